//! Parsing of the loosely formatted capture dates found in "Photo Details"
//! index files.

use std::sync::LazyLock;

use chrono::{DateTime, TimeZone, Utc};
use regex::Regex;

use crate::error::{Error, Result};

/// Shape of an index date, after lowercasing and trimming:
/// `<weekday>[,] <month> <day>[,]<year> <h>:<mm> <am|pm>[,] <tz>`.
/// Real exports write the day/year comma with no space (`july 16,2021`);
/// hand-edited files tend to add one. Both forms are accepted.
static DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[a-z]+,?\s+(?P<month>[a-z]+)\s+(?P<day>\d{1,2}),?\s*(?P<year>\d{4}),?\s+(?P<hour>\d{1,2}):(?P<minute>\d{2})\s*(?P<half>am|pm),?\s+(?P<tz>[a-z]+)$",
    )
    .unwrap()
});

fn month_number(name: &str) -> Option<u32> {
    let n = match name {
        "january" => 1,
        "february" => 2,
        "march" => 3,
        "april" => 4,
        "may" => 5,
        "june" => 6,
        "july" => 7,
        "august" => 8,
        "september" => 9,
        "october" => 10,
        "november" => 11,
        "december" => 12,
        _ => return None,
    };
    Some(n)
}

/// Parse one raw index date string into a UTC capture time.
///
/// The leading weekday token carries no information and is discarded. The
/// only recognized zone designator is `GMT`, which means UTC; anything else
/// is rejected rather than silently misinterpreted. Seconds are always zero,
/// the source format has no seconds column.
pub fn parse_index_date(raw: &str) -> Result<DateTime<Utc>> {
    let format_err = |message: String| Error::Format {
        raw: raw.to_string(),
        message,
    };

    let lowered = raw.trim().trim_matches('"').trim().to_lowercase();
    let caps = DATE_RE.captures(&lowered).ok_or_else(|| {
        format_err("expected \"<weekday> <month> <day>, <year> <hh>:<mm> <am|pm> <tz>\"".into())
    })?;

    let tz = &caps["tz"];
    if tz != "gmt" {
        return Err(format_err(format!("unsupported timezone {:?}", tz)));
    }

    let month = month_number(&caps["month"])
        .ok_or_else(|| format_err(format!("unknown month {:?}", &caps["month"])))?;

    // The regex pins these to short digit runs, so the parses cannot fail.
    let day: u32 = caps["day"].parse().unwrap_or_default();
    let year: i32 = caps["year"].parse().unwrap_or_default();
    let hour12: u32 = caps["hour"].parse().unwrap_or_default();
    let minute: u32 = caps["minute"].parse().unwrap_or_default();

    if !(1..=12).contains(&hour12) {
        return Err(format_err(format!("hour {} out of range for a 12-hour clock", hour12)));
    }

    // Full 12-hour conversion: 12am is midnight, 12pm stays noon.
    let hour = match (&caps["half"], hour12) {
        ("am", 12) => 0,
        ("pm", h) if h < 12 => h + 12,
        (_, h) => h,
    };

    Utc.with_ymd_and_hms(year, month, day, hour, minute, 0)
        .single()
        .ok_or_else(|| format_err("not a valid calendar date/time".into()))
}
