//! Discovery and parsing of "Photo Details" index files.
//!
//! An export ships one or more CSV index files next to the media tree. Each
//! data row maps a bare media filename to the raw capture date string that
//! the files themselves no longer carry.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use log::{debug, warn};
use unicode_normalization::UnicodeNormalization;
use walkdir::WalkDir;

use crate::date;
use crate::error::{Error, Result};

/// Index files are discovered by naming convention: case-sensitive prefix,
/// exact suffix.
pub const INDEX_PREFIX: &str = "Photo Details";
pub const INDEX_SUFFIX: &str = ".csv";

/// First column of a header row (compared case-insensitively).
const HEADER_SENTINEL: &str = "imgName";

/// Mapping from bare media filename to its recorded capture time.
pub type IndexTable = HashMap<String, DateTime<Utc>>;

/// Normalize a basename for table keys and lookups. Index files carry NFC
/// strings while macOS filesystems hand back NFD names for the same photos.
pub fn table_key(basename: &str) -> String {
    basename.nfc().collect()
}

/// Recursively find index files under `root`. The result is sorted so that
/// the last-write-wins merge in [`load_index`] is deterministic across runs.
pub fn discover_index_files(root: &Path) -> Vec<PathBuf> {
    let mut found = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("skipping unreadable entry during index discovery: {e}");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if name.starts_with(INDEX_PREFIX) && name.ends_with(INDEX_SUFFIX) {
            found.push(entry.into_path());
        }
    }
    found.sort();
    found
}

/// Parse the given index files into one table.
///
/// Header rows are skipped, every other row must be `(basename, raw date)`
/// with any further columns ignored. Any malformed row is fatal: a broken
/// index means the whole reconciliation would be unreliable, so nothing gets
/// processed. Duplicate basenames resolve last-write-wins.
pub fn load_index(paths: &[PathBuf]) -> Result<IndexTable> {
    let mut table = IndexTable::new();

    for path in paths {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(path)?;

        let mut rows = 0usize;
        for (rownum, record) in reader.records().enumerate() {
            let record = record?;
            let Some(name) = record.get(0) else {
                continue;
            };
            if name.is_empty() && record.len() == 1 {
                continue;
            }
            if name.eq_ignore_ascii_case(HEADER_SENTINEL) {
                continue;
            }
            let raw_date = record.get(1).ok_or_else(|| Error::Index {
                path: path.clone(),
                message: format!("row {}: expected at least two columns", rownum + 1),
            })?;
            let timestamp = date::parse_index_date(raw_date)?;
            table.insert(table_key(name), timestamp);
            rows += 1;
        }
        debug!("loaded {} rows from {}", rows, path.display());
    }

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn discovery_matches_prefix_and_suffix() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("nested/deep")).unwrap();
        fs::write(root.join("Photo Details.csv"), "").unwrap();
        fs::write(root.join("nested/deep/Photo Details-2.csv"), "").unwrap();
        // Prefix is case-sensitive, suffix is exact.
        fs::write(root.join("photo details.csv"), "").unwrap();
        fs::write(root.join("Photo Details.CSV"), "").unwrap();
        fs::write(root.join("Other.csv"), "").unwrap();

        let found = discover_index_files(root);
        let names: Vec<_> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, vec!["Photo Details.csv", "Photo Details-2.csv"]);
    }

    #[test]
    fn loads_rows_and_skips_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("Photo Details.csv");
        fs::write(
            &path,
            "imgName,originalCreationDate,importDate\n\
             IMG_0001.JPG,\"Friday July 16,2021 9:01 PM GMT\",ignored\n\
             IMG_0002.HEIC,\"Tuesday March 1,2021 10:30 AM GMT\"\n",
        )
        .unwrap();

        let table = load_index(&[path]).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(
            table["IMG_0001.JPG"].to_rfc3339(),
            "2021-07-16T21:01:00+00:00"
        );
        assert_eq!(
            table["IMG_0002.HEIC"].to_rfc3339(),
            "2021-03-01T10:30:00+00:00"
        );
    }

    #[test]
    fn later_files_overwrite_earlier_rows() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("Photo Details.csv");
        let b = dir.path().join("Photo Details-2.csv");
        fs::write(&a, "IMG.JPG,\"Friday July 16,2021 9:01 PM GMT\"\n").unwrap();
        fs::write(&b, "IMG.JPG,\"Saturday July 17,2021 9:01 PM GMT\"\n").unwrap();

        let table = load_index(&[a, b]).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table["IMG.JPG"].to_rfc3339(), "2021-07-17T21:01:00+00:00");
    }

    #[test]
    fn loading_is_idempotent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("Photo Details.csv");
        fs::write(&path, "IMG.JPG,\"Friday July 16,2021 9:01 PM GMT\"\n").unwrap();

        let paths = vec![path];
        let first = load_index(&paths).unwrap();
        let second = load_index(&paths).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn malformed_date_is_fatal() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("Photo Details.csv");
        fs::write(&path, "IMG.JPG,\"Friday July 16,2021 9:01 PM PST\"\n").unwrap();
        assert!(load_index(&[path]).is_err());
    }

    #[test]
    fn short_row_is_fatal() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("Photo Details.csv");
        fs::write(&path, "IMG.JPG\n").unwrap();
        let err = load_index(&[path]).unwrap_err();
        assert!(err.to_string().contains("two columns"));
    }

    #[test]
    fn keys_are_nfc_normalized() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("Photo Details.csv");
        // NFD-encoded "é" in the index row.
        fs::write(
            &path,
            "caf\u{0065}\u{0301}.jpg,\"Friday July 16,2021 9:01 PM GMT\"\n",
        )
        .unwrap();

        let table = load_index(&[path]).unwrap();
        // Lookup through table_key works for either normal form.
        assert!(table.contains_key(&table_key("caf\u{00e9}.jpg")));
        assert!(table.contains_key(&table_key("caf\u{0065}\u{0301}.jpg")));
    }
}
