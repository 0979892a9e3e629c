pub mod date;
pub mod error;
pub mod exif;
pub mod index;
pub mod media;
pub mod writer;

use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

pub use crate::error::{Error, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunOptions {
    /// Directory holding the exported media tree and its index files.
    pub input: PathBuf,
    /// Root of the date-partitioned archive.
    pub output: PathBuf,
}

/// Summary of one reconciliation run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunReport {
    /// Entries in the loaded index table.
    pub indexed: u64,
    /// Files merged and placed.
    pub placed: u64,
    /// Files without an index entry, left untouched.
    pub skipped: u64,
    /// Files whose merge or placement failed.
    pub failed: u64,
    /// One line per failed file.
    pub warnings: Vec<String>,
}

/// Type alias for progress callback
pub type ProgressCallback = dyn Fn(&str, u64, u64, &str) + Send + Sync;

/// Throttled progress reporter, emits at most every 200ms and always on
/// completion.
pub struct ThrottledProgress<'a> {
    inner: &'a ProgressCallback,
    last_emit: std::sync::Mutex<Instant>,
}

impl<'a> ThrottledProgress<'a> {
    pub fn new(inner: &'a ProgressCallback) -> Self {
        Self {
            inner,
            last_emit: std::sync::Mutex::new(Instant::now() - std::time::Duration::from_secs(1)),
        }
    }

    pub fn report(&self, stage: &str, current: u64, total: u64, message: &str) {
        let is_done = current + 1 >= total;
        if !is_done {
            let mut last = self.last_emit.lock().unwrap();
            if last.elapsed().as_millis() < 200 {
                return;
            }
            *last = Instant::now();
        }
        (self.inner)(stage, current, total, message);
    }
}

/// Run the full reconciliation pipeline with progress reporting.
///
/// A malformed index aborts before any media file is touched. After that,
/// every file is processed in isolation: merge and placement failures are
/// recorded and the walk continues.
pub fn run(options: &RunOptions, progress_callback: &ProgressCallback) -> Result<RunReport> {
    let tp = ThrottledProgress::new(progress_callback);

    // Stage 1: build the filename -> capture time table.
    let index_files = index::discover_index_files(&options.input);
    tp.report("index", 0, index_files.len() as u64, "Loading index files");
    let table = index::load_index(&index_files)?;
    debug!(
        "index holds {} entries from {} files",
        table.len(),
        index_files.len()
    );

    // Stage 2: collect candidate files up front. The sorted snapshot keeps
    // runs deterministic and means files moved below are never revisited.
    let files = collect_files(&options.input);

    // Stage 3: merge + place, one file at a time.
    let total = files.len() as u64;
    let mut report = RunReport {
        indexed: table.len() as u64,
        ..Default::default()
    };

    for (i, path) in files.iter().enumerate() {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            report.skipped += 1;
            continue;
        };
        tp.report("process", i as u64, total, name);

        // Matching is by bare basename only; not every file in the tree has
        // an index entry.
        let Some(&timestamp) = table.get(&index::table_key(name)) else {
            debug!("no index entry for {}", path.display());
            report.skipped += 1;
            continue;
        };

        match process_one(path, timestamp, &options.output) {
            Ok(dest) => {
                debug!("{} -> {}", path.display(), dest.display());
                report.placed += 1;
            }
            Err(e) => {
                let line = format!("error while processing {}: {}", path.display(), e);
                warn!("{line}");
                report.warnings.push(line);
                report.failed += 1;
            }
        }
    }
    tp.report("process", total, total, "done");

    Ok(report)
}

/// Merge then place one file. Placement is the last, irreversible step; a
/// placement failure after a successful merge leaves the file restamped in
/// its original directory.
fn process_one(path: &Path, timestamp: DateTime<Utc>, output: &Path) -> Result<PathBuf> {
    let outcome = exif::merge_capture_metadata(path, timestamp)?;
    let dest = writer::place_file(path, timestamp, output)?;
    if let Some(sidecar) = outcome.sidecar {
        writer::place_sidecar(&sidecar, &dest)?;
    }
    Ok(dest)
}

/// Snapshot of all regular files under `input`, sorted. Unreadable entries
/// are skipped, matching the tolerant walk of the index discovery.
fn collect_files(input: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for entry in WalkDir::new(input).sort_by_file_name() {
        match entry {
            Ok(entry) if entry.file_type().is_file() => files.push(entry.into_path()),
            Ok(_) => {}
            Err(e) => warn!("skipping unreadable entry: {e}"),
        }
    }
    files.sort();
    files
}
