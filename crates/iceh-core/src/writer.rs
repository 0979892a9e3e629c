//! Date-partitioned placement of processed files.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Datelike, Utc};
use filetime::FileTime;
use log::debug;

use crate::error::{Error, Result};

/// Destination directory for a capture time: `<root>/<year>/<month>/<day>`
/// with unpadded decimal components.
pub fn destination_dir(output_root: &Path, timestamp: DateTime<Utc>) -> PathBuf {
    output_root
        .join(timestamp.year().to_string())
        .join(timestamp.month().to_string())
        .join(timestamp.day().to_string())
}

/// Move `path` into its date-partitioned destination, preserving the
/// basename, and stamp the file's mtime with the capture time. Occupied
/// destinations are never overwritten; a numbered `name(1).ext` variant
/// picks a free name. Returns the final destination path.
pub fn place_file(path: &Path, timestamp: DateTime<Utc>, output_root: &Path) -> Result<PathBuf> {
    let dir = destination_dir(output_root, timestamp);
    fs::create_dir_all(&dir).map_err(|e| placement_error(path, &dir, e))?;

    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| Error::Placement {
            src: path.to_path_buf(),
            dest: dir.clone(),
            message: "file has no usable name".into(),
        })?;

    // Already sitting at its destination (re-run over a partially organized
    // tree): leave it alone instead of renaming it onto a numbered variant.
    if dir.join(filename) == path {
        return Ok(path.to_path_buf());
    }

    let dest = unique_destination(&dir, filename);
    move_file(path, &dest)?;

    let mtime = FileTime::from_unix_time(timestamp.timestamp(), 0);
    filetime::set_file_mtime(&dest, mtime).ok();

    debug!("placed {} -> {}", path.display(), dest.display());
    Ok(dest)
}

/// Move a merge-produced sidecar next to its placed media file, keeping the
/// `<media-name>.xmp` pairing even when the media name was uniquified.
pub fn place_sidecar(sidecar: &Path, placed_media: &Path) -> Result<()> {
    let mut name = placed_media.as_os_str().to_os_string();
    name.push(".xmp");
    move_file(sidecar, &PathBuf::from(name))
}

fn unique_destination(dir: &Path, filename: &str) -> PathBuf {
    let dest = dir.join(filename);
    if !dest.exists() {
        return dest;
    }

    let stem = Path::new(filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("file");
    let ext = Path::new(filename)
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("");

    let mut counter = 1u32;
    loop {
        let new_name = if ext.is_empty() {
            format!("{}({})", stem, counter)
        } else {
            format!("{}({}).{}", stem, counter, ext)
        };
        let candidate = dir.join(&new_name);
        if !candidate.exists() {
            return candidate;
        }
        counter += 1;
    }
}

/// Rename, falling back to copy+remove for cross-device moves.
fn move_file(src: &Path, dest: &Path) -> Result<()> {
    match fs::rename(src, dest) {
        Ok(()) => Ok(()),
        Err(_) => {
            fs::copy(src, dest).map_err(|e| placement_error(src, dest, e))?;
            fs::remove_file(src).map_err(|e| placement_error(src, dest, e))?;
            Ok(())
        }
    }
}

fn placement_error(src: &Path, dest: &Path, e: std::io::Error) -> Error {
    Error::Placement {
        src: src.to_path_buf(),
        dest: dest.to_path_buf(),
        message: e.to_string(),
    }
}
