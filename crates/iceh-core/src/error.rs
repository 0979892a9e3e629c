//! Error types for the export reconciler

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for reconciler operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the reconciler
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed date string {raw:?}: {message}")]
    Format { raw: String, message: String },

    #[error("malformed index file {path}: {message}")]
    Index { path: PathBuf, message: String },

    #[error("unsupported media format: {path}")]
    UnsupportedFormat { path: PathBuf },

    #[error("failed to move {src} to {dest}: {message}")]
    Placement {
        src: PathBuf,
        dest: PathBuf,
        message: String,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("EXIF error: {0}")]
    Exif(#[from] exif::Error),

    #[error("image container error: {0}")]
    Container(#[from] img_parts::Error),

    #[error("directory traversal error: {0}")]
    WalkDir(#[from] walkdir::Error),
}
