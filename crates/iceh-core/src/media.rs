//! Media format recognition.

use std::path::Path;

/// Recognized media formats, decided once from the file extension.
///
/// Everything downstream branches on this single classification instead of
/// re-checking extensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaFormat {
    /// JPEG/PNG/WebP: capture metadata lives in an EXIF segment that can be
    /// rewritten in place without touching pixel data.
    Raster,
    /// HEIC/HEIF: the embedded container is never rewritten here; capture
    /// metadata goes to an XMP sidecar instead.
    HighEfficiency,
    /// JPEG 2000: no writable metadata support, always rejected.
    Jpeg2000,
}

impl MediaFormat {
    /// Classify a path by extension. `None` for anything unrecognized.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "jpg" | "jpeg" | "png" | "webp" => Some(Self::Raster),
            "heic" | "heif" => Some(Self::HighEfficiency),
            "jp2" => Some(Self::Jpeg2000),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_known_extensions() {
        assert_eq!(MediaFormat::from_path(Path::new("a/b/IMG_0001.JPG")), Some(MediaFormat::Raster));
        assert_eq!(MediaFormat::from_path(Path::new("photo.jpeg")), Some(MediaFormat::Raster));
        assert_eq!(MediaFormat::from_path(Path::new("shot.png")), Some(MediaFormat::Raster));
        assert_eq!(MediaFormat::from_path(Path::new("shot.webp")), Some(MediaFormat::Raster));
        assert_eq!(MediaFormat::from_path(Path::new("IMG_0002.HEIC")), Some(MediaFormat::HighEfficiency));
        assert_eq!(MediaFormat::from_path(Path::new("scan.jp2")), Some(MediaFormat::Jpeg2000));
    }

    #[test]
    fn unknown_extensions_are_unclassified() {
        assert_eq!(MediaFormat::from_path(Path::new("clip.mov")), None);
        assert_eq!(MediaFormat::from_path(Path::new("notes.txt")), None);
        assert_eq!(MediaFormat::from_path(Path::new("no_extension")), None);
    }
}
