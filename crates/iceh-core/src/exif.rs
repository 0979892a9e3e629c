//! In-place merge of capture metadata into media files.
//!
//! For raster formats the existing EXIF payload is decoded, the capture
//! fields are set, and the payload is spliced back into the container
//! without re-encoding pixel data, so a rewrite never degrades the image.

use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use exif::experimental::Writer;
use exif::{Field, In, Reader, Tag, Value};
use img_parts::{Bytes, DynImage, ImageEXIF};
use log::debug;

use crate::error::{Error, Result};
use crate::media::MediaFormat;

/// Canonical EXIF datetime form.
pub const EXIF_DATETIME_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

/// Attribution written into every restamped file.
pub const ATTRIBUTION: &str = "From iCloud by Oleg";

/// Charset prefix for an ASCII EXIF UserComment.
const USER_COMMENT_CHARSET: &[u8] = b"ASCII\0\0\0";

/// What a merge produced besides the in-place rewrite.
#[derive(Debug, Default)]
pub struct MergeOutcome {
    /// Sidecar written next to the file, for formats without a writable
    /// embedded container. Must travel with the file through placement.
    pub sidecar: Option<PathBuf>,
}

/// Merge the capture timestamp into the file's metadata. The file (or its
/// sidecar) is mutated in place; no backup copy is retained.
pub fn merge_capture_metadata(path: &Path, timestamp: DateTime<Utc>) -> Result<MergeOutcome> {
    match MediaFormat::from_path(path) {
        Some(MediaFormat::Raster) => {
            splice_exif(path, timestamp)?;
            Ok(MergeOutcome::default())
        }
        Some(MediaFormat::HighEfficiency) => {
            // Whatever metadata the container holds is treated as absent;
            // the synthesized capture block goes to a sidecar instead.
            let sidecar = write_xmp_sidecar(path, timestamp)?;
            Ok(MergeOutcome {
                sidecar: Some(sidecar),
            })
        }
        Some(MediaFormat::Jpeg2000) => Err(Error::UnsupportedFormat {
            path: path.to_path_buf(),
        }),
        None => {
            let mime = mime_guess::from_path(path).first_or_octet_stream();
            debug!("{}: unrecognized extension (guessed {})", path.display(), mime);
            Err(Error::UnsupportedFormat {
                path: path.to_path_buf(),
            })
        }
    }
}

/// Tags owned by the merge; existing copies are dropped before rewrite.
fn is_merged_tag(tag: Tag) -> bool {
    tag == Tag::DateTime
        || tag == Tag::DateTimeOriginal
        || tag == Tag::DateTimeDigitized
        || tag == Tag::UserComment
}

/// Rewrite the file's EXIF segment with the capture fields set.
fn splice_exif(path: &Path, timestamp: DateTime<Utc>) -> Result<()> {
    let buf = fs::read(path)?;
    let mut image = DynImage::from_bytes(Bytes::from(buf))?.ok_or_else(|| {
        Error::UnsupportedFormat {
            path: path.to_path_buf(),
        }
    })?;

    // Carry over existing primary-IFD fields; an absent segment just means
    // there is nothing to carry. The thumbnail IFD is dropped on rewrite,
    // its strip offsets would not survive the new layout.
    let mut fields: Vec<Field> = Vec::new();
    if let Some(raw) = image.exif() {
        let existing = Reader::new().read_raw(raw.to_vec())?;
        for field in existing.fields() {
            if field.ifd_num != In::PRIMARY || is_merged_tag(field.tag) {
                continue;
            }
            fields.push(Field {
                tag: field.tag,
                ifd_num: field.ifd_num,
                value: field.value.clone(),
            });
        }
    }

    let stamp = timestamp.format(EXIF_DATETIME_FORMAT).to_string();
    let ascii_stamp = || Value::Ascii(vec![stamp.clone().into_bytes()]);
    let mut comment = USER_COMMENT_CHARSET.to_vec();
    comment.extend_from_slice(ATTRIBUTION.as_bytes());

    for (tag, value) in [
        (Tag::DateTime, ascii_stamp()),
        (Tag::DateTimeOriginal, ascii_stamp()),
        (Tag::DateTimeDigitized, ascii_stamp()),
        (Tag::UserComment, Value::Undefined(comment, 0)),
    ] {
        fields.push(Field {
            tag,
            ifd_num: In::PRIMARY,
            value,
        });
    }

    let mut writer = Writer::new();
    for field in &fields {
        writer.push_field(field);
    }
    let mut payload = Cursor::new(Vec::new());
    writer.write(&mut payload, false)?;

    image.set_exif(Some(payload.into_inner().into()));

    let out = fs::File::create(path)?;
    image.encoder().write_to(out)?;
    Ok(())
}

/// `IMG_0001.heic` -> `IMG_0001.heic.xmp`
pub fn sidecar_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".xmp");
    PathBuf::from(name)
}

/// Write the synthesized capture block as an XMP sidecar next to `path`.
fn write_xmp_sidecar(path: &Path, timestamp: DateTime<Utc>) -> Result<PathBuf> {
    let stamp = timestamp.format("%Y-%m-%dT%H:%M:%SZ").to_string();
    let sidecar = sidecar_path(path);
    let xmp = format!(
        r#"<?xpacket begin="" id="W5M0MpCehiHzreSzNTczkc9d"?>
<x:xmpmeta xmlns:x="adobe:ns:meta/">
 <rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#">
  <rdf:Description rdf:about=""
    xmlns:exif="http://ns.adobe.com/exif/1.0/"
    xmlns:xmp="http://ns.adobe.com/xap/1.0/"
    exif:DateTimeOriginal="{stamp}"
    exif:DateTimeDigitized="{stamp}"
    xmp:CreateDate="{stamp}"
    xmp:ModifyDate="{stamp}"
    exif:UserComment="{ATTRIBUTION}"/>
 </rdf:RDF>
</x:xmpmeta>
<?xpacket end="w"?>
"#
    );
    fs::write(&sidecar, xmp)?;
    Ok(sidecar)
}
