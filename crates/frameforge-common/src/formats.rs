//! Output format tables.
//!
//! Format names are matched case-insensitively. Anything missing from the
//! MIME table maps to [`GENERIC_MIME_TYPE`].

use crate::MediaKind;

/// MIME type used for formats not in the table.
pub const GENERIC_MIME_TYPE: &str = "application/octet-stream";

const VIDEO_FORMATS: &[&str] = &["mp4", "webm"];
const AUDIO_FORMATS: &[&str] = &["aac", "wav"];
const IMAGE_FORMATS: &[&str] = &["jpeg", "png", "webp"];

const MIME_TYPES: &[(&str, &str)] = &[
    ("mp4", "video/mp4"),
    ("webm", "video/webm"),
    ("mp3", "audio/mpeg"),
    ("aac", "audio/aac"),
    ("wav", "audio/wav"),
    ("ogg", "audio/ogg"),
    ("jpeg", "image/jpeg"),
    ("jpg", "image/jpeg"),
    ("png", "image/png"),
    ("webp", "image/webp"),
];

/// Output formats advertised for a media kind, in preference order.
pub fn supported_formats(kind: MediaKind) -> &'static [&'static str] {
    match kind {
        MediaKind::Video => VIDEO_FORMATS,
        MediaKind::Audio => AUDIO_FORMATS,
        MediaKind::Image => IMAGE_FORMATS,
    }
}

/// MIME type for an output format.
///
/// # Examples
///
/// ```
/// use frameforge_common::formats::mime_type;
///
/// assert_eq!(mime_type("MP4"), "video/mp4");
/// assert_eq!(mime_type("xyz"), "application/octet-stream");
/// ```
pub fn mime_type(format: &str) -> &'static str {
    let format = format.to_ascii_lowercase();
    MIME_TYPES
        .iter()
        .find(|(name, _)| *name == format)
        .map(|(_, mime)| *mime)
        .unwrap_or(GENERIC_MIME_TYPE)
}

/// Derive the output filename: the source name with its extension replaced.
///
/// Only the last extension is replaced; a name without one gets the format
/// appended. A missing or empty name becomes `output`.
///
/// # Examples
///
/// ```
/// use frameforge_common::formats::output_filename;
///
/// assert_eq!(output_filename(Some("clip.final.mov"), "mp4"), "clip.final.mp4");
/// assert_eq!(output_filename(None, "png"), "output.png");
/// ```
pub fn output_filename(source_name: Option<&str>, format: &str) -> String {
    let name = source_name
        .map(|n| n.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or(n))
        .filter(|n| !n.is_empty())
        .unwrap_or("output");

    let stem = match name.rfind('.') {
        Some(idx) if idx > 0 => &name[..idx],
        _ => name,
    };

    format!("{stem}.{format}")
}
