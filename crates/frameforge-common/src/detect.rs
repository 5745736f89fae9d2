//! Media kind detection by MIME type or file extension.
//!
//! This is a plain table lookup: the declared MIME type wins, then the
//! extension of the display name. No content sniffing is performed.

use std::path::Path;

use crate::{MediaKind, MediaSource};

/// Extensions recognised as video.
const VIDEO_EXTENSIONS: &[&str] = &[
    "mp4", "m4v", "mov", "webm", "mkv", "avi", "wmv", "flv", "ogv", "ts",
];

/// Extensions recognised as audio.
const AUDIO_EXTENSIONS: &[&str] = &[
    "mp3", "wav", "aac", "m4a", "ogg", "oga", "flac", "opus", "weba",
];

/// Extensions recognised as images.
const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "webp", "bmp", "tif", "tiff", "ico",
];

/// Kind implied by a MIME type's top-level type.
///
/// # Examples
///
/// ```
/// use frameforge_common::detect::kind_from_mime;
/// use frameforge_common::MediaKind;
///
/// assert_eq!(kind_from_mime("video/mp4"), Some(MediaKind::Video));
/// assert_eq!(kind_from_mime("application/pdf"), None);
/// ```
pub fn kind_from_mime(mime: &str) -> Option<MediaKind> {
    let top = mime.split('/').next()?.trim().to_ascii_lowercase();
    match top.as_str() {
        "video" => Some(MediaKind::Video),
        "audio" => Some(MediaKind::Audio),
        "image" => Some(MediaKind::Image),
        _ => None,
    }
}

/// Kind implied by a file name's extension.
pub fn kind_from_name(name: &str) -> Option<MediaKind> {
    let ext = Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())?
        .to_ascii_lowercase();

    if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
        Some(MediaKind::Video)
    } else if AUDIO_EXTENSIONS.contains(&ext.as_str()) {
        Some(MediaKind::Audio)
    } else if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        Some(MediaKind::Image)
    } else {
        None
    }
}

/// Detect the kind of a source from its declared MIME type or name.
pub fn detect_kind(source: &MediaSource) -> Option<MediaKind> {
    source
        .mime_type
        .as_deref()
        .and_then(kind_from_mime)
        .or_else(|| source.name.as_deref().and_then(kind_from_name))
}
