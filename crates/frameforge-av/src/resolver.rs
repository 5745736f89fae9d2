//! Codec parameter resolution.
//!
//! Pure functions that turn user-facing settings (quality tier, resolution
//! bucket, codec name, bitrate string) into concrete encoder parameters.

use frameforge_common::{Resolution, VideoQuality};

/// Fixed encode frame rate.
pub const FRAME_RATE: u32 = 30;

/// Audio bitrate used when the configured string does not parse.
pub const DEFAULT_AUDIO_BITRATE: u32 = 256_000;

/// Image quality used when none is configured.
pub const DEFAULT_IMAGE_QUALITY: u8 = 85;

const VIDEO_CODECS: &[(&str, &str)] = &[
    ("h264", "avc1.42001f"),
    ("h265", "hvc1.1.6.L93.B0"),
    ("vp9", "vp09.00.10.08"),
];

const AUDIO_CODECS: &[(&str, &str)] = &[
    ("mp3", "mp3"),
    ("aac", "mp4a.40.2"),
    ("ogg", "vorbis"),
    ("wav", "pcm"),
];

/// Codec identifier for a video codec name. Unknown names resolve to h264.
pub fn video_codec(name: &str) -> &'static str {
    lookup(VIDEO_CODECS, name).unwrap_or(VIDEO_CODECS[0].1)
}

/// Whether `name` has its own entry in the video codec table.
pub fn is_known_video_codec(name: &str) -> bool {
    lookup(VIDEO_CODECS, name).is_some()
}

/// Codec identifier for an audio output format. Unknown formats resolve to aac.
pub fn audio_codec(format: &str) -> &'static str {
    lookup(AUDIO_CODECS, format).unwrap_or("mp4a.40.2")
}

fn lookup(table: &[(&str, &'static str)], name: &str) -> Option<&'static str> {
    let name = name.to_ascii_lowercase();
    table.iter().find(|(k, _)| *k == name).map(|(_, v)| *v)
}

/// Multiplier applied to the pixel rate for each quality tier.
pub fn quality_factor(quality: VideoQuality) -> f64 {
    match quality {
        VideoQuality::Low => 0.1,
        VideoQuality::Medium => 0.2,
        VideoQuality::High => 0.4,
    }
}

/// Target video bitrate in bits per second.
///
/// `round(width * height * factor * 30 / 1000) * 1000`.
///
/// # Examples
///
/// ```
/// use frameforge_av::resolver::video_bitrate;
/// use frameforge_common::VideoQuality;
///
/// assert_eq!(video_bitrate(1280, 720, VideoQuality::Medium), 5_530_000);
/// ```
pub fn video_bitrate(width: u32, height: u32, quality: VideoQuality) -> u64 {
    let pixels = width as f64 * height as f64;
    let kbps = (pixels * quality_factor(quality) * FRAME_RATE as f64 / 1000.0).round();
    kbps as u64 * 1000
}

/// Scale source dimensions into a resolution bucket, preserving aspect ratio.
///
/// Sources wider than the bucket are pinned to the bucket width; the rest
/// are pinned to the bucket height. [`Resolution::Original`] and degenerate
/// sources (a zero dimension) are returned unchanged.
pub fn scale_to_bucket(width: u32, height: u32, bucket: Resolution) -> (u32, u32) {
    let Some((bucket_w, bucket_h)) = bucket.dimensions() else {
        return (width, height);
    };
    if width == 0 || height == 0 {
        return (width, height);
    }

    let ratio = width as f64 / height as f64;
    let bucket_ratio = bucket_w as f64 / bucket_h as f64;

    if ratio > bucket_ratio {
        let h = (bucket_w as f64 / ratio).round().max(1.0) as u32;
        (bucket_w, h)
    } else {
        let w = (bucket_h as f64 * ratio).round().max(1.0) as u32;
        (w, bucket_h)
    }
}

/// Parse an audio bitrate string of the form `<digits>[k]`.
///
/// A `k` suffix multiplies by 1000. Anything else, including zero,
/// yields [`DEFAULT_AUDIO_BITRATE`].
pub fn audio_bitrate(value: &str) -> u32 {
    let value = value.trim();
    let suffixed = value.strip_suffix('k').or_else(|| value.strip_suffix('K'));
    let (digits, multiplier) = match suffixed {
        Some(rest) => (rest, 1000u32),
        None => (value, 1u32),
    };

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return DEFAULT_AUDIO_BITRATE;
    }

    digits
        .parse::<u32>()
        .ok()
        .and_then(|n| n.checked_mul(multiplier))
        .filter(|&bps| bps > 0)
        .unwrap_or(DEFAULT_AUDIO_BITRATE)
}

/// Convert a 1-100 image quality into a 0.0-1.0 export factor.
///
/// Out-of-range values are clamped.
pub fn image_quality_factor(quality: u8) -> f32 {
    quality.clamp(1, 100) as f32 / 100.0
}

/// Resolved video encoder parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoParams {
    pub codec: &'static str,
    pub width: u32,
    pub height: u32,
    pub bitrate: u64,
    pub framerate: u32,
}

/// Resolve every video encoder parameter from the source size and settings.
pub fn resolve_video(
    source_width: u32,
    source_height: u32,
    config: &frameforge_common::VideoConfig,
) -> VideoParams {
    let (width, height) = scale_to_bucket(source_width, source_height, config.resolution);
    VideoParams {
        codec: video_codec(&config.codec),
        width,
        height,
        bitrate: video_bitrate(width, height, config.quality),
        framerate: FRAME_RATE,
    }
}

/// Resolved audio encoder parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioParams {
    pub codec: &'static str,
    pub sample_rate: u32,
    pub channels: u16,
    pub bitrate: u32,
}

/// Resolve every audio encoder parameter for `format` and the source channel count.
pub fn resolve_audio(
    format: &str,
    channels: u16,
    config: &frameforge_common::AudioConfig,
) -> AudioParams {
    AudioParams {
        codec: audio_codec(format),
        sample_rate: config.sample_rate,
        channels,
        bitrate: audio_bitrate(&config.bitrate),
    }
}
