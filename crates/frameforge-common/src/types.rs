//! Core type definitions for conversion requests and results.
//!
//! Settings are grouped per media kind. Each kind has a fixed default
//! ([`ConversionConfig::default`]) and a partial counterpart whose present
//! fields override those defaults when merged. Enum-valued settings parse
//! leniently: an unknown name falls back to the documented default instead
//! of failing the whole request.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Kind of media being converted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// Moving pictures, converted frame by frame.
    Video,
    /// Sampled sound.
    Audio,
    /// A single still raster.
    Image,
}

impl MediaKind {
    /// All kinds, in display order.
    pub const ALL: [MediaKind; 3] = [MediaKind::Video, MediaKind::Audio, MediaKind::Image];
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Video => write!(f, "video"),
            Self::Audio => write!(f, "audio"),
            Self::Image => write!(f, "image"),
        }
    }
}

impl FromStr for MediaKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "video" => Ok(Self::Video),
            "audio" => Ok(Self::Audio),
            "image" => Ok(Self::Image),
            other => Err(Error::unsupported_file_type(format!(
                "unknown media kind '{other}'"
            ))),
        }
    }
}

/// Video quality tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum VideoQuality {
    Low,
    #[default]
    Medium,
    High,
}

impl From<&str> for VideoQuality {
    fn from(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "low" => Self::Low,
            "high" => Self::High,
            _ => Self::Medium,
        }
    }
}

impl From<String> for VideoQuality {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl fmt::Display for VideoQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

/// Named target resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String")]
pub enum Resolution {
    /// Keep the source dimensions.
    #[default]
    #[serde(rename = "original")]
    Original,
    /// 1280x720 bucket.
    #[serde(rename = "720p")]
    Hd720,
    /// 1920x1080 bucket.
    #[serde(rename = "1080p")]
    Hd1080,
    /// 3840x2160 bucket.
    #[serde(rename = "4k")]
    Uhd4k,
}

impl Resolution {
    /// Bucket dimensions, or `None` for [`Resolution::Original`].
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        match self {
            Self::Original => None,
            Self::Hd720 => Some((1280, 720)),
            Self::Hd1080 => Some((1920, 1080)),
            Self::Uhd4k => Some((3840, 2160)),
        }
    }
}

impl From<&str> for Resolution {
    fn from(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "720p" => Self::Hd720,
            "1080p" => Self::Hd1080,
            "4k" => Self::Uhd4k,
            _ => Self::Original,
        }
    }
}

impl From<String> for Resolution {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Original => write!(f, "original"),
            Self::Hd720 => write!(f, "720p"),
            Self::Hd1080 => write!(f, "1080p"),
            Self::Uhd4k => write!(f, "4k"),
        }
    }
}

/// Video conversion settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoConfig {
    pub format: String,
    pub resolution: Resolution,
    pub quality: VideoQuality,
    pub codec: String,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            format: "mp4".to_string(),
            resolution: Resolution::Original,
            quality: VideoQuality::Medium,
            codec: "h264".to_string(),
        }
    }
}

/// Audio conversion settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioConfig {
    pub format: String,
    /// Bitrate as `<digits>[k]`, e.g. `"256k"`.
    pub bitrate: String,
    pub sample_rate: u32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            format: "mp3".to_string(),
            bitrate: "256k".to_string(),
            sample_rate: 44100,
        }
    }
}

/// Image conversion settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageConfig {
    pub format: String,
    /// Export quality, 1-100.
    pub quality: u8,
    /// Target width; the source width when unset.
    pub width: Option<u32>,
    /// Target height; the source height when unset.
    pub height: Option<u32>,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            format: "jpeg".to_string(),
            quality: 85,
            width: None,
            height: None,
        }
    }
}

/// Fully resolved settings for every media kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversionConfig {
    pub video: VideoConfig,
    pub audio: AudioConfig,
    pub image: ImageConfig,
}

impl ConversionConfig {
    /// Return a copy with every field present in `partial` applied.
    pub fn merged(&self, partial: &PartialConversionConfig) -> Self {
        let mut out = self.clone();
        if let Some(ref v) = partial.video {
            if let Some(ref format) = v.format {
                out.video.format = format.clone();
            }
            if let Some(resolution) = v.resolution {
                out.video.resolution = resolution;
            }
            if let Some(quality) = v.quality {
                out.video.quality = quality;
            }
            if let Some(ref codec) = v.codec {
                out.video.codec = codec.clone();
            }
        }
        if let Some(ref a) = partial.audio {
            if let Some(ref format) = a.format {
                out.audio.format = format.clone();
            }
            if let Some(ref bitrate) = a.bitrate {
                out.audio.bitrate = bitrate.clone();
            }
            if let Some(sample_rate) = a.sample_rate {
                out.audio.sample_rate = sample_rate;
            }
        }
        if let Some(ref i) = partial.image {
            if let Some(ref format) = i.format {
                out.image.format = format.clone();
            }
            if let Some(quality) = i.quality {
                out.image.quality = quality;
            }
            if i.width.is_some() {
                out.image.width = i.width;
            }
            if i.height.is_some() {
                out.image.height = i.height;
            }
        }
        out
    }

    /// The configured output format for a media kind.
    pub fn default_format(&self, kind: MediaKind) -> &str {
        match kind {
            MediaKind::Video => &self.video.format,
            MediaKind::Audio => &self.audio.format,
            MediaKind::Image => &self.image.format,
        }
    }
}

/// Partial video settings; present fields override the defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartialVideoConfig {
    pub format: Option<String>,
    pub resolution: Option<Resolution>,
    pub quality: Option<VideoQuality>,
    pub codec: Option<String>,
}

/// Partial audio settings; present fields override the defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartialAudioConfig {
    pub format: Option<String>,
    pub bitrate: Option<String>,
    pub sample_rate: Option<u32>,
}

/// Partial image settings; present fields override the defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartialImageConfig {
    pub format: Option<String>,
    pub quality: Option<u8>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// Caller-supplied settings layered over [`ConversionConfig::default`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartialConversionConfig {
    pub video: Option<PartialVideoConfig>,
    pub audio: Option<PartialAudioConfig>,
    pub image: Option<PartialImageConfig>,
}

impl PartialConversionConfig {
    /// Layer `other` on top of `self`, field by field.
    pub fn overlay(&self, other: &PartialConversionConfig) -> Self {
        fn pick<T: Clone>(top: &Option<T>, base: &Option<T>) -> Option<T> {
            top.clone().or_else(|| base.clone())
        }

        let video = match (&self.video, &other.video) {
            (Some(base), Some(top)) => Some(PartialVideoConfig {
                format: pick(&top.format, &base.format),
                resolution: pick(&top.resolution, &base.resolution),
                quality: pick(&top.quality, &base.quality),
                codec: pick(&top.codec, &base.codec),
            }),
            (base, top) => pick(top, base),
        };
        let audio = match (&self.audio, &other.audio) {
            (Some(base), Some(top)) => Some(PartialAudioConfig {
                format: pick(&top.format, &base.format),
                bitrate: pick(&top.bitrate, &base.bitrate),
                sample_rate: pick(&top.sample_rate, &base.sample_rate),
            }),
            (base, top) => pick(top, base),
        };
        let image = match (&self.image, &other.image) {
            (Some(base), Some(top)) => Some(PartialImageConfig {
                format: pick(&top.format, &base.format),
                quality: pick(&top.quality, &base.quality),
                width: pick(&top.width, &base.width),
                height: pick(&top.height, &base.height),
            }),
            (base, top) => pick(top, base),
        };

        Self {
            video,
            audio,
            image,
        }
    }
}

/// Input media handed to a conversion.
#[derive(Debug, Clone)]
pub struct MediaSource {
    /// Raw input bytes.
    pub data: Bytes,
    /// Caller-declared media kind, if known.
    pub kind: Option<MediaKind>,
    /// Display name, usually the original file name.
    pub name: Option<String>,
    /// Declared MIME type, if known.
    pub mime_type: Option<String>,
}

impl MediaSource {
    /// Create a source from raw bytes with nothing declared.
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            kind: None,
            name: None,
            mime_type: None,
        }
    }

    /// Builder: set the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Builder: declare the media kind.
    pub fn with_kind(mut self, kind: MediaKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Builder: declare the MIME type.
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    /// Size of the input in bytes.
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

/// A conversion request.
#[derive(Debug, Clone)]
pub struct ConversionOptions {
    pub input: MediaSource,
    /// Output format; the per-kind configured format when unset.
    pub target_format: Option<String>,
    /// Overrides merged over the per-kind defaults.
    pub config: Option<PartialConversionConfig>,
    /// Run kind detection when the input declares no kind.
    pub auto_detect: bool,
}

impl ConversionOptions {
    /// Options for `input` with defaults everywhere else.
    pub fn new(input: MediaSource) -> Self {
        Self {
            input,
            target_format: None,
            config: None,
            auto_detect: true,
        }
    }

    /// Builder: set the output format.
    pub fn with_target_format(mut self, format: impl Into<String>) -> Self {
        self.target_format = Some(format.into());
        self
    }

    /// Builder: set configuration overrides.
    pub fn with_config(mut self, config: PartialConversionConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Builder: enable or disable kind detection.
    pub fn with_auto_detect(mut self, auto_detect: bool) -> Self {
        self.auto_detect = auto_detect;
        self
    }
}

/// Outcome of a successful conversion.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionResult {
    /// Converted bytes.
    #[serde(skip)]
    pub file: Bytes,
    /// Source name with its extension replaced by the output format.
    pub filename: String,
    pub original_size: u64,
    pub converted_size: u64,
    /// Resolved output format.
    pub format: String,
    /// MIME type of `file`.
    pub mime_type: String,
}
