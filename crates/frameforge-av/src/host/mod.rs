//! Host collaborator contracts.
//!
//! The pipelines never talk to a codec library directly. A [`MediaHost`]
//! hands them a [`VideoSource`] to seek and sample, an audio decode service,
//! and [`FrameEncoder`] factories. Encoders deliver output through the
//! [`ChunkSink`](crate::session::ChunkSink) they are created with.
//!
//! - [`software`] - pure-Rust host with WAVE decode and PCM encode

pub mod software;
mod wav;

use async_trait::async_trait;
use bytes::Bytes;
use frameforge_common::Result;
use image::RgbaImage;

use crate::capability::Primitives;
use crate::resolver::{AudioParams, VideoParams};
use crate::session::ChunkSink;

pub use software::SoftwareHost;

/// One raw video frame: RGBA8 pixels plus timing.
#[derive(Debug, Clone)]
pub struct VideoFrame {
    pub timestamp_us: i64,
    pub duration_us: i64,
    pub width: u32,
    pub height: u32,
    /// Tightly packed RGBA8 rows.
    pub data: Bytes,
}

/// One block of raw audio, samples interleaved across channels.
#[derive(Debug, Clone)]
pub struct AudioFrame {
    pub timestamp_us: i64,
    pub sample_rate: u32,
    pub channels: u16,
    /// Samples per channel in this frame.
    pub frames: usize,
    /// `[f0c0, f0c1, .., f1c0, ..]`, `frames * channels` long.
    pub data: Vec<f32>,
}

/// Anything submitted to an encoder carries a presentation timestamp.
pub trait Timestamped {
    /// Presentation timestamp in microseconds.
    fn timestamp_us(&self) -> i64;
}

impl Timestamped for VideoFrame {
    fn timestamp_us(&self) -> i64 {
        self.timestamp_us
    }
}

impl Timestamped for AudioFrame {
    fn timestamp_us(&self) -> i64 {
        self.timestamp_us
    }
}

/// Fully decoded audio, one sample vector per channel.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    pub sample_rate: u32,
    pub channels: Vec<Vec<f32>>,
}

impl AudioBuffer {
    /// Number of channels.
    pub fn channel_count(&self) -> u16 {
        self.channels.len() as u16
    }

    /// Samples per channel (the shortest channel, if they differ).
    pub fn len(&self) -> usize {
        self.channels.iter().map(Vec::len).min().unwrap_or(0)
    }

    /// Whether the buffer holds no samples.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.len() as f64 / self.sample_rate as f64
    }
}

/// Source metadata available once a video has loaded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoMetadata {
    pub width: u32,
    pub height: u32,
    pub duration_secs: f64,
}

/// Settings shared by every encoder configuration.
pub trait EncoderSettings: Send + Sync {
    /// Codec identifier string.
    fn codec(&self) -> &str;
}

/// Video encoder configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoEncoderConfig {
    pub codec: String,
    pub width: u32,
    pub height: u32,
    pub bitrate: u64,
    pub framerate: u32,
}

impl From<&VideoParams> for VideoEncoderConfig {
    fn from(p: &VideoParams) -> Self {
        Self {
            codec: p.codec.to_string(),
            width: p.width,
            height: p.height,
            bitrate: p.bitrate,
            framerate: p.framerate,
        }
    }
}

impl EncoderSettings for VideoEncoderConfig {
    fn codec(&self) -> &str {
        &self.codec
    }
}

/// Audio encoder configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioEncoderConfig {
    pub codec: String,
    pub sample_rate: u32,
    pub channels: u16,
    pub bitrate: u32,
}

impl From<&AudioParams> for AudioEncoderConfig {
    fn from(p: &AudioParams) -> Self {
        Self {
            codec: p.codec.to_string(),
            sample_rate: p.sample_rate,
            channels: p.channels,
            bitrate: p.bitrate,
        }
    }
}

impl EncoderSettings for AudioEncoderConfig {
    fn codec(&self) -> &str {
        &self.codec
    }
}

/// A low-level encoder driven through configure, encode, flush.
///
/// Output is emitted through the [`ChunkSink`] the encoder was created
/// with, strictly in submission order. Failures after `configure` may be
/// reported either as an `Err` or on the sink's error channel.
#[async_trait]
pub trait FrameEncoder: Send + Sync {
    type Config: EncoderSettings;
    type Frame: Timestamped + Send + 'static;

    /// Whether the encoder can be configured with `config`.
    async fn is_config_supported(&self, config: &Self::Config) -> bool;

    /// Apply `config`. Must be called before the first `encode`.
    fn configure(&mut self, config: &Self::Config) -> Result<()>;

    /// Submit one frame. The encoder owns the frame from here on.
    fn encode(&mut self, frame: Self::Frame) -> Result<()>;

    /// Resolve once every buffered frame has been emitted.
    async fn flush(&mut self) -> Result<()>;

    /// Release encoder resources. Further calls are invalid.
    fn close(&mut self);
}

/// Video flavour of [`FrameEncoder`].
pub type VideoEncoder = dyn FrameEncoder<Config = VideoEncoderConfig, Frame = VideoFrame>;

/// Audio flavour of [`FrameEncoder`].
pub type AudioEncoder = dyn FrameEncoder<Config = AudioEncoderConfig, Frame = AudioFrame>;

/// A loaded video that can be positioned and sampled.
#[async_trait]
pub trait VideoSource: Send + Sync {
    /// Natural dimensions and duration.
    fn metadata(&self) -> VideoMetadata;

    /// Move the playback position; resolves when the seek has completed.
    async fn seek(&mut self, seconds: f64) -> Result<()>;

    /// The picture at the current position, at natural size.
    fn current_frame(&self) -> Result<RgbaImage>;
}

/// The environment providing decode and encode primitives.
#[async_trait]
pub trait MediaHost: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Which primitives this host has.
    fn primitives(&self) -> Primitives;

    /// Load a video; resolves once its metadata is available.
    async fn open_video(&self, data: Bytes) -> Result<Box<dyn VideoSource>>;

    /// Decode a whole audio file, resampled to `sample_rate`.
    async fn decode_audio(&self, data: Bytes, sample_rate: u32) -> Result<AudioBuffer>;

    /// Create an unconfigured video encoder emitting into `sink`.
    fn video_encoder(&self, sink: ChunkSink) -> Result<Box<VideoEncoder>>;

    /// Create an unconfigured audio encoder emitting into `sink`.
    fn audio_encoder(&self, sink: ChunkSink) -> Result<Box<AudioEncoder>>;
}
