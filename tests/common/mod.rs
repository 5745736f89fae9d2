//! Shared test harness for integration tests.
//!
//! Provides [`RecordingHost`], a media host with a synthetic video decoder and
//! an encoder that records what it was given. Audio goes through the real
//! [`SoftwareHost`].

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use frameforge_av::host::{
    AudioBuffer, AudioEncoder, FrameEncoder, VideoEncoder, VideoEncoderConfig, VideoFrame,
    VideoMetadata, VideoSource,
};
use frameforge_av::{ChunkSink, ChunkType, MediaHost, Primitives, SoftwareHost};
use frameforge_common::Result;
use image::{Rgba, RgbaImage};

/// What the recording encoder saw.
#[derive(Debug, Default)]
pub struct Recorded {
    pub configs: Vec<VideoEncoderConfig>,
    pub frames: Vec<(i64, u32, u32)>,
}

#[derive(Clone)]
pub struct RecordingHost {
    pub primitives: Primitives,
    pub metadata: VideoMetadata,
    pub recorded: Arc<Mutex<Recorded>>,
    audio: SoftwareHost,
}

impl RecordingHost {
    pub fn new(width: u32, height: u32, duration_secs: f64) -> Self {
        Self {
            primitives: Primitives::all(),
            metadata: VideoMetadata {
                width,
                height,
                duration_secs,
            },
            recorded: Arc::new(Mutex::new(Recorded::default())),
            audio: SoftwareHost::new(),
        }
    }

    pub fn with_primitives(mut self, primitives: Primitives) -> Self {
        self.primitives = primitives;
        self
    }

    pub fn recorded(&self) -> std::sync::MutexGuard<'_, Recorded> {
        self.recorded.lock().unwrap()
    }
}

struct SyntheticSource {
    metadata: VideoMetadata,
}

#[async_trait]
impl VideoSource for SyntheticSource {
    fn metadata(&self) -> VideoMetadata {
        self.metadata
    }

    async fn seek(&mut self, _seconds: f64) -> Result<()> {
        Ok(())
    }

    fn current_frame(&self) -> Result<RgbaImage> {
        Ok(RgbaImage::from_pixel(32, 18, Rgba([40, 80, 120, 255])))
    }
}

struct RecordingEncoder {
    sink: ChunkSink,
    recorded: Arc<Mutex<Recorded>>,
}

#[async_trait]
impl FrameEncoder for RecordingEncoder {
    type Config = VideoEncoderConfig;
    type Frame = VideoFrame;

    async fn is_config_supported(&self, _config: &VideoEncoderConfig) -> bool {
        true
    }

    fn configure(&mut self, config: &VideoEncoderConfig) -> Result<()> {
        self.recorded.lock().unwrap().configs.push(config.clone());
        Ok(())
    }

    fn encode(&mut self, frame: VideoFrame) -> Result<()> {
        self.recorded
            .lock()
            .unwrap()
            .frames
            .push((frame.timestamp_us, frame.width, frame.height));
        let kind = if self.sink.emitted() == 0 {
            ChunkType::Key
        } else {
            ChunkType::Delta
        };
        self.sink
            .emit(frame.timestamp_us, kind, frame.timestamp_us.to_be_bytes().to_vec());
        Ok(())
    }

    async fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn close(&mut self) {}
}

#[async_trait]
impl MediaHost for RecordingHost {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn primitives(&self) -> Primitives {
        self.primitives
    }

    async fn open_video(&self, _data: Bytes) -> Result<Box<dyn VideoSource>> {
        Ok(Box::new(SyntheticSource {
            metadata: self.metadata,
        }))
    }

    async fn decode_audio(&self, data: Bytes, sample_rate: u32) -> Result<AudioBuffer> {
        self.audio.decode_audio(data, sample_rate).await
    }

    fn video_encoder(&self, sink: ChunkSink) -> Result<Box<VideoEncoder>> {
        Ok(Box::new(RecordingEncoder {
            sink,
            recorded: self.recorded.clone(),
        }))
    }

    fn audio_encoder(&self, sink: ChunkSink) -> Result<Box<AudioEncoder>> {
        self.audio.audio_encoder(sink)
    }
}

/// A 16-bit PCM WAV file holding `frames` samples per channel of a ramp.
pub fn wav_bytes(sample_rate: u32, channels: u16, frames: usize) -> Vec<u8> {
    let data_len = (frames * channels as usize * 2) as u32;
    let mut out = Vec::with_capacity(44 + data_len as usize);
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_len).to_le_bytes());
    out.extend_from_slice(b"WAVE");
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&channels.to_le_bytes());
    out.extend_from_slice(&sample_rate.to_le_bytes());
    out.extend_from_slice(&(sample_rate * channels as u32 * 2).to_le_bytes());
    out.extend_from_slice(&(channels * 2).to_le_bytes());
    out.extend_from_slice(&16u16.to_le_bytes());
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_len.to_le_bytes());
    for i in 0..frames {
        let sample = ((i % 200) as i16 - 100) * 100;
        for _ in 0..channels {
            out.extend_from_slice(&sample.to_le_bytes());
        }
    }
    out
}

/// A solid-colour PNG.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_pixel(width, height, Rgba([200, 30, 60, 255]));
    let mut buf = std::io::Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
    buf.into_inner()
}
