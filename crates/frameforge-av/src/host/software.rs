//! Pure-Rust media host.
//!
//! Decodes RIFF/WAVE audio and encodes 16-bit PCM WAVE. It has no video
//! primitives, so under the strict gate it supports nothing; under the
//! per-kind gate it converts audio and images.

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use frameforge_common::{Error, Result};
use tracing::debug;

use super::{
    wav, AudioBuffer, AudioEncoder, AudioEncoderConfig, AudioFrame, FrameEncoder, MediaHost,
    VideoEncoder, VideoSource,
};
use crate::assembler::ChunkType;
use crate::capability::Primitives;
use crate::session::ChunkSink;

/// Codec identifier the PCM encoder accepts.
pub const PCM_CODEC: &str = "pcm";

/// Highest sample rate the PCM path decodes to or encodes.
pub const MAX_SAMPLE_RATE: u32 = 768_000;

const MAX_CHANNELS: u16 = 8;

/// Host backed by in-process decoders and encoders.
#[derive(Debug, Clone, Copy, Default)]
pub struct SoftwareHost;

impl SoftwareHost {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl MediaHost for SoftwareHost {
    fn name(&self) -> &'static str {
        "software"
    }

    fn primitives(&self) -> Primitives {
        Primitives {
            audio_decode: true,
            audio_encode: true,
            ..Primitives::none()
        }
    }

    async fn open_video(&self, _data: Bytes) -> Result<Box<dyn VideoSource>> {
        Err(Error::decode("software host cannot decode video"))
    }

    async fn decode_audio(&self, data: Bytes, sample_rate: u32) -> Result<AudioBuffer> {
        if sample_rate == 0 || sample_rate > MAX_SAMPLE_RATE {
            return Err(Error::invalid_input(format!(
                "sample rate {sample_rate} Hz is outside 1..={MAX_SAMPLE_RATE}"
            )));
        }
        tokio::task::spawn_blocking(move || {
            let decoded = wav::decode(&data)?;
            debug!(
                source_rate = decoded.sample_rate,
                target_rate = sample_rate,
                channels = decoded.channels.len(),
                "Decoded WAVE audio"
            );
            Ok(resample(&decoded, sample_rate))
        })
        .await
        .map_err(|e| Error::decode(format!("decode task failed: {e}")))?
    }

    fn video_encoder(&self, _sink: ChunkSink) -> Result<Box<VideoEncoder>> {
        Err(Error::unsupported_codec(
            "video",
            "software host has no video encoder",
        ))
    }

    fn audio_encoder(&self, sink: ChunkSink) -> Result<Box<AudioEncoder>> {
        Ok(Box::new(PcmEncoder::new(sink)))
    }
}

/// Linearly resample every channel to `target_rate`.
pub fn resample(buffer: &AudioBuffer, target_rate: u32) -> AudioBuffer {
    if buffer.sample_rate == target_rate || buffer.sample_rate == 0 {
        return AudioBuffer {
            sample_rate: target_rate,
            channels: buffer.channels.clone(),
        };
    }

    let ratio = buffer.sample_rate as f64 / target_rate as f64;
    let channels = buffer
        .channels
        .iter()
        .map(|input| {
            if input.is_empty() {
                return Vec::new();
            }
            let out_len = ((input.len() as f64) / ratio).round() as usize;
            let last = input.len() - 1;
            (0..out_len)
                .map(|i| {
                    let pos = i as f64 * ratio;
                    let idx = (pos.floor() as usize).min(last);
                    let next = (idx + 1).min(last);
                    let frac = (pos - idx as f64) as f32;
                    input[idx] + (input[next] - input[idx]) * frac
                })
                .collect()
        })
        .collect();

    AudioBuffer {
        sample_rate: target_rate,
        channels,
    }
}

/// Streaming 16-bit PCM WAVE encoder.
///
/// The first chunk is a 44-byte header with both size fields set to
/// `0xFFFFFFFF`; each submitted frame then yields one chunk of samples.
pub struct PcmEncoder {
    sink: ChunkSink,
    config: Option<AudioEncoderConfig>,
    header_written: bool,
    closed: bool,
}

impl PcmEncoder {
    pub fn new(sink: ChunkSink) -> Self {
        Self {
            sink,
            config: None,
            header_written: false,
            closed: false,
        }
    }
}

#[async_trait]
impl FrameEncoder for PcmEncoder {
    type Config = AudioEncoderConfig;
    type Frame = AudioFrame;

    async fn is_config_supported(&self, config: &AudioEncoderConfig) -> bool {
        config.codec == PCM_CODEC
            && (1..=MAX_SAMPLE_RATE).contains(&config.sample_rate)
            && (1..=MAX_CHANNELS).contains(&config.channels)
    }

    fn configure(&mut self, config: &AudioEncoderConfig) -> Result<()> {
        if self.closed {
            return Err(Error::encode("encoder is closed"));
        }
        self.config = Some(config.clone());
        Ok(())
    }

    fn encode(&mut self, frame: AudioFrame) -> Result<()> {
        let config = self
            .config
            .as_ref()
            .ok_or_else(|| Error::encode("encoder used before configure"))?;
        if self.closed {
            return Err(Error::encode("encoder is closed"));
        }
        if frame.channels != config.channels || frame.sample_rate != config.sample_rate {
            return Err(Error::encode(format!(
                "frame layout {}ch@{}Hz does not match configured {}ch@{}Hz",
                frame.channels, frame.sample_rate, config.channels, config.sample_rate
            )));
        }

        if !self.header_written {
            let header = wav::header(config.sample_rate, config.channels, None)?;
            self.sink.emit(frame.timestamp_us, ChunkType::Key, header);
            self.header_written = true;
        }

        let mut buf = BytesMut::with_capacity(frame.data.len() * 2);
        for &sample in &frame.data {
            wav::put_s16(&mut buf, sample);
        }
        self.sink
            .emit(frame.timestamp_us, ChunkType::Key, buf.freeze());
        Ok(())
    }

    async fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn close(&mut self) {
        self.closed = true;
    }
}
