//! In-memory host used by unit tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use frameforge_common::{Error, Result};
use image::{Rgba, RgbaImage};

use crate::assembler::ChunkType;
use crate::capability::Primitives;
use crate::host::{
    AudioBuffer, AudioEncoder, AudioEncoderConfig, AudioFrame, FrameEncoder, MediaHost,
    VideoEncoder, VideoEncoderConfig, VideoFrame, VideoMetadata, VideoSource,
};
use crate::session::ChunkSink;

/// Everything the fake host observed during a conversion.
#[derive(Debug, Default)]
pub struct Record {
    pub seeks: Vec<f64>,
    pub video_configs: Vec<VideoEncoderConfig>,
    pub audio_configs: Vec<AudioEncoderConfig>,
    pub timestamps: Vec<i64>,
    pub frame_sizes: Vec<(u32, u32)>,
    pub audio_frames: Vec<AudioFrame>,
    pub flushes: usize,
    pub closes: usize,
}

/// Configurable fake host.
#[derive(Clone)]
pub struct FakeHost {
    pub primitives: Primitives,
    pub metadata: VideoMetadata,
    pub audio: AudioBuffer,
    pub reject_codec: Option<&'static str>,
    pub fail_after_frames: Option<usize>,
    pub record: Arc<Mutex<Record>>,
}

impl Default for FakeHost {
    fn default() -> Self {
        Self {
            primitives: Primitives::all(),
            metadata: VideoMetadata {
                width: 1920,
                height: 1080,
                duration_secs: 0.2,
            },
            audio: AudioBuffer {
                sample_rate: 44_100,
                channels: vec![vec![0.5; 2500], vec![-0.5; 2500]],
            },
            reject_codec: None,
            fail_after_frames: None,
            record: Arc::new(Mutex::new(Record::default())),
        }
    }
}

impl FakeHost {
    pub fn record(&self) -> std::sync::MutexGuard<'_, Record> {
        self.record.lock().unwrap()
    }
}

struct FakeSource {
    metadata: VideoMetadata,
    position: f64,
    record: Arc<Mutex<Record>>,
}

#[async_trait]
impl VideoSource for FakeSource {
    fn metadata(&self) -> VideoMetadata {
        self.metadata
    }

    async fn seek(&mut self, seconds: f64) -> Result<()> {
        tokio::task::yield_now().await;
        self.position = seconds;
        self.record.lock().unwrap().seeks.push(seconds);
        Ok(())
    }

    fn current_frame(&self) -> Result<RgbaImage> {
        let shade = ((self.position * 30.0) as u32 % 256) as u8;
        Ok(RgbaImage::from_pixel(
            self.metadata.width.min(64),
            self.metadata.height.min(36),
            Rgba([shade, shade, shade, 255]),
        ))
    }
}

/// Emits one chunk per frame, holding the newest frame until flush.
struct FakeEncoder<C> {
    sink: ChunkSink,
    pending: Option<(i64, Bytes)>,
    host: FakeHost,
    submitted: usize,
    _config: std::marker::PhantomData<C>,
}

impl<C> FakeEncoder<C> {
    fn new(sink: ChunkSink, host: FakeHost) -> Self {
        Self {
            sink,
            pending: None,
            host,
            submitted: 0,
            _config: std::marker::PhantomData,
        }
    }

    fn push(&mut self, ts: i64, data: Bytes) {
        self.submitted += 1;
        if self.host.fail_after_frames == Some(self.submitted - 1) {
            self.sink.error("injected encoder failure");
            return;
        }
        if let Some((prev_ts, prev)) = self.pending.replace((ts, data)) {
            let kind = if self.sink.emitted() == 0 {
                ChunkType::Key
            } else {
                ChunkType::Delta
            };
            self.sink.emit(prev_ts, kind, prev);
        }
    }

    fn drain(&mut self) {
        self.host.record().flushes += 1;
        if let Some((ts, data)) = self.pending.take() {
            self.sink.emit(ts, ChunkType::Delta, data);
        }
    }
}

#[async_trait]
impl FrameEncoder for FakeEncoder<VideoEncoderConfig> {
    type Config = VideoEncoderConfig;
    type Frame = VideoFrame;

    async fn is_config_supported(&self, config: &VideoEncoderConfig) -> bool {
        self.host.reject_codec != Some(config.codec.as_str())
    }

    fn configure(&mut self, config: &VideoEncoderConfig) -> Result<()> {
        self.host.record().video_configs.push(config.clone());
        Ok(())
    }

    fn encode(&mut self, frame: VideoFrame) -> Result<()> {
        {
            let mut record = self.host.record();
            record.timestamps.push(frame.timestamp_us);
            record.frame_sizes.push((frame.width, frame.height));
        }
        let marker = Bytes::from(frame.timestamp_us.to_le_bytes().to_vec());
        self.push(frame.timestamp_us, marker);
        Ok(())
    }

    async fn flush(&mut self) -> Result<()> {
        tokio::task::yield_now().await;
        self.drain();
        Ok(())
    }

    fn close(&mut self) {
        self.host.record().closes += 1;
    }
}

#[async_trait]
impl FrameEncoder for FakeEncoder<AudioEncoderConfig> {
    type Config = AudioEncoderConfig;
    type Frame = AudioFrame;

    async fn is_config_supported(&self, config: &AudioEncoderConfig) -> bool {
        self.host.reject_codec != Some(config.codec.as_str())
    }

    fn configure(&mut self, config: &AudioEncoderConfig) -> Result<()> {
        self.host.record().audio_configs.push(config.clone());
        Ok(())
    }

    fn encode(&mut self, frame: AudioFrame) -> Result<()> {
        let ts = frame.timestamp_us;
        let marker = Bytes::from(vec![0u8; frame.data.len()]);
        {
            let mut record = self.host.record();
            record.timestamps.push(ts);
            record.audio_frames.push(frame);
        }
        self.push(ts, marker);
        Ok(())
    }

    async fn flush(&mut self) -> Result<()> {
        tokio::task::yield_now().await;
        self.drain();
        Ok(())
    }

    fn close(&mut self) {
        self.host.record().closes += 1;
    }
}

#[async_trait]
impl MediaHost for FakeHost {
    fn name(&self) -> &'static str {
        "fake"
    }

    fn primitives(&self) -> Primitives {
        self.primitives
    }

    async fn open_video(&self, data: Bytes) -> Result<Box<dyn VideoSource>> {
        if data.is_empty() {
            return Err(Error::decode("empty video"));
        }
        Ok(Box::new(FakeSource {
            metadata: self.metadata,
            position: 0.0,
            record: self.record.clone(),
        }))
    }

    async fn decode_audio(&self, data: Bytes, sample_rate: u32) -> Result<AudioBuffer> {
        if data.is_empty() {
            return Err(Error::decode("empty audio"));
        }
        Ok(AudioBuffer {
            sample_rate,
            channels: self.audio.channels.clone(),
        })
    }

    fn video_encoder(&self, sink: ChunkSink) -> Result<Box<VideoEncoder>> {
        Ok(Box::new(FakeEncoder::<VideoEncoderConfig>::new(
            sink,
            self.clone(),
        )))
    }

    fn audio_encoder(&self, sink: ChunkSink) -> Result<Box<AudioEncoder>> {
        Ok(Box::new(FakeEncoder::<AudioEncoderConfig>::new(
            sink,
            self.clone(),
        )))
    }
}

/// A small PNG for image conversions.
pub fn png_bytes(width: u32, height: u32) -> Bytes {
    let img = RgbaImage::from_pixel(width, height, Rgba([10, 200, 30, 255]));
    let mut buf = std::io::Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
    Bytes::from(buf.into_inner())
}
