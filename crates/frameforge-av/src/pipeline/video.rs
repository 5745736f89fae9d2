//! Video pipeline.
//!
//! Seeks the source to every frame position at 30 fps, draws the picture
//! onto a surface at the target resolution, and feeds the result to an
//! encoder session. Frames are strictly sequential: frame `i + 1` is not
//! sought before frame `i` has been submitted.

use std::fmt;

use bytes::Bytes;
use frameforge_common::{Error, Result, VideoConfig};
use tracing::{debug, trace, warn};

use crate::context::ConversionContext;
use crate::host::{MediaHost, VideoEncoderConfig};
use crate::raster::Surface;
use crate::resolver::{resolve_video, FRAME_RATE};
use crate::session::{chunk_channel, EncoderSession};

/// Duration of one frame in microseconds.
pub const FRAME_DURATION_US: i64 = 33_333;

/// Where a video conversion currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoStage {
    Loading,
    Configuring,
    Seeking,
    Drawing,
    Submitting,
    Flushing,
    Assembling,
    Done,
    Error,
}

impl fmt::Display for VideoStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            VideoStage::Loading => "loading",
            VideoStage::Configuring => "configuring",
            VideoStage::Seeking => "seeking",
            VideoStage::Drawing => "drawing",
            VideoStage::Submitting => "submitting",
            VideoStage::Flushing => "flushing",
            VideoStage::Assembling => "assembling",
            VideoStage::Done => "done",
            VideoStage::Error => "error",
        };
        f.write_str(s)
    }
}

/// Number of frames sampled from a source of `duration_secs`.
pub fn total_frames(duration_secs: f64) -> u64 {
    if !duration_secs.is_finite() || duration_secs <= 0.0 {
        return 0;
    }
    (duration_secs * FRAME_RATE as f64).floor() as u64
}

/// Presentation timestamp of frame `index` in microseconds.
pub fn frame_timestamp(index: u64) -> i64 {
    (index as f64 * 1_000_000.0 / FRAME_RATE as f64).round() as i64
}

struct VideoPipeline<'a> {
    host: &'a dyn MediaHost,
    ctx: &'a ConversionContext,
    stage: VideoStage,
}

impl VideoPipeline<'_> {
    fn enter(&mut self, stage: VideoStage) {
        match stage {
            VideoStage::Seeking | VideoStage::Drawing | VideoStage::Submitting => {
                trace!(from = %self.stage, to = %stage, "Video stage")
            }
            _ => debug!(from = %self.stage, to = %stage, "Video stage"),
        }
        self.stage = stage;
    }

    async fn run(&mut self, data: Bytes, config: &VideoConfig) -> Result<Bytes> {
        let ctx = self.ctx;

        self.enter(VideoStage::Loading);
        ctx.report(0.0, "loading");
        let mut source = ctx.guard(self.host.open_video(data)).await?;
        let meta = source.metadata();
        if meta.width == 0 || meta.height == 0 {
            return Err(Error::decode("video has no picture dimensions"));
        }

        self.enter(VideoStage::Configuring);
        let params = resolve_video(meta.width, meta.height, config);
        debug!(
            source = %format!("{}x{}", meta.width, meta.height),
            target = %format!("{}x{}", params.width, params.height),
            codec = params.codec,
            bitrate = params.bitrate,
            duration = meta.duration_secs,
            "Resolved video parameters"
        );

        let (sink, events) = chunk_channel();
        let encoder = self.host.video_encoder(sink)?;
        let encoder_config = VideoEncoderConfig::from(&params);
        let mut session = EncoderSession::open(encoder, events, &encoder_config, ctx).await?;
        let mut surface = Surface::new(params.width, params.height)?;

        let total = total_frames(meta.duration_secs);
        debug!(session = %session.id(), codec = session.codec(), frames = total, "Encoding video");
        for index in 0..total {
            ctx.check()?;

            self.enter(VideoStage::Seeking);
            ctx.guard(source.seek(index as f64 / FRAME_RATE as f64))
                .await?;

            self.enter(VideoStage::Drawing);
            let picture = source.current_frame()?;
            surface.draw(&picture);
            drop(picture);

            self.enter(VideoStage::Submitting);
            let frame = surface.to_video_frame(frame_timestamp(index), FRAME_DURATION_US);
            session.submit(frame)?;

            ctx.report((index + 1) as f32 / total as f32 * 99.0, "encoding");
        }

        self.enter(VideoStage::Flushing);
        ctx.guard(session.flush()).await?;

        self.enter(VideoStage::Assembling);
        let output = session.assemble()?;

        self.enter(VideoStage::Done);
        ctx.report(100.0, "done");
        debug!(frames = total, bytes = output.len(), "Video conversion finished");
        Ok(output)
    }
}

/// Convert a video source to an encoded bitstream.
pub async fn convert_video(
    host: &dyn MediaHost,
    data: Bytes,
    config: &VideoConfig,
    ctx: &ConversionContext,
) -> Result<Bytes> {
    let mut pipeline = VideoPipeline {
        host,
        ctx,
        stage: VideoStage::Loading,
    };
    let result = pipeline.run(data, config).await;
    if let Err(e) = &result {
        let failed_in = pipeline.stage;
        pipeline.enter(VideoStage::Error);
        warn!(stage = %failed_in, error = %e, "Video conversion failed");
    }
    result
}
