use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use frameforge_common::{MediaKind, Result};

use super::{TranscodeJob, Transcoder};
use crate::capability::Primitives;
use crate::context::ConversionContext;
use crate::host::MediaHost;
use crate::pipeline::{convert_audio, convert_image, convert_video};

/// Runs the frame-level pipelines over a [`MediaHost`].
///
/// Every call builds its own encoder session and surface; nothing is
/// shared between concurrent conversions except the host itself.
#[derive(Clone)]
pub struct FrameTranscoder {
    host: Arc<dyn MediaHost>,
}

impl FrameTranscoder {
    pub fn new(host: Arc<dyn MediaHost>) -> Self {
        Self { host }
    }
}

#[async_trait]
impl Transcoder for FrameTranscoder {
    fn name(&self) -> &'static str {
        "frames"
    }

    fn primitives(&self) -> Primitives {
        self.host.primitives()
    }

    async fn transcode(&self, job: TranscodeJob, ctx: &ConversionContext) -> Result<Bytes> {
        let host = self.host.as_ref();
        match job.kind {
            MediaKind::Video => convert_video(host, job.data, &job.config.video, ctx).await,
            MediaKind::Audio => {
                convert_audio(host, job.data, &job.format, &job.config.audio, ctx).await
            }
            MediaKind::Image => convert_image(job.data, &job.format, &job.config.image, ctx).await,
        }
    }
}
