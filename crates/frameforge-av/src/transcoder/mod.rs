//! Transcoder backends.
//!
//! The orchestrator only sees the [`Transcoder`] trait. Two backends
//! implement it:
//!
//! - [`FrameTranscoder`] - the frame-level pipelines over a [`MediaHost`]
//! - [`CommandTranscoder`] - an ffmpeg invocation built from the same
//!   resolved parameters
//!
//! [`Backend`] selects one explicitly through [`create_transcoder`].

mod command;
mod frames;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use frameforge_common::{ConversionConfig, Error, MediaKind, Result};

use crate::capability::Primitives;
use crate::context::ConversionContext;
use crate::host::MediaHost;
use crate::tools::ToolSettings;

pub use command::{build_args, CommandTranscoder};
pub use frames::FrameTranscoder;

/// Everything a backend needs to convert one input.
#[derive(Debug, Clone)]
pub struct TranscodeJob {
    pub kind: MediaKind,
    pub data: Bytes,
    /// Resolved output format.
    pub format: String,
    /// Defaults merged with the caller's overrides.
    pub config: ConversionConfig,
    pub source_name: Option<String>,
}

/// A conversion backend.
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    /// Primitives available to this backend.
    fn primitives(&self) -> Primitives;

    /// Convert `job`, returning the output artifact.
    async fn transcode(&self, job: TranscodeJob, ctx: &ConversionContext) -> Result<Bytes>;
}

/// Backend selection strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    /// Frame-level pipelines over a media host.
    #[default]
    Frames,
    /// External ffmpeg process.
    Command,
}

impl Backend {
    pub const ALL: [Backend; 2] = [Backend::Frames, Backend::Command];
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Frames => write!(f, "frames"),
            Backend::Command => write!(f, "command"),
        }
    }
}

impl FromStr for Backend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "frames" => Ok(Backend::Frames),
            "command" => Ok(Backend::Command),
            other => Err(Error::invalid_input(format!("unknown backend: {other}"))),
        }
    }
}

/// Build the transcoder for `backend`.
///
/// The frame backend runs over `host`; the command backend uses `tools`.
pub fn create_transcoder(
    backend: Backend,
    host: Arc<dyn MediaHost>,
    tools: ToolSettings,
) -> Box<dyn Transcoder> {
    match backend {
        Backend::Frames => Box::new(FrameTranscoder::new(host)),
        Backend::Command => Box::new(CommandTranscoder::new(tools)),
    }
}
