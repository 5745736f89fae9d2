//! Frameforge-AV: the frame-level transcoding core.
//!
//! - [`resolver`] - codec parameters from user-facing settings
//! - [`capability`] - host primitive probing and gating
//! - [`assembler`] / [`session`] - encoder sessions and chunk assembly
//! - [`host`] - collaborator traits and the pure-Rust [`SoftwareHost`]
//! - [`pipeline`] - video, audio, and image pipelines
//! - [`transcoder`] - the frame and command backends
//! - [`orchestrator`] - the conversion entry point
//!
//! # Examples
//!
//! ```no_run
//! use std::sync::Arc;
//! use frameforge_av::{create_transcoder, Backend, Orchestrator, SoftwareHost, ToolSettings};
//! use frameforge_common::{ConversionOptions, MediaSource};
//!
//! # async fn example() -> frameforge_common::Result<()> {
//! let transcoder = create_transcoder(
//!     Backend::Frames,
//!     Arc::new(SoftwareHost::new()),
//!     ToolSettings::default(),
//! );
//! let orchestrator = Orchestrator::new(transcoder);
//! let input = MediaSource::new(std::fs::read("take1.wav")?).with_name("take1.wav");
//! let result = orchestrator
//!     .convert(ConversionOptions::new(input).with_target_format("wav"))
//!     .await?;
//! println!("{} ({} bytes)", result.filename, result.converted_size);
//! # Ok(())
//! # }
//! ```

pub mod assembler;
pub mod capability;
pub mod command;
pub mod context;
pub mod host;
pub mod orchestrator;
pub mod pipeline;
pub mod raster;
pub mod resolver;
pub mod session;
pub mod tools;
pub mod transcoder;

#[cfg(test)]
mod testing;

pub use assembler::{ChunkAssembler, ChunkType, EncodedChunk};
pub use capability::{is_supported, probe, Capabilities, CapabilityGate, Primitives};
pub use command::{ToolCommand, ToolOutput};
pub use context::{ConversionContext, ProgressSender};
pub use host::{MediaHost, SoftwareHost};
pub use orchestrator::Orchestrator;
pub use session::{chunk_channel, ChunkSink, EncoderSession};
pub use tools::{check_tools, ToolInfo, ToolSettings};
pub use transcoder::{create_transcoder, Backend, TranscodeJob, Transcoder};
