//! Frameforge-Common: shared types, formats, and errors.
//!
//! This crate provides the data model used across frameforge:
//!
//! - **Core Types**: media kinds, per-kind conversion settings with their
//!   defaults, conversion options and results
//! - **Formats**: supported output formats per kind and the format to MIME table
//! - **Detection**: media kind lookup by MIME type or file extension
//! - **Error Handling**: the unified error type and result alias
//!
//! # Examples
//!
//! ```
//! use frameforge_common::{ConversionConfig, MediaKind, PartialConversionConfig};
//! use frameforge_common::formats::supported_formats;
//!
//! let config = ConversionConfig::default().merged(&PartialConversionConfig::default());
//! assert_eq!(config.default_format(MediaKind::Video), "mp4");
//! assert_eq!(supported_formats(MediaKind::Image), &["jpeg", "png", "webp"]);
//! ```

pub mod detect;
pub mod error;
pub mod formats;
pub mod types;

pub use error::{Error, Result};
pub use types::*;
