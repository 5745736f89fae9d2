//! Frameforge - client-side media conversion
//!
//! This library crate exposes the CLI's configuration and file driver for
//! integration testing. The conversion core lives in `frameforge-av`.

pub mod config;
pub mod convert;
