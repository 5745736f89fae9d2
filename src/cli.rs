use clap::{Parser, Subcommand};
use frameforge_av::Backend;
use frameforge_common::MediaKind;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "frameforge")]
#[command(author, version, about = "Convert video, audio, and images frame by frame")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Convert a single file
    Convert {
        /// Input file to convert
        #[arg(required = true)]
        input: PathBuf,

        /// Output format (defaults to the configured format for the media kind)
        #[arg(long)]
        to: Option<String>,

        /// Media kind, skipping detection (video, audio, image)
        #[arg(long)]
        kind: Option<MediaKind>,

        /// Output file path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Conversion backend (frames, command)
        #[arg(long)]
        backend: Option<Backend>,

        /// Video resolution bucket (original, 720p, 1080p, 4k)
        #[arg(long)]
        resolution: Option<String>,

        /// Video quality (low, medium, high)
        #[arg(long)]
        quality: Option<String>,

        /// Video codec (h264, h265, vp9)
        #[arg(long)]
        codec: Option<String>,

        /// Audio bitrate, e.g. 128k
        #[arg(long)]
        bitrate: Option<String>,

        /// Audio sample rate in Hz
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=768_000))]
        sample_rate: Option<u32>,

        /// Image width in pixels
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=16_384))]
        width: Option<u32>,

        /// Image height in pixels
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=16_384))]
        height: Option<u32>,

        /// Image quality, 1-100
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=100))]
        image_quality: Option<u8>,

        /// Output the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// List supported output formats
    Formats {
        /// Only this media kind
        kind: Option<MediaKind>,
    },

    /// Report backend capabilities and external tool availability
    Check,

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}
