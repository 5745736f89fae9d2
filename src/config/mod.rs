mod types;

pub use types::*;

use anyhow::{Context, Result};
use frameforge_av::host::software::MAX_SAMPLE_RATE;
use frameforge_av::raster::{check_surface_size, MAX_DIMENSION};
use frameforge_av::resolver::is_known_video_codec;
use frameforge_common::{PartialConversionConfig, Resolution, VideoQuality};
use std::path::Path;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    parse_config(&content).with_context(|| format!("Invalid config file: {:?}", path))
}

/// Parse and validate configuration from TOML text
pub fn parse_config(content: &str) -> Result<Config> {
    let raw: toml::Value = toml::from_str(content).context("Failed to parse config")?;
    warn_unknown_names(&raw);

    let config: Config = toml::from_str(content).context("Failed to parse config")?;
    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let default_paths = [
        "./frameforge.toml",
        "~/.config/frameforge/config.toml",
        "/etc/frameforge/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            tracing::debug!("Using config file {:?}", path);
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    validate_overrides(&config.overrides())?;

    if config.tools.timeout_secs == 0 {
        anyhow::bail!("Tool timeout_secs cannot be 0");
    }

    if let Some(ref path) = config.tools.ffmpeg_path {
        if !path.exists() {
            tracing::warn!("Configured ffmpeg path does not exist: {:?}", path);
        }
    }

    Ok(())
}

/// Check per-kind settings, whether from a config file or the command line.
pub fn validate_overrides(overrides: &PartialConversionConfig) -> Result<()> {
    if let Some(ref audio) = overrides.audio {
        if let Some(rate) = audio.sample_rate {
            if !(1..=MAX_SAMPLE_RATE).contains(&rate) {
                anyhow::bail!(
                    "Audio sample_rate must be between 1 and {}, got {}",
                    MAX_SAMPLE_RATE,
                    rate
                );
            }
        }
    }

    if let Some(ref image) = overrides.image {
        if let Some(quality) = image.quality {
            if !(1..=100).contains(&quality) {
                anyhow::bail!("Image quality must be between 1 and 100, got {}", quality);
            }
        }
        if image.width == Some(0) || image.height == Some(0) {
            anyhow::bail!("Image width and height cannot be 0");
        }
        let too_large = |side: Option<u32>| side.is_some_and(|s| s > MAX_DIMENSION);
        if too_large(image.width) || too_large(image.height) {
            anyhow::bail!("Image width and height cannot exceed {}", MAX_DIMENSION);
        }
        if let (Some(width), Some(height)) = (image.width, image.height) {
            check_surface_size(width, height)
                .with_context(|| format!("Image size {}x{} is too large", width, height))?;
        }
    }

    Ok(())
}

/// Names that parse leniently fall back to a default; say so.
fn warn_unknown_names(raw: &toml::Value) {
    let Some(video) = raw.get("video") else {
        return;
    };

    if let Some(resolution) = video.get("resolution").and_then(|v| v.as_str()) {
        if Resolution::from(resolution).to_string() != resolution.to_ascii_lowercase() {
            tracing::warn!("Unknown resolution {:?}, using original size", resolution);
        }
    }

    if let Some(quality) = video.get("quality").and_then(|v| v.as_str()) {
        if VideoQuality::from(quality).to_string() != quality.to_ascii_lowercase() {
            tracing::warn!("Unknown video quality {:?}, using medium", quality);
        }
    }

    if let Some(codec) = video.get("codec").and_then(|v| v.as_str()) {
        if !is_known_video_codec(codec) {
            tracing::warn!("Unknown video codec {:?}, using h264", codec);
        }
    }
}
