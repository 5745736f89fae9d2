use std::path::PathBuf;
use std::time::Duration;

use frameforge_av::{Backend, CapabilityGate, ToolSettings};
use frameforge_common::{
    PartialAudioConfig, PartialConversionConfig, PartialImageConfig, PartialVideoConfig,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub conversion: ConversionSection,

    #[serde(default)]
    pub video: Option<PartialVideoConfig>,

    #[serde(default)]
    pub audio: Option<PartialAudioConfig>,

    #[serde(default)]
    pub image: Option<PartialImageConfig>,

    #[serde(default)]
    pub tools: ToolsConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    /// Per-kind settings from the file, to be layered over the defaults.
    pub fn overrides(&self) -> PartialConversionConfig {
        PartialConversionConfig {
            video: self.video.clone(),
            audio: self.audio.clone(),
            image: self.image.clone(),
        }
    }
}

/// Which transcoder backend runs conversions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Frames,
    Command,
}

impl From<BackendKind> for Backend {
    fn from(kind: BackendKind) -> Self {
        match kind {
            BackendKind::Frames => Backend::Frames,
            BackendKind::Command => Backend::Command,
        }
    }
}

/// How host capabilities gate a conversion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GateMode {
    /// Every primitive must be present, whatever the media kind.
    #[default]
    Strict,
    /// Only the primitives of the requested kind must be present.
    PerKind,
}

impl From<GateMode> for CapabilityGate {
    fn from(mode: GateMode) -> Self {
        match mode {
            GateMode::Strict => CapabilityGate::Strict,
            GateMode::PerKind => CapabilityGate::PerKind,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConversionSection {
    #[serde(default)]
    pub backend: BackendKind,

    #[serde(default)]
    pub capability_gate: GateMode,

    /// Detect the media kind from MIME type or extension when not given.
    #[serde(default = "default_auto_detect")]
    pub auto_detect: bool,
}

fn default_auto_detect() -> bool {
    true
}

impl Default for ConversionSection {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            capability_gate: GateMode::default(),
            auto_detect: default_auto_detect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ToolsConfig {
    /// Explicit ffmpeg location; `PATH` is searched when unset or missing.
    #[serde(default)]
    pub ffmpeg_path: Option<PathBuf>,

    /// Maximum run time of one ffmpeg invocation, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    600
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ToolsConfig {
    pub fn settings(&self) -> ToolSettings {
        ToolSettings {
            ffmpeg_path: self.ffmpeg_path.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OutputConfig {
    /// Directory for converted files; the input's directory when unset.
    #[serde(default)]
    pub dir: Option<PathBuf>,

    /// Replace an existing file at the output path.
    #[serde(default)]
    pub overwrite: bool,
}
