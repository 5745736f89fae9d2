//! File-level conversion driver used by the CLI.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use frameforge_av::{
    create_transcoder, Backend, ConversionContext, MediaHost, Orchestrator,
};
use frameforge_common::{
    ConversionOptions, ConversionResult, MediaKind, MediaSource, PartialConversionConfig,
};
use serde::Serialize;

use crate::config::{validate_overrides, Config};

/// One file conversion as requested on the command line.
#[derive(Debug, Clone, Default)]
pub struct ConvertRequest {
    pub input: PathBuf,
    pub target_format: Option<String>,
    pub kind: Option<MediaKind>,
    /// Explicit output path; derived from the result filename when unset.
    pub output: Option<PathBuf>,
    /// Overrides the configured backend.
    pub backend: Option<Backend>,
    /// Per-kind settings layered over the config file's.
    pub overrides: PartialConversionConfig,
}

/// What a finished conversion produced.
#[derive(Debug, Clone, Serialize)]
pub struct ConvertReport {
    #[serde(flatten)]
    pub result: ConversionResult,
    pub output: PathBuf,
    pub backend: String,
}

/// Build the orchestrator described by `config`, optionally forcing a backend.
pub fn build_orchestrator(
    config: &Config,
    host: Arc<dyn MediaHost>,
    backend: Option<Backend>,
) -> Orchestrator {
    let backend = backend.unwrap_or_else(|| config.conversion.backend.into());
    let transcoder = create_transcoder(backend, host, config.tools.settings());
    Orchestrator::new(transcoder)
        .with_base_config(config.overrides())
        .with_gate(config.conversion.capability_gate.into())
}

/// Where the converted file goes.
pub fn output_path(config: &Config, request: &ConvertRequest, filename: &str) -> PathBuf {
    if let Some(ref explicit) = request.output {
        return explicit.clone();
    }
    let dir = config
        .output
        .dir
        .clone()
        .or_else(|| request.input.parent().map(Path::to_path_buf))
        .unwrap_or_default();
    dir.join(filename)
}

/// Read, convert, and write one file.
pub async fn convert_file(
    config: &Config,
    request: &ConvertRequest,
    host: Arc<dyn MediaHost>,
    ctx: &ConversionContext,
) -> Result<ConvertReport> {
    validate_overrides(&request.overrides).context("Invalid conversion settings")?;

    let data = tokio::fs::read(&request.input)
        .await
        .with_context(|| format!("Failed to read input file: {:?}", request.input))?;

    let mut source = MediaSource::new(data);
    if let Some(name) = request.input.file_name() {
        source = source.with_name(name.to_string_lossy());
    }
    if let Some(kind) = request.kind {
        source = source.with_kind(kind);
    }

    let mut options = ConversionOptions::new(source)
        .with_config(request.overrides.clone())
        .with_auto_detect(config.conversion.auto_detect);
    if let Some(ref format) = request.target_format {
        options = options.with_target_format(format.clone());
    }

    let orchestrator = build_orchestrator(config, host, request.backend);
    let filename = orchestrator
        .planned_filename(&options)
        .with_context(|| format!("Failed to convert {:?}", request.input))?;
    let output = output_path(config, request, &filename);
    if output.exists() && !config.output.overwrite {
        anyhow::bail!(
            "Output file already exists: {:?} (set [output] overwrite = true to replace it)",
            output
        );
    }

    tracing::info!(
        "Converting {:?} with the {} backend",
        request.input,
        orchestrator.backend_name()
    );
    let result = orchestrator
        .convert_with(options, ctx)
        .await
        .with_context(|| format!("Failed to convert {:?}", request.input))?;
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create output directory: {:?}", parent))?;
    }
    tokio::fs::write(&output, &result.file)
        .await
        .with_context(|| format!("Failed to write output file: {:?}", output))?;

    Ok(ConvertReport {
        result,
        output,
        backend: orchestrator.backend_name().to_string(),
    })
}
