//! Conversion orchestration.
//!
//! The single entry point for a conversion: gate on host capabilities,
//! merge settings, resolve the media kind and output format, hand the job
//! to the configured [`Transcoder`], and describe the result.

use frameforge_common::detect::detect_kind;
use frameforge_common::formats::{mime_type, output_filename};
use frameforge_common::{
    ConversionConfig, ConversionOptions, ConversionResult, Error, MediaKind,
    PartialConversionConfig, Result,
};
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::capability::{is_supported, probe, Capabilities, CapabilityGate};
use crate::context::ConversionContext;
use crate::transcoder::{TranscodeJob, Transcoder};

/// Drives conversions through one backend.
pub struct Orchestrator {
    transcoder: Box<dyn Transcoder>,
    base: PartialConversionConfig,
    gate: CapabilityGate,
}

impl Orchestrator {
    /// Orchestrate over `transcoder` with the strict gate and no base settings.
    pub fn new(transcoder: Box<dyn Transcoder>) -> Self {
        Self {
            transcoder,
            base: PartialConversionConfig::default(),
            gate: CapabilityGate::default(),
        }
    }

    /// Builder: settings layered between the defaults and each call's overrides.
    pub fn with_base_config(mut self, base: PartialConversionConfig) -> Self {
        self.base = base;
        self
    }

    /// Builder: choose how capabilities gate a conversion.
    pub fn with_gate(mut self, gate: CapabilityGate) -> Self {
        self.gate = gate;
        self
    }

    /// Name of the backend in use.
    pub fn backend_name(&self) -> &'static str {
        self.transcoder.name()
    }

    /// Whether every required primitive is present.
    pub fn is_supported(&self) -> bool {
        is_supported(self.transcoder.primitives())
    }

    /// Per-media capability of the backend.
    pub fn capabilities(&self) -> Capabilities {
        probe(self.transcoder.primitives())
    }

    /// Settings a call with `overrides` would run with.
    pub fn effective_config(&self, overrides: Option<&PartialConversionConfig>) -> ConversionConfig {
        let layered = match overrides {
            Some(o) => self.base.overlay(o),
            None => self.base.clone(),
        };
        ConversionConfig::default().merged(&layered)
    }

    /// Filename a conversion of `options` will produce, without converting.
    ///
    /// # Errors
    ///
    /// [`Error::UnsupportedFileType`] if the media kind cannot be resolved.
    pub fn planned_filename(&self, options: &ConversionOptions) -> Result<String> {
        let config = self.effective_config(options.config.as_ref());
        let kind = resolve_kind(options)?;
        let format = resolve_format(options.target_format.as_deref(), &config, kind);
        Ok(output_filename(options.input.name.as_deref(), &format))
    }

    /// Convert with a fresh context (no cancellation, no progress).
    pub async fn convert(&self, options: ConversionOptions) -> Result<ConversionResult> {
        self.convert_with(options, &ConversionContext::new()).await
    }

    /// Convert one input.
    ///
    /// # Errors
    ///
    /// - [`Error::UnsupportedEnvironment`] if the capability gate fails
    /// - [`Error::UnsupportedFileType`] if the media kind cannot be resolved
    /// - [`Error::ConversionFailed`] wrapping whatever aborted the backend
    pub async fn convert_with(
        &self,
        options: ConversionOptions,
        ctx: &ConversionContext,
    ) -> Result<ConversionResult> {
        let primitives = self.transcoder.primitives();
        if self.gate == CapabilityGate::Strict && !is_supported(primitives) {
            warn!(backend = self.transcoder.name(), "Host lacks required primitives");
            return Err(Error::UnsupportedEnvironment);
        }

        let config = self.effective_config(options.config.as_ref());
        let kind = resolve_kind(&options)?;
        if !self.gate.allows(primitives, kind) {
            warn!(backend = self.transcoder.name(), %kind, gate = %self.gate, "Host cannot convert this kind");
            return Err(Error::UnsupportedEnvironment);
        }

        let format = resolve_format(options.target_format.as_deref(), &config, kind);

        let input = options.input;
        let original_size = input.size();
        let job = TranscodeJob {
            kind,
            data: input.data,
            format: format.clone(),
            config,
            source_name: input.name.clone(),
        };

        let span = info_span!("conversion", id = %Uuid::new_v4(), %kind, format = %format);
        let output = async {
            info!(
                backend = self.transcoder.name(),
                bytes = original_size,
                "Starting conversion"
            );
            self.transcoder.transcode(job, ctx).await
        }
        .instrument(span.clone())
        .await
        .map_err(Error::conversion_failed)?;

        let result = ConversionResult {
            filename: output_filename(input.name.as_deref(), &format),
            original_size,
            converted_size: output.len() as u64,
            mime_type: mime_type(&format).to_string(),
            format,
            file: output,
        };
        span.in_scope(|| {
            info!(
                filename = %result.filename,
                original = result.original_size,
                converted = result.converted_size,
                "Conversion finished"
            )
        });
        Ok(result)
    }
}

fn resolve_kind(options: &ConversionOptions) -> Result<MediaKind> {
    if let Some(kind) = options.input.kind {
        return Ok(kind);
    }
    if options.auto_detect {
        if let Some(kind) = detect_kind(&options.input) {
            debug!(%kind, "Detected media kind");
            return Ok(kind);
        }
    }

    let described = options
        .input
        .mime_type
        .as_deref()
        .or(options.input.name.as_deref())
        .unwrap_or("unnamed input");
    Err(Error::unsupported_file_type(described))
}

fn resolve_format(requested: Option<&str>, config: &ConversionConfig, kind: MediaKind) -> String {
    requested
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .unwrap_or_else(|| config.default_format(kind))
        .to_ascii_lowercase()
}
