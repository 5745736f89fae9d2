use std::path::Path;

use async_trait::async_trait;
use bytes::Bytes;
use frameforge_common::{Error, MediaKind, Result};
use tracing::{debug, info};

use super::{TranscodeJob, Transcoder};
use crate::capability::Primitives;
use crate::command::ToolCommand;
use crate::context::ConversionContext;
use crate::resolver::{audio_bitrate, video_bitrate, FRAME_RATE};
use crate::tools::{find_tool, require_tool, ToolSettings};

/// Runs ffmpeg in a fresh scratch directory per call.
#[derive(Debug, Clone, Default)]
pub struct CommandTranscoder {
    settings: ToolSettings,
}

impl CommandTranscoder {
    pub fn new(settings: ToolSettings) -> Self {
        Self { settings }
    }
}

fn video_encoder(codec: &str) -> &'static str {
    match codec.to_ascii_lowercase().as_str() {
        "h265" => "libx265",
        "vp9" => "libvpx-vp9",
        _ => "libx264",
    }
}

fn audio_encoder(format: &str) -> &'static str {
    match format.to_ascii_lowercase().as_str() {
        "mp3" => "libmp3lame",
        "ogg" => "libvorbis",
        "wav" => "pcm_s16le",
        _ => "aac",
    }
}

/// Map 1-100 quality onto the mjpeg `-q:v` scale (2 best, 31 worst).
fn jpeg_qscale(quality: u8) -> u32 {
    let q = quality.clamp(1, 100) as u32;
    2 + ((100 - q) * 29 + 49) / 99
}

/// The ffmpeg argument list for `job`, reading `input` and writing `output`.
pub fn build_args(job: &TranscodeJob, input: &Path, output: &Path) -> Vec<String> {
    let mut args: Vec<String> = ["-hide_banner", "-nostdin", "-y", "-i"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    args.push(input.to_string_lossy().to_string());

    let format = job.format.to_ascii_lowercase();
    match job.kind {
        MediaKind::Video => {
            let video = &job.config.video;
            args.extend(["-an".into(), "-c:v".into(), video_encoder(&video.codec).into()]);
            if let Some((w, h)) = video.resolution.dimensions() {
                args.push("-vf".into());
                args.push(format!(
                    "scale={w}:{h}:force_original_aspect_ratio=decrease:force_divisible_by=2"
                ));
                args.push("-b:v".into());
                args.push(video_bitrate(w, h, video.quality).to_string());
            }
            args.extend(["-r".into(), FRAME_RATE.to_string()]);
            if format == "mp4" {
                args.extend(["-movflags".into(), "+faststart".into()]);
            }
        }
        MediaKind::Audio => {
            let audio = &job.config.audio;
            let encoder = audio_encoder(&format);
            args.extend(["-vn".into(), "-c:a".into(), encoder.into()]);
            if encoder != "pcm_s16le" {
                args.push("-b:a".into());
                args.push(audio_bitrate(&audio.bitrate).to_string());
            }
            args.extend(["-ar".into(), audio.sample_rate.to_string()]);
        }
        MediaKind::Image => {
            let image = &job.config.image;
            args.extend(["-frames:v".into(), "1".into()]);
            if image.width.is_some() || image.height.is_some() {
                let w = image.width.map_or(-1, |w| w as i64);
                let h = image.height.map_or(-1, |h| h as i64);
                args.push("-vf".into());
                args.push(format!("scale={w}:{h}"));
            }
            match format.as_str() {
                "jpeg" | "jpg" => {
                    args.push("-q:v".into());
                    args.push(jpeg_qscale(image.quality).to_string());
                }
                "webp" => {
                    args.push("-quality".into());
                    args.push(image.quality.clamp(1, 100).to_string());
                }
                _ => {}
            }
        }
    }

    args.push(output.to_string_lossy().to_string());
    args
}

#[async_trait]
impl Transcoder for CommandTranscoder {
    fn name(&self) -> &'static str {
        "command"
    }

    fn primitives(&self) -> Primitives {
        if find_tool("ffmpeg", &self.settings).is_some() {
            Primitives::all()
        } else {
            Primitives::none()
        }
    }

    async fn transcode(&self, job: TranscodeJob, ctx: &ConversionContext) -> Result<Bytes> {
        let ffmpeg = require_tool("ffmpeg", &self.settings)?;
        let workspace = tempfile::tempdir()?;

        let input_ext = job
            .source_name
            .as_deref()
            .and_then(|n| Path::new(n).extension())
            .map(|e| e.to_string_lossy().to_string())
            .unwrap_or_else(|| "bin".to_string());
        let input = workspace.path().join(format!("input.{input_ext}"));
        let output = workspace.path().join(format!("output.{}", job.format));

        ctx.report(0.0, "staging");
        tokio::fs::write(&input, &job.data).await?;

        info!(kind = %job.kind, format = %job.format, "Running ffmpeg conversion");
        let mut cmd = ToolCommand::new(ffmpeg);
        cmd.args(build_args(&job, &input, &output))
            .timeout(self.settings.timeout);
        debug!(args = ?cmd.get_args(), "ffmpeg arguments");
        ctx.guard(cmd.execute()).await?;

        let data = tokio::fs::read(&output).await?;
        if data.is_empty() {
            return Err(Error::assembly("ffmpeg produced an empty file"));
        }
        ctx.report(100.0, "done");
        Ok(Bytes::from(data))
    }
}
