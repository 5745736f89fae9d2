//! Audio pipeline.
//!
//! Decodes the whole input in one pass, then feeds it to the encoder in
//! frames of [`FRAME_SAMPLES`] samples per channel, interleaved.

use bytes::Bytes;
use frameforge_common::{AudioConfig, Error, Result};
use tracing::{debug, trace, warn};

use crate::context::ConversionContext;
use crate::host::{AudioEncoderConfig, AudioFrame, MediaHost};
use crate::resolver::resolve_audio;
use crate::session::{chunk_channel, EncoderSession};

/// Samples per channel in one encoder frame. The final frame may be shorter.
pub const FRAME_SAMPLES: usize = 1024;

/// Interleave `frames` samples starting at `offset` from every channel.
///
/// The result is `[f0c0, f0c1, .., f0cN-1, f1c0, ..]`; sample `f` of
/// channel `c` lands at index `f * N + c`.
///
/// # Examples
///
/// ```
/// use frameforge_av::pipeline::audio::interleave;
///
/// let left = [1.0, 2.0, 3.0];
/// let right = [-1.0, -2.0, -3.0];
/// assert_eq!(
///     interleave(&[&left[..], &right[..]], 1, 2),
///     vec![2.0, -2.0, 3.0, -3.0]
/// );
/// ```
pub fn interleave<S: AsRef<[f32]>>(channels: &[S], offset: usize, frames: usize) -> Vec<f32> {
    let n = channels.len();
    let mut out = vec![0.0; frames * n];
    for (c, channel) in channels.iter().enumerate() {
        let samples = &channel.as_ref()[offset..offset + frames];
        for (f, &sample) in samples.iter().enumerate() {
            out[f * n + c] = sample;
        }
    }
    out
}

/// Timestamp of the sample at `offset` in microseconds.
pub fn sample_timestamp(offset: usize, sample_rate: u32) -> i64 {
    if sample_rate == 0 {
        return 0;
    }
    (offset as f64 / sample_rate as f64 * 1_000_000.0).round() as i64
}

/// Convert an audio source to `format`.
pub async fn convert_audio(
    host: &dyn MediaHost,
    data: Bytes,
    format: &str,
    config: &AudioConfig,
    ctx: &ConversionContext,
) -> Result<Bytes> {
    let result = run(host, data, format, config, ctx).await;
    if let Err(e) = &result {
        warn!(format, error = %e, "Audio conversion failed");
    }
    result
}

async fn run(
    host: &dyn MediaHost,
    data: Bytes,
    format: &str,
    config: &AudioConfig,
    ctx: &ConversionContext,
) -> Result<Bytes> {
    ctx.report(0.0, "decoding");
    let buffer = ctx
        .guard(host.decode_audio(data, config.sample_rate))
        .await?;
    if buffer.channels.is_empty() {
        return Err(Error::decode("decoded audio has no channels"));
    }

    let params = resolve_audio(format, buffer.channel_count(), config);
    debug!(
        codec = params.codec,
        sample_rate = params.sample_rate,
        channels = params.channels,
        bitrate = params.bitrate,
        samples = buffer.len(),
        "Resolved audio parameters"
    );

    let (sink, events) = chunk_channel();
    let encoder = host.audio_encoder(sink)?;
    let encoder_config = AudioEncoderConfig::from(&params);
    let mut session = EncoderSession::open(encoder, events, &encoder_config, ctx).await?;

    let total = buffer.len();
    let frame_count = total.div_ceil(FRAME_SAMPLES);
    debug!(session = %session.id(), codec = session.codec(), frames = frame_count, "Encoding audio");
    for (index, offset) in (0..total).step_by(FRAME_SAMPLES).enumerate() {
        ctx.check()?;

        let frames = FRAME_SAMPLES.min(total - offset);
        let frame = AudioFrame {
            timestamp_us: sample_timestamp(offset, buffer.sample_rate),
            sample_rate: buffer.sample_rate,
            channels: buffer.channel_count(),
            frames,
            data: interleave(&buffer.channels, offset, frames),
        };
        trace!(index, offset, frames, "Submitting audio frame");
        session.submit(frame)?;

        ctx.report((index + 1) as f32 / frame_count as f32 * 99.0, "encoding");
    }

    ctx.guard(session.flush()).await?;
    drop(buffer);

    let output = session.assemble()?;
    ctx.report(100.0, "done");
    debug!(frames = frame_count, bytes = output.len(), "Audio conversion finished");
    Ok(output)
}
