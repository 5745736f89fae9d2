//! RIFF/WAVE reading and header writing.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use frameforge_common::{Error, Result};

use super::AudioBuffer;

const FORMAT_PCM: u16 = 1;
const FORMAT_FLOAT: u16 = 3;
const FORMAT_EXTENSIBLE: u16 = 0xFFFE;

/// Size placeholder used when the stream length is not known up front.
pub(crate) const STREAMING_SIZE: u32 = 0xFFFF_FFFF;

/// Length of the canonical 44-byte header written by [`header`].
pub(crate) const HEADER_LEN: usize = 44;

#[derive(Debug, Clone, Copy)]
struct FormatChunk {
    format: u16,
    channels: u16,
    sample_rate: u32,
    bits_per_sample: u16,
}

/// Decode a WAVE file into per-channel float samples at its native rate.
pub(crate) fn decode(data: &[u8]) -> Result<AudioBuffer> {
    let mut buf = data;
    if buf.remaining() < 12 {
        return Err(Error::decode("file too short for a RIFF header"));
    }
    let riff = take_tag(&mut buf);
    buf.advance(4);
    let wave = take_tag(&mut buf);
    if &riff != b"RIFF" || &wave != b"WAVE" {
        return Err(Error::decode("not a RIFF/WAVE file"));
    }

    let mut format = None;
    while buf.remaining() >= 8 {
        let id = take_tag(&mut buf);
        let declared = buf.get_u32_le() as usize;
        // Streaming writers leave the data size at its placeholder.
        let len = declared.min(buf.remaining());

        match &id {
            b"fmt " => {
                format = Some(parse_format(&buf[..len])?);
            }
            b"data" => {
                let fmt = format.ok_or_else(|| Error::decode("data chunk before fmt chunk"))?;
                return samples(fmt, &buf[..len]);
            }
            _ => {}
        }

        buf.advance(len);
        if len % 2 == 1 && buf.has_remaining() {
            buf.advance(1);
        }
    }

    Err(Error::decode("no data chunk found"))
}

fn take_tag(buf: &mut &[u8]) -> [u8; 4] {
    let mut tag = [0u8; 4];
    buf.copy_to_slice(&mut tag);
    tag
}

fn parse_format(mut chunk: &[u8]) -> Result<FormatChunk> {
    if chunk.len() < 16 {
        return Err(Error::decode("fmt chunk too short"));
    }
    let mut format = chunk.get_u16_le();
    let channels = chunk.get_u16_le();
    let sample_rate = chunk.get_u32_le();
    chunk.advance(6);
    let bits_per_sample = chunk.get_u16_le();

    if format == FORMAT_EXTENSIBLE {
        // cbSize, valid bits, channel mask, then the subformat GUID.
        if chunk.len() < 10 {
            return Err(Error::decode("extensible fmt chunk too short"));
        }
        chunk.advance(8);
        format = chunk.get_u16_le();
    }

    if channels == 0 || sample_rate == 0 {
        return Err(Error::decode("fmt chunk declares no channels or zero sample rate"));
    }

    Ok(FormatChunk {
        format,
        channels,
        sample_rate,
        bits_per_sample,
    })
}

fn samples(fmt: FormatChunk, mut data: &[u8]) -> Result<AudioBuffer> {
    let bytes_per_sample = match (fmt.format, fmt.bits_per_sample) {
        (FORMAT_PCM, 8) => 1,
        (FORMAT_PCM, 16) => 2,
        (FORMAT_PCM, 24) => 3,
        (FORMAT_PCM, 32) | (FORMAT_FLOAT, 32) => 4,
        (format, bits) => {
            return Err(Error::decode(format!(
                "unsupported WAVE encoding (format {format}, {bits} bits)"
            )))
        }
    };

    let channels = fmt.channels as usize;
    let frames = data.len() / (bytes_per_sample * channels);
    let mut out = vec![Vec::with_capacity(frames); channels];

    for _ in 0..frames {
        for channel in out.iter_mut() {
            let sample = match (fmt.format, bytes_per_sample) {
                (_, 1) => (data.get_u8() as f32 - 128.0) / 128.0,
                (_, 2) => data.get_i16_le() as f32 / 32_768.0,
                (_, 3) => {
                    let raw = data.get_int_le(3) as i32;
                    raw as f32 / 8_388_608.0
                }
                (FORMAT_FLOAT, _) => data.get_f32_le(),
                _ => data.get_i32_le() as f32 / 2_147_483_648.0,
            };
            channel.push(sample);
        }
    }

    Ok(AudioBuffer {
        sample_rate: fmt.sample_rate,
        channels: out,
    })
}

/// Canonical 16-bit PCM header.
///
/// Pass `None` for `data_len` when the length is unknown; both size fields
/// are then set to [`STREAMING_SIZE`]. Fails when the byte rate does not
/// fit the 32-bit header field.
pub(crate) fn header(sample_rate: u32, channels: u16, data_len: Option<u32>) -> Result<Bytes> {
    let block_align = channels
        .checked_mul(2)
        .ok_or_else(|| Error::encode(format!("{channels} channels do not fit a WAVE header")))?;
    let byte_rate = sample_rate.checked_mul(u32::from(block_align)).ok_or_else(|| {
        Error::encode(format!(
            "byte rate for {sample_rate} Hz x {channels} channels overflows the WAVE header"
        ))
    })?;
    let (riff_len, data_len) = match data_len {
        Some(len) => (len.saturating_add(36), len),
        None => (STREAMING_SIZE, STREAMING_SIZE),
    };

    let mut buf = BytesMut::with_capacity(HEADER_LEN);
    buf.put_slice(b"RIFF");
    buf.put_u32_le(riff_len);
    buf.put_slice(b"WAVE");
    buf.put_slice(b"fmt ");
    buf.put_u32_le(16);
    buf.put_u16_le(FORMAT_PCM);
    buf.put_u16_le(channels);
    buf.put_u32_le(sample_rate);
    buf.put_u32_le(byte_rate);
    buf.put_u16_le(block_align);
    buf.put_u16_le(16);
    buf.put_slice(b"data");
    buf.put_u32_le(data_len);
    Ok(buf.freeze())
}

/// Encode one interleaved sample as signed 16-bit little endian.
pub(crate) fn put_s16(buf: &mut BytesMut, sample: f32) {
    let clamped = sample.clamp(-1.0, 1.0);
    buf.put_i16_le((clamped * i16::MAX as f32).round() as i16);
}
