//! Off-screen raster surface.
//!
//! Video frames are drawn onto a fixed-size surface at the target
//! resolution before encoding; image conversions draw once and export.

use std::io::Cursor;

use bytes::Bytes;
use frameforge_common::{Error, Result};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;
use image::imageops::{self, FilterType};
use image::{DynamicImage, ExtendedColorType, ImageEncoder, RgbaImage};

use crate::host::VideoFrame;
use crate::resolver::image_quality_factor;

/// Decode any supported still-image format to RGBA8.
pub fn decode_raster(data: &[u8]) -> Result<RgbaImage> {
    let img = image::load_from_memory(data)
        .map_err(|e| Error::decode(format!("failed to decode image: {e}")))?;
    Ok(img.to_rgba8())
}

/// Largest width or height a surface may have.
pub const MAX_DIMENSION: u32 = 16_384;

/// Largest RGBA buffer a surface may allocate.
pub const MAX_SURFACE_BYTES: u64 = 512 * 1024 * 1024;

/// Check that a `width` x `height` RGBA surface is non-empty and within
/// [`MAX_DIMENSION`] and [`MAX_SURFACE_BYTES`].
pub fn check_surface_size(width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(Error::invalid_input(format!(
            "surface dimensions must be non-zero, got {width}x{height}"
        )));
    }
    if width > MAX_DIMENSION || height > MAX_DIMENSION {
        return Err(Error::invalid_input(format!(
            "surface {width}x{height} exceeds the {MAX_DIMENSION} pixel side limit"
        )));
    }
    let bytes = u64::from(width)
        .checked_mul(u64::from(height))
        .and_then(|px| px.checked_mul(4))
        .filter(|&bytes| bytes <= MAX_SURFACE_BYTES);
    if bytes.is_none() {
        return Err(Error::invalid_input(format!(
            "surface {width}x{height} exceeds the {MAX_SURFACE_BYTES} byte limit"
        )));
    }
    Ok(())
}

/// Fixed-size RGBA drawing surface.
#[derive(Debug, Clone)]
pub struct Surface {
    pixels: RgbaImage,
}

impl Surface {
    /// Create a transparent surface.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidInput`] if either dimension is zero or the surface
    /// is larger than [`check_surface_size`] allows.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        check_surface_size(width, height)?;
        Ok(Self {
            pixels: RgbaImage::new(width, height),
        })
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Draw `image` stretched to cover the whole surface.
    pub fn draw(&mut self, image: &RgbaImage) {
        if image.dimensions() == self.pixels.dimensions() {
            self.pixels.copy_from_slice(image.as_raw());
        } else {
            self.pixels = imageops::resize(image, self.width(), self.height(), FilterType::Triangle);
        }
    }

    /// Current surface contents.
    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    /// Snapshot the surface as a raw video frame.
    pub fn to_video_frame(&self, timestamp_us: i64, duration_us: i64) -> VideoFrame {
        VideoFrame {
            timestamp_us,
            duration_us,
            width: self.width(),
            height: self.height(),
            data: Bytes::from(self.pixels.as_raw().clone()),
        }
    }

    /// Encode the surface as a still image.
    ///
    /// `quality` (1-100) applies to lossy formats only. JPEG drops the alpha
    /// channel; WebP is written lossless.
    pub fn export(&self, format: &str, quality: u8) -> Result<Bytes> {
        let (w, h) = self.pixels.dimensions();
        let mut buf = Cursor::new(Vec::new());

        let written = match format.to_ascii_lowercase().as_str() {
            "jpeg" | "jpg" => {
                let rgb = DynamicImage::ImageRgba8(self.pixels.clone()).to_rgb8();
                let q = (image_quality_factor(quality) * 100.0).round() as u8;
                JpegEncoder::new_with_quality(&mut buf, q).write_image(
                    rgb.as_raw(),
                    w,
                    h,
                    ExtendedColorType::Rgb8,
                )
            }
            "png" => PngEncoder::new(&mut buf).write_image(
                self.pixels.as_raw(),
                w,
                h,
                ExtendedColorType::Rgba8,
            ),
            "webp" => WebPEncoder::new_lossless(&mut buf).write_image(
                self.pixels.as_raw(),
                w,
                h,
                ExtendedColorType::Rgba8,
            ),
            other => {
                return Err(Error::unsupported_codec(
                    other,
                    "no raster exporter for this format",
                ))
            }
        };

        written.map_err(|e| Error::encode(format!("{format} export failed: {e}")))?;
        Ok(Bytes::from(buf.into_inner()))
    }
}
