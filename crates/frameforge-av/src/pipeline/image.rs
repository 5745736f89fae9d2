//! Image pipeline: decode, resample onto a surface, export once.

use bytes::Bytes;
use frameforge_common::{Error, ImageConfig, Result};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::context::ConversionContext;
use crate::raster::{decode_raster, Surface};

/// Target dimensions: explicit overrides win, else the source's own.
pub fn target_dimensions(source: (u32, u32), config: &ImageConfig) -> (u32, u32) {
    (
        config.width.unwrap_or(source.0),
        config.height.unwrap_or(source.1),
    )
}

/// Convert a still image to `format`.
pub async fn convert_image(
    data: Bytes,
    format: &str,
    config: &ImageConfig,
    ctx: &ConversionContext,
) -> Result<Bytes> {
    ctx.check()?;
    ctx.report(0.0, "decoding");

    let format_owned = format.to_string();
    let config = config.clone();
    let token = ctx.cancellation.clone();
    let job = tokio::task::spawn_blocking(move || render(&data, &format_owned, &config, &token));
    let result = ctx
        .guard(async {
            job.await
                .map_err(|e| Error::encode(format!("image task failed: {e}")))?
        })
        .await;

    match &result {
        Ok(out) => {
            ctx.report(100.0, "done");
            debug!(format, bytes = out.len(), "Image conversion finished");
        }
        Err(e) => warn!(format, error = %e, "Image conversion failed"),
    }
    result
}

/// Runs off the async runtime, so cancellation is polled between stages.
fn render(
    data: &[u8],
    format: &str,
    config: &ImageConfig,
    cancel: &CancellationToken,
) -> Result<Bytes> {
    let check = || {
        if cancel.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    };

    let picture = decode_raster(data)?;
    check()?;
    let (width, height) = target_dimensions(picture.dimensions(), config);
    debug!(
        source = %format!("{}x{}", picture.width(), picture.height()),
        target = %format!("{width}x{height}"),
        quality = config.quality,
        "Resolved image parameters"
    );

    let mut surface = Surface::new(width, height)?;
    surface.draw(&picture);
    drop(picture);
    check()?;

    let output = surface.export(format, config.quality)?;
    if output.is_empty() {
        return Err(Error::assembly("image export produced no data"));
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn png(w: u32, h: u32) -> Vec<u8> {
        let mut surface = Surface::new(w, h).unwrap();
        surface.draw(&RgbaImage::from_pixel(w, h, Rgba([10, 20, 30, 255])));
        surface.export("png", 100).unwrap().to_vec()
    }

    #[test]
    fn test_render_stops_when_cancelled() {
        let token = CancellationToken::new();
        token.cancel();
        let err = render(&png(8, 8), "png", &ImageConfig::default(), &token).unwrap_err();
        assert!(matches!(err, Error::Cancelled));
    }

    #[test]
    fn test_render_rejects_oversized_target() {
        let config = ImageConfig {
            width: Some(100_000),
            height: Some(100_000),
            ..ImageConfig::default()
        };
        let err = render(&png(8, 8), "png", &config, &CancellationToken::new()).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_convert_image_resizes() {
        let config = ImageConfig {
            width: Some(4),
            height: Some(2),
            ..ImageConfig::default()
        };
        let out = convert_image(Bytes::from(png(8, 8)), "png", &config, &ConversionContext::new())
            .await
            .unwrap();
        let decoded = image::load_from_memory(&out).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (4, 2));
    }

    #[test]
    fn test_target_dimensions_default_to_source() {
        let config = ImageConfig::default();
        assert_eq!(target_dimensions((640, 480), &config), (640, 480));
    }

    #[test]
    fn test_target_dimensions_overrides() {
        let config = ImageConfig {
            width: Some(100),
            height: Some(50),
            quality: 50,
            ..ImageConfig::default()
        };
        assert_eq!(target_dimensions((640, 480), &config), (100, 50));

        let width_only = ImageConfig {
            width: Some(320),
            ..ImageConfig::default()
        };
        assert_eq!(target_dimensions((640, 480), &width_only), (320, 480));
    }
}
