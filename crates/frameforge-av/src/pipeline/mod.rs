//! Per-media transformation engines.
//!
//! - [`video`] - seek, draw, encode at a fixed frame rate
//! - [`audio`] - decode once, interleave, encode in fixed-size frames
//! - [`image`] - decode, resample, export once

pub mod audio;
pub mod image;
pub mod video;

pub use audio::convert_audio;
pub use image::convert_image;
pub use video::{convert_video, VideoStage};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ConversionContext;
    use crate::host::VideoMetadata;
    use crate::testing::{png_bytes, FakeHost};
    use bytes::Bytes;
    use frameforge_common::{AudioConfig, Error, ImageConfig, Resolution, VideoConfig};

    fn video_bytes() -> Bytes {
        Bytes::from_static(b"\x00\x00\x00\x18ftypmp42")
    }

    #[tokio::test]
    async fn test_video_frames_are_sequential() {
        let host = FakeHost::default();
        let ctx = ConversionContext::new();
        let out = convert_video(&host, video_bytes(), &VideoConfig::default(), &ctx)
            .await
            .unwrap();

        let record = host.record();
        assert_eq!(record.seeks.len(), 6);
        assert_eq!(record.timestamps, vec![0, 33_333, 66_667, 100_000, 133_333, 166_667]);
        assert!(record.timestamps.windows(2).all(|w| w[0] <= w[1]));
        for (i, seek) in record.seeks.iter().enumerate() {
            assert!((seek - i as f64 / 30.0).abs() < 1e-9);
        }
        assert_eq!(record.flushes, 1);
        assert_eq!(record.closes, 1);
        assert_eq!(out.len(), 6 * 8);
        assert_eq!(&out[8..16], &33_333i64.to_le_bytes());
    }

    #[tokio::test]
    async fn test_video_720p_bucket() {
        let host = FakeHost::default();
        let config = VideoConfig {
            resolution: Resolution::Hd720,
            ..VideoConfig::default()
        };
        convert_video(&host, video_bytes(), &config, &ConversionContext::new())
            .await
            .unwrap();

        let record = host.record();
        let configured = &record.video_configs[0];
        assert_eq!((configured.width, configured.height), (1280, 720));
        assert_eq!(configured.bitrate, 5_530_000);
        assert_eq!(configured.codec, "avc1.42001f");
        assert!(record.frame_sizes.iter().all(|&s| s == (1280, 720)));
    }

    #[tokio::test]
    async fn test_video_codec_rejected_before_frames() {
        let host = FakeHost {
            reject_codec: Some("vp09.00.10.08"),
            ..FakeHost::default()
        };
        let config = VideoConfig {
            codec: "vp9".into(),
            ..VideoConfig::default()
        };
        let err = convert_video(&host, video_bytes(), &config, &ConversionContext::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedCodec { .. }));

        let record = host.record();
        assert!(record.seeks.is_empty());
        assert!(record.video_configs.is_empty());
        assert_eq!(record.closes, 1);
    }

    #[tokio::test]
    async fn test_video_encoder_error_aborts() {
        let host = FakeHost {
            fail_after_frames: Some(2),
            ..FakeHost::default()
        };
        let err = convert_video(
            &host,
            video_bytes(),
            &VideoConfig::default(),
            &ConversionContext::new(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::EncodeFailure(_)));

        let record = host.record();
        assert_eq!(record.timestamps.len(), 3);
        assert_eq!(record.flushes, 0);
        assert_eq!(record.closes, 1);
    }

    #[tokio::test]
    async fn test_video_too_short_has_no_output() {
        let host = FakeHost {
            metadata: VideoMetadata {
                width: 640,
                height: 360,
                duration_secs: 0.01,
            },
            ..FakeHost::default()
        };
        let err = convert_video(
            &host,
            video_bytes(),
            &VideoConfig::default(),
            &ConversionContext::new(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::AssemblyFailure(_)));
    }

    #[tokio::test]
    async fn test_video_cancelled_mid_loop() {
        let host = FakeHost {
            metadata: VideoMetadata {
                width: 320,
                height: 240,
                duration_secs: 10.0,
            },
            ..FakeHost::default()
        };
        let ctx = ConversionContext::new();
        let token = ctx.cancellation.clone();
        let ctx = ctx.with_progress(crate::context::ProgressSender::new(move |p, _| {
            if p > 10.0 {
                token.cancel();
            }
        }));

        let err = convert_video(&host, video_bytes(), &VideoConfig::default(), &ctx)
            .await
            .unwrap_err();
        assert!(err.is_cancelled());

        let record = host.record();
        assert!(record.timestamps.len() < 300);
        assert_eq!(record.flushes, 0);
        assert_eq!(record.closes, 1);
    }

    #[tokio::test]
    async fn test_audio_frames_partition_samples() {
        let host = FakeHost::default();
        let config = AudioConfig {
            bitrate: "128k".into(),
            ..AudioConfig::default()
        };
        convert_audio(
            &host,
            Bytes::from_static(b"RIFF"),
            "aac",
            &config,
            &ConversionContext::new(),
        )
        .await
        .unwrap();

        let record = host.record();
        let configured = &record.audio_configs[0];
        assert_eq!(configured.codec, "mp4a.40.2");
        assert_eq!(configured.bitrate, 128_000);
        assert_eq!(configured.channels, 2);
        assert_eq!(configured.sample_rate, 44_100);

        let sizes: Vec<usize> = record.audio_frames.iter().map(|f| f.frames).collect();
        assert_eq!(sizes, vec![1024, 1024, 452]);
        assert_eq!(record.timestamps, vec![0, 23_220, 46_440]);
        for frame in &record.audio_frames {
            assert_eq!(frame.data.len(), frame.frames * 2);
            assert_eq!(&frame.data[..2], &[0.5, -0.5]);
        }
        assert_eq!(record.flushes, 1);
        assert_eq!(record.closes, 1);
    }

    #[tokio::test]
    async fn test_audio_decode_failure() {
        let host = FakeHost::default();
        let err = convert_audio(
            &host,
            Bytes::new(),
            "wav",
            &AudioConfig::default(),
            &ConversionContext::new(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::DecodeFailure(_)));
        assert!(host.record().audio_configs.is_empty());
    }

    #[tokio::test]
    async fn test_image_resized_and_exported() {
        let config = ImageConfig {
            format: "png".into(),
            quality: 50,
            width: Some(100),
            height: Some(50),
        };
        let out = convert_image(png_bytes(20, 20), "png", &config, &ConversionContext::new())
            .await
            .unwrap();
        let decoded = crate::raster::decode_raster(&out).unwrap();
        assert_eq!(decoded.dimensions(), (100, 50));
    }

    #[tokio::test]
    async fn test_image_unknown_format() {
        let err = convert_image(
            png_bytes(4, 4),
            "tiff",
            &ImageConfig::default(),
            &ConversionContext::new(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::UnsupportedCodec { .. }));
    }
}
