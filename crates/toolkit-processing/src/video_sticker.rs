//! Animated video stickers.
//!
//! The first `max_video_seconds` of a clip are sampled at no more than
//! `max_sample_fps`, squared, and encoded as a looping lossless animated WebP.

use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::OwnedSemaphorePermit;
use toolkit_core::{MediaKind, PolicyLimits, StickerError, VideoOverflow};

use crate::encoding::encode_animation;
use crate::ffmpeg::{FFmpegService, FrameSampling, MediaProbe, StreamSelector};

pub struct VideoStickerTransformer {
    ffmpeg: Arc<FFmpegService>,
    limits: Arc<PolicyLimits>,
}

impl VideoStickerTransformer {
    pub fn new(ffmpeg: Arc<FFmpegService>, limits: Arc<PolicyLimits>) -> Self {
        Self { ffmpeg, limits }
    }

    /// Decide how a probed clip is sampled, rejecting clips that cannot be converted.
    pub fn plan(&self, probe: &MediaProbe) -> Result<FrameSampling, StickerError> {
        let duration = probe
            .duration
            .filter(|d| *d > 0.0)
            .ok_or(StickerError::NoDuration(MediaKind::Video))?;

        if duration > self.limits.max_video_seconds as f64
            && self.limits.video_overflow == VideoOverflow::Reject
        {
            return Err(StickerError::VideoTooLong {
                max_seconds: self.limits.max_video_seconds,
            });
        }

        if probe.width.is_none() || probe.height.is_none() {
            return Err(StickerError::NoFramesDecoded);
        }

        Ok(FrameSampling {
            trim_end: self.limits.video_trim_end(duration),
            fps: self.limits.sampling_fps(probe.frame_rate),
            size: self.limits.max_dimension,
        })
    }

    /// Probe, decode, and encode. `permit` moves into the encoder task so it is held
    /// until encoding ends.
    #[tracing::instrument(skip(self, permit))]
    pub async fn transform(
        &self,
        path: &Path,
        permit: OwnedSemaphorePermit,
    ) -> Result<Bytes, StickerError> {
        let probe = self.ffmpeg.probe(path, StreamSelector::Video).await?;
        let sampling = self.plan(&probe)?;

        let raw = self.ffmpeg.decode_frames(path, sampling).await?;
        let frame_count = raw.len() / sampling.frame_len();
        if frame_count == 0 {
            return Err(StickerError::NoFramesDecoded);
        }

        let frame_duration_ms = PolicyLimits::frame_duration_ms(sampling.fps);
        tracing::debug!(
            frame_count,
            fps = sampling.fps,
            frame_duration_ms,
            trim_end = sampling.trim_end,
            "Encoding animated sticker"
        );

        let size = sampling.size;
        let encoded = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            encode_animation(&raw, size, frame_duration_ms)
        })
        .await
        .map_err(|e| StickerError::Internal(format!("Animation worker failed: {}", e)))??;

        Ok(Bytes::from(encoded))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transformer(overflow: VideoOverflow) -> VideoStickerTransformer {
        let ffmpeg = FFmpegService::new("ffmpeg".into(), "ffprobe".into()).unwrap();
        let limits = PolicyLimits::default().with_video_overflow(overflow);
        VideoStickerTransformer::new(Arc::new(ffmpeg), Arc::new(limits))
    }

    fn probe(duration: Option<f64>, frame_rate: Option<f64>) -> MediaProbe {
        MediaProbe {
            duration,
            width: Some(1280),
            height: Some(720),
            frame_rate,
            codec: Some("h264".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_plan_short_clip() {
        let plan = transformer(VideoOverflow::Reject)
            .plan(&probe(Some(2.5), Some(30.0)))
            .unwrap();
        assert_eq!(plan.trim_end, 2.5);
        assert_eq!(plan.fps, 15);
        assert_eq!(plan.size, 512);
    }

    #[test]
    fn test_plan_keeps_slow_frame_rates() {
        let plan = transformer(VideoOverflow::Reject)
            .plan(&probe(Some(4.0), Some(8.0)))
            .unwrap();
        assert_eq!(plan.fps, 8);
    }

    #[test]
    fn test_plan_without_duration() {
        for duration in [None, Some(0.0), Some(-1.0)] {
            assert!(matches!(
                transformer(VideoOverflow::Trim).plan(&probe(duration, Some(30.0))),
                Err(StickerError::NoDuration(MediaKind::Video))
            ));
        }
    }

    #[test]
    fn test_long_clip_rejected_by_default() {
        assert!(matches!(
            transformer(VideoOverflow::Reject).plan(&probe(Some(10.0), Some(30.0))),
            Err(StickerError::VideoTooLong { max_seconds: 6 })
        ));
    }

    #[test]
    fn test_long_clip_trimmed_when_configured() {
        let plan = transformer(VideoOverflow::Trim)
            .plan(&probe(Some(10.0), Some(30.0)))
            .unwrap();
        assert_eq!(plan.trim_end, 6.0);
        assert_eq!(plan.fps, 15);
    }

    #[test]
    fn test_exactly_max_length_is_accepted() {
        assert!(transformer(VideoOverflow::Reject)
            .plan(&probe(Some(6.0), None))
            .is_ok());
    }

    #[test]
    fn test_clip_without_video_stream() {
        let mut audio_only = probe(Some(3.0), None);
        audio_only.width = None;
        audio_only.height = None;
        assert!(matches!(
            transformer(VideoOverflow::Reject).plan(&audio_only),
            Err(StickerError::NoFramesDecoded)
        ));
    }
}
