//! Conversion limits applied to every sticker request.

use anyhow::anyhow;

const MAX_DIMENSION: u32 = 512;
const MAX_VIDEO_SECONDS: u32 = 6;
const MAX_AUDIO_SECONDS: u32 = 15;
const MAX_SAMPLE_FPS: u32 = 15;
const AUDIO_BITRATE_KBPS: u32 = 128;
const AUDIO_SAMPLE_RATE_HZ: u32 = 44_100;

/// What to do with a video longer than `max_video_seconds`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VideoOverflow {
    /// Reject the upload with `VideoTooLong`.
    #[default]
    Reject,
    /// Keep only the first `max_video_seconds` of the clip.
    Trim,
}

impl VideoOverflow {
    pub fn parse(s: &str) -> Result<Self, anyhow::Error> {
        match s.trim().to_lowercase().as_str() {
            "reject" => Ok(VideoOverflow::Reject),
            "trim" => Ok(VideoOverflow::Trim),
            other => Err(anyhow!(
                "Invalid video overflow policy: {} (expected 'reject' or 'trim')",
                other
            )),
        }
    }
}

/// Immutable process-wide limits, built once at startup and shared by reference.
#[derive(Debug, Clone, PartialEq)]
pub struct PolicyLimits {
    pub max_dimension: u32,
    pub max_video_seconds: u32,
    pub max_audio_seconds: u32,
    pub max_sample_fps: u32,
    pub audio_bitrate_kbps: u32,
    pub audio_sample_rate_hz: u32,
    pub video_overflow: VideoOverflow,
}

impl Default for PolicyLimits {
    fn default() -> Self {
        Self {
            max_dimension: MAX_DIMENSION,
            max_video_seconds: MAX_VIDEO_SECONDS,
            max_audio_seconds: MAX_AUDIO_SECONDS,
            max_sample_fps: MAX_SAMPLE_FPS,
            audio_bitrate_kbps: AUDIO_BITRATE_KBPS,
            audio_sample_rate_hz: AUDIO_SAMPLE_RATE_HZ,
            video_overflow: VideoOverflow::default(),
        }
    }
}

impl PolicyLimits {
    pub fn with_video_overflow(mut self, video_overflow: VideoOverflow) -> Self {
        self.video_overflow = video_overflow;
        self
    }

    /// End of the trimmed video timeline, in seconds.
    pub fn video_trim_end(&self, duration: f64) -> f64 {
        duration.min(self.max_video_seconds as f64)
    }

    /// End of the trimmed audio timeline, in seconds.
    pub fn audio_trim_end(&self, duration: f64) -> f64 {
        duration.min(self.max_audio_seconds as f64)
    }

    /// Frame sampling rate for a source reporting `source_fps`.
    ///
    /// Fractional rates are truncated; zero, unknown, or non-finite rates fall
    /// back to `max_sample_fps`.
    pub fn sampling_fps(&self, source_fps: Option<f64>) -> u32 {
        let source = source_fps
            .filter(|fps| fps.is_finite() && *fps > 0.0)
            .map(|fps| fps.floor() as u32)
            .filter(|fps| *fps > 0)
            .unwrap_or(self.max_sample_fps);
        source.min(self.max_sample_fps)
    }

    /// Display duration of one animation frame, in milliseconds.
    pub fn frame_duration_ms(fps: u32) -> u32 {
        if fps == 0 {
            return 1;
        }
        ((1000.0 / fps as f64).round() as u32).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limits() {
        let limits = PolicyLimits::default();
        assert_eq!(limits.max_dimension, 512);
        assert_eq!(limits.max_video_seconds, 6);
        assert_eq!(limits.max_audio_seconds, 15);
        assert_eq!(limits.max_sample_fps, 15);
        assert_eq!(limits.audio_bitrate_kbps, 128);
        assert_eq!(limits.audio_sample_rate_hz, 44_100);
        assert_eq!(limits.video_overflow, VideoOverflow::Reject);
    }

    #[test]
    fn test_sampling_fps_caps_and_falls_back() {
        let limits = PolicyLimits::default();
        assert_eq!(limits.sampling_fps(Some(30.0)), 15);
        assert_eq!(limits.sampling_fps(Some(29.97)), 15);
        assert_eq!(limits.sampling_fps(Some(10.0)), 10);
        assert_eq!(limits.sampling_fps(Some(12.9)), 12);
        assert_eq!(limits.sampling_fps(Some(0.0)), 15);
        assert_eq!(limits.sampling_fps(Some(0.5)), 15);
        assert_eq!(limits.sampling_fps(Some(f64::NAN)), 15);
        assert_eq!(limits.sampling_fps(None), 15);
    }

    #[test]
    fn test_frame_duration_rounds() {
        assert_eq!(PolicyLimits::frame_duration_ms(15), 67);
        assert_eq!(PolicyLimits::frame_duration_ms(10), 100);
        assert_eq!(PolicyLimits::frame_duration_ms(3), 333);
        assert_eq!(PolicyLimits::frame_duration_ms(5000), 1);
        assert_eq!(PolicyLimits::frame_duration_ms(0), 1);
    }

    #[test]
    fn test_trim_ends() {
        let limits = PolicyLimits::default();
        assert_eq!(limits.video_trim_end(10.0), 6.0);
        assert_eq!(limits.video_trim_end(2.5), 2.5);
        assert_eq!(limits.audio_trim_end(20.0), 15.0);
        assert_eq!(limits.audio_trim_end(3.0), 3.0);
    }

    #[test]
    fn test_video_overflow_parse() {
        assert_eq!(VideoOverflow::parse("trim").unwrap(), VideoOverflow::Trim);
        assert_eq!(VideoOverflow::parse(" REJECT ").unwrap(), VideoOverflow::Reject);
        assert!(VideoOverflow::parse("clip").is_err());
    }
}
