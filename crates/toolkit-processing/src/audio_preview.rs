//! Audio previews: the first `max_audio_seconds` of a clip re-encoded as MP3.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use toolkit_core::{MediaKind, PolicyLimits, StickerError};

use crate::ffmpeg::{FFmpegError, FFmpegService, MediaProbe, Mp3Encoding, StreamSelector};

pub struct AudioPreviewTransformer {
    ffmpeg: Arc<FFmpegService>,
    limits: Arc<PolicyLimits>,
    output_dir: PathBuf,
}

impl AudioPreviewTransformer {
    pub fn new(
        ffmpeg: Arc<FFmpegService>,
        limits: Arc<PolicyLimits>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            ffmpeg,
            limits,
            output_dir: output_dir.into(),
        }
    }

    pub fn plan(&self, probe: &MediaProbe) -> Result<Mp3Encoding, StickerError> {
        let duration = probe
            .duration
            .filter(|d| *d > 0.0)
            .ok_or(StickerError::NoDuration(MediaKind::Audio))?;

        Ok(Mp3Encoding {
            trim_end: self.limits.audio_trim_end(duration),
            bitrate_kbps: self.limits.audio_bitrate_kbps,
            sample_rate_hz: self.limits.audio_sample_rate_hz,
        })
    }

    #[tracing::instrument(skip(self))]
    pub async fn transform(&self, path: &Path) -> Result<Bytes, StickerError> {
        let probe = self.ffmpeg.probe(path, StreamSelector::Audio).await?;
        let encoding = self.plan(&probe)?;

        // Removed on drop, like the staged input.
        let output = tempfile::Builder::new()
            .prefix("sticker-")
            .suffix(".mp3")
            .tempfile_in(&self.output_dir)?;

        match self
            .ffmpeg
            .transcode_mp3(path, output.path(), encoding)
            .await
        {
            Ok(()) => {}
            Err(FFmpegError::Failed { stderr, .. }) => {
                return Err(StickerError::TranscodeFailure(stderr));
            }
            Err(other) => return Err(other.into()),
        }

        let data = tokio::fs::read(output.path()).await?;
        if data.is_empty() {
            return Err(StickerError::TranscodeFailure(
                "ffmpeg produced an empty file".to_string(),
            ));
        }

        Ok(Bytes::from(data))
    }
}
