//! StickerDispatcher - one entry point from an upload to a finished artifact.
//!
//! Flow: classify, stage (video and audio only), transform, package. The staged file
//! is released before the dispatcher returns, on success and on every error path.

use std::fmt::Display;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use futures::Stream;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use toolkit_core::{MediaKind, PolicyLimits, StickerArtifact, StickerError};

use crate::audio_preview::AudioPreviewTransformer;
use crate::classifier::MediaClassifier;
use crate::ffmpeg::FFmpegService;
use crate::image_sticker::ImageStickerTransformer;
use crate::sanitizer::FilenameSanitizer;
use crate::stager::{read_to_bytes, MediaUpload, StagedFile, UploadStager};
use crate::video_sticker::VideoStickerTransformer;

pub struct StickerDispatcher {
    stager: UploadStager,
    image: ImageStickerTransformer,
    video: VideoStickerTransformer,
    audio: AudioPreviewTransformer,
    /// Bounds how many conversions run at once, blocking-pool work included.
    conversion_permits: Arc<Semaphore>,
}

impl StickerDispatcher {
    pub fn new(
        ffmpeg: Arc<FFmpegService>,
        limits: Arc<PolicyLimits>,
        staging_dir: impl Into<PathBuf>,
        max_concurrent_conversions: usize,
    ) -> Self {
        let staging_dir = staging_dir.into();
        Self {
            stager: UploadStager::new(staging_dir.clone()),
            image: ImageStickerTransformer::new(limits.clone()),
            video: VideoStickerTransformer::new(ffmpeg.clone(), limits.clone()),
            audio: AudioPreviewTransformer::new(ffmpeg, limits, staging_dir),
            conversion_permits: Arc::new(Semaphore::new(max_concurrent_conversions)),
        }
    }

    /// Conversion slots currently free.
    pub fn available_permits(&self) -> usize {
        self.conversion_permits.available_permits()
    }

    #[tracing::instrument(skip_all, fields(
        media.content_type = upload.content_type.as_deref().unwrap_or(""),
        media.filename = upload.filename.as_deref().unwrap_or(""),
        media.kind = tracing::field::Empty,
        media.staged_bytes = tracing::field::Empty,
    ))]
    pub async fn create_sticker<S, E>(
        &self,
        upload: MediaUpload<S>,
    ) -> Result<StickerArtifact, StickerError>
    where
        S: Stream<Item = Result<Bytes, E>> + Send,
        E: Display + Send,
    {
        let start = Instant::now();

        let kind = MediaClassifier::classify(
            upload.content_type.as_deref(),
            upload.filename.as_deref(),
        )?;
        tracing::Span::current().record("media.kind", tracing::field::display(kind));

        let filename =
            FilenameSanitizer::sanitize(upload.original_name(), kind.output_extension());

        let data = match kind {
            MediaKind::Image => {
                let bytes = read_to_bytes(upload.body).await?;
                let permit = self.acquire_permit().await?;
                self.image.transform(bytes, permit).await?
            }
            MediaKind::Video => {
                let staged = self.stage(upload).await?;
                let permit = self.acquire_permit().await?;
                self.video.transform(staged.path(), permit).await?
            }
            MediaKind::Audio => {
                let staged = self.stage(upload).await?;
                let _permit = self.acquire_permit().await?;
                self.audio.transform(staged.path()).await?
            }
        };

        tracing::info!(
            duration_ms = start.elapsed().as_millis(),
            output_bytes = data.len(),
            filename = %filename,
            "Sticker created"
        );

        Ok(StickerArtifact {
            data,
            mime_type: kind.output_mime_type(),
            filename,
        })
    }

    async fn stage<S, E>(&self, upload: MediaUpload<S>) -> Result<StagedFile, StickerError>
    where
        S: Stream<Item = Result<Bytes, E>>,
        E: Display,
    {
        let suffix = FilenameSanitizer::staging_suffix(upload.filename.as_deref());
        let staged = self.stager.stage(upload.body, &suffix).await?;
        tracing::Span::current().record("media.staged_bytes", staged.size());
        Ok(staged)
    }

    async fn acquire_permit(&self) -> Result<OwnedSemaphorePermit, StickerError> {
        self.conversion_permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| StickerError::Internal("Conversion gate closed".to_string()))
    }
}
