use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use toolkit_core::StickerError;
use toolkit_processing::MediaUpload;

use crate::error::{ErrorResponse, HttpStickerError};
use crate::state::AppState;

/// Multipart field carrying the uploaded file.
pub const MEDIA_FIELD: &str = "media";

#[utoipa::path(
    post,
    path = "/stickers/whatsapp",
    tag = "stickers",
    request_body(
        content = inline(Object),
        content_type = "multipart/form-data",
        description = "Exactly one file field named `media`: an image (PNG, JPEG, WebP), a video (MP4, MOV, MKV, WebM), or an audio clip (MP3, WAV, M4A, OGG)."
    ),
    responses(
        (status = 200, description = "Sticker created: a 512x512 WebP (static for images, animated for videos) or an MP3 preview for audio"),
        (status = 400, description = "Unsupported, empty, or unconvertible media", body = ErrorResponse),
        (status = 413, description = "Upload too large", body = ErrorResponse),
        (status = 500, description = "Conversion failed", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, multipart), fields(operation = "create_whatsapp_sticker"))]
pub async fn create_whatsapp_sticker(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Response, HttpStickerError> {
    let mut artifact = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            StickerError::UploadTooLarge
        } else {
            StickerError::InvalidUpload(e.body_text())
        }
    })? {
        if field.name() != Some(MEDIA_FIELD) {
            continue;
        }

        if artifact.is_some() {
            return Err(StickerError::InvalidUpload(format!(
                "send exactly one field named '{}'",
                MEDIA_FIELD
            ))
            .into());
        }

        let content_type = field.content_type().map(str::to_string);
        let filename = field.file_name().map(str::to_string);
        let upload = MediaUpload::new(field, content_type, filename);

        let created = tokio::time::timeout(
            state.sticker_timeout,
            state.dispatcher.create_sticker(upload),
        )
        .await
        .map_err(|_| StickerError::ProcessingTimeout {
            seconds: state.sticker_timeout.as_secs(),
        })??;

        artifact = Some(created);
    }

    let artifact = artifact.ok_or(StickerError::MissingMedia)?;

    let headers = [
        (header::CONTENT_TYPE, artifact.mime_type.to_string()),
        (header::CONTENT_DISPOSITION, artifact.content_disposition()),
    ];

    Ok((StatusCode::OK, headers, artifact.data).into_response())
}
