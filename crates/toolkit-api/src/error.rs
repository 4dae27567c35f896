//! HTTP error response conversion
//!
//! Handlers return `Result<Response, HttpStickerError>`. Any `StickerError` (or
//! `anyhow::Error`) converts with `?` and renders as `{"detail": "..."}` with the status
//! from its metadata. Non-sensitive errors also carry their machine-readable `code`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use toolkit_core::{ErrorMetadata, LogLevel, StickerError};
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Human-readable reason the request failed
    pub detail: String,
    /// Machine-readable error code, omitted for internal failures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// Wrapper type for StickerError to implement IntoResponse
/// This is necessary because of Rust's orphan rules - we can't implement
/// IntoResponse (external trait) for StickerError (external type from toolkit-core)
#[derive(Debug)]
pub struct HttpStickerError(pub StickerError);

impl From<StickerError> for HttpStickerError {
    fn from(err: StickerError) -> Self {
        HttpStickerError(err)
    }
}

impl From<anyhow::Error> for HttpStickerError {
    fn from(err: anyhow::Error) -> Self {
        HttpStickerError(StickerError::from(err))
    }
}

fn log_error(error: &StickerError) {
    let error_type = error.error_type();
    let error_code = error.error_code();
    let details = error.detailed_message();
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error = %details, error_type, error_code, "Sticker request rejected");
        }
        LogLevel::Warn => {
            tracing::warn!(error = %details, error_type, error_code, "Sticker conversion failed");
        }
        LogLevel::Error => {
            tracing::error!(error = %details, error_type, error_code, "Sticker conversion failed");
        }
    }
}

impl IntoResponse for HttpStickerError {
    fn into_response(self) -> Response {
        let error = &self.0;

        let status = StatusCode::from_u16(error.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        log_error(error);

        let body = Json(ErrorResponse {
            detail: error.client_message(),
            code: (!error.is_sensitive()).then(|| error.error_code().to_string()),
        });

        (status, body).into_response()
    }
}
