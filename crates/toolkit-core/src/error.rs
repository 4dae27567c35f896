//! Error types module
//!
//! Every failure of the sticker pipeline is a `StickerError`. Validation failures carry
//! messages that are safe to show to the client verbatim; everything else is reported
//! with a generic message and logged with full detail.

use std::io;

use crate::models::MediaKind;

/// Generic client message for failures that must not leak internals.
pub const GENERIC_FAILURE_MESSAGE: &str = "Failed to create WhatsApp sticker.";

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for inputs we could not convert
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "VIDEO_TOO_LONG")
    fn error_code(&self) -> &'static str;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Whether details must be hidden from the client
    fn is_sensitive(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum StickerError {
    #[error("Unsupported media type. Please upload an image, video, or audio file.")]
    UnsupportedMediaKind,

    #[error("A media file is required.")]
    MissingMedia,

    #[error("Invalid upload: {0}")]
    InvalidUpload(String),

    #[error("Upload exceeds the maximum allowed size.")]
    UploadTooLarge,

    #[error("Uploaded {subject} is empty.")]
    EmptyUpload { subject: &'static str },

    #[error("Invalid image supplied: {0}")]
    InvalidImage(String),

    #[error("{} duration is too short to convert.", .0.label())]
    NoDuration(MediaKind),

    #[error("Video must be {max_seconds} seconds or shorter.")]
    VideoTooLong { max_seconds: u32 },

    #[error("Unable to read frames from video.")]
    NoFramesDecoded,

    #[error("Audio transcode failed: {0}")]
    TranscodeFailure(String),

    #[error("Conversion timed out after {seconds} seconds")]
    ProcessingTimeout { seconds: u64 },

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

impl StickerError {
    /// Empty image payload, detected before decoding.
    pub fn empty_image() -> Self {
        StickerError::EmptyUpload { subject: "image" }
    }

    /// Empty staged file, detected after the upload was written to disk.
    pub fn empty_file() -> Self {
        StickerError::EmptyUpload { subject: "file" }
    }

    /// Get the error type name for detailed error responses
    pub fn error_type(&self) -> &'static str {
        match self {
            StickerError::UnsupportedMediaKind => "UnsupportedMediaKind",
            StickerError::MissingMedia => "MissingMedia",
            StickerError::InvalidUpload(_) => "InvalidUpload",
            StickerError::UploadTooLarge => "UploadTooLarge",
            StickerError::EmptyUpload { .. } => "EmptyUpload",
            StickerError::InvalidImage(_) => "InvalidImage",
            StickerError::NoDuration(_) => "NoDuration",
            StickerError::VideoTooLong { .. } => "VideoTooLong",
            StickerError::NoFramesDecoded => "NoFramesDecoded",
            StickerError::TranscodeFailure(_) => "TranscodeFailure",
            StickerError::ProcessingTimeout { .. } => "ProcessingTimeout",
            StickerError::Internal(_) => "Internal",
            StickerError::InternalWithSource { .. } => "Internal",
        }
    }

    /// Get detailed error information including error chain
    pub fn detailed_message(&self) -> String {
        use std::error::Error;

        let mut details = match self {
            StickerError::InternalWithSource { message, .. } => message.clone(),
            other => other.to_string(),
        };

        let mut source = self.source();
        let mut depth = 0;
        while let Some(err) = source {
            depth += 1;
            if depth > 5 {
                details.push_str("\n  ... (truncated)");
                break;
            }
            details.push_str(&format!("\n  Caused by: {}", err));
            source = err.source();
        }

        details
    }
}

impl From<anyhow::Error> for StickerError {
    fn from(err: anyhow::Error) -> Self {
        StickerError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<io::Error> for StickerError {
    fn from(err: io::Error) -> Self {
        StickerError::Internal(format!("IO error: {}", err))
    }
}

/// Static metadata for each variant: (http_status, error_code, sensitive, log_level).
fn sticker_error_static_metadata(err: &StickerError) -> (u16, &'static str, bool, LogLevel) {
    match err {
        StickerError::UnsupportedMediaKind => {
            (400, "UNSUPPORTED_MEDIA_KIND", false, LogLevel::Debug)
        }
        StickerError::MissingMedia => (400, "MISSING_MEDIA", false, LogLevel::Debug),
        StickerError::InvalidUpload(_) => (400, "INVALID_UPLOAD", false, LogLevel::Debug),
        StickerError::UploadTooLarge => (413, "UPLOAD_TOO_LARGE", false, LogLevel::Debug),
        StickerError::EmptyUpload { .. } => (400, "EMPTY_UPLOAD", false, LogLevel::Debug),
        StickerError::InvalidImage(_) => (400, "INVALID_IMAGE", false, LogLevel::Debug),
        StickerError::NoDuration(_) => (400, "NO_DURATION", false, LogLevel::Debug),
        StickerError::VideoTooLong { .. } => (400, "VIDEO_TOO_LONG", false, LogLevel::Debug),
        StickerError::NoFramesDecoded => (400, "NO_FRAMES_DECODED", false, LogLevel::Warn),
        StickerError::TranscodeFailure(_) => (400, "TRANSCODE_FAILURE", true, LogLevel::Warn),
        StickerError::ProcessingTimeout { .. } => {
            (500, "PROCESSING_TIMEOUT", true, LogLevel::Error)
        }
        StickerError::Internal(_) => (500, "INTERNAL_ERROR", true, LogLevel::Error),
        StickerError::InternalWithSource { .. } => (500, "INTERNAL_ERROR", true, LogLevel::Error),
    }
}

impl ErrorMetadata for StickerError {
    fn http_status_code(&self) -> u16 {
        sticker_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        sticker_error_static_metadata(self).1
    }

    fn is_sensitive(&self) -> bool {
        sticker_error_static_metadata(self).2
    }

    fn log_level(&self) -> LogLevel {
        sticker_error_static_metadata(self).3
    }

    fn client_message(&self) -> String {
        match self {
            StickerError::TranscodeFailure(_) => "Unable to convert audio clip.".to_string(),
            StickerError::ProcessingTimeout { .. }
            | StickerError::Internal(_)
            | StickerError::InternalWithSource { .. } => GENERIC_FAILURE_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_errors_are_client_visible() {
        let err = StickerError::VideoTooLong { max_seconds: 6 };
        assert_eq!(err.http_status_code(), 400);
        assert_eq!(err.error_code(), "VIDEO_TOO_LONG");
        assert_eq!(err.client_message(), "Video must be 6 seconds or shorter.");
        assert!(!err.is_sensitive());
        assert_eq!(err.log_level(), LogLevel::Debug);
    }

    #[test]
    fn test_empty_upload_messages() {
        assert_eq!(
            StickerError::empty_image().client_message(),
            "Uploaded image is empty."
        );
        assert_eq!(
            StickerError::empty_file().client_message(),
            "Uploaded file is empty."
        );
    }

    #[test]
    fn test_no_duration_message_names_the_kind() {
        assert_eq!(
            StickerError::NoDuration(MediaKind::Video).client_message(),
            "Video duration is too short to convert."
        );
        assert_eq!(
            StickerError::NoDuration(MediaKind::Audio).client_message(),
            "Audio duration is too short to convert."
        );
    }

    #[test]
    fn test_internal_errors_hide_details() {
        let err = StickerError::from(anyhow::anyhow!("ffprobe exited with status 1: moov atom not found"));
        assert_eq!(err.http_status_code(), 500);
        assert_eq!(err.client_message(), GENERIC_FAILURE_MESSAGE);
        assert!(err.is_sensitive());
        assert!(err.detailed_message().contains("moov atom not found"));
    }

    #[test]
    fn test_transcode_failure_hides_ffmpeg_output() {
        let err = StickerError::TranscodeFailure("Unknown encoder 'libmp3lame'".to_string());
        assert_eq!(err.http_status_code(), 400);
        assert_eq!(err.client_message(), "Unable to convert audio clip.");
        assert!(!err.client_message().contains("libmp3lame"));
    }

    #[test]
    fn test_timeout_is_internal() {
        let err = StickerError::ProcessingTimeout { seconds: 120 };
        assert_eq!(err.http_status_code(), 500);
        assert_eq!(err.error_type(), "ProcessingTimeout");
        assert_eq!(err.client_message(), GENERIC_FAILURE_MESSAGE);
    }
}
