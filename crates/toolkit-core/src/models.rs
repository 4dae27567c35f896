//! Domain models shared by the processing pipeline and the HTTP layer.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Kind of media a sticker request carries. Decided once per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
    Audio,
}

impl MediaKind {
    /// MIME type of the artifact produced for this kind.
    pub fn output_mime_type(self) -> &'static str {
        match self {
            MediaKind::Image | MediaKind::Video => "image/webp",
            MediaKind::Audio => "audio/mpeg",
        }
    }

    /// Extension (with leading dot) of the artifact produced for this kind.
    pub fn output_extension(self) -> &'static str {
        match self {
            MediaKind::Image | MediaKind::Video => ".webp",
            MediaKind::Audio => ".mp3",
        }
    }

    /// Capitalized label used in client-facing messages.
    pub fn label(self) -> &'static str {
        match self {
            MediaKind::Image => "Image",
            MediaKind::Video => "Video",
            MediaKind::Audio => "Audio",
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaKind::Image => write!(f, "image"),
            MediaKind::Video => write!(f, "video"),
            MediaKind::Audio => write!(f, "audio"),
        }
    }
}

/// Final encoded output of one conversion. Streamed once, then dropped.
#[derive(Debug, Clone)]
pub struct StickerArtifact {
    pub data: Bytes,
    pub mime_type: &'static str,
    pub filename: String,
}

impl StickerArtifact {
    pub fn content_disposition(&self) -> String {
        format!("attachment; filename=\"{}\"", self.filename)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_mime_types() {
        assert_eq!(MediaKind::Image.output_mime_type(), "image/webp");
        assert_eq!(MediaKind::Video.output_mime_type(), "image/webp");
        assert_eq!(MediaKind::Audio.output_mime_type(), "audio/mpeg");
        assert_eq!(MediaKind::Audio.output_extension(), ".mp3");
    }

    #[test]
    fn test_content_disposition_quotes_filename() {
        let artifact = StickerArtifact {
            data: Bytes::from_static(b"RIFF"),
            mime_type: "image/webp",
            filename: "cat.webp".to_string(),
        };
        assert_eq!(
            artifact.content_disposition(),
            "attachment; filename=\"cat.webp\""
        );
    }
}
