//! Media classification from the declared content type and filename.

use std::path::Path;

use toolkit_core::{MediaKind, StickerError};

const IMAGE_MIME_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp", "image/jpg"];
const VIDEO_MIME_TYPES: &[&str] = &[
    "video/mp4",
    "video/quicktime",
    "video/webm",
    "video/x-matroska",
];
const AUDIO_MIME_TYPES: &[&str] = &[
    "audio/mpeg",
    "audio/mp3",
    "audio/wav",
    "audio/x-wav",
    "audio/ogg",
    "audio/x-m4a",
    "audio/mp4",
];

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp"];
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "mkv", "webm"];
const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "m4a", "ogg"];

/// Order in which kinds are tried. The first match wins.
const KINDS: [(MediaKind, &[&str], &[&str]); 3] = [
    (MediaKind::Image, IMAGE_MIME_TYPES, IMAGE_EXTENSIONS),
    (MediaKind::Video, VIDEO_MIME_TYPES, VIDEO_EXTENSIONS),
    (MediaKind::Audio, AUDIO_MIME_TYPES, AUDIO_EXTENSIONS),
];

pub struct MediaClassifier;

impl MediaClassifier {
    /// Decide the kind of an upload.
    ///
    /// For each kind in order, the normalized content type is checked first and
    /// the filename extension second. Kind order deliberately outranks the MIME/extension
    /// split, so `audio/mpeg` named `cover.png` is an image.
    pub fn classify(
        content_type: Option<&str>,
        filename: Option<&str>,
    ) -> Result<MediaKind, StickerError> {
        let mime = content_type.map(normalize_mime_type).unwrap_or_default();
        let extension = filename.and_then(lowercase_extension).unwrap_or_default();

        KINDS
            .iter()
            .find(|(_, mime_types, extensions)| {
                (!mime.is_empty() && mime_types.contains(&mime.as_str()))
                    || (!extension.is_empty() && extensions.contains(&extension.as_str()))
            })
            .map(|(kind, _, _)| *kind)
            .ok_or(StickerError::UnsupportedMediaKind)
    }
}

/// Strip parameters, surrounding whitespace, and case (e.g. "Image/JPEG; q=1" -> "image/jpeg").
fn normalize_mime_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or(content_type)
        .trim()
        .to_lowercase()
}

fn lowercase_extension(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_by_content_type() {
        assert_eq!(
            MediaClassifier::classify(Some("image/png"), None).unwrap(),
            MediaKind::Image
        );
        assert_eq!(
            MediaClassifier::classify(Some("video/quicktime"), Some("clip")).unwrap(),
            MediaKind::Video
        );
        assert_eq!(
            MediaClassifier::classify(Some("audio/x-m4a"), None).unwrap(),
            MediaKind::Audio
        );
    }

    #[test]
    fn test_content_type_parameters_and_case_are_ignored() {
        assert_eq!(
            MediaClassifier::classify(Some(" Image/JPEG; charset=binary"), None).unwrap(),
            MediaKind::Image
        );
    }

    #[test]
    fn test_falls_back_to_extension() {
        assert_eq!(
            MediaClassifier::classify(Some("application/octet-stream"), Some("Cat.JPG")).unwrap(),
            MediaKind::Image
        );
        assert_eq!(
            MediaClassifier::classify(None, Some("clip.mkv")).unwrap(),
            MediaKind::Video
        );
        assert_eq!(
            MediaClassifier::classify(Some(""), Some("voice.ogg")).unwrap(),
            MediaKind::Audio
        );
    }

    #[test]
    fn test_image_wins_over_later_kinds() {
        // Content type says audio but the extension is an image: image is checked first.
        assert_eq!(
            MediaClassifier::classify(Some("audio/mpeg"), Some("cover.png")).unwrap(),
            MediaKind::Image
        );
    }

    #[test]
    fn test_unsupported_media() {
        assert!(matches!(
            MediaClassifier::classify(Some("application/octet-stream"), Some("data.bin")),
            Err(StickerError::UnsupportedMediaKind)
        ));
        assert!(matches!(
            MediaClassifier::classify(None, None),
            Err(StickerError::UnsupportedMediaKind)
        ));
        assert!(matches!(
            MediaClassifier::classify(Some("image/gif"), Some("party.gif")),
            Err(StickerError::UnsupportedMediaKind)
        ));
    }
}
