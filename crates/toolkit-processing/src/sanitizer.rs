//! Download filenames derived from untrusted upload names.

use std::path::Path;

const FALLBACK_NAME: &str = "sticker";
const MAX_SUFFIX_LENGTH: usize = 16;

pub struct FilenameSanitizer;

impl FilenameSanitizer {
    /// Safe download name: the stem of `original`, restricted to `[A-Za-z0-9._-]`,
    /// followed by `extension` (which includes its leading dot).
    pub fn sanitize(original: Option<&str>, extension: &str) -> String {
        let original = original.filter(|s| !s.is_empty()).unwrap_or(FALLBACK_NAME);

        let stem = Path::new(original)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(FALLBACK_NAME);

        let cleaned: String = stem
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                    c
                } else {
                    '_'
                }
            })
            .collect();

        let base = if cleaned.is_empty() {
            FALLBACK_NAME
        } else {
            cleaned.as_str()
        };

        format!("{}{}", base, extension)
    }

    /// Suffix for a staged temp file: the lower-cased original extension with its dot,
    /// or an empty string when the name has no plain alphanumeric extension.
    pub fn staging_suffix(filename: Option<&str>) -> String {
        filename
            .and_then(|name| Path::new(name).extension())
            .and_then(|ext| ext.to_str())
            .filter(|ext| {
                !ext.is_empty()
                    && ext.len() <= MAX_SUFFIX_LENGTH
                    && ext.chars().all(|c| c.is_ascii_alphanumeric())
            })
            .map(|ext| format!(".{}", ext.to_lowercase()))
            .unwrap_or_default()
    }
}
