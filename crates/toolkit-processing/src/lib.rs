//! Toolkit Media Processing Library
//!
//! This crate turns uploaded images, videos, and audio clips into sticker artifacts:
//! static or animated lossless WebP, or a trimmed MP3 preview.

pub mod audio_preview;
pub mod classifier;
pub mod dispatcher;
pub mod encoding;
pub mod ffmpeg;
pub mod image_sticker;
pub mod sanitizer;
pub mod stager;
pub mod video_sticker;

// Re-export commonly used types
pub use audio_preview::AudioPreviewTransformer;
pub use classifier::MediaClassifier;
pub use dispatcher::StickerDispatcher;
pub use ffmpeg::{FFmpegError, FFmpegService, FrameSampling, MediaProbe, Mp3Encoding, StreamSelector};
pub use image_sticker::{fit_to_square, ImageStickerTransformer};
pub use sanitizer::FilenameSanitizer;
pub use stager::{BytesBody, MediaUpload, StagedFile, UploadStager};
pub use video_sticker::VideoStickerTransformer;
