//! Lossless WebP encoding, static and animated.

use toolkit_core::StickerError;
use webp::{AnimEncoder, AnimFrame, Encoder, WebPConfig};

const WEBP_QUALITY: f32 = 100.0;
const WEBP_METHOD: i32 = 6;
/// Zero loops means the animation repeats forever.
const LOOP_FOREVER: i32 = 0;

fn lossless_config() -> Result<WebPConfig, StickerError> {
    let mut config = WebPConfig::new()
        .map_err(|_| StickerError::Internal("Failed to initialize WebP config".to_string()))?;
    config.lossless = 1;
    config.quality = WEBP_QUALITY;
    config.method = WEBP_METHOD;
    Ok(config)
}

/// Encode one RGBA image as a lossless WebP.
pub fn encode_static(rgba: &[u8], width: u32, height: u32) -> Result<Vec<u8>, StickerError> {
    let config = lossless_config()?;
    let encoded = Encoder::from_rgba(rgba, width, height)
        .encode_advanced(&config)
        .map_err(|e| StickerError::Internal(format!("WebP encoding failed: {:?}", e)))?;
    Ok(encoded.to_vec())
}

/// Encode consecutive `size`×`size` RGBA frames as a looping lossless animated WebP,
/// each frame shown for `frame_duration_ms`. A trailing partial frame is ignored.
pub fn encode_animation(
    frames: &[u8],
    size: u32,
    frame_duration_ms: u32,
) -> Result<Vec<u8>, StickerError> {
    let frame_len = size as usize * size as usize * 4;
    if frame_len == 0 || frames.len() < frame_len {
        return Err(StickerError::NoFramesDecoded);
    }

    let config = lossless_config()?;
    let mut encoder = AnimEncoder::new(size, size, &config);
    encoder.set_loop_count(LOOP_FOREVER);

    let mut timestamp_ms: i32 = 0;
    for frame in frames.chunks_exact(frame_len) {
        encoder.add_frame(AnimFrame::from_rgba(frame, size, size, timestamp_ms));
        timestamp_ms += frame_duration_ms as i32;
    }

    let encoded = encoder
        .try_encode()
        .map_err(|e| StickerError::Internal(format!("Animated WebP encoding failed: {:?}", e)))?;
    Ok(encoded.to_vec())
}
