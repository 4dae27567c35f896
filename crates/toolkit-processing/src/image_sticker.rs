//! Static image stickers.

use std::sync::Arc;

use bytes::Bytes;
use image::imageops::{self, FilterType};
use image::RgbaImage;
use tokio::sync::OwnedSemaphorePermit;
use toolkit_core::{PolicyLimits, StickerError};

use crate::encoding::encode_static;

/// Centre-crop the largest square out of `img` and resample it to `size`×`size`.
pub fn fit_to_square(img: &RgbaImage, size: u32) -> RgbaImage {
    let (width, height) = img.dimensions();
    let edge = width.min(height);
    let x = (width - edge) / 2;
    let y = (height - edge) / 2;

    let square = imageops::crop_imm(img, x, y, edge, edge).to_image();
    if edge == size {
        return square;
    }
    imageops::resize(&square, size, size, FilterType::Lanczos3)
}

/// Decode, square, and re-encode one image. CPU bound.
pub fn render_image_sticker(data: &[u8], size: u32) -> Result<Vec<u8>, StickerError> {
    if data.is_empty() {
        return Err(StickerError::empty_image());
    }

    let decoded =
        image::load_from_memory(data).map_err(|e| StickerError::InvalidImage(e.to_string()))?;
    let squared = fit_to_square(&decoded.to_rgba8(), size);

    encode_static(squared.as_raw(), size, size)
}

pub struct ImageStickerTransformer {
    limits: Arc<PolicyLimits>,
}

impl ImageStickerTransformer {
    pub fn new(limits: Arc<PolicyLimits>) -> Self {
        Self { limits }
    }

    /// Render on the blocking pool. `permit` stays held until the render finishes, even
    /// when the caller stops waiting for it.
    #[tracing::instrument(skip(self, data, permit), fields(input_bytes = data.len()))]
    pub async fn transform(
        &self,
        data: Bytes,
        permit: OwnedSemaphorePermit,
    ) -> Result<Bytes, StickerError> {
        if data.is_empty() {
            return Err(StickerError::empty_image());
        }

        let size = self.limits.max_dimension;
        let encoded = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            render_image_sticker(&data, size)
        })
        .await
            .map_err(|e| StickerError::Internal(format!("Image worker failed: {}", e)))??;

        Ok(Bytes::from(encoded))
    }
}
