//! Application state shared by every handler.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use toolkit_core::Config;
use toolkit_processing::{FFmpegService, StickerDispatcher};

pub struct AppState {
    pub dispatcher: StickerDispatcher,
    pub sticker_timeout: Duration,
}

impl AppState {
    pub fn new(config: &Config) -> Result<Self, anyhow::Error> {
        let ffmpeg = FFmpegService::new(config.ffmpeg_path.clone(), config.ffprobe_path.clone())
            .context("Invalid ffmpeg configuration")?;

        let dispatcher = StickerDispatcher::new(
            Arc::new(ffmpeg),
            Arc::new(config.limits.clone()),
            config.staging_dir.clone(),
            config.max_concurrent_transcodes,
        );

        Ok(Self {
            dispatcher,
            sticker_timeout: Duration::from_secs(config.sticker_timeout_secs),
        })
    }
}
