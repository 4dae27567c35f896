//! Test helpers: dispatcher construction, generated media, and ffmpeg detection.
//!
//! Tests that need real media generate it with the local `ffmpeg` and return early
//! when the binary is not installed.

#![allow(dead_code)]

use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;

use image::{DynamicImage, ImageFormat, RgbImage};
use tempfile::TempDir;
use toolkit_core::{PolicyLimits, VideoOverflow};
use toolkit_processing::{FFmpegService, StickerDispatcher};

/// Dispatcher whose staged and intermediate files all land in a private directory.
pub struct TestPipeline {
    pub dispatcher: StickerDispatcher,
    pub ffmpeg: Arc<FFmpegService>,
    pub staging_dir: TempDir,
}

impl TestPipeline {
    pub fn new(overflow: VideoOverflow) -> Self {
        let staging_dir = tempfile::tempdir().unwrap();
        let ffmpeg = Arc::new(FFmpegService::new("ffmpeg".into(), "ffprobe".into()).unwrap());
        let limits = Arc::new(PolicyLimits::default().with_video_overflow(overflow));
        let dispatcher = StickerDispatcher::new(ffmpeg.clone(), limits, staging_dir.path(), 2);
        Self {
            dispatcher,
            ffmpeg,
            staging_dir,
        }
    }

    /// Files currently left in the staging directory.
    pub fn leftover_files(&self) -> Vec<PathBuf> {
        std::fs::read_dir(self.staging_dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .collect()
    }
}

pub fn ffmpeg_available() -> bool {
    ["ffmpeg", "ffprobe"].iter().all(|bin| {
        Command::new(bin)
            .arg("-version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    })
}

pub fn mp3_encoder_available() -> bool {
    ffmpeg_available()
        && Command::new("ffmpeg")
            .args(["-hide_banner", "-encoders"])
            .output()
            .map(|o| String::from_utf8_lossy(&o.stdout).contains("libmp3lame"))
            .unwrap_or(false)
}

fn run_ffmpeg(args: &[&str], output: &Path) {
    let status = Command::new("ffmpeg")
        .args(["-v", "error", "-y"])
        .args(args)
        .arg(output)
        .status()
        .unwrap();
    assert!(status.success(), "ffmpeg failed to generate {}", output.display());
}

/// Synthetic test-pattern clip encoded as MPEG-4 part 2.
pub fn generate_video(dir: &Path, seconds: u32, width: u32, height: u32, fps: u32) -> Vec<u8> {
    let path = dir.join(format!("source-{}s-{}x{}.mp4", seconds, width, height));
    let source = format!(
        "testsrc=duration={}:size={}x{}:rate={}",
        seconds, width, height, fps
    );
    run_ffmpeg(
        &["-f", "lavfi", "-i", &source, "-pix_fmt", "yuv420p", "-c:v", "mpeg4"],
        &path,
    );
    std::fs::read(path).unwrap()
}

/// Sine tone as 16-bit PCM WAV.
pub fn generate_tone(dir: &Path, seconds: u32) -> Vec<u8> {
    let path = dir.join(format!("tone-{}s.wav", seconds));
    let source = format!("sine=frequency=440:duration={}", seconds);
    run_ffmpeg(&["-f", "lavfi", "-i", &source], &path);
    std::fs::read(path).unwrap()
}

/// Horizontal colour bands so crops can be checked by sampling pixels.
pub fn banded_rgb(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |_, y| {
        let band = y * 3 / height;
        match band {
            0 => image::Rgb([255, 0, 0]),
            1 => image::Rgb([0, 255, 0]),
            _ => image::Rgb([0, 0, 255]),
        }
    })
}

pub fn encode_image(img: RgbImage, format: ImageFormat) -> Vec<u8> {
    let mut buffer = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut buffer, format)
        .unwrap();
    buffer.into_inner()
}
