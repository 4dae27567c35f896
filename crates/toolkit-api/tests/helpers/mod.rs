//! Test helpers: build the router against a private staging directory.
//!
//! Run from workspace root: `cargo test -p toolkit-api --test sticker_api_test`.

#![allow(dead_code)]

use std::collections::HashMap;
use std::io::Cursor;
use std::path::PathBuf;
use std::process::Command;

use axum_test::TestServer;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use tempfile::TempDir;
use toolkit_api::setup::build_app;
use toolkit_core::Config;

/// Test application: server plus the staging directory it writes into.
pub struct TestApp {
    pub server: TestServer,
    pub staging_dir: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    pub fn leftover_files(&self) -> Vec<PathBuf> {
        std::fs::read_dir(self.staging_dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .collect()
    }
}

pub fn setup_test_app() -> TestApp {
    setup_test_app_with(&[])
}

/// Build the app with extra configuration variables on top of the test defaults.
pub fn setup_test_app_with(vars: &[(&str, &str)]) -> TestApp {
    let staging_dir = tempfile::tempdir().expect("Failed to create staging dir");

    let mut env: HashMap<String, String> = HashMap::new();
    env.insert(
        "STAGING_DIR".to_string(),
        staging_dir.path().to_string_lossy().into_owned(),
    );
    for (key, value) in vars {
        env.insert(key.to_string(), value.to_string());
    }

    let config = Config::from_lookup(|key| env.get(key).cloned()).expect("Invalid test config");
    config.validate().expect("Test config failed validation");

    let (_state, app) = build_app(config).expect("Failed to build app");
    let server = TestServer::new(app.into_make_service()).expect("Failed to create test server");

    TestApp {
        server,
        staging_dir,
    }
}

/// Three horizontal bands: red, green, blue.
pub fn create_banded_jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |_, y| match y * 3 / height {
        0 => Rgb([255, 0, 0]),
        1 => Rgb([0, 255, 0]),
        _ => Rgb([0, 0, 255]),
    });
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut out, ImageFormat::Jpeg)
        .expect("Failed to encode jpeg");
    out.into_inner()
}

/// Build a multipart body by hand so the request carries an exact Content-Length.
pub fn raw_multipart(boundary: &str, field: &str, filename: &str, mime: &str, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::with_capacity(data.len() + 256);
    body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
            field, filename, mime
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());
    body
}

pub fn mp3_encoder_available() -> bool {
    let probe_ok = Command::new("ffprobe")
        .arg("-version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false);
    probe_ok
        && Command::new("ffmpeg")
            .args(["-hide_banner", "-encoders"])
            .output()
            .map(|o| String::from_utf8_lossy(&o.stdout).contains("libmp3lame"))
            .unwrap_or(false)
}

/// Generate a WAV sine tone with the local ffmpeg.
pub fn generate_tone(dir: &std::path::Path, seconds: u32) -> Vec<u8> {
    let output = dir.join("tone.wav");
    let status = Command::new("ffmpeg")
        .args(["-v", "error", "-y", "-f", "lavfi", "-i"])
        .arg(format!("sine=frequency=440:duration={}", seconds))
        .arg(&output)
        .status()
        .expect("Failed to run ffmpeg");
    assert!(status.success(), "ffmpeg failed to generate tone");
    std::fs::read(output).unwrap()
}
