//! Configuration module
//!
//! Server, conversion, and logging settings read from the environment (and a `.env`
//! file when present).

use std::env;
use std::path::PathBuf;

use crate::policy::{PolicyLimits, VideoOverflow};

const SERVER_PORT: u16 = 4000;
const MAX_UPLOAD_SIZE_MB: usize = 50;
const MAX_CONCURRENT_TRANSCODES: usize = 2;
const STICKER_TIMEOUT_SECS: u64 = 120;
const HTTP_CONCURRENCY_LIMIT: usize = 10_000;
const DEFAULT_CORS_ORIGINS: &str =
    "http://localhost:5173,http://127.0.0.1:5173,http://localhost:3000";

/// Output format of the tracing subscriber
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    pub server_port: u16,
    pub environment: String,
    pub cors_origins: Vec<String>,
    pub ffmpeg_path: String,
    pub ffprobe_path: String,
    pub max_upload_size_bytes: usize,
    pub max_concurrent_transcodes: usize,
    pub sticker_timeout_secs: u64,
    pub http_concurrency_limit: usize,
    /// Directory holding staged uploads and intermediate files.
    pub staging_dir: PathBuf,
    pub log_format: LogFormat,
    pub limits: PolicyLimits,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = lookup("ENVIRONMENT")
            .or_else(|| lookup("APP_ENV"))
            .unwrap_or_else(|| "development".to_string());

        let cors_origins: Vec<String> = lookup("CORS_ORIGINS")
            .unwrap_or_else(|| DEFAULT_CORS_ORIGINS.to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let ffmpeg_path = lookup("FFMPEG_PATH").unwrap_or_else(|| "ffmpeg".to_string());
        let ffprobe_path =
            lookup("FFPROBE_PATH").unwrap_or_else(|| derive_ffprobe_path(&ffmpeg_path));

        let max_upload_size_mb = lookup("MAX_UPLOAD_SIZE_MB")
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(MAX_UPLOAD_SIZE_MB);

        let video_overflow = match lookup("VIDEO_OVERFLOW") {
            Some(value) => VideoOverflow::parse(&value)?,
            None => VideoOverflow::default(),
        };

        let log_format = match lookup("LOG_FORMAT").as_deref().map(str::trim) {
            Some(f) if f.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Compact,
        };

        let config = Config {
            server_port: lookup("PORT")
                .unwrap_or_else(|| SERVER_PORT.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            environment,
            cors_origins,
            ffmpeg_path,
            ffprobe_path,
            max_upload_size_bytes: max_upload_size_mb * 1024 * 1024,
            max_concurrent_transcodes: lookup("MAX_CONCURRENT_TRANSCODES")
                .and_then(|v| v.parse().ok())
                .unwrap_or(MAX_CONCURRENT_TRANSCODES),
            sticker_timeout_secs: lookup("STICKER_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(STICKER_TIMEOUT_SECS),
            http_concurrency_limit: lookup("HTTP_CONCURRENCY_LIMIT")
                .and_then(|v| v.parse::<usize>().ok())
                .unwrap_or(HTTP_CONCURRENCY_LIMIT)
                .max(1),
            staging_dir: lookup("STAGING_DIR")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(env::temp_dir),
            log_format,
            limits: PolicyLimits::default().with_video_overflow(video_overflow),
        };

        Ok(config)
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.is_production() && self.cors_origins.iter().any(|o| o == "*") {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        if self.max_upload_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_UPLOAD_SIZE_MB must be greater than 0"));
        }

        if self.max_concurrent_transcodes == 0 {
            return Err(anyhow::anyhow!(
                "MAX_CONCURRENT_TRANSCODES must be greater than 0"
            ));
        }

        if self.sticker_timeout_secs == 0 {
            return Err(anyhow::anyhow!("STICKER_TIMEOUT_SECS must be greater than 0"));
        }

        if !self.staging_dir.is_dir() {
            return Err(anyhow::anyhow!(
                "STAGING_DIR must be an existing directory: {}",
                self.staging_dir.display()
            ));
        }

        if self.ffmpeg_path.trim().is_empty() {
            return Err(anyhow::anyhow!("FFMPEG_PATH must not be empty"));
        }

        Ok(())
    }
}

/// `ffprobe` living next to the configured `ffmpeg`, or on `PATH` for a bare name.
fn derive_ffprobe_path(ffmpeg_path: &str) -> String {
    let path = std::path::Path::new(ffmpeg_path);
    match path.file_name().and_then(|n| n.to_str()) {
        Some(name) if name.contains("ffmpeg") => {
            let probe_name = name.replacen("ffmpeg", "ffprobe", 1);
            path.with_file_name(probe_name).to_string_lossy().into_owned()
        }
        _ => "ffprobe".to_string(),
    }
}
