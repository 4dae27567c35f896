//! FFmpegService - probing, frame decoding, and audio transcoding through the
//! `ffprobe`/`ffmpeg` binaries.
//!
//! Every child process is spawned with `kill_on_drop(true)`, so cancelling a conversion
//! also terminates the decoder working on it.

use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::time::Instant;

use serde::Deserialize;
use tokio::process::Command;
use toolkit_core::StickerError;

/// Validate that a path doesn't contain shell metacharacters or dangerous sequences
fn validate_path(path: &str) -> Result<(), FFmpegError> {
    let dangerous_chars = [';', '|', '&', '$', '`', '(', ')', '<', '>', '\n', '\r'];
    if path.chars().any(|c| dangerous_chars.contains(&c)) {
        return Err(FFmpegError::InvalidPath(format!(
            "contains dangerous characters: {}",
            path
        )));
    }

    if path.contains("..") {
        return Err(FFmpegError::InvalidPath(format!(
            "contains directory traversal: {}",
            path
        )));
    }

    Ok(())
}

fn validate_binary(path: &str) -> Result<(), FFmpegError> {
    validate_path(path)?;

    if path.is_empty()
        || !path.chars().all(|c| {
            c.is_alphanumeric() || c == '/' || c == '-' || c == '_' || c == '.' || c == '\\'
        })
    {
        return Err(FFmpegError::InvalidPath(format!(
            "contains unsafe characters: {}",
            path
        )));
    }

    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum FFmpegError {
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Failed to execute {program}: {source}")]
    Spawn {
        program: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status}: {stderr}")]
    Failed {
        program: &'static str,
        status: ExitStatus,
        stderr: String,
    },

    #[error("Failed to parse ffprobe output: {0}")]
    Parse(#[from] serde_json::Error),
}

impl From<FFmpegError> for StickerError {
    fn from(err: FFmpegError) -> Self {
        StickerError::from(anyhow::Error::new(err))
    }
}

/// Which stream ffprobe should report on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamSelector {
    Video,
    Audio,
}

impl StreamSelector {
    fn as_arg(self) -> &'static str {
        match self {
            StreamSelector::Video => "v:0",
            StreamSelector::Audio => "a:0",
        }
    }
}

/// What ffprobe reported about a staged file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MediaProbe {
    /// Container duration in seconds, falling back to the selected stream's duration.
    pub duration: Option<f64>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// Native frame rate of the selected video stream.
    pub frame_rate: Option<f64>,
    pub codec: Option<String>,
    /// Sample rate of the selected audio stream, in Hz.
    pub sample_rate: Option<u32>,
    /// Stream bit rate in bits per second, falling back to the container's.
    pub bit_rate: Option<u64>,
}

#[derive(Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    #[serde(default)]
    format: Option<ProbeFormat>,
}

#[derive(Deserialize)]
struct ProbeStream {
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    avg_frame_rate: Option<String>,
    r_frame_rate: Option<String>,
    duration: Option<String>,
    sample_rate: Option<String>,
    bit_rate: Option<String>,
}

#[derive(Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
    bit_rate: Option<String>,
}

impl MediaProbe {
    pub fn from_json(data: &[u8]) -> Result<Self, FFmpegError> {
        let output: ProbeOutput = serde_json::from_slice(data)?;
        let stream = output.streams.into_iter().next();
        let (format_duration, format_bit_rate) = output
            .format
            .map(|f| (f.duration, f.bit_rate))
            .unwrap_or_default();

        let duration = format_duration
            .and_then(|d| d.parse::<f64>().ok())
            .or_else(|| {
                stream
                    .as_ref()
                    .and_then(|s| s.duration.as_deref())
                    .and_then(|d| d.parse::<f64>().ok())
            })
            .filter(|d| d.is_finite());

        let format_bit_rate = format_bit_rate.and_then(|b| b.parse::<u64>().ok());

        let Some(stream) = stream else {
            return Ok(MediaProbe {
                duration,
                bit_rate: format_bit_rate,
                ..Default::default()
            });
        };

        let frame_rate = stream
            .avg_frame_rate
            .as_deref()
            .and_then(parse_frame_rate)
            .or_else(|| stream.r_frame_rate.as_deref().and_then(parse_frame_rate));

        Ok(MediaProbe {
            duration,
            width: stream.width.filter(|w| *w > 0),
            height: stream.height.filter(|h| *h > 0),
            frame_rate,
            codec: stream.codec_name,
            sample_rate: stream.sample_rate.and_then(|r| r.parse().ok()),
            bit_rate: stream
                .bit_rate
                .and_then(|b| b.parse().ok())
                .or(format_bit_rate),
        })
    }
}

/// Parse an ffprobe rate such as "30000/1001" or "25".
fn parse_frame_rate(rate: &str) -> Option<f64> {
    let value = match rate.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.trim().parse().ok()?;
            let den: f64 = den.trim().parse().ok()?;
            if den == 0.0 {
                return None;
            }
            num / den
        }
        None => rate.trim().parse().ok()?,
    };
    (value.is_finite() && value > 0.0).then_some(value)
}

/// Raw RGBA frames cut from the start of a video.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameSampling {
    /// Seconds of the source timeline to decode, starting at zero.
    pub trim_end: f64,
    pub fps: u32,
    /// Edge of the square output frame.
    pub size: u32,
}

impl FrameSampling {
    pub fn frame_len(&self) -> usize {
        self.size as usize * self.size as usize * 4
    }

    /// Filter graph: sample at `fps`, centre-crop the largest square, resample to `size`.
    ///
    /// The crop is expressed against the decoded frame so that rotated sources are
    /// cropped after ffmpeg applies their display matrix.
    pub fn filter_graph(&self) -> String {
        format!(
            "fps={fps},crop='min(iw,ih)':'min(iw,ih)':'(iw-min(iw,ih))/2':'(ih-min(iw,ih))/2',scale={size}:{size}:flags=lanczos",
            fps = self.fps,
            size = self.size
        )
    }
}

/// MP3 re-encode of the start of an audio clip.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mp3Encoding {
    pub trim_end: f64,
    pub bitrate_kbps: u32,
    pub sample_rate_hz: u32,
}

#[derive(Debug, Clone)]
pub struct FFmpegService {
    ffmpeg_path: String,
    ffprobe_path: String,
}

impl FFmpegService {
    pub fn new(ffmpeg_path: String, ffprobe_path: String) -> Result<Self, FFmpegError> {
        validate_binary(&ffmpeg_path)?;
        validate_binary(&ffprobe_path)?;

        Ok(Self {
            ffmpeg_path,
            ffprobe_path,
        })
    }

    /// Probe the first stream of the selected type plus the container format.
    #[tracing::instrument(skip(self), fields(
        process.executable.name = "ffprobe",
        process.executable.path = %self.ffprobe_path,
        ffmpeg.operation = "probe"
    ))]
    pub async fn probe(
        &self,
        path: &Path,
        selector: StreamSelector,
    ) -> Result<MediaProbe, FFmpegError> {
        let start = Instant::now();
        validate_path(&path.to_string_lossy())?;

        let output = Command::new(&self.ffprobe_path)
            .args([
                "-v",
                "error",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
                "-select_streams",
                selector.as_arg(),
            ])
            .arg(path)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| FFmpegError::Spawn {
                program: "ffprobe",
                source,
            })?;

        if !output.status.success() {
            return Err(FFmpegError::Failed {
                program: "ffprobe",
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let probe = MediaProbe::from_json(&output.stdout)?;

        tracing::info!(
            duration_ms = start.elapsed().as_millis(),
            media_duration = ?probe.duration,
            width = ?probe.width,
            height = ?probe.height,
            frame_rate = ?probe.frame_rate,
            codec = ?probe.codec,
            sample_rate = ?probe.sample_rate,
            bit_rate = ?probe.bit_rate,
            "Media probe completed"
        );

        Ok(probe)
    }

    /// Decode square RGBA frames to memory through a rawvideo pipe.
    #[tracing::instrument(skip(self), fields(
        process.executable.name = "ffmpeg",
        ffmpeg.operation = "decode_frames"
    ))]
    pub async fn decode_frames(
        &self,
        path: &Path,
        sampling: FrameSampling,
    ) -> Result<Vec<u8>, FFmpegError> {
        let start = Instant::now();
        validate_path(&path.to_string_lossy())?;

        let output = Command::new(&self.ffmpeg_path)
            .args(["-nostdin", "-v", "error", "-i"])
            .arg(path)
            .args([
                "-t".to_string(),
                format!("{:.3}", sampling.trim_end),
                "-an".to_string(),
                "-vf".to_string(),
                sampling.filter_graph(),
                "-pix_fmt".to_string(),
                "rgba".to_string(),
                "-f".to_string(),
                "rawvideo".to_string(),
                "pipe:1".to_string(),
            ])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| FFmpegError::Spawn {
                program: "ffmpeg",
                source,
            })?;

        if !output.status.success() {
            return Err(FFmpegError::Failed {
                program: "ffmpeg",
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        tracing::info!(
            duration_ms = start.elapsed().as_millis(),
            decoded_bytes = output.stdout.len(),
            frames = output.stdout.len() / sampling.frame_len(),
            "Frame decode completed"
        );

        Ok(output.stdout)
    }

    /// Re-encode the start of `input` to MP3 at `output`, overwriting it.
    #[tracing::instrument(skip(self), fields(
        process.executable.name = "ffmpeg",
        ffmpeg.operation = "transcode_mp3"
    ))]
    pub async fn transcode_mp3(
        &self,
        input: &Path,
        output: &Path,
        encoding: Mp3Encoding,
    ) -> Result<(), FFmpegError> {
        let start = Instant::now();
        validate_path(&input.to_string_lossy())?;
        validate_path(&output.to_string_lossy())?;

        let result = Command::new(&self.ffmpeg_path)
            .args(["-nostdin", "-v", "error", "-y", "-i"])
            .arg(input)
            .args([
                "-t".to_string(),
                format!("{:.3}", encoding.trim_end),
                "-vn".to_string(),
                "-acodec".to_string(),
                "libmp3lame".to_string(),
                "-b:a".to_string(),
                format!("{}k", encoding.bitrate_kbps),
                "-ar".to_string(),
                encoding.sample_rate_hz.to_string(),
                "-f".to_string(),
                "mp3".to_string(),
            ])
            .arg(output)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| FFmpegError::Spawn {
                program: "ffmpeg",
                source,
            })?;

        if !result.status.success() {
            return Err(FFmpegError::Failed {
                program: "ffmpeg",
                status: result.status,
                stderr: String::from_utf8_lossy(&result.stderr).trim().to_string(),
            });
        }

        tracing::info!(
            duration_ms = start.elapsed().as_millis(),
            "Audio transcode completed"
        );

        Ok(())
    }
}
