//! External capture / probe tools (ffmpeg, ffprobe)

use super::types::{DurationBucket, Resolution};
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Default watchdog slack on top of the clip length
pub const DEFAULT_CAPTURE_GRACE_SECS: u64 = 30;

/// Probe runs on a local file; a short bound is plenty
const PROBE_TIMEOUT_SECS: u64 = 15;

/// What to record and where
#[derive(Debug, Clone)]
pub struct CaptureRequest {
    pub stream_url: String,
    pub bucket: DurationBucket,
    pub output_path: PathBuf,
}

/// Capture / probe seam
#[async_trait]
pub trait MediaTools: Send + Sync {
    /// Record `bucket` worth of the stream into `output_path`
    async fn capture(&self, request: &CaptureRequest) -> Result<()>;

    /// Raw probe output for the first video stream ("W,H")
    async fn probe_resolution(&self, path: &Path) -> Result<String>;
}

/// Parse probe output; exactly two positive integers separated by a comma
pub fn parse_resolution(output: &str) -> Option<Resolution> {
    let (w, h) = output.trim().split_once(',')?;
    let width: u32 = w.trim().parse().ok()?;
    let height: u32 = h.trim().parse().ok()?;

    if width == 0 || height == 0 {
        return None;
    }

    Some(Resolution { width, height })
}

/// Probe a file, falling back to 1920x1080 on any failure
pub async fn probe_or_default(tools: &dyn MediaTools, path: &Path) -> Resolution {
    match tools.probe_resolution(path).await {
        Ok(output) => parse_resolution(&output).unwrap_or_else(|| {
            tracing::debug!(output = %output.trim(), "Unparsable probe output, using default resolution");
            Resolution::default()
        }),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Probe failed, using default resolution");
            Resolution::default()
        }
    }
}

/// ffmpeg / ffprobe via tokio::process
#[derive(Debug, Clone)]
pub struct FfmpegTools {
    /// Force RTSP over TCP (container networking)
    docker: bool,
    grace: Duration,
    ffmpeg_bin: String,
    ffprobe_bin: String,
}

impl FfmpegTools {
    pub fn new(docker: bool, grace: Duration) -> Self {
        Self {
            docker,
            grace,
            ffmpeg_bin: "ffmpeg".to_string(),
            ffprobe_bin: "ffprobe".to_string(),
        }
    }

    /// Override binary names (tests, non-PATH installs)
    pub fn with_binaries(mut self, ffmpeg: impl Into<String>, ffprobe: impl Into<String>) -> Self {
        self.ffmpeg_bin = ffmpeg.into();
        self.ffprobe_bin = ffprobe.into();
        self
    }

    /// `[-rtsp_transport tcp] -y -t <bound> -i <url> <path>`
    pub fn capture_args(&self, request: &CaptureRequest) -> Vec<String> {
        let mut args = Vec::with_capacity(8);
        if self.docker {
            args.push("-rtsp_transport".to_string());
            args.push("tcp".to_string());
        }
        args.extend([
            "-y".to_string(),
            "-t".to_string(),
            request.bucket.time_arg().to_string(),
            "-i".to_string(),
            request.stream_url.clone(),
            request.output_path.to_string_lossy().into_owned(),
        ]);
        args
    }

    pub fn probe_args(path: &Path) -> Vec<String> {
        vec![
            "-v".to_string(),
            "error".to_string(),
            "-select_streams".to_string(),
            "v:0".to_string(),
            "-show_entries".to_string(),
            "stream=width,height".to_string(),
            "-of".to_string(),
            "csv=p=0".to_string(),
            path.to_string_lossy().into_owned(),
        ]
    }

    /// Run a tool to completion under a watchdog.
    ///
    /// On timeout the Child is dropped and kill_on_drop sends SIGKILL,
    /// so a hung stream never leaves an ffmpeg behind.
    async fn run(&self, bin: &str, args: &[String], limit: Duration) -> Result<Vec<u8>> {
        let child = Command::new(bin)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::Capture(format!("{} spawn failed: {}", bin, e)))?;

        match tokio::time::timeout(limit, child.wait_with_output()).await {
            Ok(Ok(output)) => {
                if !output.status.success() {
                    let stderr = String::from_utf8_lossy(&output.stderr);
                    return Err(Error::Capture(format!(
                        "{} exited with {}: {}",
                        bin,
                        output.status,
                        last_line(&stderr)
                    )));
                }
                Ok(output.stdout)
            }
            Ok(Err(e)) => Err(Error::Capture(format!("{} execution failed: {}", bin, e))),
            Err(_) => {
                tracing::warn!(
                    tool = bin,
                    timeout_sec = limit.as_secs(),
                    "Tool timeout, process killed via kill_on_drop"
                );
                Err(Error::Capture(format!("{} timeout ({}s)", bin, limit.as_secs())))
            }
        }
    }
}

#[async_trait]
impl MediaTools for FfmpegTools {
    async fn capture(&self, request: &CaptureRequest) -> Result<()> {
        let args = self.capture_args(request);
        let limit = Duration::from_secs(request.bucket.seconds()) + self.grace;

        tracing::debug!(
            output = %request.output_path.display(),
            bound = request.bucket.time_arg(),
            docker = self.docker,
            "Starting capture"
        );

        self.run(&self.ffmpeg_bin, &args, limit).await.map(|_| ())
    }

    async fn probe_resolution(&self, path: &Path) -> Result<String> {
        let args = Self::probe_args(path);
        let stdout = self
            .run(&self.ffprobe_bin, &args, Duration::from_secs(PROBE_TIMEOUT_SECS))
            .await?;

        Ok(String::from_utf8_lossy(&stdout).into_owned())
    }
}

/// ffmpeg prints a banner before the actual error
fn last_line(stderr: &str) -> &str {
    stderr
        .lines()
        .rev()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("")
}
