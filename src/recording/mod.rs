//! Recording - interactive clip workflow
//!
//! ## Responsibilities
//!
//! - record → camera choice → duration choice, correlated through SessionStore
//! - Capture with the external tool, probe the resolution, deliver the clip
//! - One running job per (user, stream); temp file removed on every terminal path
//!
//! ## State flow
//!
//! Idle → CameraSelected → DurationSelected → Capturing → Probing →
//! Delivering → Done | Failed

mod lease;
mod media_tools;
mod paths;
mod types;

pub use lease::{RecordingLease, RecordingLeases};
pub use media_tools::{
    parse_resolution, probe_or_default, CaptureRequest, FfmpegTools, MediaTools,
    DEFAULT_CAPTURE_GRACE_SECS,
};
pub use paths::{hashify, recording_path};
pub use types::*;

use crate::camera_registry::{CameraChoice, CameraRegistry};
use crate::config_store::{ConfigStore, UserId};
use crate::delivery::{MediaTransport, VideoClip};
use crate::error::{Error, Result};
use crate::session_state::{SessionStore, SessionValue, WorkflowStage};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Delivery attempts before giving up
pub const DEFAULT_MAX_DELIVERY_ATTEMPTS: u32 = 3;

/// Notice sent before capture starts
pub const RECORDING_STARTED_TEXT: &str = "Recording is started";

/// Orchestrator tuning
#[derive(Debug, Clone)]
pub struct RecordingOptions {
    /// Temp clip directory
    pub recording_dir: PathBuf,
    pub max_delivery_attempts: u32,
    /// Pause between failed delivery attempts
    pub retry_delay: Duration,
}

impl RecordingOptions {
    pub fn new(recording_dir: impl Into<PathBuf>) -> Self {
        Self {
            recording_dir: recording_dir.into(),
            max_delivery_attempts: DEFAULT_MAX_DELIVERY_ATTEMPTS,
            retry_delay: Duration::from_secs(1),
        }
    }
}

/// RecordingOrchestrator instance
pub struct RecordingOrchestrator {
    config_store: Arc<ConfigStore>,
    registry: Arc<CameraRegistry>,
    sessions: Arc<SessionStore>,
    tools: Arc<dyn MediaTools>,
    transport: Arc<dyn MediaTransport>,
    leases: RecordingLeases,
    options: RecordingOptions,
}

impl RecordingOrchestrator {
    /// Create new RecordingOrchestrator
    pub fn new(
        config_store: Arc<ConfigStore>,
        registry: Arc<CameraRegistry>,
        sessions: Arc<SessionStore>,
        tools: Arc<dyn MediaTools>,
        transport: Arc<dyn MediaTransport>,
        options: RecordingOptions,
    ) -> Self {
        Self {
            config_store,
            registry,
            sessions,
            tools,
            transport,
            leases: RecordingLeases::new(),
            options,
        }
    }

    /// "record": offer the cameras this user may record
    pub async fn begin(&self, user_id: UserId) -> Result<Vec<CameraChoice>> {
        let permissions = self
            .config_store
            .get_permissions_for(user_id)
            .ok_or_else(|| Error::Forbidden(format!("no permissions for user {}", user_id)))?;

        let choices: Vec<CameraChoice> = self
            .registry
            .descriptors()
            .iter()
            .filter(|camera| permissions.allows(&camera.tag))
            .map(CameraChoice::from)
            .collect();

        if choices.is_empty() {
            return Err(Error::Forbidden(format!(
                "no cameras permitted for user {}",
                user_id
            )));
        }

        self.sessions
            .remove(user_id, WorkflowStage::DurationSelection)
            .await;
        self.sessions
            .set(
                user_id,
                WorkflowStage::CameraSelection,
                SessionValue::PendingCamera {
                    offered_tags: choices.iter().map(|c| c.tag.clone()).collect(),
                },
            )
            .await;

        tracing::info!(user_id = user_id, cameras = choices.len(), "Recording workflow started");
        Ok(choices)
    }

    /// Camera picked: remember its stream, offer the durations
    ///
    /// Returns None when no camera offer is pending (no "record" yet or expired).
    pub async fn choose_camera(
        &self,
        user_id: UserId,
        tag: &str,
    ) -> Result<Option<Vec<DurationBucket>>> {
        let permitted = self
            .config_store
            .get_permissions_for(user_id)
            .map(|p| p.allows(tag))
            .unwrap_or(false);
        if !permitted {
            return Err(Error::Forbidden(format!(
                "camera {} not permitted for user {}",
                tag, user_id
            )));
        }

        let offered_tags = match self
            .sessions
            .get(user_id, WorkflowStage::CameraSelection)
            .await
        {
            Some(SessionValue::PendingCamera { offered_tags }) => offered_tags,
            _ => {
                tracing::info!(user_id = user_id, camera_id = %tag, "No pending camera offer, ignoring choice");
                return Ok(None);
            }
        };
        if !offered_tags.iter().any(|t| t == tag) {
            return Err(Error::Validation(format!("camera {} was not offered", tag)));
        }

        let camera = self
            .registry
            .descriptor(tag)
            .ok_or_else(|| Error::NotFound(format!("camera {}", tag)))?;
        let stream_url = self.registry.stream_url(tag)?.to_string();

        if self
            .sessions
            .take(user_id, WorkflowStage::CameraSelection)
            .await
            .is_none()
        {
            return Ok(None);
        }
        self.sessions
            .set(
                user_id,
                WorkflowStage::DurationSelection,
                SessionValue::PendingDuration {
                    tag: camera.tag.clone(),
                    camera_name: camera.name.clone(),
                    stream_url,
                },
            )
            .await;

        log_state(user_id, tag, RecordingState::CameraSelected);
        Ok(Some(DurationBucket::ALL.to_vec()))
    }

    /// Duration picked: run the job to a terminal state
    ///
    /// Returns None when no camera choice is pending (already used or expired).
    /// A job already running for the same file is refused with Conflict and
    /// the pending choice is kept.
    pub async fn choose_duration(
        &self,
        user_id: UserId,
        bucket: DurationBucket,
    ) -> Result<Option<RecordingOutcome>> {
        let (tag, camera_name, stream_url) = match self
            .sessions
            .get(user_id, WorkflowStage::DurationSelection)
            .await
        {
            Some(SessionValue::PendingDuration {
                tag,
                camera_name,
                stream_url,
            }) => (tag, camera_name, stream_url),
            _ => {
                tracing::info!(user_id = user_id, "No pending camera selection, ignoring duration");
                return Ok(None);
            }
        };

        let output_path = recording_path(&self.options.recording_dir, user_id, &stream_url);
        let job = RecordingJob {
            user_id,
            tag,
            camera_name,
            stream_url,
            bucket,
            output_path,
        };

        let lease_key = job.output_path.to_string_lossy().into_owned();
        let _lease = self.leases.try_acquire(&lease_key).await.ok_or_else(|| {
            Error::Conflict(format!(
                "recording of {} already running for user {}",
                job.tag, user_id
            ))
        })?;

        // consumed only once the job is ours; expired in between → stale
        if self
            .sessions
            .take(user_id, WorkflowStage::DurationSelection)
            .await
            .is_none()
        {
            return Ok(None);
        }

        log_state(user_id, &job.tag, RecordingState::DurationSelected);
        Ok(Some(self.run_job(&job).await))
    }

    /// Capture → probe → deliver. Never leaves the temp file behind.
    async fn run_job(&self, job: &RecordingJob) -> RecordingOutcome {
        let outcome = self.execute(job).await;
        remove_if_exists(&job.output_path).await;

        match outcome.state {
            RecordingState::Done => tracing::info!(
                user_id = job.user_id,
                camera_id = %job.tag,
                bucket = %job.bucket,
                attempts = outcome.attempts,
                "Recording delivered"
            ),
            _ => tracing::error!(
                user_id = job.user_id,
                camera_id = %job.tag,
                failed_at = ?outcome.failed_at,
                error = outcome.error.as_deref().unwrap_or(""),
                "Recording failed"
            ),
        }

        outcome
    }

    async fn execute(&self, job: &RecordingJob) -> RecordingOutcome {
        if let Err(e) = tokio::fs::create_dir_all(&self.options.recording_dir).await {
            return failed(job, RecordingState::DurationSelected, 0, Error::from(e));
        }
        remove_if_exists(&job.output_path).await;

        if let Err(e) = self
            .transport
            .send_text(job.user_id, RECORDING_STARTED_TEXT)
            .await
        {
            tracing::warn!(user_id = job.user_id, error = %e, "Failed to send recording notice");
        }

        log_state(job.user_id, &job.tag, RecordingState::Capturing);
        let request = CaptureRequest {
            stream_url: job.stream_url.clone(),
            bucket: job.bucket,
            output_path: job.output_path.clone(),
        };
        if let Err(e) = self.tools.capture(&request).await {
            return failed(job, RecordingState::Capturing, 0, e);
        }

        log_state(job.user_id, &job.tag, RecordingState::Probing);
        let resolution = probe_or_default(self.tools.as_ref(), &job.output_path).await;
        tracing::debug!(camera_id = %job.tag, resolution = %resolution, "Clip resolution");

        log_state(job.user_id, &job.tag, RecordingState::Delivering);
        let data = match tokio::fs::read(&job.output_path).await {
            Ok(data) => data,
            Err(e) => return failed(job, RecordingState::Delivering, 0, Error::from(e)),
        };

        let clip = VideoClip {
            file_name: job
                .output_path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| format!("{}.mp4", job.tag)),
            data,
            resolution,
            caption: Some(format!("{} ({}s)", job.camera_name, job.bucket.seconds())),
        };

        let max_attempts = self.options.max_delivery_attempts.max(1);
        let mut last_error = None;
        for attempt in 1..=max_attempts {
            match self.transport.send_video(job.user_id, &clip).await {
                Ok(()) => {
                    log_state(job.user_id, &job.tag, RecordingState::Done);
                    return RecordingOutcome {
                        user_id: job.user_id,
                        tag: job.tag.clone(),
                        bucket: job.bucket,
                        state: RecordingState::Done,
                        failed_at: None,
                        attempts: attempt,
                        resolution: Some(resolution),
                        error: None,
                    };
                }
                Err(e) => {
                    tracing::warn!(
                        user_id = job.user_id,
                        camera_id = %job.tag,
                        attempt = attempt,
                        max_attempts = max_attempts,
                        error = %e,
                        "Video delivery failed"
                    );
                    last_error = Some(e);
                    if attempt < max_attempts && !self.options.retry_delay.is_zero() {
                        tokio::time::sleep(self.options.retry_delay).await;
                    }
                }
            }
        }

        let error = last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "no delivery attempt made".to_string());
        let mut outcome = failed(
            job,
            RecordingState::Delivering,
            max_attempts,
            Error::Delivery(format!(
                "delivery failed after {} attempts: {}",
                max_attempts, error
            )),
        );
        outcome.resolution = Some(resolution);
        outcome
    }
}

fn failed(job: &RecordingJob, stage: RecordingState, attempts: u32, error: Error) -> RecordingOutcome {
    log_state(job.user_id, &job.tag, RecordingState::Failed);
    RecordingOutcome {
        user_id: job.user_id,
        tag: job.tag.clone(),
        bucket: job.bucket,
        state: RecordingState::Failed,
        failed_at: Some(stage),
        attempts,
        resolution: None,
        error: Some(error.to_string()),
    }
}

fn log_state(user_id: UserId, tag: &str, state: RecordingState) {
    tracing::debug!(user_id = user_id, camera_id = %tag, state = ?state, "Recording state");
}

async fn remove_if_exists(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => tracing::debug!(path = %path.display(), "Temp recording removed"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "Failed to remove temp recording"),
    }
}
