//! LivenessProber - fleet reachability check
//!
//! ## Responsibilities
//!
//! - One credential-less GET per registered camera, concurrently
//! - Classification: available iff the camera answered exactly 401
//!   (reachable, asks for auth). Timeouts, refusals, any other status → false
//! - Feed results into CameraStatusTracker for lost/recovered logging

mod tracker;

use tracker::CameraStatusTracker;

use crate::camera_registry::{CameraRegistry, LivenessClient};
use reqwest::StatusCode;
use std::collections::HashMap;
use std::sync::Arc;

/// tag → available
pub type LivenessResult = HashMap<String, bool>;

/// LivenessProber instance
pub struct LivenessProber {
    registry: Arc<CameraRegistry>,
    tracker: CameraStatusTracker,
}

impl LivenessProber {
    /// Create new LivenessProber
    pub fn new(registry: Arc<CameraRegistry>) -> Self {
        Self {
            registry,
            tracker: CameraStatusTracker::new(),
        }
    }

    /// Probe every registered camera
    pub async fn check_available_cameras(&self) -> LivenessResult {
        let mut handles = Vec::new();

        for camera in self.registry.descriptors() {
            let (client, url) = match (
                self.registry.liveness(&camera.tag),
                self.registry.snapshot_url(&camera.tag),
            ) {
                (Ok(client), Ok(url)) => (client.clone(), url.to_string()),
                _ => continue,
            };

            let tag = camera.tag.clone();
            let handle = tokio::spawn(async move {
                let available = probe_camera(&client, &url, &tag).await;
                (tag, available)
            });
            handles.push((camera.tag.clone(), handle));
        }

        let mut result = LivenessResult::new();
        for (tag, handle) in handles {
            let available = match handle.await {
                Ok((_, available)) => available,
                Err(e) => {
                    tracing::warn!(camera_id = %tag, error = %e, "Liveness task aborted");
                    false
                }
            };

            self.tracker.update_status(&tag, available).await;
            result.insert(tag, available);
        }

        tracing::debug!(
            cameras = result.len(),
            available = result.values().filter(|v| **v).count(),
            "Liveness probe complete"
        );

        result
    }
}

async fn probe_camera(client: &LivenessClient, url: &str, tag: &str) -> bool {
    match client.probe(url).await {
        Ok(status) => {
            let available = status == StatusCode::UNAUTHORIZED;
            if !available {
                tracing::debug!(camera_id = %tag, status = %status, "Unexpected probe status");
            }
            available
        }
        Err(e) => {
            tracing::debug!(camera_id = %tag, error = %e, "Probe failed");
            false
        }
    }
}
