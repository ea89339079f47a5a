//! SnapshotService - concurrent image fetch from cameras
//!
//! ## Responsibilities
//!
//! - Fan out one digest-authenticated GET per requested camera
//! - Collect only 200 responses; failures silently shrink the result
//! - "All cameras" album: liveness filter → fetch → ordered photos

use crate::camera_registry::{AccessClient, CameraRegistry};
use crate::delivery::AlbumPhoto;
use crate::liveness_prober::LivenessProber;
use reqwest::StatusCode;
use std::collections::HashMap;
use std::sync::Arc;

/// tag → JPEG bytes (only successful cameras)
pub type FetchResult = HashMap<String, Vec<u8>>;

/// SnapshotService instance
pub struct SnapshotService {
    registry: Arc<CameraRegistry>,
    prober: Arc<LivenessProber>,
}

impl SnapshotService {
    /// Create new SnapshotService
    pub fn new(registry: Arc<CameraRegistry>, prober: Arc<LivenessProber>) -> Self {
        Self { registry, prober }
    }

    /// Fetch current snapshots for the requested tags
    ///
    /// Each camera runs in its own task; the result is merged after every
    /// task finished or hit its client timeout. Tags not registered are
    /// skipped.
    pub async fn get_all_images(&self, tags: &[String]) -> FetchResult {
        let mut handles = Vec::new();

        for camera in self.registry.descriptors() {
            if !tags.iter().any(|t| t == &camera.tag) {
                continue;
            }

            let (client, url) = match (
                self.registry.get(&camera.tag),
                self.registry.snapshot_url(&camera.tag),
            ) {
                (Ok(client), Ok(url)) => (client.clone(), url.to_string()),
                _ => continue,
            };

            let tag = camera.tag.clone();
            let handle = tokio::spawn(async move {
                let data = fetch_snapshot(&client, &url).await;
                (tag, data)
            });
            handles.push((camera.tag.clone(), handle));
        }

        let mut images = FetchResult::new();
        for (tag, handle) in handles {
            match handle.await {
                Ok((tag, Some(data))) => {
                    images.insert(tag, data);
                }
                Ok((_, None)) => {}
                Err(e) => {
                    tracing::warn!(camera_id = %tag, error = %e, "Snapshot task aborted");
                }
            }
        }

        tracing::debug!(
            requested = tags.len(),
            fetched = images.len(),
            "Snapshot fan-out complete"
        );

        images
    }

    /// Album of current images from permitted cameras that are reachable
    ///
    /// Photos follow the camera order of the config file.
    pub async fn permitted_album(&self, permitted: &[String]) -> Vec<AlbumPhoto> {
        let statuses = self.prober.check_available_cameras().await;

        let available: Vec<String> = permitted
            .iter()
            .filter(|tag| statuses.get(tag.as_str()).copied().unwrap_or(false))
            .cloned()
            .collect();

        tracing::info!(
            permitted = permitted.len(),
            available = available.len(),
            "Building snapshot album"
        );

        let mut images = self.get_all_images(&available).await;

        self.registry
            .descriptors()
            .iter()
            .filter_map(|camera| {
                images.remove(&camera.tag).map(|data| AlbumPhoto {
                    tag: camera.tag.clone(),
                    file_name: format!("{}.jpeg", camera.tag),
                    data,
                })
            })
            .collect()
    }
}

/// One camera fetch; None on any failure
async fn fetch_snapshot(client: &AccessClient, url: &str) -> Option<Vec<u8>> {
    match client.fetch(url).await {
        Ok(resp) if resp.status == StatusCode::OK => {
            tracing::debug!(
                camera_id = %client.tag(),
                size = resp.body.len(),
                "Snapshot fetched"
            );
            Some(resp.body)
        }
        Ok(resp) => {
            tracing::debug!(
                camera_id = %client.tag(),
                status = %resp.status,
                "Snapshot rejected"
            );
            None
        }
        Err(e) => {
            tracing::debug!(
                camera_id = %client.tag(),
                error = %e,
                "Snapshot request failed"
            );
            None
        }
    }
}
