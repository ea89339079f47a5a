//! Camera Status Tracker
//!
//! Remembers the last liveness classification per camera and reports
//! lost/recovered transitions. Only transitions are logged.

use std::collections::HashMap;
use tokio::sync::RwLock;

/// Camera connection status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraConnectionStatus {
    /// Never probed
    Unknown,
    /// Reachable (answered 401 to the probe)
    Online,
    /// Timed out / refused / unexpected status
    Offline,
}

/// Camera status transition event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraStatusEvent {
    /// Online → Offline, or first probe failed
    Lost,
    /// Offline → Online
    Recovered,
}

/// Tracks camera reachability between probe rounds
pub struct CameraStatusTracker {
    statuses: RwLock<HashMap<String, CameraConnectionStatus>>,
}

impl CameraStatusTracker {
    /// Create new tracker
    pub fn new() -> Self {
        Self {
            statuses: RwLock::new(HashMap::new()),
        }
    }

    /// Record one probe result and return the transition, if any
    pub async fn update_status(&self, tag: &str, available: bool) -> Option<CameraStatusEvent> {
        let mut statuses = self.statuses.write().await;

        let new_status = if available {
            CameraConnectionStatus::Online
        } else {
            CameraConnectionStatus::Offline
        };

        let prev = statuses
            .insert(tag.to_string(), new_status)
            .unwrap_or(CameraConnectionStatus::Unknown);

        match (prev, new_status) {
            (CameraConnectionStatus::Online, CameraConnectionStatus::Offline) => {
                tracing::warn!(camera_id = %tag, "Camera connection lost");
                Some(CameraStatusEvent::Lost)
            }
            (CameraConnectionStatus::Unknown, CameraConnectionStatus::Offline) => {
                tracing::warn!(camera_id = %tag, "Camera unreachable on first probe");
                Some(CameraStatusEvent::Lost)
            }
            (CameraConnectionStatus::Offline, CameraConnectionStatus::Online) => {
                tracing::info!(camera_id = %tag, "Camera connection recovered");
                Some(CameraStatusEvent::Recovered)
            }
            _ => None,
        }
    }
}

impl Default for CameraStatusTracker {
    fn default() -> Self {
        Self::new()
    }
}
