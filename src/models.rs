//! API models shared by the HTTP surface

use serde::{Deserialize, Serialize};

/// API response wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            ok: true,
            data: Some(data),
        }
    }

    /// Accepted, nothing to report (stale selection etc.)
    pub fn empty() -> Self {
        Self {
            ok: true,
            data: None,
        }
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_sec: u64,
    pub cameras: usize,
}

/// POST /api/recordings/camera
#[derive(Debug, Clone, Deserialize)]
pub struct ChooseCameraRequest {
    pub tag: String,
}

/// POST /api/recordings/duration
#[derive(Debug, Clone, Deserialize)]
pub struct ChooseDurationRequest {
    /// "05" | "15" | "30" | "60"
    pub bucket: String,
}

/// POST /api/snapshots result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotsResponse {
    /// Tags in album order
    pub delivered: Vec<String>,
}
