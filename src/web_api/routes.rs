//! API Routes

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use std::collections::BTreeMap;

use super::Caller;
use crate::camera_registry::CameraChoice;
use crate::config_store::UserId;
use crate::error::{Error, Result};
use crate::models::{ApiResponse, ChooseCameraRequest, ChooseDurationRequest, SnapshotsResponse};
use crate::recording::{DurationBucket, RecordingOutcome};
use crate::state::AppState;

/// Create API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/healthz", get(super::health_check))
        // Commands
        .route("/api/cameras", get(list_cameras))
        .route("/api/cameras/status", get(camera_status))
        .route("/api/snapshots", post(send_snapshots))
        .route("/api/recordings", post(begin_recording))
        // Selections
        .route("/api/recordings/camera", post(choose_camera))
        .route("/api/recordings/duration", post(choose_duration))
        .with_state(state)
}

// ========================================
// Commands
// ========================================

/// "about": cameras the caller may use
async fn list_cameras(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<ApiResponse<Vec<CameraChoice>>>> {
    audit(&state, caller, "about").await;
    let tags = permitted_tags(&state, caller.0)?;

    let cameras: Vec<CameraChoice> = state
        .registry
        .descriptors()
        .iter()
        .filter(|camera| tags.contains(&camera.tag))
        .map(CameraChoice::from)
        .collect();

    Ok(Json(ApiResponse::success(cameras)))
}

/// Liveness of the caller's cameras
async fn camera_status(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<ApiResponse<BTreeMap<String, bool>>>> {
    audit(&state, caller, "status").await;
    let tags = permitted_tags(&state, caller.0)?;

    let liveness = state.prober.check_available_cameras().await;
    let status: BTreeMap<String, bool> = tags
        .into_iter()
        .filter(|tag| state.registry.contains(tag))
        .map(|tag| {
            let available = liveness.get(&tag).copied().unwrap_or(false);
            (tag, available)
        })
        .collect();

    Ok(Json(ApiResponse::success(status)))
}

/// "all": one album with a snapshot from every reachable permitted camera
async fn send_snapshots(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<ApiResponse<SnapshotsResponse>>> {
    audit(&state, caller, "all").await;
    let tags = permitted_tags(&state, caller.0)?;

    let album = state.snapshots.permitted_album(&tags).await;
    let delivered: Vec<String> = album.iter().map(|photo| photo.tag.clone()).collect();

    if album.is_empty() {
        tracing::info!(user_id = caller.0, "No camera answered, album skipped");
    } else {
        state.transport.send_album(caller.0, &album).await?;
        tracing::info!(user_id = caller.0, photos = album.len(), "Snapshot album delivered");
    }

    Ok(Json(ApiResponse::success(SnapshotsResponse { delivered })))
}

/// "record": start the workflow
async fn begin_recording(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<ApiResponse<Vec<CameraChoice>>>> {
    audit(&state, caller, "record").await;
    let choices = state.recorder.begin(caller.0).await?;
    Ok(Json(ApiResponse::success(choices)))
}

// ========================================
// Selections
// ========================================

async fn choose_camera(
    State(state): State<AppState>,
    caller: Caller,
    Json(req): Json<ChooseCameraRequest>,
) -> Result<Json<ApiResponse<Vec<DurationBucket>>>> {
    audit(&state, caller, "record camera").await;

    match state.recorder.choose_camera(caller.0, &req.tag).await? {
        Some(buckets) => Ok(Json(ApiResponse::success(buckets))),
        None => Ok(Json(ApiResponse::empty())),
    }
}

async fn choose_duration(
    State(state): State<AppState>,
    caller: Caller,
    Json(req): Json<ChooseDurationRequest>,
) -> Result<Json<ApiResponse<RecordingOutcome>>> {
    audit(&state, caller, "record duration").await;
    let bucket: DurationBucket = req.bucket.parse()?;

    match state.recorder.choose_duration(caller.0, bucket).await? {
        Some(outcome) => Ok(Json(ApiResponse::success(outcome))),
        None => Ok(Json(ApiResponse::empty())),
    }
}

// ========================================
// Helpers
// ========================================

fn permitted_tags(state: &AppState, user_id: UserId) -> Result<Vec<String>> {
    state
        .config_store
        .get_permissions_for(user_id)
        .map(|permissions| permissions.tags.clone())
        .ok_or_else(|| Error::Forbidden(format!("no available cameras for user {}", user_id)))
}

/// Tell the admin about commands run by anyone else
async fn audit(state: &AppState, caller: Caller, command: &str) {
    let admin_id = state.config_store.admin_id();
    if admin_id == 0 || caller.0 == admin_id {
        return;
    }

    let text = format!("user {} ran {}", caller.0, command);
    if let Err(e) = state.transport.send_text(admin_id, &text).await {
        tracing::warn!(user_id = caller.0, command = command, error = %e, "Admin notice failed");
    }
}
