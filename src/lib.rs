//! cameras-bot Library
//!
//! Chat-driven access to a fleet of IP security cameras.
//!
//! ## Architecture (8 Components)
//!
//! 1. ConfigStore - fleet file: cameras, permissions, delivery
//! 2. CameraRegistry - per-camera digest / liveness clients
//! 3. SnapshotService - concurrent snapshot fetch, "all" album
//! 4. LivenessProber - concurrent reachability check
//! 5. SessionStore - per-user workflow state with expiry
//! 6. RecordingOrchestrator - capture → probe → deliver
//! 7. Delivery - outbound transport seam
//! 8. WebAPI - REST endpoints standing in for chat commands

pub mod camera_registry;
pub mod config_store;
pub mod delivery;
pub mod liveness_prober;
pub mod recording;
pub mod session_state;
pub mod snapshot_service;
pub mod web_api;
pub mod models;
pub mod error;
pub mod state;

pub use error::{Error, Result};
pub use state::AppState;
