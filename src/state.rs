//! Application state
//!
//! Holds all shared components and state

use crate::camera_registry::{
    CameraRegistry, RegistryOptions, DEFAULT_FETCH_TIMEOUT_MS, DEFAULT_LIVENESS_TIMEOUT_MS,
};
use crate::config_store::ConfigStore;
use crate::delivery::MediaTransport;
use crate::liveness_prober::LivenessProber;
use crate::recording::{
    MediaTools, RecordingOptions, RecordingOrchestrator, DEFAULT_CAPTURE_GRACE_SECS,
};
use crate::session_state::{SessionStore, DEFAULT_SESSION_TTL_SECS};
use crate::snapshot_service::SnapshotService;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Fleet file (cameras, permissions, delivery)
    pub config_path: PathBuf,
    /// Temp clip directory
    pub recording_dir: PathBuf,
    /// Server port
    pub port: u16,
    /// Server host
    pub host: String,
    /// Running inside a container (RTSP over TCP)
    pub is_docker: bool,
    pub fetch_timeout_ms: u64,
    pub liveness_timeout_ms: u64,
    pub session_ttl_secs: i64,
    /// Watchdog slack on top of the clip length
    pub capture_grace_secs: u64,
    /// Pause between failed delivery attempts
    pub delivery_retry_delay_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        let config_path = std::env::var("CONFIG_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_config_path());
        let recording_dir = std::env::var("RECORDING_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| parent_dir(&config_path));

        Self {
            config_path,
            recording_dir,
            port: env_parse("PORT", 8080),
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            is_docker: std::env::var("IS_DOCKER")
                .map(|v| v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
            fetch_timeout_ms: env_parse("FETCH_TIMEOUT_MS", DEFAULT_FETCH_TIMEOUT_MS),
            liveness_timeout_ms: env_parse("LIVENESS_TIMEOUT_MS", DEFAULT_LIVENESS_TIMEOUT_MS),
            session_ttl_secs: env_parse("SESSION_TTL_SECS", DEFAULT_SESSION_TTL_SECS),
            capture_grace_secs: env_parse("CAPTURE_GRACE_SECS", DEFAULT_CAPTURE_GRACE_SECS),
            delivery_retry_delay_ms: env_parse("DELIVERY_RETRY_DELAY_MS", 1000),
        }
    }
}

impl AppConfig {
    pub fn registry_options(&self) -> RegistryOptions {
        RegistryOptions {
            fetch_timeout: Duration::from_millis(self.fetch_timeout_ms),
            liveness_timeout: Duration::from_millis(self.liveness_timeout_ms),
        }
    }

    pub fn recording_options(&self) -> RecordingOptions {
        let mut options = RecordingOptions::new(&self.recording_dir);
        options.retry_delay = Duration::from_millis(self.delivery_retry_delay_ms);
        options
    }

    pub fn capture_grace(&self) -> Duration {
        Duration::from_secs(self.capture_grace_secs)
    }

    /// Selection TTL; non-positive or out of range values fall back to the default
    pub fn session_ttl(&self) -> chrono::Duration {
        let secs = if self.session_ttl_secs < 1 {
            tracing::warn!(session_ttl_secs = self.session_ttl_secs, "Invalid session TTL, using default");
            DEFAULT_SESSION_TTL_SECS
        } else {
            self.session_ttl_secs
        };

        chrono::Duration::try_seconds(secs).unwrap_or_else(|| {
            tracing::warn!(session_ttl_secs = secs, "Session TTL out of range, using default");
            chrono::Duration::seconds(DEFAULT_SESSION_TTL_SECS)
        })
    }
}

/// `$HOME/.config/cameras-bot/config.json`
fn default_config_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home)
        .join(".config")
        .join("cameras-bot")
        .join("config.json")
}

fn parent_dir(path: &Path) -> PathBuf {
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Application config
    pub config: AppConfig,
    /// ConfigStore (fleet file)
    pub config_store: Arc<ConfigStore>,
    /// CameraRegistry (per-camera clients)
    pub registry: Arc<CameraRegistry>,
    /// LivenessProber
    pub prober: Arc<LivenessProber>,
    /// SnapshotService
    pub snapshots: Arc<SnapshotService>,
    /// SessionStore (record workflow)
    pub sessions: Arc<SessionStore>,
    /// RecordingOrchestrator
    pub recorder: Arc<RecordingOrchestrator>,
    /// Outbound transport
    pub transport: Arc<dyn MediaTransport>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Wire all components around an already set up registry
    pub fn new(
        config: AppConfig,
        config_store: Arc<ConfigStore>,
        registry: Arc<CameraRegistry>,
        tools: Arc<dyn MediaTools>,
        transport: Arc<dyn MediaTransport>,
    ) -> Self {
        let prober = Arc::new(LivenessProber::new(registry.clone()));
        let snapshots = Arc::new(SnapshotService::new(registry.clone(), prober.clone()));
        let sessions = Arc::new(SessionStore::new(config.session_ttl()));
        let recorder = Arc::new(RecordingOrchestrator::new(
            config_store.clone(),
            registry.clone(),
            sessions.clone(),
            tools,
            transport.clone(),
            config.recording_options(),
        ));

        Self {
            config,
            config_store,
            registry,
            prober,
            snapshots,
            sessions,
            recorder,
            transport,
            started_at: Utc::now(),
        }
    }

    pub fn uptime_sec(&self) -> u64 {
        Utc::now()
            .signed_duration_since(self.started_at)
            .num_seconds()
            .max(0) as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parent_dir() {
        assert_eq!(
            parent_dir(Path::new("/etc/cameras-bot/config.json")),
            PathBuf::from("/etc/cameras-bot")
        );
        assert_eq!(parent_dir(Path::new("config.json")), PathBuf::from("."));
    }

    #[test]
    fn test_default_config_path_layout() {
        let path = default_config_path();
        assert!(path.ends_with(".config/cameras-bot/config.json"));
    }

    #[test]
    fn test_session_ttl_falls_back_on_bad_values() {
        let mut config = AppConfig::default();

        config.session_ttl_secs = 30;
        assert_eq!(config.session_ttl(), chrono::Duration::seconds(30));

        config.session_ttl_secs = -5;
        assert_eq!(config.session_ttl(), chrono::Duration::seconds(600));

        config.session_ttl_secs = 0;
        assert_eq!(config.session_ttl(), chrono::Duration::seconds(600));

        config.session_ttl_secs = i64::MAX;
        assert_eq!(config.session_ttl(), chrono::Duration::seconds(600));
    }

    #[test]
    fn test_env_parse_fallback() {
        assert_eq!(env_parse("CAMERAS_BOT_TEST_UNSET_KEY", 42u64), 42);
    }
}
