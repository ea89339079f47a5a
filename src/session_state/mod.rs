//! SessionState - per-user workflow store
//!
//! ## Responsibilities
//!
//! - Correlate the steps of the record workflow across separate events
//! - One entry per (user, stage); a later set overwrites
//! - Abandoned selections expire after the TTL
//!
//! A single RwLock covers the whole map. Fine for a small user base;
//! every get/set across all users is serialized on it.

use crate::config_store::UserId;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Default TTL for pending selections (10 minutes)
pub const DEFAULT_SESSION_TTL_SECS: i64 = 600;

/// Workflow stage (session key)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkflowStage {
    /// Waiting for the user to pick a camera
    CameraSelection,
    /// Camera picked, waiting for a duration
    DurationSelection,
}

/// Workflow payload stored per stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionValue {
    /// Cameras offered to the user
    PendingCamera { offered_tags: Vec<String> },
    /// Camera chosen; stream URL kept for the capture step
    PendingDuration {
        tag: String,
        camera_name: String,
        stream_url: String,
    },
}

struct SessionEntry {
    value: SessionValue,
    stored_at: DateTime<Utc>,
}

/// In-memory session store (lost on restart)
pub struct SessionStore {
    entries: RwLock<HashMap<(UserId, WorkflowStage), SessionEntry>>,
    ttl: Duration,
}

impl SessionStore {
    /// Create new store with the given TTL
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Create with default TTL
    pub fn with_defaults() -> Self {
        Self::new(Duration::seconds(DEFAULT_SESSION_TTL_SECS))
    }

    /// Store a value (overwrites)
    pub async fn set(&self, user_id: UserId, stage: WorkflowStage, value: SessionValue) {
        let mut entries = self.entries.write().await;
        entries.insert(
            (user_id, stage),
            SessionEntry {
                value,
                stored_at: Utc::now(),
            },
        );
    }

    /// Read a value; expired entries read as absent
    pub async fn get(&self, user_id: UserId, stage: WorkflowStage) -> Option<SessionValue> {
        let entries = self.entries.read().await;
        entries
            .get(&(user_id, stage))
            .filter(|entry| !self.is_expired(entry))
            .map(|entry| entry.value.clone())
    }

    /// Remove and return a value
    pub async fn take(&self, user_id: UserId, stage: WorkflowStage) -> Option<SessionValue> {
        let mut entries = self.entries.write().await;
        entries
            .remove(&(user_id, stage))
            .filter(|entry| !self.is_expired(entry))
            .map(|entry| entry.value)
    }

    /// Remove a single stage entry
    pub async fn remove(&self, user_id: UserId, stage: WorkflowStage) {
        self.entries.write().await.remove(&(user_id, stage));
    }

    /// Drop expired entries; returns how many were removed
    pub async fn purge_expired(&self) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| !self.is_expired(entry));
        let purged = before - entries.len();

        if purged > 0 {
            tracing::debug!(purged = purged, remaining = entries.len(), "Expired sessions purged");
        }

        purged
    }

    /// Number of stored entries (including not yet purged expired ones)
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    fn is_expired(&self, entry: &SessionEntry) -> bool {
        Utc::now().signed_duration_since(entry.stored_at) > self.ttl
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn pending(tag: &str) -> SessionValue {
        SessionValue::PendingDuration {
            tag: tag.to_string(),
            camera_name: tag.to_uppercase(),
            stream_url: format!("rtsp://admin:pw@{}:554/ISAPI/Streaming/Channels/101", tag),
        }
    }

    #[tokio::test]
    async fn test_set_then_get() {
        let store = SessionStore::with_defaults();
        store.set(1, WorkflowStage::DurationSelection, pending("garage")).await;

        assert_eq!(
            store.get(1, WorkflowStage::DurationSelection).await,
            Some(pending("garage"))
        );
    }

    #[tokio::test]
    async fn test_get_unset() {
        let store = SessionStore::with_defaults();
        assert!(store.get(1, WorkflowStage::DurationSelection).await.is_none());

        store.set(1, WorkflowStage::DurationSelection, pending("garage")).await;
        assert!(store.get(1, WorkflowStage::CameraSelection).await.is_none());
        assert!(store.get(2, WorkflowStage::DurationSelection).await.is_none());
    }

    #[tokio::test]
    async fn test_set_overwrites() {
        let store = SessionStore::with_defaults();
        store.set(1, WorkflowStage::DurationSelection, pending("garage")).await;
        store.set(1, WorkflowStage::DurationSelection, pending("yard")).await;

        assert_eq!(store.len().await, 1);
        assert_eq!(
            store.get(1, WorkflowStage::DurationSelection).await,
            Some(pending("yard"))
        );
    }

    #[tokio::test]
    async fn test_take_removes() {
        let store = SessionStore::with_defaults();
        store.set(1, WorkflowStage::DurationSelection, pending("garage")).await;

        assert!(store.take(1, WorkflowStage::DurationSelection).await.is_some());
        assert!(store.take(1, WorkflowStage::DurationSelection).await.is_none());
    }

    #[tokio::test]
    async fn test_expired_entry_reads_absent_and_is_purged() {
        let store = SessionStore::new(Duration::milliseconds(20));
        store.set(1, WorkflowStage::DurationSelection, pending("garage")).await;

        tokio::time::sleep(std::time::Duration::from_millis(60)).await;

        assert!(store.get(1, WorkflowStage::DurationSelection).await.is_none());
        assert_eq!(store.purge_expired().await, 1);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_concurrent_users_do_not_interfere() {
        let store = Arc::new(SessionStore::with_defaults());

        let mut handles = Vec::new();
        for user_id in 0..64i64 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                for round in 0..10 {
                    let tag = format!("cam-{}-{}", user_id, round);
                    store
                        .set(user_id, WorkflowStage::DurationSelection, pending(&tag))
                        .await;
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(store.len().await, 64);
        for user_id in 0..64i64 {
            let expected = pending(&format!("cam-{}-9", user_id));
            assert_eq!(
                store.get(user_id, WorkflowStage::DurationSelection).await,
                Some(expected)
            );
        }
    }
}
