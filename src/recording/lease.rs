//! RecordingLeases - one running job per temp file
//!
//! Two jobs for the same user and stream would write the same file.
//! The second one is refused instead of queued.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

/// Per-key lock table
#[derive(Default)]
pub struct RecordingLeases {
    locks: RwLock<HashMap<String, Arc<Mutex<()>>>>,
}

impl RecordingLeases {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the lease for `key` without waiting; None when it is held
    pub async fn try_acquire(&self, key: &str) -> Option<RecordingLease> {
        let lock = self.get_or_create_lock(key).await;

        match lock.try_lock_owned() {
            Ok(guard) => {
                tracing::debug!(key = %key, "Recording lease acquired");
                Some(RecordingLease {
                    key: key.to_string(),
                    _guard: guard,
                })
            }
            Err(_) => {
                tracing::debug!(key = %key, "Recording lease busy");
                None
            }
        }
    }

    async fn get_or_create_lock(&self, key: &str) -> Arc<Mutex<()>> {
        {
            let locks = self.locks.read().await;
            if let Some(lock) = locks.get(key) {
                return lock.clone();
            }
        }

        let mut locks = self.locks.write().await;
        locks
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

/// Held for the duration of a job; released on drop
pub struct RecordingLease {
    key: String,
    _guard: OwnedMutexGuard<()>,
}

impl Drop for RecordingLease {
    fn drop(&mut self) {
        tracing::debug!(key = %self.key, "Recording lease released");
    }
}
