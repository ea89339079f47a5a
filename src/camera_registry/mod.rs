//! CameraRegistry - per-camera access clients
//!
//! ## Responsibilities
//!
//! - Build one AccessClient (digest auth) and one LivenessClient per camera
//! - All-or-nothing setup: one bad descriptor aborts the whole fleet
//! - Tag lookup; read-only after setup

mod client;
mod types;

pub use client::{AccessClient, LivenessClient, SnapshotResponse};
pub use types::*;

use crate::config_store::CameraDescriptor;
use crate::error::{Error, Result};
use std::collections::HashMap;

/// Clients and resolved endpoints for one camera
struct CameraEntry {
    access: AccessClient,
    liveness: LivenessClient,
    snapshot_url: String,
    stream_url: String,
}

/// CameraRegistry instance
pub struct CameraRegistry {
    /// Ordered as in the config file
    descriptors: Vec<CameraDescriptor>,
    entries: HashMap<String, CameraEntry>,
}

impl CameraRegistry {
    /// Build clients for every descriptor
    ///
    /// Fails if any camera lacks credentials or a tag appears twice.
    pub fn setup(descriptors: &[CameraDescriptor], options: &RegistryOptions) -> Result<Self> {
        let mut entries = HashMap::with_capacity(descriptors.len());

        for camera in descriptors {
            if camera.user.is_empty() {
                return Err(Error::Config(format!(
                    "missing username for camera with tag: {}",
                    camera.tag
                )));
            }
            if camera.pass.is_empty() {
                return Err(Error::Config(format!(
                    "missing password for camera with tag: {}",
                    camera.tag
                )));
            }

            if entries.contains_key(&camera.tag) {
                return Err(Error::Config(format!(
                    "duplicate camera tag: {}",
                    camera.tag
                )));
            }

            let entry = CameraEntry {
                access: AccessClient::new(
                    camera.tag.clone(),
                    camera.user.clone(),
                    camera.pass.clone(),
                    options.fetch_timeout,
                )?,
                liveness: LivenessClient::new(options.liveness_timeout)?,
                snapshot_url: snapshot_url(&camera.host),
                stream_url: stream_url(camera),
            };

            entries.insert(camera.tag.clone(), entry);
        }

        tracing::info!(
            cameras = entries.len(),
            fetch_timeout_ms = options.fetch_timeout.as_millis() as u64,
            liveness_timeout_ms = options.liveness_timeout.as_millis() as u64,
            "CameraRegistry initialized"
        );

        Ok(Self {
            descriptors: descriptors.to_vec(),
            entries,
        })
    }

    /// AccessClient for a tag
    pub fn get(&self, tag: &str) -> Result<&AccessClient> {
        self.entry(tag).map(|e| &e.access)
    }

    /// LivenessClient for a tag
    pub fn liveness(&self, tag: &str) -> Result<&LivenessClient> {
        self.entry(tag).map(|e| &e.liveness)
    }

    pub fn snapshot_url(&self, tag: &str) -> Result<&str> {
        self.entry(tag).map(|e| e.snapshot_url.as_str())
    }

    pub fn stream_url(&self, tag: &str) -> Result<&str> {
        self.entry(tag).map(|e| e.stream_url.as_str())
    }

    /// Registered descriptors in config order
    pub fn descriptors(&self) -> &[CameraDescriptor] {
        &self.descriptors
    }

    pub fn descriptor(&self, tag: &str) -> Option<&CameraDescriptor> {
        self.descriptors.iter().find(|c| c.tag == tag)
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.entries.contains_key(tag)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn entry(&self, tag: &str) -> Result<&CameraEntry> {
        self.entries
            .get(tag)
            .ok_or_else(|| Error::NotFound(format!("no camera client found for {}", tag)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera(tag: &str, pass: &str) -> CameraDescriptor {
        CameraDescriptor {
            tag: tag.to_string(),
            name: tag.to_uppercase(),
            user: "admin".to_string(),
            pass: pass.to_string(),
            host: "192.168.88.111".to_string(),
        }
    }

    #[test]
    fn test_setup_and_get() {
        let registry = CameraRegistry::setup(
            &[camera("garage", "pw"), camera("yard", "pw")],
            &RegistryOptions::default(),
        )
        .unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get("garage").unwrap().tag(), "garage");
        assert!(registry.liveness("yard").is_ok());
        assert_eq!(registry.descriptors()[1].tag, "yard");
    }

    #[test]
    fn test_get_unknown_tag() {
        let registry =
            CameraRegistry::setup(&[camera("garage", "pw")], &RegistryOptions::default()).unwrap();

        assert!(matches!(registry.get("attic"), Err(Error::NotFound(_))));
        assert!(matches!(registry.stream_url("attic"), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_missing_password_aborts_whole_fleet() {
        let result = CameraRegistry::setup(
            &[camera("garage", "pw"), camera("yard", "")],
            &RegistryOptions::default(),
        );

        match result {
            Err(Error::Config(msg)) => {
                assert_eq!(msg, "missing password for camera with tag: yard")
            }
            _ => panic!("expected config error"),
        }
    }

    #[test]
    fn test_missing_username_reported_as_such() {
        let mut nameless = camera("yard", "pw");
        nameless.user.clear();

        let result = CameraRegistry::setup(&[nameless], &RegistryOptions::default());
        match result {
            Err(Error::Config(msg)) => {
                assert_eq!(msg, "missing username for camera with tag: yard")
            }
            _ => panic!("expected config error"),
        }
    }

    #[test]
    fn test_duplicate_tag_rejected() {
        let result = CameraRegistry::setup(
            &[camera("garage", "pw"), camera("garage", "pw2")],
            &RegistryOptions::default(),
        );
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_empty_fleet() {
        let registry = CameraRegistry::setup(&[], &RegistryOptions::default()).unwrap();
        assert!(registry.is_empty());
    }
}
