//! ConfigStore - Fleet configuration
//!
//! ## Responsibilities
//!
//! - Load camera descriptors / permissions from config.json once at startup
//! - Permission lookup (`get_permissions_for`)
//! - Read-only for the rest of the process lifetime
//!
//! Constructed explicitly and shared through `Arc`, never a global.

mod repository;
mod types;

pub use repository::ConfigRepository;
pub use types::*;

use crate::error::Result;
use std::path::Path;

/// ConfigStore instance
#[derive(Debug, Clone)]
pub struct ConfigStore {
    fleet: FleetConfig,
}

impl ConfigStore {
    /// Load from a config.json path
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let repo = ConfigRepository::new(path.as_ref());
        let fleet = repo.load().await?;

        tracing::info!(
            path = %repo.path().display(),
            cameras = fleet.cameras.len(),
            permissions = fleet.permissions.len(),
            "Fleet config loaded"
        );
        tracing::debug!(fleet = %fleet, "Fleet config contents");

        Ok(Self { fleet })
    }

    /// Wrap an already parsed fleet config
    pub fn from_fleet(fleet: FleetConfig) -> Self {
        Self { fleet }
    }

    /// Ordered camera descriptor list
    pub fn cameras(&self) -> &[CameraDescriptor] {
        &self.fleet.cameras
    }

    pub fn admin_id(&self) -> UserId {
        self.fleet.admin_id
    }

    pub fn delivery(&self) -> Option<&DeliveryConfig> {
        self.fleet.delivery.as_ref()
    }

    /// Permission lookup (None = user not configured)
    pub fn get_permissions_for(&self, user_id: UserId) -> Option<&CameraPermissions> {
        self.fleet.get_permissions_for(user_id)
    }
}
