//! ConfigStore Repository
//!
//! File access layer for the fleet config

use super::types::FleetConfig;
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Reads config.json from disk
#[derive(Debug, Clone)]
pub struct ConfigRepository {
    path: PathBuf,
}

impl ConfigRepository {
    /// Create new repository
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and parse the fleet file
    pub async fn load(&self) -> Result<FleetConfig> {
        let bytes = fs::read(&self.path).await.map_err(|e| {
            Error::Config(format!("failed to read {}: {}", self.path.display(), e))
        })?;

        Self::parse(&bytes)
    }

    /// Parse fleet JSON
    pub fn parse(bytes: &[u8]) -> Result<FleetConfig> {
        serde_json::from_slice(bytes)
            .map_err(|e| Error::Config(format!("invalid fleet config: {}", e)))
    }
}
