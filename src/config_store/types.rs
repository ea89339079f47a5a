//! ConfigStore data types
//!
//! Fleet file structures: camera descriptors, permissions, delivery settings

use serde::{Deserialize, Serialize};
use std::fmt;

/// Chat/user identifier
pub type UserId = i64;

/// Camera descriptor (one per physical camera)
#[derive(Clone, Serialize, Deserialize)]
pub struct CameraDescriptor {
    /// Unique stable identifier (e.g. "garage")
    pub tag: String,
    /// Display name shown in choice lists
    pub name: String,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub pass: String,
    /// Network host, optionally with port
    pub host: String,
}

// 認証情報はログに出さない
impl fmt::Display for CameraDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{Name: {}, Tag: {}, Host: {}}}", self.name, self.tag, self.host)
    }
}

impl fmt::Debug for CameraDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CameraDescriptor")
            .field("tag", &self.tag)
            .field("name", &self.name)
            .field("user", &self.user)
            .field("pass", &"***")
            .field("host", &self.host)
            .finish()
    }
}

/// Per-user camera permissions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraPermissions {
    pub user_id: UserId,
    /// Older config files used "Tags"
    #[serde(default, alias = "Tags")]
    pub tags: Vec<String>,
}

impl CameraPermissions {
    /// Check whether the tag is granted
    pub fn allows(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

impl fmt::Display for CameraPermissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{UserId: {}, Tags: {:?}}}", self.user_id, self.tags)
    }
}

/// Delivery webhook settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryConfig {
    pub webhook_url: String,
    #[serde(default = "default_delivery_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_delivery_timeout_secs() -> u64 {
    30
}

/// Fleet config file (config.json)
///
/// Unknown keys (bot_token, app_hash, app_id) are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FleetConfig {
    #[serde(default)]
    pub admin_id: UserId,
    #[serde(default)]
    pub cameras: Vec<CameraDescriptor>,
    #[serde(default)]
    pub permissions: Vec<CameraPermissions>,
    #[serde(default)]
    pub delivery: Option<DeliveryConfig>,
}

impl FleetConfig {
    /// Look up permissions for a user (None = not a known user)
    pub fn get_permissions_for(&self, user_id: UserId) -> Option<&CameraPermissions> {
        self.permissions.iter().find(|p| p.user_id == user_id)
    }
}

impl fmt::Display for FleetConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cameras: Vec<String> = self.cameras.iter().map(|c| c.to_string()).collect();
        let permissions: Vec<String> = self.permissions.iter().map(|p| p.to_string()).collect();
        write!(
            f,
            "AdminId: {}, Cameras: [{}], Permissions: [{}]",
            self.admin_id,
            cameras.join(", "),
            permissions.join(", ")
        )
    }
}
