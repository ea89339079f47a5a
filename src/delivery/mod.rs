//! Delivery - outbound media to users
//!
//! `MediaTransport` is the seam to whatever carries messages to users.
//! `WebhookTransport` posts multipart payloads to an HTTP endpoint.

mod webhook;

pub use webhook::WebhookTransport;

use crate::config_store::UserId;
use crate::error::Result;
use crate::recording::Resolution;
use async_trait::async_trait;

/// Finished clip ready for delivery
#[derive(Debug, Clone)]
pub struct VideoClip {
    pub file_name: String,
    pub data: Vec<u8>,
    pub resolution: Resolution,
    pub caption: Option<String>,
}

/// One image of a snapshot album
#[derive(Debug, Clone)]
pub struct AlbumPhoto {
    pub tag: String,
    pub file_name: String,
    pub data: Vec<u8>,
}

/// Outbound transport used by the core
#[async_trait]
pub trait MediaTransport: Send + Sync {
    /// Deliver a recorded clip
    async fn send_video(&self, user_id: UserId, clip: &VideoClip) -> Result<()>;

    /// Deliver a snapshot album
    async fn send_album(&self, user_id: UserId, photos: &[AlbumPhoto]) -> Result<()>;

    /// Deliver a short text notice
    async fn send_text(&self, user_id: UserId, text: &str) -> Result<()>;
}
