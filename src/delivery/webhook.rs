//! WebhookTransport - HTTP multipart delivery

use super::{AlbumPhoto, MediaTransport, VideoClip};
use crate::config_store::UserId;
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde_json::json;
use std::time::Duration;

/// Posts media to `{base_url}/video`, `{base_url}/album`, `{base_url}/text`
pub struct WebhookTransport {
    client: reqwest::Client,
    base_url: String,
}

impl WebhookTransport {
    /// Create new WebhookTransport
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post_form(&self, path: &str, form: Form) -> Result<()> {
        let url = format!("{}/{}", self.base_url, path);
        let resp = self.client.post(&url).multipart(form).send().await?;
        Self::check(&url, resp.status())
    }

    fn check(url: &str, status: reqwest::StatusCode) -> Result<()> {
        if status.is_success() {
            return Ok(());
        }

        Err(Error::Delivery(format!("{} returned {}", url, status)))
    }
}

#[async_trait]
impl MediaTransport for WebhookTransport {
    async fn send_video(&self, user_id: UserId, clip: &VideoClip) -> Result<()> {
        let mut form = Form::new()
            .text("user_id", user_id.to_string())
            .text("width", clip.resolution.width.to_string())
            .text("height", clip.resolution.height.to_string())
            .part(
                "video",
                Part::bytes(clip.data.clone())
                    .file_name(clip.file_name.clone())
                    .mime_str("video/mp4")?,
            );

        if let Some(ref caption) = clip.caption {
            form = form.text("caption", caption.clone());
        }

        self.post_form("video", form).await?;

        tracing::debug!(
            user_id = user_id,
            file = %clip.file_name,
            size = clip.data.len(),
            "Video delivered via webhook"
        );
        Ok(())
    }

    async fn send_album(&self, user_id: UserId, photos: &[AlbumPhoto]) -> Result<()> {
        let tags: Vec<&str> = photos.iter().map(|p| p.tag.as_str()).collect();

        let mut form = Form::new()
            .text("user_id", user_id.to_string())
            .text("tags", tags.join(","));

        for photo in photos {
            form = form.part(
                "photo",
                Part::bytes(photo.data.clone())
                    .file_name(photo.file_name.clone())
                    .mime_str("image/jpeg")?,
            );
        }

        self.post_form("album", form).await
    }

    async fn send_text(&self, user_id: UserId, text: &str) -> Result<()> {
        let url = format!("{}/text", self.base_url);
        let resp = self
            .client
            .post(&url)
            .json(&json!({ "user_id": user_id, "text": text }))
            .send()
            .await?;

        Self::check(&url, resp.status())
    }
}
