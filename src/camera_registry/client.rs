//! Per-camera HTTP clients
//!
//! - AccessClient: digest-authenticated snapshot fetch
//! - LivenessClient: short-timeout request without credentials

use crate::error::{Error, Result};
use reqwest::header::{AUTHORIZATION, WWW_AUTHENTICATE};
use reqwest::{StatusCode, Url};
use std::time::Duration;

/// Response of a snapshot request
#[derive(Debug, Clone)]
pub struct SnapshotResponse {
    pub status: StatusCode,
    /// Body bytes (only read for 200)
    pub body: Vec<u8>,
}

/// Authenticated client bound to one camera's credentials
#[derive(Clone)]
pub struct AccessClient {
    tag: String,
    client: reqwest::Client,
    username: String,
    password: String,
}

impl AccessClient {
    /// Create new AccessClient
    pub fn new(
        tag: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            tag: tag.into(),
            client,
            username: username.into(),
            password: password.into(),
        })
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// GET with HTTP digest authentication
    ///
    /// The first request goes out without credentials. A 401 carrying a
    /// Digest challenge is answered once; any other response is final.
    pub async fn fetch(&self, url: &str) -> Result<SnapshotResponse> {
        let resp = self.client.get(url).send().await?;

        if resp.status() != StatusCode::UNAUTHORIZED {
            return Self::read(resp).await;
        }

        let challenge = resp
            .headers()
            .get(WWW_AUTHENTICATE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let Some(challenge) = challenge else {
            return Self::read(resp).await;
        };

        if !challenge.trim_start().to_ascii_lowercase().starts_with("digest") {
            tracing::debug!(
                camera_id = %self.tag,
                challenge = %challenge,
                "Camera did not offer digest auth"
            );
            return Self::read(resp).await;
        }

        let authorization = self.answer_challenge(url, &challenge)?;

        let resp = self
            .client
            .get(url)
            .header(AUTHORIZATION, authorization)
            .send()
            .await?;

        Self::read(resp).await
    }

    /// Build the Authorization header for a Digest challenge
    fn answer_challenge(&self, url: &str, challenge: &str) -> Result<String> {
        let parsed = Url::parse(url)
            .map_err(|e| Error::Validation(format!("invalid snapshot url {}: {}", url, e)))?;

        let uri = match parsed.query() {
            Some(query) => format!("{}?{}", parsed.path(), query),
            None => parsed.path().to_string(),
        };

        let mut prompt = digest_auth::parse(challenge)
            .map_err(|e| Error::Internal(format!("invalid digest challenge: {}", e)))?;

        let context =
            digest_auth::AuthContext::new(self.username.as_str(), self.password.as_str(), uri.as_str());

        let answer = prompt
            .respond(&context)
            .map_err(|e| Error::Internal(format!("digest response failed: {}", e)))?;

        Ok(answer.to_header_string())
    }

    async fn read(resp: reqwest::Response) -> Result<SnapshotResponse> {
        let status = resp.status();

        if status != StatusCode::OK {
            return Ok(SnapshotResponse {
                status,
                body: Vec::new(),
            });
        }

        let bytes = resp.bytes().await?;
        Ok(SnapshotResponse {
            status,
            body: bytes.to_vec(),
        })
    }
}

/// Credential-less reachability client
#[derive(Clone)]
pub struct LivenessClient {
    client: reqwest::Client,
}

impl LivenessClient {
    /// Create new LivenessClient
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    /// GET and return only the status code
    pub async fn probe(&self, url: &str) -> Result<StatusCode> {
        let resp = self.client.get(url).send().await?;
        Ok(resp.status())
    }
}
