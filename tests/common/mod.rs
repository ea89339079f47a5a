// Shared fixtures: mock cameras, fake media tools, recording transport.
#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::http::{header, HeaderMap, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use md5::{Digest, Md5};
use tokio::net::TcpListener;
use tokio::sync::Mutex;

use cameras_bot::camera_registry::{CameraRegistry, RegistryOptions, SNAPSHOT_PATH};
use cameras_bot::config_store::{
    CameraDescriptor, CameraPermissions, ConfigStore, FleetConfig, UserId,
};
use cameras_bot::delivery::{AlbumPhoto, MediaTransport, VideoClip};
use cameras_bot::recording::{CaptureRequest, MediaTools, Resolution};
use cameras_bot::state::{AppConfig, AppState};
use cameras_bot::{Error, Result};

pub const DIGEST_REALM: &str = "IP Camera";
pub const DIGEST_NONCE: &str = "4e6f6e63654e6f6e6365";
pub const DIGEST_CHALLENGE: &str =
    r#"Digest realm="IP Camera", qop="auth", nonce="4e6f6e63654e6f6e6365", opaque="0a1b2c""#;

/// Credentials every mock camera accepts
pub const CAMERA_USER: &str = "admin";
pub const CAMERA_PASS: &str = "s3cret";

/// How a mock camera answers the snapshot endpoint
#[derive(Debug, Clone, Copy)]
pub enum CameraBehavior {
    /// 401 + Digest challenge without credentials, 200 with them
    Digest,
    /// 500 for everything
    Broken,
    /// Digest camera that answers after a delay
    Slow(Duration),
    /// 200 without asking for credentials
    Open,
}

/// Start a mock camera; returns its `host:port`
pub async fn start_camera(behavior: CameraBehavior, jpeg: &'static [u8]) -> SocketAddr {
    let app = Router::new().route(
        SNAPSHOT_PATH,
        get(move |uri: Uri, headers: HeaderMap| async move {
            respond(behavior, jpeg, uri, headers).await
        }),
    );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

async fn respond(
    behavior: CameraBehavior,
    jpeg: &'static [u8],
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    match behavior {
        CameraBehavior::Broken => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        CameraBehavior::Open => (StatusCode::OK, jpeg).into_response(),
        CameraBehavior::Digest => digest(jpeg, &uri, &headers),
        CameraBehavior::Slow(delay) => {
            tokio::time::sleep(delay).await;
            digest(jpeg, &uri, &headers)
        }
    }
}

fn md5_hex(input: &str) -> String {
    format!("{:x}", Md5::digest(input.as_bytes()))
}

/// `key=value` / `key="value"` pairs of a Digest Authorization header
fn digest_fields(value: &str) -> Option<HashMap<String, String>> {
    let params = value.strip_prefix("Digest ")?;
    Some(
        params
            .split(',')
            .filter_map(|part| part.trim().split_once('='))
            .map(|(k, v)| (k.trim().to_string(), v.trim().trim_matches('"').to_string()))
            .collect(),
    )
}

/// RFC 2617 check (qop=auth) against the mock credentials and the requested URI
fn digest_valid(uri: &Uri, headers: &HeaderMap) -> bool {
    let Some(fields) = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(digest_fields)
    else {
        return false;
    };
    let field = |name: &str| fields.get(name).map(String::as_str).unwrap_or("");

    let requested = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| uri.path());
    if field("username") != CAMERA_USER
        || field("realm") != DIGEST_REALM
        || field("nonce") != DIGEST_NONCE
        || field("uri") != requested
        || field("qop") != "auth"
    {
        return false;
    }

    let ha1 = md5_hex(&format!("{}:{}:{}", CAMERA_USER, DIGEST_REALM, CAMERA_PASS));
    let ha2 = md5_hex(&format!("GET:{}", field("uri")));
    let expected = md5_hex(&format!(
        "{}:{}:{}:{}:{}:{}",
        ha1,
        DIGEST_NONCE,
        field("nc"),
        field("cnonce"),
        field("qop"),
        ha2
    ));

    field("response") == expected
}

fn digest(jpeg: &'static [u8], uri: &Uri, headers: &HeaderMap) -> Response {
    let authorized = digest_valid(uri, headers);

    if authorized {
        (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "image/jpeg")],
            jpeg,
        )
            .into_response()
    } else {
        (
            StatusCode::UNAUTHORIZED,
            [(header::WWW_AUTHENTICATE, DIGEST_CHALLENGE)],
        )
            .into_response()
    }
}

pub fn camera(tag: &str, host: impl ToString) -> CameraDescriptor {
    CameraDescriptor {
        tag: tag.to_string(),
        name: format!("{} camera", tag),
        user: CAMERA_USER.to_string(),
        pass: CAMERA_PASS.to_string(),
        host: host.to_string(),
    }
}

pub fn permissions(user_id: UserId, tags: &[&str]) -> CameraPermissions {
    CameraPermissions {
        user_id,
        tags: tags.iter().map(|t| t.to_string()).collect(),
    }
}

/// Short timeouts so slow cameras fail fast
pub fn fast_options() -> RegistryOptions {
    RegistryOptions {
        fetch_timeout: Duration::from_millis(500),
        liveness_timeout: Duration::from_millis(300),
    }
}

pub fn registry(cameras: &[CameraDescriptor]) -> Arc<CameraRegistry> {
    Arc::new(CameraRegistry::setup(cameras, &fast_options()).unwrap())
}

pub fn test_config(recording_dir: &Path) -> AppConfig {
    AppConfig {
        config_path: recording_dir.join("config.json"),
        recording_dir: recording_dir.to_path_buf(),
        port: 0,
        host: "127.0.0.1".to_string(),
        is_docker: false,
        fetch_timeout_ms: 500,
        liveness_timeout_ms: 300,
        session_ttl_secs: 600,
        capture_grace_secs: 5,
        delivery_retry_delay_ms: 0,
    }
}

/// Full application state around fakes
pub fn app_state(
    recording_dir: &Path,
    fleet: FleetConfig,
    tools: Arc<FakeTools>,
    transport: Arc<RecordingTransport>,
) -> AppState {
    let registry = registry(&fleet.cameras);
    AppState::new(
        test_config(recording_dir),
        Arc::new(ConfigStore::from_fleet(fleet)),
        registry,
        tools,
        transport,
    )
}

/// Serve a router on an ephemeral port; returns the base URL
pub async fn serve(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

// ========================================
// Fakes
// ========================================

/// Writes a small clip instead of running ffmpeg
pub struct FakeTools {
    pub probe_output: String,
    pub captures: Mutex<Vec<CaptureRequest>>,
}

impl FakeTools {
    pub fn new() -> Self {
        Self {
            probe_output: "640,480".to_string(),
            captures: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl MediaTools for FakeTools {
    async fn capture(&self, request: &CaptureRequest) -> Result<()> {
        self.captures.lock().await.push(request.clone());
        tokio::fs::write(&request.output_path, b"\x00\x00\x00\x18ftypmp42").await?;
        Ok(())
    }

    async fn probe_resolution(&self, _path: &Path) -> Result<String> {
        Ok(self.probe_output.clone())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Sent {
    Video {
        user_id: UserId,
        file_name: String,
        resolution: Resolution,
    },
    Album {
        user_id: UserId,
        tags: Vec<String>,
    },
    Text {
        user_id: UserId,
        text: String,
    },
}

/// Records everything sent; can reject the first N videos
pub struct RecordingTransport {
    rejected_videos: u32,
    video_calls: AtomicU32,
    pub sent: Mutex<Vec<Sent>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::rejecting(0)
    }

    pub fn rejecting(rejected_videos: u32) -> Self {
        Self {
            rejected_videos,
            video_calls: AtomicU32::new(0),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn video_calls(&self) -> u32 {
        self.video_calls.load(Ordering::SeqCst)
    }

    pub async fn texts_to(&self, user_id: UserId) -> Vec<String> {
        self.sent
            .lock()
            .await
            .iter()
            .filter_map(|sent| match sent {
                Sent::Text { user_id: to, text } if *to == user_id => Some(text.clone()),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl MediaTransport for RecordingTransport {
    async fn send_video(&self, user_id: UserId, clip: &VideoClip) -> Result<()> {
        let call = self.video_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call <= self.rejected_videos {
            return Err(Error::Delivery(format!("upload {} rejected", call)));
        }

        self.sent.lock().await.push(Sent::Video {
            user_id,
            file_name: clip.file_name.clone(),
            resolution: clip.resolution,
        });
        Ok(())
    }

    async fn send_album(&self, user_id: UserId, photos: &[AlbumPhoto]) -> Result<()> {
        self.sent.lock().await.push(Sent::Album {
            user_id,
            tags: photos.iter().map(|p| p.tag.clone()).collect(),
        });
        Ok(())
    }

    async fn send_text(&self, user_id: UserId, text: &str) -> Result<()> {
        self.sent.lock().await.push(Sent::Text {
            user_id,
            text: text.to_string(),
        });
        Ok(())
    }
}

pub fn dir_entries(dir: &Path) -> usize {
    std::fs::read_dir(dir).map(|entries| entries.count()).unwrap_or(0)
}
