//! cameras-bot - IP camera access for chat users
//!
//! Main entry point for the server.

use cameras_bot::{
    camera_registry::CameraRegistry,
    config_store::ConfigStore,
    delivery::WebhookTransport,
    recording::FfmpegTools,
    state::{AppConfig, AppState},
    web_api, Error,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Expired session sweep period
const SESSION_PURGE_INTERVAL_SECS: u64 = 60;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cameras_bot=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting cameras-bot v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = AppConfig::default();
    tracing::info!(
        config_path = %config.config_path.display(),
        recording_dir = %config.recording_dir.display(),
        is_docker = config.is_docker,
        "Configuration loaded"
    );

    let config_store = Arc::new(ConfigStore::load(&config.config_path).await?);
    tracing::info!(
        cameras = config_store.cameras().len(),
        admin_id = config_store.admin_id(),
        "ConfigStore initialized"
    );

    // 1台でも不備があれば起動しない
    let registry = Arc::new(CameraRegistry::setup(
        config_store.cameras(),
        &config.registry_options(),
    )?);
    tracing::info!(cameras = registry.len(), "CameraRegistry initialized");

    let delivery = config_store
        .delivery()
        .ok_or_else(|| Error::Config("delivery.webhook_url is not configured".to_string()))?;
    let transport = Arc::new(WebhookTransport::new(
        delivery.webhook_url.clone(),
        Duration::from_secs(delivery.timeout_secs),
    )?);
    tracing::info!(webhook_url = %transport.base_url(), "WebhookTransport initialized");

    let tools = Arc::new(FfmpegTools::new(config.is_docker, config.capture_grace()));

    let state = AppState::new(config, config_store, registry, tools, transport);

    // Start session purge task
    let sessions = state.sessions.clone();
    tokio::spawn(async move {
        let mut interval =
            tokio::time::interval(Duration::from_secs(SESSION_PURGE_INTERVAL_SECS));
        loop {
            interval.tick().await;
            sessions.purge_expired().await;
        }
    });

    let app = web_api::create_router(state.clone())
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = format!("{}:{}", state.config.host, state.config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
