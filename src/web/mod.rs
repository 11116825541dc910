//! The key-holding relay and the optional front-end file server.

use std::num::NonZeroU16;
use std::path::Path;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use tower_http::services::{ServeDir, ServeFile};
use tracing::{error, info};
use url::Url;

use crate::constants::{GENERATE_PATH, MAX_REQUEST_BODY_BYTES};

mod proxy;

use proxy::generate_handler;

/// Shared state of the relay.
#[derive(Clone)]
pub struct AppState {
    client: reqwest::Client,
    api_key: Option<String>,
    provider_base_url: Url,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("provider_base_url", &self.provider_base_url.as_str())
            .finish()
    }
}

impl AppState {
    /// A blank credential counts as unset.
    pub fn new(api_key: Option<String>, provider_base_url: Url) -> Self {
        let api_key = api_key.filter(|key| !key.trim().is_empty());

        Self {
            client: reqwest::Client::new(),
            api_key,
            provider_base_url,
        }
    }

    fn upstream_url(&self, model: &str) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.provider_base_url.as_str().trim_end_matches('/'),
            model
        )
    }
}

/// Builds the router; `static_dir`, when given, is served for every other
/// path with `index.html` as the fallback.
pub fn create_router(static_dir: Option<&Path>) -> Router<AppState> {
    let router = Router::new().route(
        GENERATE_PATH,
        axum::routing::post(generate_handler).layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES)),
    );

    match static_dir {
        Some(dir) => router.fallback_service(
            ServeDir::new(dir).fallback(ServeFile::new(dir.join("index.html"))),
        ),
        None => router,
    }
}

/// Binds the listener and serves until ctrl-c.
pub async fn setup_server(
    listen_addr: &str,
    port: NonZeroU16,
    state: AppState,
    static_dir: Option<&Path>,
) -> Result<(), anyhow::Error> {
    if state.api_key.is_none() {
        info!("No provider credential configured; generation requests will be refused");
    }
    let app = create_router(static_dir).with_state(state);

    let addr = format!("{}:{}", listen_addr, port);
    info!("Server listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    if let Err(err) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("Server error: {}", err);
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
