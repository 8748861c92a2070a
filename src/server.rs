//! Axum server setup, shared application state, and graceful shutdown.
//!
//! Contains [`AppState`] (the `Arc`-shared state holding the immutable
//! routing tables, gateway settings, HTTP client, stats, and uptime),
//! [`build_router`] for constructing the Axum router with middleware
//! layers, [`build_http_client`] for the outbound hyper client, and
//! [`shutdown_signal`] for SIGTERM / Ctrl+C handling.

use std::any::Any;
use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;

use crate::config::model::{Config, GatewaySettings};
use crate::config::ConfigVersion;
use crate::error::respond_error;
use crate::health::health_handler;
use crate::proxy;
use crate::proxy::forward::UpstreamLimits;
use crate::proxy::resolver::RouteTable;

/// Where the running configuration came from.
#[derive(Debug)]
pub struct LoadedConfig {
    pub version: ConfigVersion,
    pub source_name: String,
    pub loaded_at: Instant,
}

#[derive(Debug)]
pub struct Stats {
    pub forwarded: AtomicU64,
    pub failed: AtomicU64,
}

impl Default for Stats {
    fn default() -> Self {
        Self::new()
    }
}

impl Stats {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            forwarded: AtomicU64::new(0),
            failed: AtomicU64::new(0),
        }
    }
}

pub type HttpsConnector =
    hyper_rustls::HttpsConnector<hyper_util::client::legacy::connect::HttpConnector>;
pub type HttpClient = Client<HttpsConnector, http_body_util::Full<bytes::Bytes>>;

/// State shared by every request flow.
///
/// `routes` and `settings` are written once here and only read afterwards,
/// so no lock guards them.
pub struct AppState {
    pub routes: RouteTable,
    pub settings: GatewaySettings,
    pub max_request_body: usize,
    pub loaded: LoadedConfig,
    pub http_client: HttpClient,
    pub start_time: Instant,
    pub stats: Stats,
}

impl AppState {
    #[must_use]
    pub fn new(config: &Config, loaded: LoadedConfig, max_request_body: usize) -> Self {
        Self {
            routes: RouteTable::from_config(config),
            settings: config.gateway.clone(),
            max_request_body,
            loaded,
            http_client: build_http_client(),
            start_time: Instant::now(),
            stats: Stats::new(),
        }
    }

    #[must_use]
    pub fn upstream_limits(&self) -> UpstreamLimits {
        UpstreamLimits {
            timeout: Duration::from_millis(self.settings.timeout),
            max_response_body: self.settings.max_response_body,
        }
    }
}

/// Outbound client. Idle connections are not pooled, so every connection
/// lives only as long as the forward that opened it.
#[must_use]
pub fn build_http_client() -> HttpClient {
    // When multiple rustls crypto providers are compiled in, rustls cannot
    // auto-detect which one to use. Explicitly install `ring` as the default.
    let _ = rustls::crypto::ring::default_provider().install_default();

    let https = hyper_rustls::HttpsConnectorBuilder::new()
        .with_webpki_roots()
        .https_or_http()
        .enable_http1()
        .build();
    Client::builder(TokioExecutor::new())
        .pool_max_idle_per_host(0)
        .build(https)
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .fallback(proxy::gateway_handler)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CatchPanicLayer::custom(handle_panic)),
        )
        .with_state(state)
}

/// Turn a panic inside a request flow into a JSON 500 carrying the panic message.
fn handle_panic(payload: Box<dyn Any + Send + 'static>) -> Response {
    let message = payload
        .downcast_ref::<String>()
        .cloned()
        .or_else(|| payload.downcast_ref::<&str>().map(|s| (*s).to_string()))
        .unwrap_or_else(|| "internal error".to_string());

    tracing::error!(error = %message, "request handler panicked");
    respond_error(StatusCode::INTERNAL_SERVER_ERROR, message)
}

pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("received Ctrl+C"),
        () = terminate => tracing::info!("received SIGTERM"),
    }
}
