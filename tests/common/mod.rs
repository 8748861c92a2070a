//! Shared harness for integration tests: an in-process gateway and a
//! mock backend that echoes what it received.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use portico::config::model::Config;
use portico::config::ConfigVersion;
use portico::server::{self, AppState, LoadedConfig};

pub const MAX_BODY: usize = 1_048_576;

/// What the mock backend saw, echoed back as its response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct Echo {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl Echo {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn header_values(&self, name: &str) -> Vec<&str> {
        self.headers
            .iter()
            .filter(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
            .collect()
    }
}

pub struct Gateway {
    pub addr: SocketAddr,
    pub state: Arc<AppState>,
    shutdown: Option<tokio::sync::oneshot::Sender<()>>,
    handle: Option<tokio::task::JoinHandle<()>>,
}

impl Gateway {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    /// Signal graceful shutdown and wait for the server task to finish.
    pub async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            handle.await.unwrap();
        }
    }
}

pub fn config(
    mount_path: &str,
    services: &[(&str, String)],
    endpoints: &[(&str, &str)],
) -> Config {
    let mut config = Config::default();
    config.gateway.mount_path = mount_path.to_string();
    config.services = services
        .iter()
        .map(|(name, url)| ((*name).to_string(), url.clone()))
        .collect::<BTreeMap<_, _>>();
    config.endpoints = endpoints
        .iter()
        .map(|(endpoint, service)| ((*endpoint).to_string(), (*service).to_string()))
        .collect::<BTreeMap<_, _>>();
    config
}

/// The usual layout: `/api/{login,register,teapot,slow}` on a `users`
/// service rooted at `<backend>/users`.
pub fn users_config(backend: SocketAddr) -> Config {
    config(
        "/api",
        &[("users", format!("http://{backend}/users"))],
        &[
            ("login", "users"),
            ("register", "users"),
            ("teapot", "users"),
            ("slow", "users"),
        ],
    )
}

pub async fn start_gateway(config: Config, max_body: usize) -> Gateway {
    let loaded = LoadedConfig {
        version: ConfigVersion::Hash("test-hash".into()),
        source_name: "test".into(),
        loaded_at: Instant::now(),
    };
    let state = Arc::new(AppState::new(&config, loaded, max_body));
    let router = server::build_router(Arc::clone(&state));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
    let handle = tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
            .unwrap();
    });

    Gateway {
        addr,
        state,
        shutdown: Some(shutdown_tx),
        handle: Some(handle),
    }
}

/// Start the mock backend.
///
/// Every path echoes the request, except:
/// - `POST */login` with body `{"u":"a"}` answers `201 {"id":1}`
/// - `*/teapot` answers 418 with custom and repeated headers
/// - `*/slow` waits two seconds before echoing
pub async fn start_backend() -> SocketAddr {
    let app = Router::new().fallback(any(backend_handler));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

async fn backend_handler(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Response {
    let path = uri.path().to_string();

    if path.ends_with("/login") && method == Method::POST && body.as_ref() == br#"{"u":"a"}"# {
        return (StatusCode::CREATED, Json(serde_json::json!({"id": 1}))).into_response();
    }

    if path.ends_with("/teapot") {
        return Response::builder()
            .status(StatusCode::IM_A_TEAPOT)
            .header("content-type", "text/plain")
            .header("x-upstream", "mock")
            .header("set-cookie", "a=1")
            .header("set-cookie", "b=2")
            .body(Body::from("short and stout"))
            .unwrap();
    }

    if path.ends_with("/slow") {
        tokio::time::sleep(Duration::from_secs(2)).await;
    }

    let echo = Echo {
        method: method.to_string(),
        path,
        query: uri.query().map(String::from),
        headers: headers
            .iter()
            .map(|(k, v)| {
                (
                    k.as_str().to_string(),
                    String::from_utf8_lossy(v.as_bytes()).into_owned(),
                )
            })
            .collect(),
        body: String::from_utf8_lossy(&body).into_owned(),
    };
    Json(echo).into_response()
}

/// An address nothing listens on.
pub async fn refused_addr() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}
