//! Core gateway request handling.
//!
//! The [`gateway_handler`] function is the Axum fallback that receives
//! every non-`/health` request. Each request runs through three steps:
//! [`resolver`] maps the path below the mount prefix to a backend URL,
//! [`forward`] sends the mirrored request to that URL, and [`relay`]
//! copies the backend response to the caller. Any failure along the way
//! becomes a JSON error response via [`ProxyError`].

pub mod forward;
pub mod headers;
pub mod relay;
pub mod resolver;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Instant;

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};

use crate::error::ProxyError;
use crate::server::AppState;
use forward::{ForwardMethod, ForwardedRequest, ForwardedResponse};

pub async fn gateway_handler(State(state): State<Arc<AppState>>, request: Request) -> Response {
    let started = Instant::now();
    let (parts, body) = request.into_parts();
    let correlation_id = parts
        .headers
        .get("x-correlation-id")
        .and_then(|v| v.to_str().ok())
        .map_or_else(|| uuid::Uuid::new_v4().to_string(), String::from);

    let result = proxy_request(&state, &parts, body, &correlation_id).await;
    let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

    match result {
        Ok(forwarded) => {
            state.stats.forwarded.fetch_add(1, Ordering::Relaxed);
            tracing::info!(
                correlation_id = %correlation_id,
                method = %parts.method,
                path = %parts.uri.path(),
                status = forwarded.status.as_u16(),
                latency_ms,
                "request relayed"
            );
            relay::relay(forwarded)
        }
        Err(e) => {
            state.stats.failed.fetch_add(1, Ordering::Relaxed);
            let status = e.status();
            if status.is_server_error() {
                tracing::error!(
                    correlation_id = %correlation_id,
                    method = %parts.method,
                    path = %parts.uri.path(),
                    status = status.as_u16(),
                    latency_ms,
                    error = %e,
                    "request failed"
                );
            } else {
                tracing::warn!(
                    correlation_id = %correlation_id,
                    method = %parts.method,
                    path = %parts.uri.path(),
                    status = status.as_u16(),
                    error = %e,
                    "request rejected"
                );
            }
            e.into_response()
        }
    }
}

async fn proxy_request(
    state: &AppState,
    parts: &Parts,
    body: Body,
    correlation_id: &str,
) -> Result<ForwardedResponse, ProxyError> {
    let path = parts.uri.path();
    let endpoint_path = strip_mount(state.settings.mount_prefix(), path)
        .ok_or_else(|| ProxyError::OutsideMount(path.to_string()))?;

    let target = state.routes.resolve(endpoint_path)?;
    let method = ForwardMethod::try_from(&parts.method)?;

    let request = ForwardedRequest::capture(
        method,
        &parts.headers,
        body,
        state.max_request_body,
        state.settings.strip_hop_by_hop,
    )
    .await?;

    let url = target.url_with_query(parts.uri.query());
    tracing::debug!(
        correlation_id = %correlation_id,
        endpoint = %target.endpoint,
        service = %target.service_name,
        target = %url,
        body_bytes = request.body.len(),
        "forwarding request"
    );

    forward::forward(&state.http_client, request, &url, state.upstream_limits()).await
}

/// Path below the mount prefix, or `None` when the request is not under it.
///
/// `/api` and `/api/` yield `""` and `"/"`, which the resolver rejects as
/// invalid; `/apix` is not under `/api` at all.
#[must_use]
pub fn strip_mount<'a>(prefix: &str, path: &'a str) -> Option<&'a str> {
    let rest = path.strip_prefix(prefix)?;
    (rest.is_empty() || rest.starts_with('/')).then_some(rest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_mount_prefix() {
        assert_eq!(strip_mount("/api", "/api/login"), Some("/login"));
        assert_eq!(strip_mount("/api", "/api"), Some(""));
        assert_eq!(strip_mount("/api", "/api/"), Some("/"));
    }

    #[test]
    fn rejects_paths_outside_mount() {
        assert_eq!(strip_mount("/api", "/apix/login"), None);
        assert_eq!(strip_mount("/api", "/login"), None);
    }

    #[test]
    fn nested_mount_prefix() {
        assert_eq!(strip_mount("/gateway/v1", "/gateway/v1/login"), Some("/login"));
        assert_eq!(strip_mount("/gateway/v1", "/gateway/v1x/login"), None);
    }
}
