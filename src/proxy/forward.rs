//! Outbound request construction and execution.
//!
//! A [`ForwardedRequest`] mirrors the inbound request: one of the four
//! supported methods, the filtered header set, and (for POST and PUT
//! only) the inbound body read fully into memory. [`forward`] sends it to
//! the resolved target and collects the backend's status, headers and
//! body into a [`ForwardedResponse`].
//!
//! Any status the backend answers with is a successful forward. Only a
//! failed exchange (refused connection, DNS failure, broken body, timeout)
//! is reported as a [`TransportError`].

use std::time::Duration;

use axum::body::Body;
use axum::http::{HeaderMap, Method, StatusCode};
use bytes::Bytes;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};

use super::headers::build_forwarded_headers;
use crate::error::{ProxyError, TransportError};
use crate::server::HttpClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForwardMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl ForwardMethod {
    /// Only POST and PUT forward a request body.
    #[must_use]
    pub const fn carries_body(self) -> bool {
        matches!(self, Self::Post | Self::Put)
    }

    #[must_use]
    pub const fn as_method(self) -> Method {
        match self {
            Self::Get => Method::GET,
            Self::Post => Method::POST,
            Self::Put => Method::PUT,
            Self::Delete => Method::DELETE,
        }
    }
}

impl TryFrom<&Method> for ForwardMethod {
    type Error = ProxyError;

    fn try_from(method: &Method) -> Result<Self, Self::Error> {
        match method {
            &Method::GET => Ok(Self::Get),
            &Method::POST => Ok(Self::Post),
            &Method::PUT => Ok(Self::Put),
            &Method::DELETE => Ok(Self::Delete),
            other => Err(ProxyError::UnsupportedMethod(other.to_string())),
        }
    }
}

#[derive(Debug)]
pub struct ForwardedRequest {
    pub method: ForwardMethod,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl ForwardedRequest {
    /// Build the outbound request from the inbound headers and body.
    ///
    /// The inbound body is only read for POST and PUT, and never beyond
    /// `max_body` bytes. For GET and DELETE it is dropped unread.
    pub async fn capture(
        method: ForwardMethod,
        inbound_headers: &HeaderMap,
        body: Body,
        max_body: usize,
        strip_hop_by_hop: bool,
    ) -> Result<Self, ProxyError> {
        let headers = build_forwarded_headers(inbound_headers, strip_hop_by_hop);

        let body = if method.carries_body() {
            read_body(body, max_body).await?
        } else {
            Bytes::new()
        };

        Ok(Self {
            method,
            headers,
            body,
        })
    }
}

#[derive(Debug)]
pub struct ForwardedResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

#[derive(Debug, Clone, Copy)]
pub struct UpstreamLimits {
    pub timeout: Duration,
    pub max_response_body: usize,
}

pub async fn forward(
    client: &HttpClient,
    request: ForwardedRequest,
    target_url: &str,
    limits: UpstreamLimits,
) -> Result<ForwardedResponse, ProxyError> {
    let uri: hyper::Uri = target_url
        .parse()
        .map_err(|e: hyper::http::uri::InvalidUri| ProxyError::InvalidTargetUrl {
            url: target_url.to_string(),
            reason: e.to_string(),
        })?;

    let mut outbound = hyper::Request::new(Full::new(request.body));
    *outbound.method_mut() = request.method.as_method();
    *outbound.uri_mut() = uri;
    *outbound.headers_mut() = request.headers;

    // The timeout covers the whole exchange, body included.
    let exchange = async {
        let response = client
            .request(outbound)
            .await
            .map_err(|e| TransportError::Connect {
                url: target_url.to_string(),
                reason: error_chain(&e),
            })?;

        let (parts, body) = response.into_parts();
        let body = Limited::new(body, limits.max_response_body)
            .collect()
            .await
            .map_err(|e| {
                if is_length_limit(e.as_ref()) {
                    TransportError::BodyTooLarge {
                        url: target_url.to_string(),
                        limit: limits.max_response_body,
                    }
                } else {
                    TransportError::Body {
                        url: target_url.to_string(),
                        reason: error_chain(e.as_ref()),
                    }
                }
            })?
            .to_bytes();

        Ok::<_, TransportError>(ForwardedResponse {
            status: parts.status,
            headers: parts.headers,
            body,
        })
    };

    match tokio::time::timeout(limits.timeout, exchange).await {
        Ok(result) => result.map_err(ProxyError::from),
        Err(_) => Err(TransportError::Timeout {
            url: target_url.to_string(),
            timeout_ms: u64::try_from(limits.timeout.as_millis()).unwrap_or(u64::MAX),
        }
        .into()),
    }
}

async fn read_body(body: Body, limit: usize) -> Result<Bytes, ProxyError> {
    axum::body::to_bytes(body, limit).await.map_err(|e| {
        if is_length_limit(&e) {
            ProxyError::PayloadTooLarge { limit }
        } else {
            ProxyError::BodyRead(error_chain(&e))
        }
    })
}

fn is_length_limit(err: &(dyn std::error::Error + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(e) = current {
        if e.is::<LengthLimitError>() {
            return true;
        }
        current = e.source();
    }
    false
}

/// Render an error with its sources, e.g. `client error (Connect): tcp connect error: ...`.
fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
