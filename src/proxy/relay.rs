//! Relay of a backend response to the original caller.
//!
//! The caller sees exactly the backend's status code and every backend
//! header in order, unfiltered, followed by the backend body bytes.

use axum::body::Body;
use axum::response::{IntoResponse, Response};

use super::forward::ForwardedResponse;

#[must_use]
pub fn relay(forwarded: ForwardedResponse) -> Response {
    let ForwardedResponse {
        status,
        headers,
        body,
    } = forwarded;

    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}

impl IntoResponse for ForwardedResponse {
    fn into_response(self) -> Response {
        relay(self)
    }
}
