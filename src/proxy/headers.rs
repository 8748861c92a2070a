//! Outbound header construction.
//!
//! [`build_forwarded_headers`] copies every inbound header except `Host`
//! and `Content-Length`, which the client recomputes for the new
//! destination and payload. Repeated headers keep all their values in
//! order. When no `Content-Type` survives the copy, `application/json` is
//! set. Hop-by-hop headers are only removed when the gateway is
//! configured to do so.

use std::sync::LazyLock;

use axum::http::header::{CONTENT_LENGTH, CONTENT_TYPE, HOST};
use axum::http::{HeaderMap, HeaderName, HeaderValue};

static HOP_BY_HOP: LazyLock<Vec<HeaderName>> = LazyLock::new(|| {
    [
        "connection",
        "keep-alive",
        "transfer-encoding",
        "te",
        "trailer",
        "upgrade",
        "proxy-authorization",
    ]
    .iter()
    .filter_map(|name| name.parse::<HeaderName>().ok())
    .collect()
});

fn is_recomputed(name: &HeaderName) -> bool {
    *name == HOST || *name == CONTENT_LENGTH
}

#[must_use]
pub fn build_forwarded_headers(original: &HeaderMap, strip_hop_by_hop: bool) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(original.len() + 1);

    for (name, value) in original {
        if is_recomputed(name) || (strip_hop_by_hop && HOP_BY_HOP.contains(name)) {
            continue;
        }
        headers.append(name.clone(), value.clone());
    }

    if !headers.contains_key(CONTENT_TYPE) {
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    }

    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inbound() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("host", "gateway:3000".parse().unwrap());
        headers.insert("content-length", "12".parse().unwrap());
        headers.insert("authorization", "Bearer abc".parse().unwrap());
        headers.insert("connection", "keep-alive".parse().unwrap());
        headers
    }

    #[test]
    fn drops_host_and_content_length() {
        let result = build_forwarded_headers(&inbound(), false);
        assert!(result.get("host").is_none());
        assert!(result.get("content-length").is_none());
        assert_eq!(result.get("authorization").unwrap(), "Bearer abc");
    }

    #[test]
    fn keeps_hop_by_hop_unless_configured() {
        let kept = build_forwarded_headers(&inbound(), false);
        assert_eq!(kept.get("connection").unwrap(), "keep-alive");

        let stripped = build_forwarded_headers(&inbound(), true);
        assert!(stripped.get("connection").is_none());
        assert!(stripped.get("authorization").is_some());
    }

    #[test]
    fn hop_by_hop_list_holds_request_headers_only() {
        assert!(HOP_BY_HOP.iter().any(|name| name == "proxy-authorization"));
        assert!(!HOP_BY_HOP.iter().any(|name| name == "proxy-authenticate"));
    }

    #[test]
    fn defaults_content_type_to_json() {
        let result = build_forwarded_headers(&inbound(), false);
        assert_eq!(result.get("content-type").unwrap(), "application/json");
    }

    #[test]
    fn explicit_content_type_is_not_overridden() {
        let mut original = inbound();
        original.insert("content-type", "text/plain; charset=utf-8".parse().unwrap());
        let result = build_forwarded_headers(&original, false);
        let values: Vec<_> = result
            .get_all("content-type")
            .iter()
            .map(|v| v.to_str().unwrap())
            .collect();
        assert_eq!(values, vec!["text/plain; charset=utf-8"]);
    }

    #[test]
    fn repeated_values_are_preserved_in_order() {
        let mut original = HeaderMap::new();
        original.append("x-trace", "one".parse().unwrap());
        original.append("x-trace", "two".parse().unwrap());
        let mixed_case = HeaderName::from_bytes(b"X-Trace").unwrap();
        original.append(mixed_case, "three".parse().unwrap());

        let result = build_forwarded_headers(&original, false);
        let values: Vec<_> = result
            .get_all("x-trace")
            .iter()
            .map(|v| v.to_str().unwrap())
            .collect();
        assert_eq!(values, vec!["one", "two", "three"]);
    }
}
