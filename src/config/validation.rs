//! Configuration validation with detailed error reporting.
//!
//! The [`validate`] function checks a parsed [`Config`] eagerly, before
//! any request is served: the mount path, the upstream limits, every
//! service base URL, every endpoint name, and the invariant that each
//! endpoint refers to a declared service. Returns a list of
//! [`ValidationError`] values with suggestions where one can be guessed.

use url::Url;

use super::model::Config;
use crate::error::ValidationError;

/// Validate the gateway mount path. Returns `Ok(())` or a human-readable error.
pub fn validate_mount_path(path: &str) -> Result<(), String> {
    if path.is_empty() {
        return Err("mount path cannot be empty".into());
    }
    if !path.starts_with('/') {
        return Err(format!("mount path must start with '/' (got '{path}')"));
    }
    if path.trim_end_matches('/').is_empty() {
        return Err("mount path cannot be the root '/', it would shadow /health".into());
    }
    if path.contains(['?', '#', '*']) || path.parse::<hyper::Uri>().is_err() {
        return Err(format!("mount path '{path}' must be a plain path"));
    }
    Ok(())
}

/// Validate a service base URL. Returns `Ok(())` or a human-readable error.
pub fn validate_base_url(url: &str) -> Result<(), String> {
    let parsed = Url::parse(url).map_err(|_| format!("'{url}' is not a valid URL"))?;
    let scheme = parsed.scheme();
    if scheme != "http" && scheme != "https" {
        return Err(format!(
            "unsupported scheme '{scheme}' (expected http or https)"
        ));
    }
    if parsed.query().is_some() || parsed.fragment().is_some() {
        return Err(format!(
            "'{url}' must not carry a query or fragment, endpoint names are appended to it"
        ));
    }
    // Url::parse percent-encodes what the outbound client would refuse.
    let sample_target = format!("{}/endpoint", url.trim_end_matches('/'));
    if sample_target.parse::<hyper::Uri>().is_err() {
        return Err(format!(
            "'{url}' contains characters that are not allowed in a URL"
        ));
    }
    Ok(())
}

/// Validate an endpoint name, which must be exactly one path segment.
pub fn validate_endpoint_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("endpoint name cannot be empty".into());
    }
    if name.contains('/') {
        return Err(format!("endpoint '{name}' must be a single path segment"));
    }
    if name.contains(|c: char| c.is_whitespace() || matches!(c, '?' | '#' | '%'))
        || format!("/{name}").parse::<hyper::Uri>().is_err()
    {
        return Err(format!(
            "endpoint '{name}' contains characters that cannot appear in a path segment"
        ));
    }
    Ok(())
}

pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let gateway = &config.gateway;

    if let Err(msg) = validate_mount_path(&gateway.mount_path) {
        errors.push(ValidationError {
            key: "gateway.mount_path".into(),
            message: msg,
            suggestion: if gateway.mount_path.is_empty() || gateway.mount_path.starts_with('/') {
                None
            } else {
                Some(format!("did you mean '/{}'?", gateway.mount_path))
            },
        });
    }

    if gateway.timeout == 0 {
        errors.push(ValidationError {
            key: "gateway.timeout".into(),
            message: "timeout must be greater than 0 ms".into(),
            suggestion: None,
        });
    }

    if gateway.max_response_body == 0 {
        errors.push(ValidationError {
            key: "gateway.max_response_body".into(),
            message: "max_response_body must be greater than 0 bytes".into(),
            suggestion: None,
        });
    }

    if config.endpoints.is_empty() {
        errors.push(ValidationError {
            key: "endpoints".into(),
            message: "at least one endpoint must be defined".into(),
            suggestion: None,
        });
        return Err(errors);
    }

    for (name, url) in &config.services {
        if let Err(msg) = validate_base_url(url) {
            errors.push(ValidationError {
                key: format!("services.{name}"),
                message: msg,
                suggestion: None,
            });
        }
    }

    for (endpoint, service) in &config.endpoints {
        let key = format!("endpoints.{endpoint}");

        if let Err(msg) = validate_endpoint_name(endpoint) {
            errors.push(ValidationError {
                key: key.clone(),
                message: msg,
                suggestion: endpoint
                    .split('/')
                    .find(|s| !s.is_empty())
                    .filter(|_| endpoint.contains('/'))
                    .map(|first| format!("did you mean '{first}'?")),
            });
        }

        if !config.services.contains_key(service) {
            errors.push(ValidationError {
                key,
                message: format!("service '{service}' is not declared under services"),
                suggestion: config
                    .services
                    .keys()
                    .find(|known| known.eq_ignore_ascii_case(service))
                    .map(|known| format!("did you mean '{known}'?")),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[must_use]
pub fn format_validation_report(path: &str, config: &Config) -> String {
    let gateway = &config.gateway;
    let mut lines = vec![format!(
        "  {} services, {} endpoints (mounted at {}, timeout {}ms)\n",
        config.services.len(),
        config.endpoints.len(),
        gateway.mount_path,
        gateway.timeout,
    )];

    for (endpoint, service) in &config.endpoints {
        let base = config.services.get(service).map_or("?", String::as_str);
        lines.push(format!(
            "  {}/{endpoint}  -> {service} ({}/{endpoint})",
            gateway.mount_prefix(),
            base.trim_end_matches('/'),
        ));
    }

    let unused = config.unused_services();
    if !unused.is_empty() {
        lines.push(format!("\n  unused services: {}", unused.join(", ")));
    }

    format!("{} is valid\n{}", path, lines.join("\n"))
}
