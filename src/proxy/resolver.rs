//! Endpoint to backend URL resolution.
//!
//! [`RouteTable`] holds the two lookup tables (endpoint name to service
//! name, service name to base URL). It is built once at startup and
//! never mutated afterwards, so request flows read it concurrently
//! through a shared reference without locking.

use std::collections::HashMap;

use crate::config::model::Config;
use crate::error::ProxyError;

#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    services: HashMap<String, String>,
    endpoints: HashMap<String, String>,
}

/// A resolved destination for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTarget {
    pub endpoint: String,
    pub service_name: String,
    pub base_url: String,
    pub target_url: String,
}

impl RouteTarget {
    /// Target URL with the inbound query string appended, if any.
    #[must_use]
    pub fn url_with_query(&self, query: Option<&str>) -> String {
        match query {
            Some(q) if !q.is_empty() => format!("{}?{q}", self.target_url),
            _ => self.target_url.clone(),
        }
    }
}

impl RouteTable {
    #[must_use]
    pub fn new(services: HashMap<String, String>, endpoints: HashMap<String, String>) -> Self {
        Self {
            services,
            endpoints,
        }
    }

    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.services.clone().into_iter().collect(),
            config.endpoints.clone().into_iter().collect(),
        )
    }

    #[must_use]
    pub fn service_count(&self) -> usize {
        self.services.len()
    }

    #[must_use]
    pub fn endpoint_count(&self) -> usize {
        self.endpoints.len()
    }

    /// Resolve the path below the mount prefix (e.g. `/login`) to a backend URL.
    ///
    /// A single trailing `/` is tolerated. Anything left after stripping the
    /// separators is percent-decoded and looked up as a whole, so `/%6Cogin`
    /// is `login` and `/a/b` is the unknown endpoint `a/b`.
    pub fn resolve(&self, path: &str) -> Result<RouteTarget, ProxyError> {
        let raw = path.strip_prefix('/').unwrap_or(path);
        let raw = raw.strip_suffix('/').unwrap_or(raw);

        if raw.is_empty() {
            return Err(ProxyError::InvalidPath);
        }

        let endpoint = urlencoding::decode(raw)
            .map_err(|_| ProxyError::UnknownEndpoint(raw.to_string()))?;
        let endpoint: &str = &endpoint;

        let service_name = self
            .endpoints
            .get(endpoint)
            .ok_or_else(|| ProxyError::UnknownEndpoint(endpoint.to_string()))?;

        let base_url =
            self.services
                .get(service_name)
                .ok_or_else(|| ProxyError::MissingServiceConfig {
                    endpoint: endpoint.to_string(),
                    service: service_name.clone(),
                })?;

        Ok(RouteTarget {
            endpoint: endpoint.to_string(),
            service_name: service_name.clone(),
            base_url: base_url.clone(),
            target_url: format!("{}/{endpoint}", base_url.trim_end_matches('/')),
        })
    }
}
