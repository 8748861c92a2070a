//! Serde data structures for the Portico configuration file.
//!
//! Contains [`Config`] (the root) and [`GatewaySettings`]. The two routing
//! tables are plain maps: `services` (service name to base URL) and
//! `endpoints` (endpoint name to service name). All types derive
//! `Serialize` and `Deserialize` with `deny_unknown_fields` for strict
//! parsing.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

const fn default_timeout() -> u64 {
    5000
}

const fn default_max_response_body() -> usize {
    10 * 1024 * 1024
}

fn default_mount_path() -> String {
    "/api".to_string()
}

fn is_default_timeout(v: &u64) -> bool {
    *v == default_timeout()
}

fn is_default_max_response_body(v: &usize) -> bool {
    *v == default_max_response_body()
}

fn is_default_mount_path(v: &str) -> bool {
    v == default_mount_path()
}

fn is_false(v: &bool) -> bool {
    !*v
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default, skip_serializing_if = "GatewaySettings::is_default")]
    pub gateway: GatewaySettings,

    #[serde(default)]
    pub services: BTreeMap<String, String>,

    #[serde(default)]
    pub endpoints: BTreeMap<String, String>,
}

impl Config {
    /// Services that no endpoint refers to.
    #[must_use]
    pub fn unused_services(&self) -> Vec<&str> {
        self.services
            .keys()
            .filter(|name| !self.endpoints.values().any(|s| s == *name))
            .map(String::as_str)
            .collect()
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewaySettings {
    /// Path prefix the gateway is mounted under.
    #[serde(
        default = "default_mount_path",
        skip_serializing_if = "is_default_mount_path"
    )]
    pub mount_path: String,

    /// Upstream timeout in milliseconds.
    #[serde(
        default = "default_timeout",
        skip_serializing_if = "is_default_timeout"
    )]
    pub timeout: u64,

    #[serde(
        default = "default_max_response_body",
        skip_serializing_if = "is_default_max_response_body"
    )]
    pub max_response_body: usize,

    #[serde(default, skip_serializing_if = "is_false")]
    pub strip_hop_by_hop: bool,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            mount_path: default_mount_path(),
            timeout: default_timeout(),
            max_response_body: default_max_response_body(),
            strip_hop_by_hop: false,
        }
    }
}

impl GatewaySettings {
    fn is_default(&self) -> bool {
        is_default_mount_path(&self.mount_path)
            && is_default_timeout(&self.timeout)
            && is_default_max_response_body(&self.max_response_body)
            && !self.strip_hop_by_hop
    }

    /// Mount path without trailing separators.
    #[must_use]
    pub fn mount_prefix(&self) -> &str {
        self.mount_path.trim_end_matches('/')
    }
}
