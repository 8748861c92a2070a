//! `portico init`: generate a starter configuration file.
//!
//! Writes a YAML, JSON, or TOML config with either a minimal or a fully
//! commented template. An existing file is never overwritten.

use std::path::PathBuf;

use crate::cli::{ConfigFormat, InitArgs};
use crate::error::PorticoError;

pub fn execute(args: &InitArgs) -> Result<(), PorticoError> {
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(format!("portico.{}", args.format.extension())));

    if output.exists() {
        return Err(PorticoError::FileExists { path: output });
    }

    std::fs::write(&output, template(&args.format, args.full))?;
    println!("Created {}", output.display());
    Ok(())
}

const fn template(format: &ConfigFormat, full: bool) -> &'static str {
    match (format, full) {
        (ConfigFormat::Yaml, false) => YAML_MINIMAL,
        (ConfigFormat::Yaml, true) => YAML_FULL,
        (ConfigFormat::Json, false) => JSON_MINIMAL,
        (ConfigFormat::Json, true) => JSON_FULL,
        (ConfigFormat::Toml, false) => TOML_MINIMAL,
        (ConfigFormat::Toml, true) => TOML_FULL,
    }
}

const YAML_MINIMAL: &str = r#"# portico config

services:
  users: "http://localhost:8080/users"

endpoints:
  login: users
  register: users
"#;

const YAML_FULL: &str = r#"# portico config
#
# Requests to <mount_path>/<endpoint> are forwarded to <service base URL>/<endpoint>.
# All gateway values shown are defaults. Uncomment and modify as needed.

gateway:
  mount_path: "/api"             # Prefix every endpoint is served under
  # timeout: 5000                # Backend timeout in ms (connect + response)
  # max_response_body: 10485760  # Largest backend body relayed, in bytes
  # strip_hop_by_hop: false      # Drop Connection, TE, etc. before forwarding

# Service name -> base URL (http or https, no query string)
services:
  users: "http://localhost:8080/users"
  # orders: "http://localhost:8081/orders"

# Endpoint name (single path segment) -> service name
endpoints:
  login: users
  register: users
  # checkout: orders
"#;

const JSON_MINIMAL: &str = r#"{
  "services": {
    "users": "http://localhost:8080/users"
  },
  "endpoints": {
    "login": "users",
    "register": "users"
  }
}
"#;

const JSON_FULL: &str = r#"{
  "gateway": {
    "mount_path": "/api",
    "timeout": 5000,
    "max_response_body": 10485760,
    "strip_hop_by_hop": false
  },
  "services": {
    "users": "http://localhost:8080/users"
  },
  "endpoints": {
    "login": "users",
    "register": "users"
  }
}
"#;

const TOML_MINIMAL: &str = r#"# portico config

[services]
users = "http://localhost:8080/users"

[endpoints]
login = "users"
register = "users"
"#;

const TOML_FULL: &str = r#"# portico config
#
# Requests to <mount_path>/<endpoint> are forwarded to <service base URL>/<endpoint>.
# All gateway values shown are defaults. Uncomment and modify as needed.

[gateway]
mount_path = "/api"
# timeout = 5000
# max_response_body = 10485760
# strip_hop_by_hop = false

[services]
users = "http://localhost:8080/users"
# orders = "http://localhost:8081/orders"

[endpoints]
login = "users"
register = "users"
# checkout = "orders"
"#;
