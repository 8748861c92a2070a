//! Concrete [`ConfigSource`](super::ConfigSource) implementations.
//!
//! Provides the file-based source (YAML, JSON, TOML, each gated by a
//! feature flag) and the [`parse_config_str`] helper for format-specific
//! deserialization.

pub mod file_source;

use sha2::{Digest, Sha256};

use crate::config::model::Config;
use crate::error::PorticoError;

/// Parse a config string based on file extension.
pub fn parse_config_str(
    ext: &str,
    content: &str,
    path_display: &str,
) -> Result<Config, PorticoError> {
    match ext {
        #[cfg(feature = "yaml")]
        "yaml" | "yml" => serde_yml::from_str(content).map_err(|e| PorticoError::ConfigParse {
            path: path_display.to_string(),
            source: Box::new(e),
        }),

        #[cfg(feature = "json")]
        "json" => serde_json::from_str(content).map_err(|e| PorticoError::ConfigParse {
            path: path_display.to_string(),
            source: Box::new(e),
        }),

        #[cfg(feature = "toml")]
        "toml" => toml::from_str(content).map_err(|e| PorticoError::ConfigParse {
            path: path_display.to_string(),
            source: Box::new(e),
        }),

        other => Err(PorticoError::UnsupportedFormat(other.to_string())),
    }
}

/// Compute a lowercase hex-encoded SHA-256 digest.
#[must_use]
pub fn sha256_hex(data: &[u8]) -> String {
    format!("{:x}", Sha256::digest(data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_is_lowercase_hex() {
        let digest = sha256_hex(b"portico");
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let err = parse_config_str("ini", "", "portico.ini").unwrap_err();
        assert!(matches!(err, PorticoError::UnsupportedFormat(ref ext) if ext == "ini"));
    }
}
