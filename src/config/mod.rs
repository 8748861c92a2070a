//! Configuration loading and validation.
//!
//! Defines the [`ConfigSource`] trait for pluggable config backends and
//! the [`ConfigVersion`] enum identifying the loaded content. The routing
//! tables are read once at startup and never reloaded: every request sees
//! the same immutable tables for the life of the process. Submodules
//! provide the data model, validation logic, and concrete sources.

pub mod model;
pub mod sources;
pub mod validation;

use async_trait::async_trait;

use crate::error::PorticoError;
use model::Config;

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigVersion {
    Hash(String),
}

impl ConfigVersion {
    /// Short form used in logs and the health payload.
    #[must_use]
    pub fn short(&self) -> &str {
        match self {
            Self::Hash(h) => h.get(..8).unwrap_or(h),
        }
    }
}

// async_trait is required here because ConfigSource is used as Box<dyn ConfigSource>
// and native async fn in traits does not support dyn dispatch.
#[async_trait]
pub trait ConfigSource: Send + Sync {
    fn name(&self) -> &'static str;
    async fn load(&self) -> Result<(Config, ConfigVersion), PorticoError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_version_truncates_hash() {
        let version = ConfigVersion::Hash("abcdef1234567890".into());
        assert_eq!(version.short(), "abcdef12");
    }

    #[test]
    fn short_version_keeps_short_hash() {
        let version = ConfigVersion::Hash("abc".into());
        assert_eq!(version.short(), "abc");
    }
}
