//! Generic async file-based config source.
//!
//! [`FileSource`] implements [`ConfigSource`] for any file format by
//! accepting a deserialization function at construction time. It reads
//! the file asynchronously via Tokio, validates the result, and computes
//! a SHA-256 hash of the content as the config version.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::sha256_hex;
use crate::config::model::Config;
use crate::config::validation::validate;
use crate::config::{ConfigSource, ConfigVersion};
use crate::error::PorticoError;

type Deserialize = fn(&str) -> Result<Config, Box<dyn std::error::Error + Send + Sync>>;

pub struct FileSource {
    path: PathBuf,
    name: &'static str,
    deserialize: Deserialize,
}

impl FileSource {
    #[must_use]
    pub fn new(path: PathBuf, name: &'static str, deserialize: Deserialize) -> Self {
        Self {
            path,
            name,
            deserialize,
        }
    }

    /// Pick the deserializer from the file extension.
    pub fn for_path(path: &Path) -> Result<Self, PorticoError> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        match ext {
            #[cfg(feature = "yaml")]
            "yaml" | "yml" => Ok(Self::new(path.to_path_buf(), "yaml", |content| {
                serde_yml::from_str::<Config>(content).map_err(Into::into)
            })),

            #[cfg(feature = "json")]
            "json" => Ok(Self::new(path.to_path_buf(), "json", |content| {
                serde_json::from_str::<Config>(content).map_err(Into::into)
            })),

            #[cfg(feature = "toml")]
            "toml" => Ok(Self::new(path.to_path_buf(), "toml", |content| {
                toml::from_str::<Config>(content).map_err(Into::into)
            })),

            other => Err(PorticoError::UnsupportedFormat(other.to_string())),
        }
    }

    async fn read_content(&self) -> Result<String, PorticoError> {
        tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                PorticoError::ConfigFileNotFound {
                    path: self.path.clone(),
                }
            } else {
                PorticoError::Io(e)
            }
        })
    }
}

#[async_trait]
impl ConfigSource for FileSource {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn load(&self) -> Result<(Config, ConfigVersion), PorticoError> {
        let content = self.read_content().await?;

        let config = (self.deserialize)(&content).map_err(|e| PorticoError::ConfigParse {
            path: self.path.display().to_string(),
            source: e,
        })?;

        if let Err(errors) = validate(&config) {
            return Err(PorticoError::ConfigValidation { errors });
        }

        let hash = sha256_hex(content.as_bytes());
        Ok((config, ConfigVersion::Hash(hash)))
    }
}
