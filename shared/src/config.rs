use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::capabilities::{HttpError, ResourceUrl, DEFAULT_TIMEOUT_MS, MAX_TIMEOUT_MS};
use crate::offline_cache::CacheManifest;

pub const DEFAULT_DATA_PATH: &str = "Sites.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid data path: {0}")]
    DataPath(#[source] HttpError),

    #[error("request timeout must be within 1..={max}ms, got {value}")]
    Timeout { value: u64, max: u64 },

    #[error("invalid cached asset: {0}")]
    Asset(#[source] HttpError),
}

/// Shell-provided settings. Every field has a default, so an empty JSON
/// object is a valid config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub data_path: String,
    pub request_timeout_ms: u64,
    pub cache: CacheManifest,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_path: DEFAULT_DATA_PATH.to_string(),
            request_timeout_ms: DEFAULT_TIMEOUT_MS,
            cache: CacheManifest::default(),
        }
    }
}

impl AppConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&contents)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        ResourceUrl::new(self.data_path.as_str()).map_err(ConfigError::DataPath)?;

        if self.request_timeout_ms == 0 || self.request_timeout_ms > MAX_TIMEOUT_MS {
            return Err(ConfigError::Timeout {
                value: self.request_timeout_ms,
                max: MAX_TIMEOUT_MS,
            });
        }

        for asset in &self.cache.assets {
            ResourceUrl::new(asset.as_str()).map_err(ConfigError::Asset)?;
        }

        Ok(())
    }
}
