//! slowroll.toml client configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cache::DocumentCache;
use crate::error::{ClientError, ClientResult};

fn default_cache_name() -> String {
    "slowroll".to_string()
}

fn default_timeout() -> String {
    "10s".to_string()
}

fn default_cache_enabled() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Where the rollout document is published (`http://`, `file://` or a path).
    pub url: String,
    #[serde(default = "default_cache_name")]
    pub cache_name: String,
    /// Defaults to `$XDG_CACHE_HOME/slowroll`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,
    #[serde(default = "default_cache_enabled")]
    pub cache: bool,
    /// Fetch timeout, e.g. `"10s"` or `"1500ms"`.
    #[serde(default = "default_timeout")]
    pub timeout: String,
}

impl ClientConfig {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            cache_name: default_cache_name(),
            cache_dir: None,
            cache: default_cache_enabled(),
            timeout: default_timeout(),
        }
    }

    pub fn from_file(path: &Path) -> ClientResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> ClientResult<Self> {
        toml::from_str(content).map_err(|e| ClientError::Config(e.to_string()))
    }

    pub fn to_toml_string(&self) -> ClientResult<String> {
        toml::to_string_pretty(self).map_err(|e| ClientError::Config(e.to_string()))
    }

    /// The fetch timeout. Must be positive.
    pub fn timeout(&self) -> ClientResult<Duration> {
        let delta = slowroll::parse_duration(&self.timeout)?;
        delta
            .to_std()
            .ok()
            .filter(|d| !d.is_zero())
            .ok_or_else(|| ClientError::Config(format!("timeout must be positive, got {:?}", self.timeout)))
    }

    /// The document cache, unless disabled or no cache directory is known.
    pub fn document_cache(&self) -> Option<DocumentCache> {
        if !self.cache {
            return None;
        }
        let dir = self.cache_dir.clone().or_else(DocumentCache::default_dir)?;
        Some(DocumentCache::new(dir, &self.cache_name))
    }
}
