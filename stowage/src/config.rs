//! Serializable cache configuration.
//!
//! ```yaml
//! storePrivate: false
//! storeNoStore: false
//! ignoreNoLastMod: false
//! keyPrefix: "stowage:"
//! includeRequestPropertiesInHash: [tenant]
//! excludeRequestHeadersFromHash: [x-request-id]
//! hostConfig:
//!   api.example.com:
//!     storePrivate: true
//! backend:
//!   type: Redis
//!   host: 127.0.0.1
//!   port: 6379
//! ```
//!
//! Unknown keys are ignored. Validators are code and are attached through
//! [`CacheBuilder`](crate::CacheBuilder) or [`PolicyOverrides`] values.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use stowage_backend::{Backend, MemoryBackend};
use stowage_core::PolicyOverrides;

use crate::error::ConfigError;

fn default_key_prefix() -> String {
    stowage_backend::DEFAULT_KEY_PREFIX.to_owned()
}

/// Top-level cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheConfig {
    #[serde(default)]
    pub store_private: bool,
    #[serde(default)]
    pub store_no_store: bool,
    #[serde(default)]
    pub ignore_no_last_mod: bool,
    /// Per-host policy overrides.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub host_config: BTreeMap<String, PolicyOverrides>,
    /// Extra request fields hashed into the fingerprint.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub include_request_properties_in_hash: Vec<String>,
    /// Extra request headers left out of the fingerprint.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude_request_headers_from_hash: Vec<String>,
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend: Option<BackendConfig>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            store_private: false,
            store_no_store: false,
            ignore_no_last_mod: false,
            host_config: BTreeMap::new(),
            include_request_properties_in_hash: Vec::new(),
            exclude_request_headers_from_hash: Vec::new(),
            key_prefix: default_key_prefix(),
            backend: None,
        }
    }
}

impl CacheConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_saphyr::from_str(yaml)?)
    }
}

/// Store the cache talks to.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum BackendConfig {
    /// Process-local [`MemoryBackend`].
    Memory,
    Redis(RedisConfig),
}

impl BackendConfig {
    pub fn into_backend(self) -> Result<Arc<dyn Backend>, ConfigError> {
        match self {
            BackendConfig::Memory => Ok(Arc::new(MemoryBackend::new())),
            BackendConfig::Redis(config) => config.into_backend(),
        }
    }
}

/// Redis connection parameters.
///
/// `url` wins over `unixSocket`, which wins over `host`/`port`. With none
/// of them set the backend connects to `127.0.0.1:6379`.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RedisConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unix_socket: Option<String>,
    /// Label used in logs and metrics.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl RedisConfig {
    #[cfg(feature = "redis")]
    pub fn connection_mode(&self) -> stowage_redis::ConnectionMode {
        use stowage_redis::ConnectionMode;

        if let Some(url) = &self.url {
            return ConnectionMode::url(url.clone());
        }
        if let Some(path) = &self.unix_socket {
            return ConnectionMode::unix_socket(path.clone());
        }
        ConnectionMode::tcp(
            self.host.clone().unwrap_or_else(|| "127.0.0.1".to_owned()),
            self.port.unwrap_or(6379),
        )
    }

    #[cfg(feature = "redis")]
    pub fn into_backend(self) -> Result<Arc<dyn Backend>, ConfigError> {
        use stowage_redis::RedisBackend;

        let mut builder = RedisBackend::builder().connection(self.connection_mode());
        if let Some(label) = self.label {
            builder = builder.label(label);
        }
        let backend = builder
            .build()
            .map_err(stowage_backend::BackendError::from)?;
        Ok(Arc::new(backend))
    }

    #[cfg(not(feature = "redis"))]
    pub fn into_backend(self) -> Result<Arc<dyn Backend>, ConfigError> {
        Err(ConfigError::BackendNotAvailable("Redis".to_owned()))
    }
}
