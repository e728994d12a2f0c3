//! The [`Cache`] facade and its builder.

use std::sync::Arc;

use stowage_backend::{Backend, CacheEntry, Command, EntryStore, StoreError, StoredEntry};
use stowage_core::{
    CacheableRequest, Evaluator, Fingerprint, Fingerprinter, GlobalPolicy, HostRegistry,
    PolicyOverrides, PolicyResolver, RequestValidator, ResponseValidator,
};
use tracing::debug;

use crate::config::{BackendConfig, CacheConfig};
use crate::error::ConfigError;

/// HTTP response cache.
///
/// Combines policy resolution, request fingerprinting and entry storage.
/// Cloning is cheap and clones share host policies and the backend.
///
/// A typical request/response cycle:
///
/// ```
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// use http::{Method, StatusCode};
/// use stowage::{Cache, CacheEntry, CacheableRequest, CacheableResponse, MemoryBackend};
///
/// let cache = Cache::builder().backend(MemoryBackend::new()).build()?;
///
/// let request = CacheableRequest::new(Method::GET, "https://api.example.com/users");
/// let mut evaluator = cache.evaluator(Some("api.example.com"), None);
/// let fingerprint = cache.fingerprint(&request);
///
/// if evaluator.is_retrievable(&request) {
///     if let Some(_entry) = cache.get(&fingerprint).await? {
///         return Ok(());
///     }
/// }
///
/// let response = CacheableResponse::new(StatusCode::OK);
/// if evaluator.is_storable(&response) {
///     cache.put(&fingerprint, CacheEntry::new().response(response)).await?;
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Cache {
    resolver: PolicyResolver,
    fingerprinter: Arc<Fingerprinter>,
    store: EntryStore,
}

impl Cache {
    pub fn builder() -> CacheBuilder {
        CacheBuilder::default()
    }

    /// Builds a cache from configuration alone.
    pub fn from_config(config: CacheConfig) -> Result<Self, ConfigError> {
        CacheBuilder::from_config(config).build()
    }

    pub fn fingerprint(&self, request: &CacheableRequest) -> Fingerprint {
        let fingerprint = self.fingerprinter.fingerprint(request);
        debug!(uri = request.uri(), %fingerprint, "Computed fingerprint");
        fingerprint
    }

    pub fn fingerprinter(&self) -> &Fingerprinter {
        &self.fingerprinter
    }

    /// Registers host policies; hosts that already have one keep it.
    pub fn add_host_configs<I, K>(&self, configs: I)
    where
        I: IntoIterator<Item = (K, PolicyOverrides)>,
        K: Into<String>,
    {
        self.resolver.hosts().add(configs);
    }

    /// Replaces the policies of the listed hosts.
    pub fn set_host_configs<I, K>(&self, configs: I)
    where
        I: IntoIterator<Item = (K, PolicyOverrides)>,
        K: Into<String>,
    {
        self.resolver.hosts().set(configs);
    }

    /// Merges into the policies of the listed hosts, field by field.
    pub fn update_host_configs<I, K>(&self, configs: I)
    where
        I: IntoIterator<Item = (K, PolicyOverrides)>,
        K: Into<String>,
    {
        self.resolver.hosts().update(configs);
    }

    /// Resets the listed hosts to an empty policy.
    pub fn clear_host_configs<I, K>(&self, hosts: I)
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        self.resolver.hosts().clear(hosts);
    }

    /// Snapshot of the policy registered for `host`.
    pub fn host_config(&self, host: &str) -> Option<PolicyOverrides> {
        self.resolver.hosts().get(host)
    }

    pub fn global_policy(&self) -> &GlobalPolicy {
        self.resolver.global()
    }

    /// A fresh evaluator for one request/response cycle.
    pub fn evaluator(
        &self,
        hostname: Option<&str>,
        overrides: Option<&PolicyOverrides>,
    ) -> Evaluator {
        self.resolver.evaluator(hostname, overrides)
    }

    pub async fn get(&self, fingerprint: &Fingerprint) -> Result<Option<StoredEntry>, StoreError> {
        self.store.get(fingerprint.as_str()).await
    }

    pub async fn put(&self, fingerprint: &Fingerprint, entry: CacheEntry) -> Result<(), StoreError> {
        self.store.put(fingerprint.as_str(), entry).await
    }

    /// Runs one store command against the entry key of `fingerprint`.
    pub async fn put_with_command(
        &self,
        command: Command,
        fingerprint: &Fingerprint,
    ) -> Result<(), StoreError> {
        self.store
            .put_with_command(command, fingerprint.as_str())
            .await
    }

    /// Deletes the entry of `fingerprint`; `true` if exactly one key went away.
    pub async fn purge(&self, fingerprint: &Fingerprint) -> Result<bool, StoreError> {
        self.store.purge(fingerprint.as_str()).await
    }

    pub fn store(&self) -> &EntryStore {
        &self.store
    }
}

/// Builder for [`Cache`].
///
/// A backend passed with [`backend`](Self::backend) takes precedence over
/// [`backend_config`](Self::backend_config).
#[derive(Default)]
pub struct CacheBuilder {
    global: GlobalPolicy,
    hosts: Vec<(String, PolicyOverrides)>,
    fingerprinter: Fingerprinter,
    key_prefix: Option<String>,
    backend: Option<Arc<dyn Backend>>,
    backend_config: Option<BackendConfig>,
}

impl CacheBuilder {
    pub fn from_config(config: CacheConfig) -> Self {
        let CacheConfig {
            store_private,
            store_no_store,
            ignore_no_last_mod,
            host_config,
            include_request_properties_in_hash,
            exclude_request_headers_from_hash,
            key_prefix,
            backend,
        } = config;

        let mut builder = Self::default()
            .store_private(store_private)
            .store_no_store(store_no_store)
            .ignore_no_last_mod(ignore_no_last_mod)
            .key_prefix(key_prefix);
        for (host, overrides) in host_config {
            builder = builder.host_policy(host, overrides);
        }
        for name in include_request_properties_in_hash {
            builder = builder.include_property(name);
        }
        for name in exclude_request_headers_from_hash {
            builder = builder.exclude_header(name);
        }
        builder.backend_config = backend;
        builder
    }

    pub fn store_private(mut self, value: bool) -> Self {
        self.global.store_private = value;
        self
    }

    pub fn store_no_store(mut self, value: bool) -> Self {
        self.global.store_no_store = value;
        self
    }

    pub fn ignore_no_last_mod(mut self, value: bool) -> Self {
        self.global.ignore_no_last_mod = value;
        self
    }

    /// Appends a global request validator; it runs after host and per-call
    /// validators and before the built-in ones.
    pub fn request_validator(mut self, validator: RequestValidator) -> Self {
        self.global.request_validators.push(validator);
        self
    }

    /// Appends a global response validator.
    pub fn response_validator(mut self, validator: ResponseValidator) -> Self {
        self.global.response_validators.push(validator);
        self
    }

    /// Initial policy for `host`. A later call for the same host replaces it.
    pub fn host_policy(mut self, host: impl Into<String>, overrides: PolicyOverrides) -> Self {
        self.hosts.push((host.into(), overrides));
        self
    }

    pub fn include_property(mut self, name: impl AsRef<str>) -> Self {
        self.fingerprinter = self.fingerprinter.include_property(name);
        self
    }

    pub fn exclude_header(mut self, name: impl AsRef<str>) -> Self {
        self.fingerprinter = self.fingerprinter.exclude_header(name);
        self
    }

    pub fn key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = Some(prefix.into());
        self
    }

    pub fn backend<B>(mut self, backend: B) -> Self
    where
        B: Backend + 'static,
    {
        self.backend = Some(Arc::new(backend));
        self
    }

    pub fn shared_backend(mut self, backend: Arc<dyn Backend>) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn backend_config(mut self, config: BackendConfig) -> Self {
        self.backend_config = Some(config);
        self
    }

    pub fn build(self) -> Result<Cache, ConfigError> {
        let backend = match (self.backend, self.backend_config) {
            (Some(backend), _) => backend,
            (None, Some(config)) => config.into_backend()?,
            (None, None) => return Err(ConfigError::MissingBackend),
        };
        let store = match self.key_prefix {
            Some(prefix) => EntryStore::with_prefix(backend, prefix),
            None => EntryStore::new(backend),
        };

        let hosts = HostRegistry::new();
        hosts.set(self.hosts);

        debug!(
            backend = store.backend().label(),
            prefix = store.prefix(),
            hosts = hosts.len(),
            "Cache built"
        );
        Ok(Cache {
            resolver: PolicyResolver::with_hosts(self.global, hosts),
            fingerprinter: Arc::new(self.fingerprinter),
            store,
        })
    }
}
