use pretty_assertions::assert_eq;
use stowage::{BackendConfig, Cache, CacheConfig, ConfigError, RedisConfig};

#[test]
fn test_full_config_deserialize() {
    let yaml = r#"
storePrivate: true
storeNoStore: false
ignoreNoLastMod: true
keyPrefix: "edge:"
includeRequestPropertiesInHash:
  - tenant
excludeRequestHeadersFromHash:
  - x-request-id
hostConfig:
  api.example.com:
    storePrivate: false
    storeNoStore: true
  static.example.com:
    ignoreNoLastMod: false
backend:
  type: Redis
  host: "cache.internal"
  port: 6380
  label: sessions
"#;

    let config = CacheConfig::from_yaml(yaml).expect("failed to deserialize");

    assert!(config.store_private);
    assert!(!config.store_no_store);
    assert!(config.ignore_no_last_mod);
    assert_eq!(config.key_prefix, "edge:");
    assert_eq!(config.include_request_properties_in_hash, vec!["tenant"]);
    assert_eq!(config.exclude_request_headers_from_hash, vec!["x-request-id"]);

    let api = &config.host_config["api.example.com"];
    assert_eq!(api.store_private, Some(false));
    assert_eq!(api.store_no_store, Some(true));
    assert_eq!(api.ignore_no_last_mod, None);
    let assets = &config.host_config["static.example.com"];
    assert_eq!(assets.ignore_no_last_mod, Some(false));

    assert_eq!(
        config.backend,
        Some(BackendConfig::Redis(RedisConfig {
            host: Some("cache.internal".to_owned()),
            port: Some(6380),
            label: Some("sessions".to_owned()),
            ..RedisConfig::default()
        }))
    );
}

#[test]
fn test_defaults() {
    let config = CacheConfig::from_yaml("{}").expect("failed to deserialize");

    assert!(!config.store_private);
    assert!(!config.store_no_store);
    assert!(!config.ignore_no_last_mod);
    assert!(config.host_config.is_empty());
    assert!(config.include_request_properties_in_hash.is_empty());
    assert!(config.exclude_request_headers_from_hash.is_empty());
    assert_eq!(config.key_prefix, "stowage:");
    assert_eq!(config.backend, None);
    assert_eq!(CacheConfig::default().key_prefix, config.key_prefix);
}

#[test]
fn test_unknown_keys_are_ignored() {
    let yaml = r#"
storePrivate: true
compression: zstd
hostConfig:
  api.example.com:
    storeNoStore: true
    requestValidators: [custom]
backend:
  type: Memory
  maxCapacity: 100
"#;

    let config = CacheConfig::from_yaml(yaml).expect("failed to deserialize");

    assert!(config.store_private);
    let api = &config.host_config["api.example.com"];
    assert_eq!(api.store_no_store, Some(true));
    assert!(api.request_validators.is_none());
    assert_eq!(config.backend, Some(BackendConfig::Memory));
}

#[test]
fn test_invalid_yaml() {
    let result = CacheConfig::from_yaml("storePrivate: [not, a, bool]");

    assert!(matches!(result, Err(ConfigError::Parse(_))));
}

#[test]
fn test_serialize_skips_empty_fields() {
    let config = CacheConfig {
        backend: Some(BackendConfig::Memory),
        ..CacheConfig::default()
    };

    let json = serde_json::to_value(&config).unwrap();

    assert_eq!(
        json,
        serde_json::json!({
            "storePrivate": false,
            "storeNoStore": false,
            "ignoreNoLastMod": false,
            "keyPrefix": "stowage:",
            "backend": { "type": "Memory" },
        })
    );
}

#[test]
fn test_cache_from_config() {
    let yaml = r#"
storePrivate: true
keyPrefix: "edge:"
excludeRequestHeadersFromHash: [x-request-id]
hostConfig:
  api.example.com:
    storeNoStore: true
backend:
  type: Memory
"#;
    let config = CacheConfig::from_yaml(yaml).unwrap();

    let cache = Cache::from_config(config).expect("failed to build cache");

    assert!(cache.global_policy().store_private);
    assert_eq!(cache.store().prefix(), "edge:");
    assert_eq!(cache.store().backend().label(), "memory");
    assert!(
        cache
            .fingerprinter()
            .excluded_headers()
            .iter()
            .any(|name| name == "x-request-id")
    );
    let host = cache.host_config("api.example.com").unwrap();
    assert_eq!(host.store_no_store, Some(true));
}

#[test]
fn test_missing_backend() {
    let result = Cache::from_config(CacheConfig::default());

    assert!(matches!(result, Err(ConfigError::MissingBackend)));
}

#[cfg(not(feature = "redis"))]
#[test]
fn test_redis_backend_without_feature() {
    let config = CacheConfig {
        backend: Some(BackendConfig::Redis(RedisConfig::default())),
        ..CacheConfig::default()
    };

    match Cache::from_config(config) {
        Err(ConfigError::BackendNotAvailable(name)) => assert_eq!(name, "Redis"),
        other => panic!("expected BackendNotAvailable, got {other:?}"),
    }
}

#[cfg(feature = "redis")]
#[test]
fn test_redis_connection_mode() {
    use stowage::redis::ConnectionMode;

    let tcp = RedisConfig {
        host: Some("cache.internal".to_owned()),
        ..RedisConfig::default()
    };
    assert_eq!(tcp.connection_mode(), ConnectionMode::tcp("cache.internal", 6379));

    let socket = RedisConfig {
        host: Some("ignored".to_owned()),
        unix_socket: Some("/run/redis.sock".to_owned()),
        ..RedisConfig::default()
    };
    assert_eq!(socket.connection_mode(), ConnectionMode::unix_socket("/run/redis.sock"));

    let url = RedisConfig {
        url: Some("redis://10.0.0.1:6379/2".to_owned()),
        unix_socket: Some("/run/redis.sock".to_owned()),
        ..RedisConfig::default()
    };
    assert_eq!(url.connection_mode(), ConnectionMode::url("redis://10.0.0.1:6379/2"));
}

#[cfg(feature = "redis")]
#[test]
fn test_redis_backend_builds_lazily() {
    let config = CacheConfig {
        backend: Some(BackendConfig::Redis(RedisConfig {
            port: Some(1),
            label: Some("sessions".to_owned()),
            ..RedisConfig::default()
        })),
        ..CacheConfig::default()
    };

    let cache = Cache::from_config(config).expect("client is created without connecting");

    assert_eq!(cache.store().backend().label(), "sessions");
}
