//! Per-host policy overrides.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::debug;

use crate::policy::PolicyOverrides;

/// Concurrent hostname → [`PolicyOverrides`] mapping.
///
/// Safe to mutate from several request-handling tasks while others resolve
/// policies: every read returns a point-in-time copy of an entry, never a
/// live reference.
#[derive(Debug, Default)]
pub struct HostRegistry {
    hosts: DashMap<String, PolicyOverrides>,
}

impl HostRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers overrides for hosts that have none yet. Existing entries
    /// are left untouched.
    pub fn add<I, K>(&self, configs: I)
    where
        I: IntoIterator<Item = (K, PolicyOverrides)>,
        K: Into<String>,
    {
        for (host, overrides) in configs {
            match self.hosts.entry(host.into()) {
                Entry::Occupied(entry) => {
                    debug!(host = %entry.key(), "Host policy already registered, skipping");
                }
                Entry::Vacant(entry) => {
                    entry.insert(overrides);
                }
            }
        }
    }

    /// Replaces the overrides of every listed host.
    pub fn set<I, K>(&self, configs: I)
    where
        I: IntoIterator<Item = (K, PolicyOverrides)>,
        K: Into<String>,
    {
        for (host, overrides) in configs {
            self.hosts.insert(host.into(), overrides);
        }
    }

    /// Merges into the overrides of every listed host, field by field.
    /// Hosts without an entry start from empty overrides.
    pub fn update<I, K>(&self, configs: I)
    where
        I: IntoIterator<Item = (K, PolicyOverrides)>,
        K: Into<String>,
    {
        for (host, overrides) in configs {
            self.hosts.entry(host.into()).or_default().merge(overrides);
        }
    }

    /// Resets every listed host to empty overrides. The hosts stay registered.
    pub fn clear<I, K>(&self, hosts: I)
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        for host in hosts {
            self.hosts.insert(host.into(), PolicyOverrides::default());
        }
    }

    /// Snapshot of the overrides registered for `host`.
    pub fn get(&self, host: &str) -> Option<PolicyOverrides> {
        self.hosts.get(host).map(|entry| entry.value().clone())
    }

    pub fn contains(&self, host: &str) -> bool {
        self.hosts.contains_key(host)
    }

    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_keeps_first_registration() {
        let registry = HostRegistry::new();
        registry.add([("api.example.com", PolicyOverrides::new().store_private(true))]);
        registry.add([("api.example.com", PolicyOverrides::new().store_private(false))]);

        let overrides = registry.get("api.example.com").unwrap();
        assert_eq!(overrides.store_private, Some(true));
    }

    #[test]
    fn test_set_replaces_whole_entry() {
        let registry = HostRegistry::new();
        registry.set([(
            "api.example.com",
            PolicyOverrides::new().store_private(true).store_no_store(true),
        )]);
        registry.set([("api.example.com", PolicyOverrides::new().ignore_no_last_mod(true))]);

        let overrides = registry.get("api.example.com").unwrap();
        assert_eq!(overrides.store_private, None);
        assert_eq!(overrides.store_no_store, None);
        assert_eq!(overrides.ignore_no_last_mod, Some(true));
    }

    #[test]
    fn test_update_merges_fields() {
        let registry = HostRegistry::new();
        registry.update([("new.example.com", PolicyOverrides::new().store_no_store(true))]);
        registry.set([("api.example.com", PolicyOverrides::new().store_private(true))]);
        registry.update([("api.example.com", PolicyOverrides::new().store_no_store(true))]);

        let overrides = registry.get("api.example.com").unwrap();
        assert_eq!(overrides.store_private, Some(true));
        assert_eq!(overrides.store_no_store, Some(true));
        assert_eq!(
            registry.get("new.example.com").unwrap().store_no_store,
            Some(true)
        );
    }

    #[test]
    fn test_clear_resets_to_empty() {
        let registry = HostRegistry::new();
        registry.set([("api.example.com", PolicyOverrides::new().store_private(true))]);

        registry.clear(["api.example.com", "other.example.com"]);

        assert!(registry.get("api.example.com").unwrap().is_empty());
        assert!(registry.get("other.example.com").unwrap().is_empty());
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_snapshot_is_detached() {
        let registry = HostRegistry::new();
        registry.set([("api.example.com", PolicyOverrides::new().store_private(true))]);

        let snapshot = registry.get("api.example.com").unwrap();
        registry.set([("api.example.com", PolicyOverrides::new().store_private(false))]);

        assert_eq!(snapshot.store_private, Some(true));
    }
}
