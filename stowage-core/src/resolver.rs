//! Builds evaluators from the global policy and host overrides.

use std::sync::Arc;

use tracing::trace;

use crate::evaluator::Evaluator;
use crate::policy::{GlobalPolicy, PolicyOverrides, ResolvedPolicy};
use crate::registry::HostRegistry;

/// Resolves the effective policy for a request and wraps it in a fresh
/// [`Evaluator`].
///
/// Cloning shares the global policy and the host registry.
#[derive(Debug, Clone, Default)]
pub struct PolicyResolver {
    global: Arc<GlobalPolicy>,
    hosts: Arc<HostRegistry>,
}

impl PolicyResolver {
    pub fn new(global: GlobalPolicy) -> Self {
        Self::with_hosts(global, HostRegistry::new())
    }

    pub fn with_hosts(global: GlobalPolicy, hosts: HostRegistry) -> Self {
        Self {
            global: Arc::new(global),
            hosts: Arc::new(hosts),
        }
    }

    pub fn global(&self) -> &GlobalPolicy {
        &self.global
    }

    pub fn hosts(&self) -> &HostRegistry {
        &self.hosts
    }

    /// Merges the global policy, the overrides registered for `hostname`
    /// (if any) and the per-call `overrides` (if any).
    pub fn resolve(
        &self,
        hostname: Option<&str>,
        overrides: Option<&PolicyOverrides>,
    ) -> ResolvedPolicy {
        let host = hostname.and_then(|hostname| self.hosts.get(hostname));
        trace!(
            hostname,
            host_overrides = host.is_some(),
            call_overrides = overrides.is_some(),
            "Resolving cache policy"
        );
        ResolvedPolicy::resolve(&self.global, host.as_ref(), overrides)
    }

    /// A new evaluator for one request/response cycle.
    pub fn evaluator(
        &self,
        hostname: Option<&str>,
        overrides: Option<&PolicyOverrides>,
    ) -> Evaluator {
        self.resolve(hostname, overrides).into_evaluator()
    }
}
