// SPDX-FileCopyrightText: 2026 deskrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Effective per-tenant coordination policy.
//!
//! Global defaults come from `[coordination]` in the config file and are
//! always available. The tenant layer is read through a [`PolicySource`];
//! any read failure is logged and the defaults are used instead.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use deskrelay_config::model::CoordinationConfig;
use deskrelay_core::{CoordinationPolicy, PolicyOverride, PolicySource, TenantId};
use tokio::time::Instant;
use tracing::{debug, error};

/// Field-wise merge: every field present in `over` wins.
pub fn merge(defaults: CoordinationPolicy, over: Option<&PolicyOverride>) -> CoordinationPolicy {
    let Some(over) = over else {
        return defaults;
    };
    CoordinationPolicy {
        check_agent: over.check_agent.unwrap_or(defaults.check_agent),
        auto_pause: over.auto_pause.unwrap_or(defaults.auto_pause),
        auto_resolve: over.auto_resolve.unwrap_or(defaults.auto_resolve),
        manage_enabled: over.manage_enabled.unwrap_or(defaults.manage_enabled),
        detect_transfer_marker: over
            .detect_transfer_marker
            .unwrap_or(defaults.detect_transfer_marker),
    }
}

/// Resolves the effective policy for a tenant.
pub struct PolicyResolver {
    defaults: CoordinationPolicy,
    source: Arc<dyn PolicySource>,
    ttl: Option<Duration>,
    cache: DashMap<TenantId, (Instant, CoordinationPolicy)>,
}

impl PolicyResolver {
    /// A resolver that reads the tenant override on every call.
    pub fn new(defaults: CoordinationPolicy, source: Arc<dyn PolicySource>) -> Self {
        Self {
            defaults,
            source,
            ttl: None,
            cache: DashMap::new(),
        }
    }

    /// Build from the `[coordination]` config section.
    pub fn from_config(config: &CoordinationConfig, source: Arc<dyn PolicySource>) -> Self {
        Self::new(config.policy(), source)
            .with_cache_ttl(Duration::from_secs(config.policy_cache_ttl_secs))
    }

    /// Serve resolved policies from memory for up to `ttl`. A zero TTL
    /// disables the cache.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = (!ttl.is_zero()).then_some(ttl);
        self
    }

    /// Global defaults.
    pub fn defaults(&self) -> CoordinationPolicy {
        self.defaults
    }

    /// Effective policy for `tenant`. Never fails.
    pub async fn resolve(&self, tenant: &TenantId) -> CoordinationPolicy {
        if let Some(ttl) = self.ttl {
            if let Some(entry) = self.cache.get(tenant) {
                let (stored_at, policy) = *entry;
                if stored_at.elapsed() < ttl {
                    return policy;
                }
            }
        }

        match self.source.tenant_override(tenant).await {
            Ok(over) => {
                let policy = merge(self.defaults, over.as_ref());
                if self.ttl.is_some() {
                    self.cache.insert(tenant.clone(), (Instant::now(), policy));
                }
                debug!(tenant = %tenant, has_override = over.is_some(), "policy resolved");
                policy
            }
            Err(e) => {
                error!(tenant = %tenant, error = %e, "error reading tenant policy override, using defaults");
                self.defaults
            }
        }
    }

    /// Drop any cached policy for `tenant`.
    pub fn invalidate(&self, tenant: &TenantId) {
        self.cache.remove(tenant);
    }
}
