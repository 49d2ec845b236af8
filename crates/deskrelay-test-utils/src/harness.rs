// SPDX-FileCopyrightText: 2026 deskrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Coordinator wired to in-memory fakes.
//!
//! `CoordinatorHarness` keeps a handle to every fake so tests can seed state
//! before an action and inspect call counters after it.

use std::sync::Arc;

use deskrelay_config::model::CoordinationConfig;
use deskrelay_coordinator::{HandoffCoordinator, PolicyResolver};
use deskrelay_core::{CoordinationPolicy, DeskCredential, PolicyOverride};

use crate::mock_desk::MockDesk;
use crate::mock_sources::{StaticCredentials, StaticPolicySource};
use crate::mock_store::{MemoryHistory, MemorySessionStore};

/// Builder for [`CoordinatorHarness`].
pub struct CoordinatorHarnessBuilder {
    defaults: CoordinationPolicy,
    policies: StaticPolicySource,
    credentials: StaticCredentials,
    desk: MockDesk,
    sessions: MemorySessionStore,
    history: MemoryHistory,
    transfer_marker: Option<String>,
}

impl CoordinatorHarnessBuilder {
    fn new() -> Self {
        Self {
            defaults: CoordinationConfig::default().policy(),
            policies: StaticPolicySource::new(),
            credentials: StaticCredentials::new(),
            desk: MockDesk::new(),
            sessions: MemorySessionStore::new(),
            history: MemoryHistory::new(),
            transfer_marker: None,
        }
    }

    /// Replace the global defaults.
    pub fn with_defaults(mut self, defaults: CoordinationPolicy) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn with_override(mut self, tenant: &str, over: PolicyOverride) -> Self {
        self.policies = self.policies.with_override(tenant, over);
        self
    }

    pub fn with_policy_source(mut self, policies: StaticPolicySource) -> Self {
        self.policies = policies;
        self
    }

    pub fn with_credential(mut self, tenant: &str, credential: DeskCredential) -> Self {
        self.credentials = self.credentials.with_credential(tenant, credential);
        self
    }

    pub fn with_credentials(mut self, credentials: StaticCredentials) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn with_desk(mut self, desk: MockDesk) -> Self {
        self.desk = desk;
        self
    }

    pub fn with_sessions(mut self, sessions: MemorySessionStore) -> Self {
        self.sessions = sessions;
        self
    }

    pub fn with_history(mut self, history: MemoryHistory) -> Self {
        self.history = history;
        self
    }

    pub fn with_transfer_marker(mut self, marker: &str) -> Self {
        self.transfer_marker = Some(marker.to_string());
        self
    }

    pub fn build(self) -> CoordinatorHarness {
        let policies = Arc::new(self.policies);
        let credentials = Arc::new(self.credentials);
        let desk = Arc::new(self.desk);
        let sessions = Arc::new(self.sessions);
        let history = Arc::new(self.history);

        let resolver = PolicyResolver::new(self.defaults, policies.clone());
        let mut coordinator = HandoffCoordinator::new(
            resolver,
            sessions.clone(),
            history.clone(),
            credentials.clone(),
            desk.clone(),
        );
        if let Some(marker) = self.transfer_marker {
            coordinator = coordinator.with_transfer_marker(marker);
        }

        CoordinatorHarness {
            coordinator: Arc::new(coordinator),
            policies,
            credentials,
            desk,
            sessions,
            history,
        }
    }
}

/// A coordinator plus handles to the fakes behind it.
pub struct CoordinatorHarness {
    pub coordinator: Arc<HandoffCoordinator>,
    pub policies: Arc<StaticPolicySource>,
    pub credentials: Arc<StaticCredentials>,
    pub desk: Arc<MockDesk>,
    pub sessions: Arc<MemorySessionStore>,
    pub history: Arc<MemoryHistory>,
}

impl CoordinatorHarness {
    pub fn builder() -> CoordinatorHarnessBuilder {
        CoordinatorHarnessBuilder::new()
    }
}
