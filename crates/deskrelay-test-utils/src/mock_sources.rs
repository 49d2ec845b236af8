// SPDX-FileCopyrightText: 2026 deskrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fixed per-tenant policy overrides and desk credentials.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use secrecy::SecretString;

use deskrelay_core::{
    CredentialSource, DeskCredential, PolicyOverride, PolicySource, RelayError, TenantId,
};

/// A credential that passes [`DeskCredential::is_usable`].
pub fn usable_credential(base_url: &str) -> DeskCredential {
    DeskCredential {
        base_url: base_url.to_string(),
        api_token: SecretString::from("test-token".to_string()),
        account_id: "1".to_string(),
        enabled: true,
    }
}

/// A complete credential with `enabled = false`.
pub fn disabled_credential(base_url: &str) -> DeskCredential {
    DeskCredential {
        enabled: false,
        ..usable_credential(base_url)
    }
}

/// Policy overrides keyed by tenant id.
#[derive(Default)]
pub struct StaticPolicySource {
    overrides: HashMap<String, PolicyOverride>,
    fail: bool,
    reads: AtomicUsize,
}

impl StaticPolicySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_override(mut self, tenant: &str, over: PolicyOverride) -> Self {
        self.overrides.insert(tenant.to_string(), over);
        self
    }

    /// Every read returns an error.
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    /// Number of `tenant_override` calls.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PolicySource for StaticPolicySource {
    async fn tenant_override(
        &self,
        tenant: &TenantId,
    ) -> Result<Option<PolicyOverride>, RelayError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(RelayError::Storage {
                source: "injected policy source failure".into(),
            });
        }
        Ok(self.overrides.get(&tenant.0).copied())
    }
}

/// Desk credentials keyed by tenant id.
#[derive(Default)]
pub struct StaticCredentials {
    credentials: HashMap<String, DeskCredential>,
    fail: bool,
}

impl StaticCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credential(mut self, tenant: &str, credential: DeskCredential) -> Self {
        self.credentials.insert(tenant.to_string(), credential);
        self
    }

    /// Every lookup returns an error.
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }
}

#[async_trait]
impl CredentialSource for StaticCredentials {
    async fn credential(&self, tenant: &TenantId) -> Result<Option<DeskCredential>, RelayError> {
        if self.fail {
            return Err(RelayError::Storage {
                source: "injected credential source failure".into(),
            });
        }
        Ok(self.credentials.get(&tenant.0).cloned())
    }
}
