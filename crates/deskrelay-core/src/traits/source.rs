// SPDX-FileCopyrightText: 2026 deskrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-tenant configuration sources.

use async_trait::async_trait;

use crate::error::RelayError;
use crate::types::{DeskCredential, PolicyOverride, TenantId};

/// Source of per-tenant coordination overrides.
///
/// Global defaults come from process configuration; this trait only supplies
/// the tenant layer. Callers treat an error the same as "no override".
#[async_trait]
pub trait PolicySource: Send + Sync {
    async fn tenant_override(&self, tenant: &TenantId)
        -> Result<Option<PolicyOverride>, RelayError>;
}

/// Source of remote desk credentials.
#[async_trait]
pub trait CredentialSource: Send + Sync {
    async fn credential(&self, tenant: &TenantId) -> Result<Option<DeskCredential>, RelayError>;
}
