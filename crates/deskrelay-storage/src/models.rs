// SPDX-FileCopyrightText: 2026 deskrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage row types.
//!
//! Session and message rows use the canonical types from `deskrelay-core`;
//! tenant settings are storage-specific and live here.

pub use deskrelay_core::types::{BotSession, ConversationMessage, MessageDirection, SessionStatus};

/// A `tenant_settings` row: the coordination override blob and the remote
/// desk credential fields as stored.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct TenantSettings {
    pub tenant_id: String,
    /// JSON-encoded `PolicyOverride`, if the tenant has one.
    pub coordination_override: Option<String>,
    pub desk_base_url: Option<String>,
    pub desk_api_token: Option<String>,
    pub desk_account_id: Option<String>,
    pub desk_enabled: bool,
}

impl std::fmt::Debug for TenantSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TenantSettings")
            .field("tenant_id", &self.tenant_id)
            .field("coordination_override", &self.coordination_override)
            .field("desk_base_url", &self.desk_base_url)
            .field("desk_api_token", &self.desk_api_token.as_ref().map(|_| "[redacted]"))
            .field("desk_account_id", &self.desk_account_id)
            .field("desk_enabled", &self.desk_enabled)
            .finish()
    }
}
