// SPDX-FileCopyrightText: 2026 deskrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared by the storage, desk, coordinator, and gateway crates.

use std::fmt;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// Opaque tenant identifier. A tenant owns one coordination policy and at
/// most one remote desk credential.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TenantId(pub String);

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TenantId {
    fn from(s: &str) -> Self {
        TenantId(s.to_string())
    }
}

/// Local identity of a conversation (e.g. the end user's address on the
/// messaging platform).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationKey(pub String);

impl fmt::Display for ConversationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ConversationKey {
    fn from(s: &str) -> Self {
        ConversationKey(s.to_string())
    }
}

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter behind a [`crate::PluginAdapter`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Storage,
    RemoteDesk,
}

// --- Policy ---

/// Effective coordination policy for one tenant.
///
/// Serialized in camelCase so the stored per-tenant override blob and the
/// status endpoint share one shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoordinationPolicy {
    /// Look up remote assignment before letting the bot process a message.
    pub check_agent: bool,
    /// Pause the bot automatically when a human replies from the desk.
    pub auto_pause: bool,
    /// Resolve the remote conversation when a bot flow completes.
    pub auto_resolve: bool,
    /// Accept explicit management commands for this tenant.
    pub manage_enabled: bool,
    /// Detect an in-message transfer marker in bot output.
    pub detect_transfer_marker: bool,
}

/// Partial per-tenant policy. `None` fields fall through to the global default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PolicyOverride {
    pub check_agent: Option<bool>,
    pub auto_pause: Option<bool>,
    pub auto_resolve: Option<bool>,
    pub manage_enabled: Option<bool>,
    pub detect_transfer_marker: Option<bool>,
}

// --- Remote desk credential ---

/// Per-tenant credential for the remote desk API.
#[derive(Clone)]
pub struct DeskCredential {
    pub base_url: String,
    pub api_token: SecretString,
    pub account_id: String,
    pub enabled: bool,
}

impl DeskCredential {
    /// A credential is usable only when enabled and every field is non-empty.
    pub fn is_usable(&self) -> bool {
        self.enabled
            && !self.base_url.trim().is_empty()
            && !self.api_token.expose_secret().trim().is_empty()
            && !self.account_id.trim().is_empty()
    }

    /// Base URL without a trailing slash.
    pub fn base(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}

impl fmt::Debug for DeskCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeskCredential")
            .field("base_url", &self.base_url)
            .field("api_token", &"[redacted]")
            .field("account_id", &self.account_id)
            .field("enabled", &self.enabled)
            .finish()
    }
}

// --- Bot sessions ---

/// Lifecycle state of a bot session. `Closed` is terminal.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    AsRefStr,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Opened,
    Paused,
    Closed,
}

/// A persisted bot session row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotSession {
    pub id: String,
    pub tenant_id: String,
    pub conversation_key: String,
    pub status: SessionStatus,
    pub created_at: String,
    pub updated_at: String,
}

// --- Message history ---

/// Direction of a recorded message relative to the bot.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, AsRefStr, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MessageDirection {
    Inbound,
    Outbound,
}

/// A message as recorded in the local history. Inbound messages that were
/// mirrored to the desk carry the remote conversation id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub id: String,
    pub tenant_id: String,
    pub conversation_key: String,
    pub direction: MessageDirection,
    pub content: String,
    pub remote_conversation_id: Option<u64>,
    /// Unix timestamp in seconds.
    pub message_timestamp: i64,
}

// --- Remote desk ---

/// Status of a conversation on the remote desk.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RemoteStatus {
    Open,
    Resolved,
    Pending,
    Snoozed,
    Other(String),
}

impl RemoteStatus {
    pub fn as_str(&self) -> &str {
        match self {
            RemoteStatus::Open => "open",
            RemoteStatus::Resolved => "resolved",
            RemoteStatus::Pending => "pending",
            RemoteStatus::Snoozed => "snoozed",
            RemoteStatus::Other(s) => s,
        }
    }
}

impl fmt::Display for RemoteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for RemoteStatus {
    fn from(s: &str) -> Self {
        match s {
            "open" => RemoteStatus::Open,
            "resolved" => RemoteStatus::Resolved,
            "pending" => RemoteStatus::Pending,
            "snoozed" => RemoteStatus::Snoozed,
            other => RemoteStatus::Other(other.to_string()),
        }
    }
}

impl From<String> for RemoteStatus {
    fn from(s: String) -> Self {
        RemoteStatus::from(s.as_str())
    }
}

impl From<RemoteStatus> for String {
    fn from(status: RemoteStatus) -> Self {
        status.as_str().to_string()
    }
}

/// Point-in-time view of a remote conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationSnapshot {
    pub id: u64,
    /// Whether the desk reports any assignee, even one without a numeric id.
    pub assigned: bool,
    pub assignee_id: Option<u64>,
    pub team_id: Option<u64>,
    pub status: RemoteStatus,
}

impl ConversationSnapshot {
    /// A human owns the conversation when an agent is assigned and it is open.
    pub fn is_human_owned(&self) -> bool {
        self.assigned && self.status == RemoteStatus::Open
    }
}

/// Requested agent/team assignment for a remote conversation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub agent_id: Option<u64>,
    pub team_id: Option<u64>,
}

impl Assignment {
    pub fn is_empty(&self) -> bool {
        self.agent_id.is_none() && self.team_id.is_none()
    }
}

/// Per-step outcome of an [`Assignment`]. `None` means the step was not requested.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssignmentReport {
    pub agent: Option<bool>,
    pub team: Option<bool>,
}

// --- Coordinator results ---

/// Result of a coordinator action. `success == false` is a reportable no-op,
/// not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionOutcome {
    pub success: bool,
    pub detail: String,
}

/// Management actions accepted from the command entry point.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ManageAction {
    TransferHuman,
    ResolveBot,
    PauseBot,
    ResumeBot,
}

/// A validated management command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManageRequest {
    pub action: ManageAction,
    pub conversation_key: ConversationKey,
    pub assignment: Assignment,
    /// Desired remote status; for `resolve_bot` the remote side is resolved
    /// only when this is absent or `resolved`.
    pub desired_remote_status: Option<RemoteStatus>,
}

/// Outcome of a management command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManageResponse {
    /// The action ran (successfully or as a no-op).
    Completed {
        action: ManageAction,
        outcome: ActionOutcome,
    },
    /// Management commands are disabled for this tenant; nothing was attempted.
    Disabled,
}
