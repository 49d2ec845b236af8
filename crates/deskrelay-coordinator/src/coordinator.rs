// SPDX-FileCopyrightText: 2026 deskrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The handoff coordinator.
//!
//! Every public operation is total: store, history, credential, and desk
//! failures are logged and folded into `true` (gate), count 0 (local steps),
//! or `false` (remote steps). The local step of an action always runs before
//! its remote step.

use std::sync::Arc;

use deskrelay_config::model::CoordinationConfig;
use deskrelay_core::{
    ActionOutcome, Assignment, BotSession, ConversationKey, ConversationMessage,
    CoordinationPolicy, CredentialSource, DeskCredential, ManageAction, ManageRequest,
    ManageResponse, MessageHistory, RelayError, RemoteDesk, RemoteStatus, SessionStatus,
    SessionStore, TenantId,
};
use tracing::{debug, error, info, warn};

use crate::linker::ConversationLinker;
use crate::policy::PolicyResolver;

/// Result of scanning bot output for the transfer marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferDetection {
    /// The text to deliver, with the marker removed when it was acted on.
    pub text: String,
    /// Outcome of the transfer, if one was triggered.
    pub transferred: Option<ActionOutcome>,
}

/// Coordinates bot sessions with human agents on the remote desk.
pub struct HandoffCoordinator {
    policy: PolicyResolver,
    linker: ConversationLinker,
    sessions: Arc<dyn SessionStore>,
    history: Arc<dyn MessageHistory>,
    credentials: Arc<dyn CredentialSource>,
    desk: Arc<dyn RemoteDesk>,
    transfer_marker: String,
}

impl HandoffCoordinator {
    pub fn new(
        policy: PolicyResolver,
        sessions: Arc<dyn SessionStore>,
        history: Arc<dyn MessageHistory>,
        credentials: Arc<dyn CredentialSource>,
        desk: Arc<dyn RemoteDesk>,
    ) -> Self {
        Self {
            policy,
            linker: ConversationLinker::new(history.clone()),
            sessions,
            history,
            credentials,
            desk,
            transfer_marker: CoordinationConfig::default().transfer_marker,
        }
    }

    /// Marker text that requests a transfer when found in bot output.
    pub fn with_transfer_marker(mut self, marker: impl Into<String>) -> Self {
        self.transfer_marker = marker.into();
        self
    }

    /// Effective policy for `tenant`. Read-only.
    pub async fn coordination_status(&self, tenant: &TenantId) -> CoordinationPolicy {
        self.policy.resolve(tenant).await
    }

    /// Whether the bot may process a message in `remote_id`'s conversation.
    ///
    /// Returns `false` only when the desk reports an assigned agent on an
    /// open conversation. Anything that prevents the check answers `true`.
    pub async fn should_bot_process(&self, tenant: &TenantId, remote_id: Option<u64>) -> bool {
        let Some(remote_id) = remote_id else {
            return true;
        };
        if !self.policy.resolve(tenant).await.check_agent {
            debug!(tenant = %tenant, "agent check disabled");
            return true;
        }
        let Some(cred) = self.usable_credential(tenant).await else {
            return true;
        };
        match self.desk.get_conversation(&cred, remote_id).await {
            Some(snapshot) if snapshot.is_human_owned() => {
                info!(
                    tenant = %tenant,
                    remote_conversation_id = remote_id,
                    assignee_id = ?snapshot.assignee_id,
                    "human agent owns conversation, bot should not process"
                );
                false
            }
            Some(_) => true,
            None => true,
        }
    }

    /// Pause the bot and hand the remote conversation to a human.
    pub async fn transfer_to_human(
        &self,
        tenant: &TenantId,
        key: &ConversationKey,
        assignment: Assignment,
    ) -> ActionOutcome {
        let paused = self.pause_sessions(tenant, key).await;
        let updated = self
            .update_remote(tenant, key, RemoteStatus::Open, assignment)
            .await;
        ActionOutcome {
            success: paused > 0 || updated,
            detail: format!("paused {paused} bot session(s), desk updated: {updated}"),
        }
    }

    /// Close every live bot session, and resolve the remote conversation
    /// when `resolve_remote` is set.
    pub async fn resolve_bot(
        &self,
        tenant: &TenantId,
        key: &ConversationKey,
        resolve_remote: bool,
    ) -> ActionOutcome {
        let closed = self
            .transition(
                tenant,
                key,
                &[SessionStatus::Opened, SessionStatus::Paused],
                SessionStatus::Closed,
            )
            .await;
        if closed > 0 {
            info!(tenant = %tenant, conversation_key = %key, count = closed, "closed bot sessions");
        }
        let resolved = if resolve_remote {
            self.update_remote(tenant, key, RemoteStatus::Resolved, Assignment::default())
                .await
        } else {
            false
        };
        ActionOutcome {
            success: closed > 0 || resolved,
            detail: format!("closed {closed} bot session(s), desk resolved: {resolved}"),
        }
    }

    /// Pause opened sessions. The desk is not touched.
    pub async fn pause_bot(&self, tenant: &TenantId, key: &ConversationKey) -> ActionOutcome {
        let paused = self.pause_sessions(tenant, key).await;
        ActionOutcome {
            success: paused > 0,
            detail: format!("paused {paused} bot session(s)"),
        }
    }

    /// Reopen paused sessions.
    pub async fn resume_bot(&self, tenant: &TenantId, key: &ConversationKey) -> ActionOutcome {
        let resumed = self
            .transition(tenant, key, &[SessionStatus::Paused], SessionStatus::Opened)
            .await;
        if resumed > 0 {
            info!(tenant = %tenant, conversation_key = %key, count = resumed, "resumed bot sessions");
        }
        ActionOutcome {
            success: resumed > 0,
            detail: format!("resumed {resumed} bot session(s)"),
        }
    }

    /// Run a management command if the tenant allows them.
    ///
    /// When `manage_enabled` is off nothing else is read or written.
    pub async fn manage(&self, tenant: &TenantId, request: &ManageRequest) -> ManageResponse {
        if !self.policy.resolve(tenant).await.manage_enabled {
            info!(tenant = %tenant, action = %request.action, "manage command rejected: disabled for tenant");
            return ManageResponse::Disabled;
        }

        let key = &request.conversation_key;
        info!(tenant = %tenant, conversation_key = %key, action = %request.action, "manage command");
        let outcome = match request.action {
            ManageAction::TransferHuman => {
                self.transfer_to_human(tenant, key, request.assignment).await
            }
            ManageAction::ResolveBot => {
                let resolve_remote = request
                    .desired_remote_status
                    .as_ref()
                    .is_none_or(|s| *s == RemoteStatus::Resolved);
                self.resolve_bot(tenant, key, resolve_remote).await
            }
            ManageAction::PauseBot => self.pause_bot(tenant, key).await,
            ManageAction::ResumeBot => self.resume_bot(tenant, key).await,
        };
        ManageResponse::Completed {
            action: request.action,
            outcome,
        }
    }

    /// A human agent replied from the desk. Pauses the bot when the tenant
    /// has `auto_pause` on; returns the number of sessions paused.
    pub async fn on_human_reply(&self, tenant: &TenantId, key: &ConversationKey) -> usize {
        if !self.policy.resolve(tenant).await.auto_pause {
            debug!(tenant = %tenant, conversation_key = %key, "auto pause disabled");
            return 0;
        }
        self.pause_sessions(tenant, key).await
    }

    /// A bot flow finished. Sessions are always closed; the remote
    /// conversation is resolved only with `auto_resolve` on.
    pub async fn on_bot_completed(&self, tenant: &TenantId, key: &ConversationKey) -> ActionOutcome {
        let auto_resolve = self.policy.resolve(tenant).await.auto_resolve;
        self.resolve_bot(tenant, key, auto_resolve).await
    }

    /// Scan outgoing bot text for the transfer marker and hand off if found.
    pub async fn detect_transfer(
        &self,
        tenant: &TenantId,
        key: &ConversationKey,
        text: &str,
    ) -> TransferDetection {
        let unchanged = || TransferDetection {
            text: text.to_string(),
            transferred: None,
        };
        if !self.policy.resolve(tenant).await.detect_transfer_marker {
            return unchanged();
        }
        let Some(stripped) = strip_marker(text, &self.transfer_marker) else {
            return unchanged();
        };
        info!(tenant = %tenant, conversation_key = %key, "transfer marker found in bot output");
        let outcome = self
            .transfer_to_human(tenant, key, Assignment::default())
            .await;
        TransferDetection {
            text: stripped,
            transferred: Some(outcome),
        }
    }

    /// Start a bot session for a conversation.
    pub async fn open_session(
        &self,
        tenant: &TenantId,
        key: &ConversationKey,
    ) -> Option<BotSession> {
        match self.sessions.open_session(tenant, key).await {
            Ok(session) => {
                debug!(tenant = %tenant, conversation_key = %key, session_id = %session.id, "bot session opened");
                Some(session)
            }
            Err(e) => {
                error!(tenant = %tenant, conversation_key = %key, error = %e, "error opening bot session");
                None
            }
        }
    }

    /// Append a message to the history used for linking.
    ///
    /// Unlike the coordination actions this returns the error, so a caller
    /// can tell a rejected message from a storage failure.
    pub async fn record_message(&self, message: &ConversationMessage) -> Result<(), RelayError> {
        self.history.record_message(message).await.inspect_err(|e| {
            error!(tenant = %message.tenant_id, conversation_key = %message.conversation_key, error = %e, "error recording message");
        })
    }

    /// Sessions of a conversation, newest first. Empty on error.
    pub async fn sessions(&self, tenant: &TenantId, key: &ConversationKey) -> Vec<BotSession> {
        self.sessions
            .list_sessions(tenant, key)
            .await
            .unwrap_or_else(|e| {
                error!(tenant = %tenant, conversation_key = %key, error = %e, "error listing bot sessions");
                Vec::new()
            })
    }

    async fn pause_sessions(&self, tenant: &TenantId, key: &ConversationKey) -> usize {
        let paused = self
            .transition(tenant, key, &[SessionStatus::Opened], SessionStatus::Paused)
            .await;
        if paused > 0 {
            info!(tenant = %tenant, conversation_key = %key, count = paused, "paused bot sessions");
        }
        paused
    }

    async fn transition(
        &self,
        tenant: &TenantId,
        key: &ConversationKey,
        from: &[SessionStatus],
        to: SessionStatus,
    ) -> usize {
        match self.sessions.bulk_transition(tenant, key, from, to).await {
            Ok(count) => count,
            Err(e) => {
                error!(tenant = %tenant, conversation_key = %key, to = %to, error = %e, "error transitioning bot sessions");
                0
            }
        }
    }

    async fn usable_credential(&self, tenant: &TenantId) -> Option<DeskCredential> {
        match self.credentials.credential(tenant).await {
            Ok(Some(cred)) if cred.is_usable() => Some(cred),
            Ok(_) => {
                debug!(tenant = %tenant, "no usable desk credential");
                None
            }
            Err(e) => {
                error!(tenant = %tenant, error = %e, "error reading desk credential");
                None
            }
        }
    }

    /// Set the remote status (and then any assignment) of the linked
    /// conversation. Returns whether the status change succeeded;
    /// assignment outcomes are logged only.
    async fn update_remote(
        &self,
        tenant: &TenantId,
        key: &ConversationKey,
        status: RemoteStatus,
        assignment: Assignment,
    ) -> bool {
        let Some(cred) = self.usable_credential(tenant).await else {
            return false;
        };
        let Some(remote_id) = self.linker.find_remote_id(tenant, key).await else {
            warn!(tenant = %tenant, conversation_key = %key, "no remote conversation linked");
            return false;
        };
        if !self.desk.set_status(&cred, remote_id, &status).await {
            return false;
        }
        if !assignment.is_empty() {
            let report = self.desk.assign(&cred, remote_id, &assignment).await;
            debug!(
                remote_conversation_id = remote_id,
                agent = ?report.agent,
                team = ?report.team,
                "assignment finished"
            );
        }
        true
    }
}

/// Remove every occurrence of `marker` from `text`, trimming the result.
/// `None` when the marker is empty or absent.
pub fn strip_marker(text: &str, marker: &str) -> Option<String> {
    if marker.is_empty() || !text.contains(marker) {
        return None;
    }
    Some(text.replace(marker, "").trim().to_string())
}
