// SPDX-FileCopyrightText: 2026 deskrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session persistence and message history traits.

use async_trait::async_trait;

use crate::error::RelayError;
use crate::types::{BotSession, ConversationKey, ConversationMessage, SessionStatus, TenantId};

/// Bot-session lifecycle store.
///
/// All coordinator mutations go through [`SessionStore::bulk_transition`],
/// which must be a single atomic filter-and-set so that concurrent actions on
/// the same conversation key never observe a half-applied transition.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Creates an `opened` session for a conversation the bot starts handling.
    async fn open_session(
        &self,
        tenant: &TenantId,
        key: &ConversationKey,
    ) -> Result<BotSession, RelayError>;

    /// Moves every session matching tenant + key whose status is in `from`
    /// to `to`, returning the number of rows changed.
    ///
    /// Closed sessions are never moved, even if `from` names `Closed`.
    async fn bulk_transition(
        &self,
        tenant: &TenantId,
        key: &ConversationKey,
        from: &[SessionStatus],
        to: SessionStatus,
    ) -> Result<usize, RelayError>;

    /// Lists all sessions for a conversation, newest first.
    async fn list_sessions(
        &self,
        tenant: &TenantId,
        key: &ConversationKey,
    ) -> Result<Vec<BotSession>, RelayError>;
}

/// Read/append access to the message history used for conversation linking.
#[async_trait]
pub trait MessageHistory: Send + Sync {
    /// Appends a message to the history.
    async fn record_message(&self, message: &ConversationMessage) -> Result<(), RelayError>;

    /// Remote conversation id carried by the newest message (by message
    /// timestamp) for this conversation, if any message carries one.
    async fn latest_remote_conversation_id(
        &self,
        tenant: &TenantId,
        key: &ConversationKey,
    ) -> Result<Option<u64>, RelayError>;
}
