// SPDX-FileCopyrightText: 2026 deskrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Remote desk client trait.

use async_trait::async_trait;

use crate::types::{Assignment, AssignmentReport, ConversationSnapshot, DeskCredential, RemoteStatus};

/// Thin, fail-soft client for the remote conversation system.
///
/// Implementations bound every call by a timeout and never return errors:
/// transport failures, timeouts, and non-2xx responses are logged and
/// surfaced as `None` / `false`. An unusable credential short-circuits to
/// failure without any network traffic.
#[async_trait]
pub trait RemoteDesk: Send + Sync {
    /// Fetches the current state of a remote conversation.
    async fn get_conversation(
        &self,
        credential: &DeskCredential,
        conversation_id: u64,
    ) -> Option<ConversationSnapshot>;

    /// Changes the status of a remote conversation.
    async fn set_status(
        &self,
        credential: &DeskCredential,
        conversation_id: u64,
        status: &RemoteStatus,
    ) -> bool;

    /// Assigns an agent and/or team. Each requested step is an independent
    /// call; one may fail while the other succeeds.
    async fn assign(
        &self,
        credential: &DeskCredential,
        conversation_id: u64,
        assignment: &Assignment,
    ) -> AssignmentReport;
}
