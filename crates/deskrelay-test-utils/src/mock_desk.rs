// SPDX-FileCopyrightText: 2026 deskrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scripted remote desk for deterministic testing.
//!
//! `MockDesk` answers from a fixed set of conversation snapshots and records
//! every call so tests can assert exactly what reached the remote side.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use deskrelay_core::{
    Assignment, AssignmentReport, ConversationSnapshot, DeskCredential, RemoteDesk, RemoteStatus,
};

/// One recorded call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeskCall {
    GetConversation(u64),
    SetStatus(u64, RemoteStatus),
    Assign(u64, Assignment),
}

pub struct MockDesk {
    conversations: HashMap<u64, ConversationSnapshot>,
    reachable: bool,
    status_ok: bool,
    agent_ok: bool,
    team_ok: bool,
    calls: Mutex<Vec<DeskCall>>,
}

impl Default for MockDesk {
    fn default() -> Self {
        Self {
            conversations: HashMap::new(),
            reachable: true,
            status_ok: true,
            agent_ok: true,
            team_ok: true,
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl MockDesk {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `snapshot` for its conversation id.
    pub fn with_conversation(mut self, snapshot: ConversationSnapshot) -> Self {
        self.conversations.insert(snapshot.id, snapshot);
        self
    }

    /// Shorthand for a conversation with the given assignee and status.
    pub fn with_state(self, id: u64, assignee_id: Option<u64>, status: RemoteStatus) -> Self {
        self.with_conversation(ConversationSnapshot {
            id,
            assigned: assignee_id.is_some(),
            assignee_id,
            team_id: None,
            status,
        })
    }

    /// Behave as if the desk is down: every call fails.
    pub fn unreachable(mut self) -> Self {
        self.reachable = false;
        self
    }

    /// Make status changes fail while fetches still succeed.
    pub fn rejecting_status(mut self) -> Self {
        self.status_ok = false;
        self
    }

    /// Make the agent assignment step fail.
    pub fn rejecting_agent(mut self) -> Self {
        self.agent_ok = false;
        self
    }

    /// Every call made so far, in order.
    pub fn calls(&self) -> Vec<DeskCall> {
        self.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.lock().len()
    }

    /// Status changes made so far.
    pub fn status_changes(&self) -> Vec<(u64, RemoteStatus)> {
        self.lock()
            .iter()
            .filter_map(|c| match c {
                DeskCall::SetStatus(id, status) => Some((*id, status.clone())),
                _ => None,
            })
            .collect()
    }

    /// Assignments requested so far.
    pub fn assignments(&self) -> Vec<(u64, Assignment)> {
        self.lock()
            .iter()
            .filter_map(|c| match c {
                DeskCall::Assign(id, a) => Some((*id, *a)),
                _ => None,
            })
            .collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<DeskCall>> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl RemoteDesk for MockDesk {
    async fn get_conversation(
        &self,
        _credential: &DeskCredential,
        conversation_id: u64,
    ) -> Option<ConversationSnapshot> {
        self.lock().push(DeskCall::GetConversation(conversation_id));
        if !self.reachable {
            return None;
        }
        self.conversations.get(&conversation_id).cloned()
    }

    async fn set_status(
        &self,
        _credential: &DeskCredential,
        conversation_id: u64,
        status: &RemoteStatus,
    ) -> bool {
        self.lock()
            .push(DeskCall::SetStatus(conversation_id, status.clone()));
        self.reachable && self.status_ok
    }

    async fn assign(
        &self,
        _credential: &DeskCredential,
        conversation_id: u64,
        assignment: &Assignment,
    ) -> AssignmentReport {
        self.lock().push(DeskCall::Assign(conversation_id, *assignment));
        AssignmentReport {
            agent: assignment.agent_id.map(|_| self.reachable && self.agent_ok),
            team: assignment.team_id.map(|_| self.reachable && self.team_ok),
        }
    }
}
