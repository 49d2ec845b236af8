// SPDX-FileCopyrightText: 2026 deskrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory session store and message history.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use deskrelay_core::{
    BotSession, ConversationKey, ConversationMessage, MessageDirection, MessageHistory,
    RelayError, SessionStatus, SessionStore, TenantId,
};

fn injected_failure(what: &str) -> RelayError {
    RelayError::Storage {
        source: format!("injected {what} failure").into(),
    }
}

/// Session store backed by a `Vec`. The whole transition runs under one lock,
/// matching the atomicity of the SQL implementation.
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: Mutex<Vec<BotSession>>,
    fail: bool,
    writes: AtomicUsize,
    clock: AtomicUsize,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every trait call returns a storage error.
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    /// Insert a session directly, bypassing the counters.
    pub fn seed(&self, tenant: &str, key: &str, status: SessionStatus) {
        let session = self.make_session(tenant, key, status);
        self.lock().push(session);
    }

    /// Statuses of a conversation's sessions in insertion order.
    pub fn statuses(&self, tenant: &str, key: &str) -> Vec<SessionStatus> {
        self.lock()
            .iter()
            .filter(|s| s.tenant_id == tenant && s.conversation_key == key)
            .map(|s| s.status)
            .collect()
    }

    /// Number of mutating calls (`open_session` and `bulk_transition`) made
    /// through the trait, including failed ones.
    pub fn write_calls(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<BotSession>> {
        self.sessions.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn timestamp(&self) -> String {
        format!("t{:06}", self.clock.fetch_add(1, Ordering::SeqCst))
    }

    fn make_session(&self, tenant: &str, key: &str, status: SessionStatus) -> BotSession {
        let now = self.timestamp();
        BotSession {
            id: uuid::Uuid::new_v4().to_string(),
            tenant_id: tenant.to_string(),
            conversation_key: key.to_string(),
            status,
            created_at: now.clone(),
            updated_at: now,
        }
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn open_session(
        &self,
        tenant: &TenantId,
        key: &ConversationKey,
    ) -> Result<BotSession, RelayError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(injected_failure("session store"));
        }
        let session = self.make_session(&tenant.0, &key.0, SessionStatus::Opened);
        self.lock().push(session.clone());
        Ok(session)
    }

    async fn bulk_transition(
        &self,
        tenant: &TenantId,
        key: &ConversationKey,
        from: &[SessionStatus],
        to: SessionStatus,
    ) -> Result<usize, RelayError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(injected_failure("session store"));
        }
        let now = self.timestamp();
        let mut sessions = self.lock();
        let mut changed = 0;
        for session in sessions.iter_mut().filter(|s| {
            s.tenant_id == tenant.0
                && s.conversation_key == key.0
                && s.status != SessionStatus::Closed
                && s.status != to
                && from.contains(&s.status)
        }) {
            session.status = to;
            session.updated_at = now.clone();
            changed += 1;
        }
        Ok(changed)
    }

    async fn list_sessions(
        &self,
        tenant: &TenantId,
        key: &ConversationKey,
    ) -> Result<Vec<BotSession>, RelayError> {
        if self.fail {
            return Err(injected_failure("session store"));
        }
        let mut out: Vec<BotSession> = self
            .lock()
            .iter()
            .filter(|s| s.tenant_id == tenant.0 && s.conversation_key == key.0)
            .cloned()
            .collect();
        out.reverse();
        Ok(out)
    }
}

/// Message history backed by a `Vec`.
#[derive(Default)]
pub struct MemoryHistory {
    messages: Mutex<Vec<ConversationMessage>>,
    fail: bool,
    lookups: AtomicUsize,
}

impl MemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every trait call returns a storage error.
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    /// Record an inbound message linked to `remote_id` at `timestamp`.
    pub fn link(&self, tenant: &str, key: &str, timestamp: i64, remote_id: u64) {
        let msg = ConversationMessage {
            id: uuid::Uuid::new_v4().to_string(),
            tenant_id: tenant.to_string(),
            conversation_key: key.to_string(),
            direction: MessageDirection::Inbound,
            content: String::new(),
            remote_conversation_id: Some(remote_id),
            message_timestamp: timestamp,
        };
        self.lock().push(msg);
    }

    /// All recorded messages in insertion order.
    pub fn messages(&self) -> Vec<ConversationMessage> {
        self.lock().clone()
    }

    /// Number of `latest_remote_conversation_id` calls.
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<ConversationMessage>> {
        self.messages.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl MessageHistory for MemoryHistory {
    async fn record_message(&self, message: &ConversationMessage) -> Result<(), RelayError> {
        if self.fail {
            return Err(injected_failure("history"));
        }
        self.lock().push(message.clone());
        Ok(())
    }

    async fn latest_remote_conversation_id(
        &self,
        tenant: &TenantId,
        key: &ConversationKey,
    ) -> Result<Option<u64>, RelayError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(injected_failure("history"));
        }
        // Later inserts win ties, as with rowid ordering in SQLite.
        Ok(self
            .lock()
            .iter()
            .enumerate()
            .filter(|(_, m)| m.tenant_id == tenant.0 && m.conversation_key == key.0)
            .filter_map(|(i, m)| m.remote_conversation_id.map(|id| ((m.message_timestamp, i), id)))
            .max_by_key(|(order, _)| *order)
            .map(|(_, id)| id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn transition_skips_closed_and_counts_writes() {
        let store = MemorySessionStore::new();
        store.seed("t", "k", SessionStatus::Opened);
        store.seed("t", "k", SessionStatus::Closed);

        let changed = store
            .bulk_transition(
                &TenantId::from("t"),
                &ConversationKey::from("k"),
                &[SessionStatus::Opened, SessionStatus::Closed],
                SessionStatus::Paused,
            )
            .await
            .unwrap();

        assert_eq!(changed, 1);
        assert_eq!(store.statuses("t", "k"), vec![SessionStatus::Paused, SessionStatus::Closed]);
        assert_eq!(store.write_calls(), 1);
    }

    #[tokio::test]
    async fn history_ties_go_to_later_insert() {
        let history = MemoryHistory::new();
        history.link("t", "k", 5, 1);
        history.link("t", "k", 5, 2);
        history.link("t", "k", 4, 3);

        let id = history
            .latest_remote_conversation_id(&TenantId::from("t"), &ConversationKey::from("k"))
            .await
            .unwrap();
        assert_eq!(id, Some(2));
    }
}
