// SPDX-FileCopyrightText: 2026 deskrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Maps a local conversation to its remote desk conversation.

use std::sync::Arc;

use deskrelay_core::{ConversationKey, MessageHistory, TenantId};
use tracing::error;

/// Finds the remote conversation id from the newest linked message.
///
/// A lookup error is logged and reported as "no link"; callers cannot act
/// on the remote side either way.
pub struct ConversationLinker {
    history: Arc<dyn MessageHistory>,
}

impl ConversationLinker {
    pub fn new(history: Arc<dyn MessageHistory>) -> Self {
        Self { history }
    }

    pub async fn find_remote_id(&self, tenant: &TenantId, key: &ConversationKey) -> Option<u64> {
        match self.history.latest_remote_conversation_id(tenant, key).await {
            Ok(id) => id,
            Err(e) => {
                error!(tenant = %tenant, conversation_key = %key, error = %e, "error looking up remote conversation id");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deskrelay_test_utils::MemoryHistory;

    #[tokio::test]
    async fn newest_linked_message_is_used() {
        let history = Arc::new(MemoryHistory::new());
        history.link("t1", "k", 10, 100);
        history.link("t1", "k", 30, 300);
        history.link("t1", "k", 20, 200);
        let linker = ConversationLinker::new(history);

        assert_eq!(
            linker.find_remote_id(&TenantId::from("t1"), &ConversationKey::from("k")).await,
            Some(300)
        );
        assert_eq!(
            linker.find_remote_id(&TenantId::from("t1"), &ConversationKey::from("none")).await,
            None
        );
    }

    #[tokio::test]
    async fn lookup_error_is_no_link() {
        let history = Arc::new(MemoryHistory::new().failing());
        history.link("t1", "k", 1, 5);
        let linker = ConversationLinker::new(history);

        assert_eq!(
            linker.find_remote_id(&TenantId::from("t1"), &ConversationKey::from("k")).await,
            None
        );
    }
}
