// SPDX-FileCopyrightText: 2026 deskrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message history operations.

use deskrelay_core::RelayError;
use rusqlite::{params, OptionalExtension};

use crate::database::{map_tr_err, Database};
use crate::models::ConversationMessage;

/// Insert a message into the history.
pub async fn insert_message(db: &Database, msg: &ConversationMessage) -> Result<(), RelayError> {
    let remote_id = msg
        .remote_conversation_id
        .map(i64::try_from)
        .transpose()
        .map_err(|_| RelayError::InvalidRequest("remote conversation id out of range".into()))?;
    let msg = msg.clone();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "INSERT INTO messages (id, tenant_id, conversation_key, direction, content,
                                       remote_conversation_id, message_timestamp)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    msg.id,
                    msg.tenant_id,
                    msg.conversation_key,
                    msg.direction.as_ref(),
                    msg.content,
                    remote_id,
                    msg.message_timestamp,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Remote conversation id of the newest message for this conversation that
/// carries one. Ties on `message_timestamp` go to the later insert.
pub async fn latest_remote_conversation_id(
    db: &Database,
    tenant_id: &str,
    conversation_key: &str,
) -> Result<Option<u64>, RelayError> {
    let tenant_id = tenant_id.to_string();
    let conversation_key = conversation_key.to_string();
    let raw = db
        .connection()
        .call(move |conn| -> Result<Option<i64>, rusqlite::Error> {
            conn.query_row(
                "SELECT remote_conversation_id FROM messages
                 WHERE tenant_id = ?1 AND conversation_key = ?2
                   AND remote_conversation_id IS NOT NULL
                 ORDER BY message_timestamp DESC, rowid DESC
                 LIMIT 1",
                params![tenant_id, conversation_key],
                |row| row.get(0),
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)?;
    Ok(raw.and_then(|id| u64::try_from(id).ok()))
}
