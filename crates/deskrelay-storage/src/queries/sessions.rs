// SPDX-FileCopyrightText: 2026 deskrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bot session operations.

use std::str::FromStr;

use deskrelay_core::RelayError;
use rusqlite::{params, params_from_iter};

use crate::database::{map_tr_err, Database};
use crate::models::{BotSession, SessionStatus};

const SESSION_COLUMNS: &str = "id, tenant_id, conversation_key, status, created_at, updated_at";

fn row_to_session(row: &rusqlite::Row<'_>) -> Result<BotSession, rusqlite::Error> {
    let status: String = row.get(3)?;
    let status = SessionStatus::from_str(&status).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(BotSession {
        id: row.get(0)?,
        tenant_id: row.get(1)?,
        conversation_key: row.get(2)?,
        status,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

/// Create a new `opened` session and return it as stored.
pub async fn create_session(
    db: &Database,
    tenant_id: &str,
    conversation_key: &str,
) -> Result<BotSession, RelayError> {
    let id = uuid::Uuid::new_v4().to_string();
    let tenant_id = tenant_id.to_string();
    let conversation_key = conversation_key.to_string();
    db.connection()
        .call(move |conn| -> Result<BotSession, rusqlite::Error> {
            conn.execute(
                "INSERT INTO bot_sessions (id, tenant_id, conversation_key, status)
                 VALUES (?1, ?2, ?3, 'opened')",
                params![id, tenant_id, conversation_key],
            )?;
            conn.query_row(
                &format!("SELECT {SESSION_COLUMNS} FROM bot_sessions WHERE id = ?1"),
                params![id],
                row_to_session,
            )
        })
        .await
        .map_err(map_tr_err)
}

/// List sessions for a conversation, newest first.
pub async fn list_sessions(
    db: &Database,
    tenant_id: &str,
    conversation_key: &str,
) -> Result<Vec<BotSession>, RelayError> {
    let tenant_id = tenant_id.to_string();
    let conversation_key = conversation_key.to_string();
    db.connection()
        .call(move |conn| -> Result<Vec<BotSession>, rusqlite::Error> {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SESSION_COLUMNS} FROM bot_sessions
                 WHERE tenant_id = ?1 AND conversation_key = ?2
                 ORDER BY created_at DESC, rowid DESC"
            ))?;
            let rows = stmt.query_map(params![tenant_id, conversation_key], row_to_session)?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(map_tr_err)
}

/// Move every session of a conversation whose status is in `from` to `to`
/// in one `UPDATE` statement, returning the number of rows changed.
///
/// `Closed` is dropped from `from` (closed is terminal) as is `to` itself, so
/// the returned count only ever reflects real transitions.
pub async fn bulk_transition(
    db: &Database,
    tenant_id: &str,
    conversation_key: &str,
    from: &[SessionStatus],
    to: SessionStatus,
) -> Result<usize, RelayError> {
    let mut sources: Vec<String> = from
        .iter()
        .filter(|s| **s != SessionStatus::Closed && **s != to)
        .map(|s| s.to_string())
        .collect();
    sources.sort_unstable();
    sources.dedup();
    if sources.is_empty() {
        return Ok(0);
    }

    let placeholders = (0..sources.len())
        .map(|i| format!("?{}", i + 4))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "UPDATE bot_sessions
         SET status = ?1, updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
         WHERE tenant_id = ?2 AND conversation_key = ?3 AND status IN ({placeholders})"
    );

    let mut values: Vec<String> = vec![
        to.as_ref().to_string(),
        tenant_id.to_string(),
        conversation_key.to_string(),
    ];
    values.extend(sources);

    db.connection()
        .call(move |conn| -> Result<usize, rusqlite::Error> {
            conn.execute(&sql, params_from_iter(values.iter()))
        })
        .await
        .map_err(map_tr_err)
}
