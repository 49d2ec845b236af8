// SPDX-FileCopyrightText: 2026 deskrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-tenant settings: coordination override and desk credential.

use deskrelay_core::RelayError;
use rusqlite::{params, OptionalExtension};

use crate::database::{map_tr_err, Database};
use crate::models::TenantSettings;

/// Insert or replace every column of a tenant's settings row.
pub async fn upsert_tenant_settings(
    db: &Database,
    settings: &TenantSettings,
) -> Result<(), RelayError> {
    let s = settings.clone();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "INSERT INTO tenant_settings (tenant_id, coordination_override, desk_base_url,
                                              desk_api_token, desk_account_id, desk_enabled)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(tenant_id) DO UPDATE SET
                    coordination_override = excluded.coordination_override,
                    desk_base_url = excluded.desk_base_url,
                    desk_api_token = excluded.desk_api_token,
                    desk_account_id = excluded.desk_account_id,
                    desk_enabled = excluded.desk_enabled,
                    updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
                params![
                    s.tenant_id,
                    s.coordination_override,
                    s.desk_base_url,
                    s.desk_api_token,
                    s.desk_account_id,
                    s.desk_enabled,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Set only the coordination override blob, creating the row if needed.
/// `None` clears the override.
pub async fn set_coordination_override(
    db: &Database,
    tenant_id: &str,
    override_json: Option<&str>,
) -> Result<(), RelayError> {
    let tenant_id = tenant_id.to_string();
    let override_json = override_json.map(str::to_string);
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "INSERT INTO tenant_settings (tenant_id, coordination_override)
                 VALUES (?1, ?2)
                 ON CONFLICT(tenant_id) DO UPDATE SET
                    coordination_override = excluded.coordination_override,
                    updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
                params![tenant_id, override_json],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Fetch a tenant's settings row.
pub async fn get_tenant_settings(
    db: &Database,
    tenant_id: &str,
) -> Result<Option<TenantSettings>, RelayError> {
    let tenant_id = tenant_id.to_string();
    db.connection()
        .call(move |conn| -> Result<Option<TenantSettings>, rusqlite::Error> {
            conn.query_row(
                "SELECT tenant_id, coordination_override, desk_base_url, desk_api_token,
                        desk_account_id, desk_enabled
                 FROM tenant_settings WHERE tenant_id = ?1",
                params![tenant_id],
                |row| {
                    Ok(TenantSettings {
                        tenant_id: row.get(0)?,
                        coordination_override: row.get(1)?,
                        desk_base_url: row.get(2)?,
                        desk_api_token: row.get(3)?,
                        desk_account_id: row.get(4)?,
                        desk_enabled: row.get(5)?,
                    })
                },
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    fn desk_settings(tenant: &str) -> TenantSettings {
        TenantSettings {
            tenant_id: tenant.to_string(),
            coordination_override: None,
            desk_base_url: Some("https://desk.example.com".to_string()),
            desk_api_token: Some("tok".to_string()),
            desk_account_id: Some("3".to_string()),
            desk_enabled: true,
        }
    }

    #[tokio::test]
    async fn missing_tenant_has_no_settings() {
        let (db, _dir) = setup_db().await;
        assert!(get_tenant_settings(&db, "nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn upsert_replaces_existing_row() {
        let (db, _dir) = setup_db().await;
        upsert_tenant_settings(&db, &desk_settings("t1")).await.unwrap();

        let mut updated = desk_settings("t1");
        updated.desk_enabled = false;
        updated.desk_account_id = Some("4".to_string());
        upsert_tenant_settings(&db, &updated).await.unwrap();

        let stored = get_tenant_settings(&db, "t1").await.unwrap().unwrap();
        assert_eq!(stored, updated);
    }

    #[tokio::test]
    async fn override_update_keeps_desk_fields() {
        let (db, _dir) = setup_db().await;
        upsert_tenant_settings(&db, &desk_settings("t1")).await.unwrap();
        set_coordination_override(&db, "t1", Some(r#"{"checkAgent":false}"#))
            .await
            .unwrap();

        let stored = get_tenant_settings(&db, "t1").await.unwrap().unwrap();
        assert_eq!(
            stored.coordination_override.as_deref(),
            Some(r#"{"checkAgent":false}"#)
        );
        assert_eq!(stored.desk_api_token.as_deref(), Some("tok"));
        assert!(stored.desk_enabled);

        set_coordination_override(&db, "t1", None).await.unwrap();
        let cleared = get_tenant_settings(&db, "t1").await.unwrap().unwrap();
        assert!(cleared.coordination_override.is_none());
    }

    #[tokio::test]
    async fn override_for_new_tenant_creates_disabled_row() {
        let (db, _dir) = setup_db().await;
        set_coordination_override(&db, "fresh", Some("{}")).await.unwrap();

        let stored = get_tenant_settings(&db, "fresh").await.unwrap().unwrap();
        assert!(!stored.desk_enabled);
        assert!(stored.desk_base_url.is_none());
    }
}
