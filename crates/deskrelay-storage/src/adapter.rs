// SPDX-FileCopyrightText: 2026 deskrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the session, history, and tenant-settings traits.

use async_trait::async_trait;
use secrecy::SecretString;
use tokio::sync::OnceCell;
use tracing::debug;

use deskrelay_config::model::StorageConfig;
use deskrelay_core::{
    AdapterType, BotSession, ConversationKey, ConversationMessage, CredentialSource,
    DeskCredential, HealthStatus, MessageHistory, PluginAdapter, PolicyOverride, PolicySource,
    RelayError, SessionStatus, SessionStore, TenantId,
};

use crate::database::Database;
use crate::models::TenantSettings;
use crate::queries;

/// SQLite-backed store.
///
/// One instance serves as the [`SessionStore`], [`MessageHistory`],
/// [`PolicySource`], and [`CredentialSource`] of a deployment. The database is
/// opened lazily by [`SqliteStore::initialize`].
pub struct SqliteStore {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStore {
    /// Create a store for the configured path. Nothing is opened yet.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// Open the database and apply migrations. Fails if called twice.
    pub async fn initialize(&self) -> Result<(), RelayError> {
        let db = Database::open_with(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| RelayError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite store initialized");
        Ok(())
    }

    /// Checkpoint the WAL.
    pub async fn close(&self) -> Result<(), RelayError> {
        self.db()?.close().await
    }

    /// The underlying database, or an error before [`initialize`](Self::initialize).
    pub fn db(&self) -> Result<&Database, RelayError> {
        self.db.get().ok_or_else(|| RelayError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }

    /// Write a tenant's full settings row.
    pub async fn put_tenant_settings(&self, settings: &TenantSettings) -> Result<(), RelayError> {
        queries::tenants::upsert_tenant_settings(self.db()?, settings).await
    }

    /// Store (or clear) a tenant's coordination override.
    pub async fn put_policy_override(
        &self,
        tenant: &TenantId,
        policy: Option<&PolicyOverride>,
    ) -> Result<(), RelayError> {
        let json = policy
            .map(serde_json::to_string)
            .transpose()
            .map_err(RelayError::storage)?;
        queries::tenants::set_coordination_override(self.db()?, &tenant.0, json.as_deref()).await
    }
}

#[async_trait]
impl PluginAdapter for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, RelayError> {
        let db = self.db()?;
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(crate::database::map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), RelayError> {
        if let Some(db) = self.db.get() {
            db.close().await?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl SessionStore for SqliteStore {
    async fn open_session(
        &self,
        tenant: &TenantId,
        key: &ConversationKey,
    ) -> Result<BotSession, RelayError> {
        queries::sessions::create_session(self.db()?, &tenant.0, &key.0).await
    }

    async fn bulk_transition(
        &self,
        tenant: &TenantId,
        key: &ConversationKey,
        from: &[SessionStatus],
        to: SessionStatus,
    ) -> Result<usize, RelayError> {
        queries::sessions::bulk_transition(self.db()?, &tenant.0, &key.0, from, to).await
    }

    async fn list_sessions(
        &self,
        tenant: &TenantId,
        key: &ConversationKey,
    ) -> Result<Vec<BotSession>, RelayError> {
        queries::sessions::list_sessions(self.db()?, &tenant.0, &key.0).await
    }
}

#[async_trait]
impl MessageHistory for SqliteStore {
    async fn record_message(&self, message: &ConversationMessage) -> Result<(), RelayError> {
        queries::messages::insert_message(self.db()?, message).await
    }

    async fn latest_remote_conversation_id(
        &self,
        tenant: &TenantId,
        key: &ConversationKey,
    ) -> Result<Option<u64>, RelayError> {
        queries::messages::latest_remote_conversation_id(self.db()?, &tenant.0, &key.0).await
    }
}

#[async_trait]
impl PolicySource for SqliteStore {
    async fn tenant_override(
        &self,
        tenant: &TenantId,
    ) -> Result<Option<PolicyOverride>, RelayError> {
        let Some(settings) = queries::tenants::get_tenant_settings(self.db()?, &tenant.0).await?
        else {
            return Ok(None);
        };
        match settings.coordination_override.as_deref() {
            None => Ok(None),
            Some(raw) => serde_json::from_str(raw)
                .map(Some)
                .map_err(RelayError::storage),
        }
    }
}

#[async_trait]
impl CredentialSource for SqliteStore {
    async fn credential(&self, tenant: &TenantId) -> Result<Option<DeskCredential>, RelayError> {
        let Some(settings) = queries::tenants::get_tenant_settings(self.db()?, &tenant.0).await?
        else {
            return Ok(None);
        };
        if settings.desk_base_url.is_none()
            && settings.desk_api_token.is_none()
            && settings.desk_account_id.is_none()
        {
            return Ok(None);
        }
        Ok(Some(DeskCredential {
            base_url: settings.desk_base_url.unwrap_or_default(),
            api_token: SecretString::from(settings.desk_api_token.unwrap_or_default()),
            account_id: settings.desk_account_id.unwrap_or_default(),
            enabled: settings.desk_enabled,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deskrelay_core::MessageDirection;
    use tempfile::tempdir;

    fn make_config(path: &str) -> StorageConfig {
        StorageConfig {
            database_path: path.to_string(),
            wal_mode: true,
        }
    }

    async fn ready_store(dir: &tempfile::TempDir, name: &str) -> SqliteStore {
        let db_path = dir.path().join(name);
        let store = SqliteStore::new(make_config(db_path.to_str().unwrap()));
        store.initialize().await.unwrap();
        store
    }

    #[tokio::test]
    async fn sqlite_store_implements_plugin_adapter() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let store = SqliteStore::new(make_config(db_path.to_str().unwrap()));

        assert_eq!(store.name(), "sqlite");
        assert_eq!(store.version(), semver::Version::new(0, 1, 0));
        assert_eq!(store.adapter_type(), AdapterType::Storage);
    }

    #[tokio::test]
    async fn initialize_twice_returns_error() {
        let dir = tempdir().unwrap();
        let store = ready_store(&dir, "double.db").await;
        assert!(store.initialize().await.is_err());
    }

    #[tokio::test]
    async fn health_check_requires_initialize() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("health.db");
        let store = SqliteStore::new(make_config(db_path.to_str().unwrap()));

        assert!(store.health_check().await.is_err());
        store.initialize().await.unwrap();
        assert_eq!(store.health_check().await.unwrap(), HealthStatus::Healthy);
        store.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn session_lifecycle_through_store() {
        let dir = tempdir().unwrap();
        let store = ready_store(&dir, "lifecycle.db").await;
        let tenant = TenantId::from("t1");
        let key = ConversationKey::from("5511999@s.whatsapp.net");

        store.open_session(&tenant, &key).await.unwrap();
        let paused = store
            .bulk_transition(&tenant, &key, &[SessionStatus::Opened], SessionStatus::Paused)
            .await
            .unwrap();
        assert_eq!(paused, 1);

        let sessions = store.list_sessions(&tenant, &key).await.unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].status, SessionStatus::Paused);
        store.close().await.unwrap();
    }

    #[tokio::test]
    async fn history_links_latest_remote_id() {
        let dir = tempdir().unwrap();
        let store = ready_store(&dir, "history.db").await;
        let tenant = TenantId::from("t1");
        let key = ConversationKey::from("k");

        assert_eq!(store.latest_remote_conversation_id(&tenant, &key).await.unwrap(), None);
        store
            .record_message(&ConversationMessage {
                id: "m1".into(),
                tenant_id: "t1".into(),
                conversation_key: "k".into(),
                direction: MessageDirection::Inbound,
                content: "hi".into(),
                remote_conversation_id: Some(42),
                message_timestamp: 1_700_000_000,
            })
            .await
            .unwrap();
        assert_eq!(
            store.latest_remote_conversation_id(&tenant, &key).await.unwrap(),
            Some(42)
        );
    }

    #[tokio::test]
    async fn policy_override_roundtrips_through_json() {
        let dir = tempdir().unwrap();
        let store = ready_store(&dir, "policy.db").await;
        let tenant = TenantId::from("t1");

        assert_eq!(store.tenant_override(&tenant).await.unwrap(), None);

        let over = PolicyOverride {
            check_agent: Some(false),
            manage_enabled: Some(false),
            ..PolicyOverride::default()
        };
        store.put_policy_override(&tenant, Some(&over)).await.unwrap();
        assert_eq!(store.tenant_override(&tenant).await.unwrap(), Some(over));

        store.put_policy_override(&tenant, None).await.unwrap();
        assert_eq!(store.tenant_override(&tenant).await.unwrap(), None);
    }

    #[tokio::test]
    async fn malformed_override_is_an_error() {
        let dir = tempdir().unwrap();
        let store = ready_store(&dir, "bad_policy.db").await;
        queries::tenants::set_coordination_override(store.db().unwrap(), "t1", Some("not json"))
            .await
            .unwrap();

        assert!(store.tenant_override(&TenantId::from("t1")).await.is_err());
    }

    #[tokio::test]
    async fn credential_reflects_settings_row() {
        let dir = tempdir().unwrap();
        let store = ready_store(&dir, "cred.db").await;
        let tenant = TenantId::from("t1");

        assert!(store.credential(&tenant).await.unwrap().is_none());

        store
            .put_tenant_settings(&TenantSettings {
                tenant_id: "t1".into(),
                coordination_override: None,
                desk_base_url: Some("https://desk.example.com/".into()),
                desk_api_token: Some("tok".into()),
                desk_account_id: Some("3".into()),
                desk_enabled: true,
            })
            .await
            .unwrap();

        let cred = store.credential(&tenant).await.unwrap().unwrap();
        assert!(cred.is_usable());
        assert_eq!(cred.base(), "https://desk.example.com");
        assert_eq!(cred.account_id, "3");
    }

    #[tokio::test]
    async fn override_only_row_has_no_credential() {
        let dir = tempdir().unwrap();
        let store = ready_store(&dir, "override_only.db").await;
        let tenant = TenantId::from("t1");
        store
            .put_policy_override(&tenant, Some(&PolicyOverride::default()))
            .await
            .unwrap();

        assert!(store.credential(&tenant).await.unwrap().is_none());
    }
}
