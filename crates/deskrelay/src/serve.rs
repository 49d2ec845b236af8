// SPDX-FileCopyrightText: 2026 deskrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `deskrelay serve` command implementation.
//!
//! Opens the SQLite store, builds the desk client and coordinator, and runs
//! the gateway until SIGINT or SIGTERM.

use std::path::Path;
use std::sync::Arc;

use deskrelay_config::model::{DeskrelayConfig, StorageConfig};
use deskrelay_coordinator::{HandoffCoordinator, PolicyResolver};
use deskrelay_core::{PluginAdapter, RelayError};
use deskrelay_desk::HttpDesk;
use deskrelay_gateway::{start_server, GatewayState};
use deskrelay_storage::SqliteStore;
use tracing::{error, info};

use crate::shutdown;

/// Open (and migrate) the store named by `config`, creating its directory.
pub async fn open_store(config: &StorageConfig) -> Result<Arc<SqliteStore>, RelayError> {
    if let Some(parent) = Path::new(&config.database_path).parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                RelayError::Internal(format!(
                    "failed to create database directory {}: {e}",
                    parent.display()
                ))
            })?;
        }
    }

    let store = SqliteStore::new(config.clone());
    store.initialize().await?;
    Ok(Arc::new(store))
}

/// Runs the `deskrelay serve` command.
pub async fn run_serve(config: DeskrelayConfig) -> Result<(), RelayError> {
    info!("starting deskrelay serve");

    let store = open_store(&config.storage).await?;
    info!(path = %config.storage.database_path, "storage initialized");

    let desk = Arc::new(HttpDesk::new(&config.desk)?);

    let resolver = PolicyResolver::from_config(&config.coordination, store.clone());
    let coordinator = HandoffCoordinator::new(
        resolver,
        store.clone(),
        store.clone(),
        store.clone(),
        desk.clone(),
    )
    .with_transfer_marker(config.coordination.transfer_marker.clone());

    let state = GatewayState::new(Arc::new(coordinator), &config.gateway)
        .with_adapter(store.clone())
        .with_adapter(desk);

    if config.gateway.bearer_token.is_none() {
        error!("gateway.bearer_token is not set -- every /v1 request will be rejected");
    }

    let cancel = shutdown::install_signal_handler();
    let served = start_server(&config.gateway, state, async move {
        cancel.cancelled().await;
    })
    .await;

    if let Err(e) = store.shutdown().await {
        error!(error = %e, "error closing storage");
    }

    served?;
    info!("deskrelay serve shutdown complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn open_store_creates_missing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("deeper").join("relay.db");
        let config = StorageConfig {
            database_path: path.to_string_lossy().into_owned(),
            wal_mode: true,
        };

        let store = open_store(&config).await.unwrap();
        assert!(path.exists());
        store.close().await.unwrap();
    }
}
