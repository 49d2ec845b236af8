// SPDX-FileCopyrightText: 2026 deskrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `deskrelay status` command implementation.
//!
//! Reads the tenant's stored override and prints the effective policy next
//! to the global defaults. Works without a running server.

use deskrelay_config::model::DeskrelayConfig;
use deskrelay_coordinator::PolicyResolver;
use deskrelay_core::{RelayError, TenantId};
use serde_json::{json, Value};

use crate::serve::open_store;

/// Build the status document for `tenant`.
pub async fn tenant_status(config: &DeskrelayConfig, tenant: &str) -> Result<Value, RelayError> {
    let tenant = tenant.trim();
    if tenant.is_empty() {
        return Err(RelayError::InvalidRequest("tenant is required".into()));
    }

    let store = open_store(&config.storage).await?;
    let resolver = PolicyResolver::from_config(&config.coordination, store.clone());
    let tenant = TenantId::from(tenant);
    let policy = resolver.resolve(&tenant).await;
    store.close().await?;

    Ok(json!({
        "tenant": tenant.0,
        "coordination": policy,
        "defaults": resolver.defaults(),
    }))
}

/// Run the `deskrelay status --tenant <id>` command.
pub async fn run_status(config: &DeskrelayConfig, tenant: &str) -> Result<(), RelayError> {
    let status = tenant_status(config, tenant).await?;
    let rendered = serde_json::to_string_pretty(&status)
        .map_err(|e| RelayError::Internal(format!("failed to render status: {e}")))?;
    println!("{rendered}");
    Ok(())
}
