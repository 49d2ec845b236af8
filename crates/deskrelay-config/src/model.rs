// SPDX-FileCopyrightText: 2026 deskrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for deskrelay.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use deskrelay_core::CoordinationPolicy;
use serde::{Deserialize, Serialize};

/// Top-level deskrelay configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DeskrelayConfig {
    /// Global coordination policy defaults.
    #[serde(default)]
    pub coordination: CoordinationConfig,

    /// Remote desk HTTP client settings.
    #[serde(default)]
    pub desk: DeskConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// HTTP gateway settings.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Log output settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Global coordination defaults. Tenants override these field by field.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CoordinationConfig {
    /// Check remote assignment before letting the bot process a message.
    #[serde(default = "default_true")]
    pub check_agent: bool,

    /// Pause the bot when a human agent replies from the desk.
    #[serde(default = "default_true")]
    pub auto_pause: bool,

    /// Resolve the remote conversation when a bot flow completes.
    #[serde(default)]
    pub auto_resolve: bool,

    /// Accept explicit management commands.
    #[serde(default = "default_true")]
    pub manage_enabled: bool,

    /// Detect the transfer marker in bot output.
    #[serde(default)]
    pub detect_transfer_marker: bool,

    /// Marker text the bot emits to request a human.
    #[serde(default = "default_transfer_marker")]
    pub transfer_marker: String,

    /// How long a resolved tenant policy may be served from cache.
    /// `0` disables caching and reads the tenant override on every call.
    #[serde(default)]
    pub policy_cache_ttl_secs: u64,
}

impl CoordinationConfig {
    /// The global defaults as a policy value.
    pub fn policy(&self) -> CoordinationPolicy {
        CoordinationPolicy {
            check_agent: self.check_agent,
            auto_pause: self.auto_pause,
            auto_resolve: self.auto_resolve,
            manage_enabled: self.manage_enabled,
            detect_transfer_marker: self.detect_transfer_marker,
        }
    }
}

impl Default for CoordinationConfig {
    fn default() -> Self {
        Self {
            check_agent: true,
            auto_pause: true,
            auto_resolve: false,
            manage_enabled: true,
            detect_transfer_marker: false,
            transfer_marker: default_transfer_marker(),
            policy_cache_ttl_secs: 0,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_transfer_marker() -> String {
    "[[transfer_human]]".to_string()
}

/// Remote desk HTTP client configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DeskConfig {
    /// Per-call timeout in seconds.
    #[serde(default = "default_desk_timeout_secs")]
    pub timeout_secs: u64,

    /// User-Agent header sent to the desk.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for DeskConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_desk_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_desk_timeout_secs() -> u64 {
    5
}

fn default_user_agent() -> String {
    concat!("deskrelay/", env!("CARGO_PKG_VERSION")).to_string()
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("deskrelay").join("deskrelay.db"))
        .and_then(|p| p.to_str().map(String::from))
        .unwrap_or_else(|| "deskrelay.db".to_string())
}

fn default_wal_mode() -> bool {
    true
}

/// HTTP gateway configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Bearer token required on `/v1` routes. `None` rejects every `/v1` request.
    #[serde(default)]
    pub bearer_token: Option<String>,

    /// Domain appended to conversation keys that carry no `@`.
    #[serde(default = "default_key_domain")]
    pub default_key_domain: String,
}

impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("bearer_token", &self.bearer_token.as_ref().map(|_| "[redacted]"))
            .field("default_key_domain", &self.default_key_domain)
            .finish()
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            bearer_token: None,
            default_key_domain: default_key_domain(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8640
}

fn default_key_domain() -> String {
    "s.whatsapp.net".to_string()
}

/// Log output configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Default level filter when `RUST_LOG` is unset (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format: `pretty` or `json`.
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordination_defaults_match_documented_values() {
        let policy = CoordinationConfig::default().policy();
        assert!(policy.check_agent);
        assert!(policy.auto_pause);
        assert!(!policy.auto_resolve);
        assert!(policy.manage_enabled);
        assert!(!policy.detect_transfer_marker);
    }

    #[test]
    fn gateway_debug_redacts_token() {
        let config = GatewayConfig {
            bearer_token: Some("super-secret".into()),
            ..GatewayConfig::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("[redacted]"));
    }

    #[test]
    fn default_user_agent_names_the_crate() {
        assert!(DeskConfig::default().user_agent.starts_with("deskrelay/"));
    }
}
