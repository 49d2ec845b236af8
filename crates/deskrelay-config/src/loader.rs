// SPDX-FileCopyrightText: 2026 deskrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./deskrelay.toml` > `~/.config/deskrelay/deskrelay.toml`
//! > `/etc/deskrelay/deskrelay.toml` with environment variable overrides via
//! the `DESKRELAY_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::DeskrelayConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/deskrelay/deskrelay.toml` (system-wide)
/// 3. `~/.config/deskrelay/deskrelay.toml` (user XDG config)
/// 4. `./deskrelay.toml` (local directory)
/// 5. `DESKRELAY_*` environment variables
pub fn load_config() -> Result<DeskrelayConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<DeskrelayConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(DeskrelayConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<DeskrelayConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(DeskrelayConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading.
///
/// Returns the Figment before extraction so callers can inspect metadata.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(DeskrelayConfig::default()))
        .merge(Toml::file("/etc/deskrelay/deskrelay.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("deskrelay/deskrelay.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("deskrelay.toml"))
        .merge(env_provider())
}

/// Environment variable provider with explicit section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` because key names contain
/// underscores: `DESKRELAY_COORDINATION_CHECK_AGENT` must map to
/// `coordination.check_agent`, not `coordination.check.agent`.
pub(crate) fn env_provider() -> Env {
    Env::prefixed("DESKRELAY_").map(|key| map_env_key(key.as_str()).into())
}

/// Maps a lowercased, prefix-stripped env var name to a dotted config path.
pub(crate) fn map_env_key(key: &str) -> String {
    const SECTIONS: [&str; 5] = ["coordination", "desk", "storage", "gateway", "logging"];
    for section in SECTIONS {
        if let Some(rest) = key.strip_prefix(section).and_then(|r| r.strip_prefix('_')) {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_keys_map_to_first_section_only() {
        assert_eq!(
            map_env_key("coordination_check_agent"),
            "coordination.check_agent"
        );
        assert_eq!(map_env_key("desk_timeout_secs"), "desk.timeout_secs");
        assert_eq!(
            map_env_key("gateway_default_key_domain"),
            "gateway.default_key_domain"
        );
        assert_eq!(map_env_key("unrelated"), "unrelated");
    }
}
