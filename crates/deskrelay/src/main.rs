// SPDX-FileCopyrightText: 2026 deskrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! deskrelay - bot/human-desk handoff coordinator.
//!
//! This is the binary entry point.

mod serve;
mod shutdown;
mod status;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use deskrelay_config::model::{DeskrelayConfig, LoggingConfig};
use deskrelay_config::ConfigError;

/// deskrelay - bot/human-desk handoff coordinator.
#[derive(Parser, Debug)]
#[command(name = "deskrelay", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the lookup hierarchy.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the coordination gateway.
    Serve,
    /// Print the effective coordination policy of a tenant as JSON.
    Status {
        #[arg(long)]
        tenant: String,
    },
    /// Inspect configuration.
    Config {
        #[command(subcommand)]
        action: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Load and validate configuration, reporting every problem found.
    Check,
    /// Print the resolved configuration as TOML, with secrets redacted.
    Show,
}

fn load_config(path: Option<&std::path::Path>) -> Result<DeskrelayConfig, Vec<ConfigError>> {
    match path {
        Some(path) => deskrelay_config::load_and_validate_path(path),
        None => deskrelay_config::load_and_validate(),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Load and validate configuration at startup
    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(errors) => {
            deskrelay_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Some(Commands::Serve) => {
            init_tracing(&config.logging);
            serve::run_serve(config).await
        }
        Some(Commands::Status { tenant }) => status::run_status(&config, &tenant).await,
        Some(Commands::Config {
            action: ConfigCommand::Check,
        }) => {
            eprintln!("deskrelay: configuration is valid");
            Ok(())
        }
        Some(Commands::Config {
            action: ConfigCommand::Show,
        }) => show_config(&config),
        None => {
            println!("deskrelay: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn show_config(config: &DeskrelayConfig) -> Result<(), deskrelay_core::RelayError> {
    let rendered = render_redacted(config)?;
    print!("{rendered}");
    Ok(())
}

fn render_redacted(config: &DeskrelayConfig) -> Result<String, deskrelay_core::RelayError> {
    let mut shown = config.clone();
    if shown.gateway.bearer_token.is_some() {
        shown.gateway.bearer_token = Some("[redacted]".to_string());
    }
    toml::to_string_pretty(&shown)
        .map_err(|e| deskrelay_core::RelayError::Internal(format!("failed to render config: {e}")))
}

/// Directive used when `RUST_LOG` is unset: every deskrelay crate at
/// `level`, request traces at `level`, everything else at `warn`.
fn default_filter(level: &str) -> String {
    const TARGETS: [&str; 7] = [
        "deskrelay",
        "deskrelay_core",
        "deskrelay_storage",
        "deskrelay_desk",
        "deskrelay_coordinator",
        "deskrelay_gateway",
        "tower_http",
    ];
    let mut directives: Vec<String> = TARGETS.iter().map(|t| format!("{t}={level}")).collect();
    directives.push("warn".to_string());
    directives.join(",")
}

fn init_tracing(logging: &LoggingConfig) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(&logging.level)));

    if logging.format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_names(false)
            .init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn cli_parses_status_and_config_commands() {
        let cli = Cli::try_parse_from(["deskrelay", "status", "--tenant", "t1"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Status { ref tenant }) if tenant == "t1"));

        let cli =
            Cli::try_parse_from(["deskrelay", "--config", "x.toml", "config", "check"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("x.toml")));
        assert!(matches!(
            cli.command,
            Some(Commands::Config {
                action: ConfigCommand::Check
            })
        ));

        assert!(Cli::try_parse_from(["deskrelay", "status"]).is_err());
    }

    #[test]
    fn binary_loads_config_defaults() {
        let config = deskrelay_config::load_and_validate_str("").unwrap();
        assert_eq!(config.gateway.port, 8640);
    }

    #[test]
    fn show_config_redacts_bearer_token() {
        let config = deskrelay_config::load_and_validate_str(
            "[gateway]\nbearer_token = \"very-secret\"\n",
        )
        .unwrap();
        let rendered = render_redacted(&config).unwrap();
        assert!(!rendered.contains("very-secret"));
        assert!(rendered.contains("[redacted]"));
        assert!(rendered.contains("[coordination]"));
    }

    #[test]
    fn default_filter_covers_workspace_crates() {
        let filter = default_filter("debug");
        assert!(filter.contains("deskrelay_coordinator=debug"));
        assert!(filter.ends_with(",warn"));
    }
}
