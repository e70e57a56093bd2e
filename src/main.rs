//! eas-toolkit binary.
//!
//! # Flow
//!
//! ```text
//!   CLI args ──▶ config (YAML + validation) ──▶ logging
//!                                                 │
//!                                                 ▼
//!                        command ──▶ wallet / provider ──▶ EAS contracts
//!                           │
//!                           ├──▶ report (stdout)
//!                           └──▶ JSON store / proof files
//! ```
//!
//! Logs go to stderr. A failed command logs its error and exits with
//! status 1.

use std::process::ExitCode;

use clap::Parser;

use eas_toolkit::cli::Cli;
use eas_toolkit::commands;
use eas_toolkit::config::{load_config, ConfigError};
use eas_toolkit::observability::init_logging;
use eas_toolkit::report;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            init_logging(cli.log_level.as_deref().unwrap_or("info"));
            if let ConfigError::Validation(errors) = &e {
                println!("{}", report::validation_errors(errors));
            }
            tracing::error!(
                path = %cli.config.display(),
                error = %e,
                "Failed to load configuration"
            );
            return ExitCode::FAILURE;
        }
    };

    let level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| config.observability.log_level.clone());
    init_logging(&level);

    tracing::debug!(
        config = %cli.config.display(),
        rpc_url = %config.network.rpc_url,
        chain_id = config.network.chain_id,
        "eas-toolkit v{} starting",
        env!("CARGO_PKG_VERSION")
    );

    match commands::run(cli, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            ExitCode::FAILURE
        }
    }
}
