//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber once per process
//! - Resolve the log level from `RUST_LOG`, then config or CLI
//!
//! # Design Decisions
//! - Logs go to stderr; stdout carries command reports only
//! - `RUST_LOG` always wins so a single run can be debugged without edits

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when `RUST_LOG` is unset.
///
/// Dependency crates stay at `warn` so RPC plumbing does not drown out the
/// toolkit's own events.
pub fn default_filter(level: &str) -> String {
    format!("warn,eas_toolkit={}", level)
}

/// Install the global subscriber. Later calls are ignored.
pub fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(level)));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_scopes_level_to_toolkit() {
        assert_eq!(default_filter("debug"), "warn,eas_toolkit=debug");
        assert!(EnvFilter::try_new(default_filter("trace")).is_ok());
    }

    #[test]
    fn test_init_twice_is_harmless() {
        init_logging("info");
        init_logging("debug");
        tracing::info!("logging initialized");
    }
}
