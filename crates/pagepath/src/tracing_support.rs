//! Tracing Setup
//!
//! The engine emits `tracing` events under the `pagepath` target:
//!
//! - `debug`: engine init, each resolved step, polls that fall back to the
//!   not-found sentinel
//! - `trace`: every poll tick
//!
//! Libraries never install a subscriber on their own. Test binaries and
//! demos call [`init_tracing`] to get readable output, filtered by
//! `RUST_LOG` when it is set.

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset or invalid
pub const DEFAULT_DIRECTIVE: &str = "pagepath=info";

/// Output format of the fmt subscriber
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Single-line human output
    #[default]
    Compact,
    /// Multi-line human output
    Pretty,
    /// One JSON object per event
    Json,
}

/// Install a compact subscriber filtered by `RUST_LOG`.
///
/// Returns `false` if a global subscriber was already installed.
pub fn init_tracing() -> bool {
    init_tracing_with(LogFormat::Compact, DEFAULT_DIRECTIVE)
}

/// Install a subscriber with the given format; `default_directive` applies
/// when `RUST_LOG` is unset or cannot be parsed.
///
/// Returns `false` if a global subscriber was already installed.
pub fn init_tracing_with(format: LogFormat, default_directive: &str) -> bool {
    let filter = env_filter(default_directive);
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_test_writer();

    let installed = match format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.is_ok()
}

fn env_filter(default_directive: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_reports_existing_subscriber() {
        let _ = init_tracing();
        assert!(!init_tracing_with(LogFormat::Json, "debug"));
    }

    #[test]
    fn test_invalid_directive_falls_back() {
        let filter = env_filter("pagepath=[not a directive");
        assert!(!filter.to_string().is_empty());
    }

    #[test]
    fn test_log_format_serde() {
        let format: LogFormat = serde_json::from_str("\"json\"").unwrap_or_default();
        assert_eq!(format, LogFormat::Json);
        assert_eq!(LogFormat::default(), LogFormat::Compact);
    }
}
