//! Tracing subscriber setup.
//!
//! The library only emits `tracing` spans and events; binaries decide where
//! they go. [`init_tracing`] installs a stderr subscriber filtered by
//! `RUST_LOG`, falling back to the given level.

use tracing_subscriber::EnvFilter;

/// Default filter when `RUST_LOG` is unset.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Compact human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Builds the filter from `RUST_LOG`, or from `level` when unset or invalid.
#[must_use]
pub fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

/// Installs the global subscriber.
///
/// Returns `false` if a subscriber was already installed, in which case the
/// existing one is kept.
pub fn init_tracing(format: LogFormat, level: &str) -> bool {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter(level))
        .with_target(true)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Pretty => builder.compact().try_init().is_ok(),
        LogFormat::Json => builder.json().try_init().is_ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_noop() {
        let _ = init_tracing(LogFormat::Pretty, DEFAULT_LOG_LEVEL);
        assert!(!init_tracing(LogFormat::Json, "debug"));
    }

    #[test]
    fn test_default_format() {
        assert_eq!(LogFormat::default(), LogFormat::Pretty);
    }
}
