//! Tracing setup and helpers for export runs
//!
//! Library code only emits `tracing` events; installing a subscriber is left
//! to the binary through [`init_with_config`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

static SUBSCRIBER_INSTALLED: AtomicBool = AtomicBool::new(false);

/// Filter used when neither `RUST_LOG` nor `-v` says otherwise
pub const DEFAULT_FILTER: &str = "warn,sh3=info";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracingConfig {
    /// `EnvFilter` directives, overridden by `RUST_LOG`
    pub filter: String,
    /// Print the module path of each event
    pub show_target: bool,
    pub show_thread_ids: bool,
    /// Print file and line of each event
    pub show_source: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            filter: DEFAULT_FILTER.to_string(),
            show_target: true,
            show_thread_ids: false,
            show_source: false,
        }
    }
}

impl TracingConfig {
    /// Default configuration with a different filter
    pub fn with_level(filter: impl Into<String>) -> Self {
        Self {
            filter: filter.into(),
            ..Self::default()
        }
    }

    /// Map a `-v` count: none keeps the default filter, then info, debug and
    /// trace. Source locations and thread ids show up from `-vvv`.
    pub fn from_verbosity(verbosity: u8) -> Self {
        let filter = match verbosity {
            0 => DEFAULT_FILTER,
            1 => "info",
            2 => "debug",
            _ => "trace",
        };
        Self {
            show_thread_ids: verbosity >= 3,
            show_source: verbosity >= 3,
            ..Self::with_level(filter)
        }
    }
}

/// Install the global subscriber.
///
/// Returns `false` when a subscriber was already installed, by this function
/// or by someone else.
pub fn init_with_config(config: TracingConfig) -> bool {
    if SUBSCRIBER_INSTALLED.swap(true, Ordering::SeqCst) {
        return false;
    }

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.filter));

    let layer = fmt::layer()
        .with_target(config.show_target)
        .with_thread_ids(config.show_thread_ids)
        .with_file(config.show_source)
        .with_line_number(config.show_source);

    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .try_init()
        .is_ok()
}

/// Run one export step inside a span and log its duration
pub fn instrument_export<T>(step: &str, f: impl FnOnce() -> T) -> T {
    let span = tracing::info_span!("export_step", step = %step);
    let _guard = span.enter();

    let started = Instant::now();
    let result = f();
    tracing::debug!(elapsed_ms = started.elapsed().as_millis() as u64, "Step finished");
    result
}

/// Span covering a run over `total` collections
pub fn progress_span(operation: &str, total: usize) -> tracing::Span {
    tracing::info_span!("progress", operation = %operation, total)
}

pub fn log_progress(current: usize, total: usize) {
    let percent = if total == 0 {
        100
    } else {
        current * 100 / total
    };
    tracing::debug!(current, total, percent, "Progress");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter() {
        let config = TracingConfig::default();
        assert_eq!(config.filter, DEFAULT_FILTER);
        assert!(config.show_target);
        assert!(!config.show_source);
    }

    #[test]
    fn test_from_verbosity() {
        assert_eq!(TracingConfig::from_verbosity(0), TracingConfig::default());
        assert_eq!(TracingConfig::from_verbosity(2).filter, "debug");

        let loud = TracingConfig::from_verbosity(7);
        assert_eq!(loud.filter, "trace");
        assert!(loud.show_source);
        assert!(loud.show_thread_ids);
    }

    #[test]
    fn test_instrument_export_returns_value() {
        assert_eq!(instrument_export("step", || 42), 42);
    }

    #[test]
    fn test_log_progress_handles_empty_totals() {
        log_progress(0, 0);
        log_progress(3, 7);
    }
}
