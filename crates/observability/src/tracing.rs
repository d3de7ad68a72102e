//! Tracing subscriber initialization.
//!
//! `RUST_LOG` wins over the configured filter when it is set.

use tracing_subscriber::EnvFilter;

pub const DEFAULT_FILTER: &str = "info";

fn filter_or(fallback: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(fallback))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Initialize logging with `filter` as the fallback directive.
///
/// `json = true` emits one JSON object per line; otherwise the compact
/// human-readable format is used. Returns `false` if a global subscriber was
/// already installed.
pub fn init_with(filter: &str, json: bool) -> bool {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter_or(filter))
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false);

    if json {
        builder.json().try_init().is_ok()
    } else {
        builder.compact().try_init().is_ok()
    }
}

/// Logging for tests: output is captured by the test harness.
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter_or("debug"))
        .with_test_writer()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_init_is_harmless() {
        init_test();
        init_test();
        assert!(!init_with(DEFAULT_FILTER, true));
    }

    #[test]
    fn invalid_fallback_filter_still_builds() {
        let _ = filter_or("[[[not a directive");
    }
}
