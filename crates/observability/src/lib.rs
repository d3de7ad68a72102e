//! Tracing/logging setup shared by the estate workspace.

/// Initialize process-wide logging with the defaults (`info`, JSON).
///
/// Safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    self::tracing::init_with(self::tracing::DEFAULT_FILTER, true);
}

pub use self::tracing::{DEFAULT_FILTER, init_test, init_with};

/// Subscriber configuration (filters, formats).
pub mod tracing;
