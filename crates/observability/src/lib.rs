//! Tracing/logging setup shared by the binaries.

/// Tracing subscriber installation.
pub mod tracing;

pub use crate::tracing::{LogConfig, LogError};

/// Initialize process-wide logging with the defaults: JSON lines on stdout,
/// filtered by `RUST_LOG` (falling back to `info`).
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    let _ = tracing::init_with(&LogConfig::default());
}

/// Initialize process-wide logging from explicit settings.
pub fn init_with(config: &LogConfig) -> Result<(), LogError> {
    tracing::init_with(config)
}
