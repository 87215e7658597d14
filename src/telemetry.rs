//! Tracing setup.

use tracing_subscriber::{fmt, EnvFilter};

/// Installs the global fmt subscriber, filtered by `RUST_LOG` (default
/// `info`). Later calls are no-ops.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).try_init();
}
