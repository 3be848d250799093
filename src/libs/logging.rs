//! Tracing subscriber setup for hosts and tests.

use tracing_subscriber::EnvFilter;

/// Installs the global tracing subscriber.
///
/// The filter honors `RUST_LOG` and defaults to `tabtime=info`. Calling
/// this more than once is harmless; later calls are ignored.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tabtime=info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
