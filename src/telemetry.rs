use tracing_subscriber::{fmt, EnvFilter};

/// Installs the global `tracing` subscriber. The filter is read from
/// `RUST_LOG` and defaults to `info`. Calling it again is a no-op.
pub fn install() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).with_target(true).try_init();
}
