//! Logging configuration for hr-ask.
//!
//! Logs go to stderr. `RUST_LOG` selects the filter; the default is `info`,
//! which includes one line per HTTP request from the trace layer.

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset or invalid.
pub const DEFAULT_FILTER: &str = "info,tower_http=info,sqlx=warn";

/// Builds the env filter, falling back to [`DEFAULT_FILTER`].
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Initializes stderr logging. Call once, before anything logs.
pub fn init_stderr_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .init();
}
