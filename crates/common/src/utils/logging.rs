use std::io;
use tracing_subscriber::{fmt, EnvFilter};

/// Directives used when `RUST_LOG` is unset.
pub const DEFAULT_DIRECTIVES: &str = "info,tower_http=info,service=info";
/// JSON output also shows backup rotation and upload decisions.
pub const JSON_DIRECTIVES: &str = "info,tower_http=info,service::storage=debug";

fn env_filter(fallback: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback))
}

/// Compact human-readable logs on stdout. Respects `RUST_LOG`.
pub fn init_logging_default() {
    let _ = fmt()
        .with_env_filter(env_filter(DEFAULT_DIRECTIVES))
        .with_target(false)
        .compact()
        .with_writer(io::stdout)
        .try_init();
}

/// One JSON object per event, with the target kept so storage events can be filtered.
pub fn init_logging_json() {
    let _ = fmt()
        .with_env_filter(env_filter(JSON_DIRECTIVES))
        .with_target(true)
        .json()
        .with_writer(io::stdout)
        .try_init();
}
