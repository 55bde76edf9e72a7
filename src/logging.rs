//! Tracing subscriber setup.

use tracing_subscriber::EnvFilter;

const DEFAULT_LEVEL: &str = "info";

/// Install the global tracing subscriber.
///
/// Reads `RUST_LOG` from the environment (default level is `info`). Events go
/// to stderr so command output on stdout stays clean. Safe to call more than
/// once; later calls are ignored.
pub fn init() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .try_init();
}

/// Filter from `RUST_LOG`. Unset or invalid directives fall back to `info`.
fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|e| {
        if std::env::var_os(EnvFilter::DEFAULT_ENV).is_some() {
            eprintln!("Ignoring invalid {}: {e}", EnvFilter::DEFAULT_ENV);
        }
        EnvFilter::new(DEFAULT_LEVEL)
    })
}
