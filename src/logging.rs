//! logging
//!
//! Tracing subscriber setup shared by the binaries.

use tracing_subscriber::{filter::LevelFilter, EnvFilter};

/// Install a compact stderr subscriber, filtered by `RUST_LOG` (default `info`).
///
/// Lambda's log stream stamps every line, so timestamps are left out.
/// Calling this more than once is harmless; later calls are ignored.
pub fn init() {
    let subscriber = tracing_subscriber::fmt()
        .compact()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .without_time()
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}
