//! Tracing initialization for the server binary.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

/// Route `tracing` output to stderr, or to `log_path` when given.
///
/// `RUST_LOG` overrides the default `info` filter. Call once, from the
/// binary.
pub fn init_tracing(log_path: Option<&Path>) -> std::io::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match log_path {
        Some(path) => {
            let file = File::create(path)?;
            builder.with_writer(Arc::new(file)).with_ansi(false).init();
        }
        None => builder.with_writer(std::io::stderr).init(),
    }
    Ok(())
}
