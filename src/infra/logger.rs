// src/infra/logger.rs — Structured logging with tracing

use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::{fmt, EnvFilter};

/// Environment variable checked before RUST_LOG.
const LOG_ENV: &str = "TOURNEY_LOG";

fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(level))
}

/// Initialize the global subscriber. Logs go to stderr unless `file` is set,
/// in which case they are appended to that file without ANSI colors.
pub fn init_logging(level: &str, file: Option<&Path>) {
    let filter = env_filter(level);

    if let Some(path) = file {
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        match std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
        {
            Ok(f) => {
                fmt()
                    .with_env_filter(filter)
                    .with_target(false)
                    .with_ansi(false)
                    .with_writer(Mutex::new(f))
                    .compact()
                    .init();
                return;
            }
            Err(e) => {
                eprintln!("warning: cannot open log file {}: {e}", path.display());
            }
        }
    }

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}
