//! Tracing subscriber setup.
//!
//! The TUI owns the terminal while it runs, so interactive sessions log to
//! a file inside the data directory. One-shot commands log to stderr.

use std::fs::OpenOptions;
use std::io::IsTerminal;
use std::path::Path;
use std::sync::Mutex;

use anyhow::{anyhow, Context};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Log file name inside the data directory.
pub const LOG_FILE: &str = "study.log";

/// Install the global subscriber. `RUST_LOG` overrides the verbosity flag.
pub fn init_tracing(verbose: u8, log_dir: Option<&Path>) -> anyhow::Result<()> {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| anyhow!("invalid RUST_LOG / log filter: {e}"))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_level(true);

    let init_result = match log_dir {
        Some(dir) => {
            let path = dir.join(LOG_FILE);
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
        None => builder
            .with_ansi(std::io::stderr().is_terminal())
            .with_writer(std::io::stderr)
            .try_init(),
    };

    if let Err(err) = init_result {
        debug!(error = %err, "tracing subscriber already set, continuing");
    }

    Ok(())
}
