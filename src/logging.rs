//! Tracing subscriber setup.
//!
//! Filter priority: `ROLO_LOG`, then `RUST_LOG`, then the `-v`/`-q` flags
//! (default `warn`). Scripting commands log to stderr. The TUI owns the
//! terminal, so it logs to a file instead.

use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing::Level;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "ROLO_LOG";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
}

impl Verbosity {
    /// Verbose wins if both flags are given.
    pub const fn from_flags(verbose: bool, quiet: bool) -> Self {
        if verbose {
            Self::Verbose
        } else if quiet {
            Self::Quiet
        } else {
            Self::Normal
        }
    }

    pub const fn default_level(self) -> Level {
        match self {
            Self::Quiet => Level::ERROR,
            Self::Normal => Level::WARN,
            Self::Verbose => Level::DEBUG,
        }
    }
}

pub fn init_stderr(verbosity: Verbosity) {
    let use_ansi = std::io::IsTerminal::is_terminal(&std::io::stderr());
    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(use_ansi)
        .with_target(false)
        .without_time()
        .compact();
    // a subscriber may already be installed (tests); keep the first one
    let _ = tracing_subscriber::registry()
        .with(build_env_filter(verbosity))
        .with(layer)
        .try_init();
}

/// Log to `path` (appending). Used while the TUI is running.
pub fn init_file(verbosity: Verbosity, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create log dir: {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open log file {}", path.display()))?;

    let layer = fmt::layer()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true)
        .with_thread_names(true);
    let _ = tracing_subscriber::registry()
        .with(build_env_filter(verbosity))
        .with(layer)
        .try_init();
    Ok(())
}

fn build_env_filter(verbosity: Verbosity) -> EnvFilter {
    // unparseable directives fall through rather than failing
    if let Ok(directives) = std::env::var(LOG_ENV) {
        if let Ok(filter) = EnvFilter::try_new(&directives) {
            return filter;
        }
    }
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }
    EnvFilter::new(verbosity.default_level().to_string().to_lowercase())
}
