//! Logging setup for hosts embedding warp_intent
//!
//! The library only emits `tracing` events. Hosts that do not install their
//! own subscriber can call [`init_logging`]; output goes to stderr so it never
//! mixes with terminal output on stdout.

use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Emit one JSON object per event instead of human-readable lines
    pub json_output: bool,
    /// Append to this file instead of stderr
    pub file_path: Option<PathBuf>,
    /// Filter used when `RUST_LOG` is not set
    pub default_filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            json_output: false,
            file_path: None,
            default_filter: "warn".to_string(),
        }
    }
}

/// Install a global subscriber. Returns false if one was already installed.
pub fn init_logging(config: LogConfig) -> bool {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.default_filter))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let file = config.file_path.as_ref().and_then(|path| {
        std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .ok()
    });

    let registry = tracing_subscriber::registry().with(env_filter);
    let result = match (file, config.json_output) {
        (Some(file), true) => registry
            .with(fmt::layer().json().with_writer(Mutex::new(file)))
            .try_init(),
        (Some(file), false) => registry
            .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
            .try_init(),
        (None, true) => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
        (None, false) => registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .try_init(),
    };
    result.is_ok()
}
