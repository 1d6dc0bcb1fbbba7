// src/logging.rs

//! Logging setup for `assetpipe` using `tracing` + `tracing-subscriber`.
//!
//! The filter comes from, in order:
//! 1. the `--log-level` CLI flag
//! 2. the `ASSETPIPE_LOG` environment variable, which takes full
//!    `EnvFilter` directives (`debug`, `assetpipe::watch=trace,info`, ...)
//! 3. `info`
//!
//! Logs go to STDERR so `--dry-run` output on STDOUT stays clean.

use anyhow::{anyhow, Result};
use tracing_subscriber::{fmt, EnvFilter};

use crate::cli::LogLevel;

/// Environment variable consulted when `--log-level` is absent.
pub const LOG_ENV: &str = "ASSETPIPE_LOG";

const DEFAULT_DIRECTIVE: &str = "info";

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let filter = match cli_level {
        Some(lvl) => EnvFilter::new(lvl.as_str()),
        None => filter_from_env(std::env::var(LOG_ENV).ok().as_deref()),
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("failed to install log subscriber: {e}"))
}

fn filter_from_env(value: Option<&str>) -> EnvFilter {
    let Some(spec) = value.map(str::trim).filter(|s| !s.is_empty()) else {
        return EnvFilter::new(DEFAULT_DIRECTIVE);
    };

    EnvFilter::try_new(spec).unwrap_or_else(|err| {
        eprintln!("assetpipe: ignoring invalid {LOG_ENV}={spec:?}: {err}");
        EnvFilter::new(DEFAULT_DIRECTIVE)
    })
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}
