// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Target name that starts the watch session instead of a one-shot run.
pub const WATCH_TARGET: &str = "watch";

/// Target run when no name is given on the command line.
pub const DEFAULT_TARGET: &str = "default";

/// Command-line arguments for `assetpipe`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "assetpipe",
    version,
    about = "Copy, concatenate, compile and minify front-end assets.",
    long_about = None
)]
pub struct CliArgs {
    /// Task or aggregate to run. `watch` starts the watch session.
    #[arg(value_name = "TARGET", default_value = DEFAULT_TARGET)]
    pub target: String,

    /// Path to the project file (TOML).
    ///
    /// Source and destination paths are resolved against its directory.
    #[arg(long, value_name = "PATH", default_value = "Assetpipe.toml")]
    pub config: String,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `ASSETPIPE_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Resolve and print the plan, but touch no files.
    #[arg(long)]
    pub dry_run: bool,

    /// In `watch` mode, do not start the preview server.
    #[arg(long)]
    pub no_serve: bool,
}

impl CliArgs {
    pub fn is_watch(&self) -> bool {
        self.target == WATCH_TARGET
    }
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
