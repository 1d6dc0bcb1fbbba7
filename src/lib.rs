// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod graph;
pub mod logging;
pub mod pipeline;
pub mod serve;
pub mod watch;

use std::path::PathBuf;
use std::time::Duration;

use tracing::debug;

use crate::cli::CliArgs;
use crate::config::loader::load_and_validate;
use crate::config::model::ConfigFile;
use crate::engine::Runner;
use crate::errors::Result;
use crate::graph::Plan;
use crate::serve::ReloadHub;
use crate::watch::{bindings_from_config, WatchBinding};

/// High-level entry point used by `main.rs`.
///
/// Loads and validates the project file, then either runs the requested
/// target once or, for `watch`, starts the preview server and the watch
/// session.
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let cfg = load_and_validate(&config_path)?;

    if args.is_watch() {
        let bindings = bindings_from_config(&cfg);
        if args.dry_run {
            print_watch_dry_run(&cfg, &bindings, !args.no_serve);
            return Ok(());
        }
        return run_watch(&cfg, &bindings, !args.no_serve).await;
    }

    let runner = Runner::from_config(&cfg)?;

    // Resolution happens before any I/O, dry-run or not.
    let plan = runner.graph().resolve(&args.target)?;
    if args.dry_run {
        print_plan(&plan);
        return Ok(());
    }

    let report = runner.run_plan(plan).await?;
    for task in &report.tasks {
        for path in &task.written {
            debug!(task = %task.name, path = ?path, "wrote");
        }
    }
    Ok(())
}

async fn run_watch(cfg: &ConfigFile, bindings: &[WatchBinding], with_server: bool) -> Result<()> {
    let runner = Runner::from_config(cfg)?;
    let debounce = Duration::from_millis(cfg.config.debounce_ms);

    let hub = if with_server {
        let hub = ReloadHub::new();
        serve::serve(cfg.serve.port, &cfg.serve.proxy, hub.clone()).await?;
        Some(hub)
    } else {
        None
    };

    watch::watch(runner, bindings, debounce, hub).await
}

fn print_plan(plan: &Plan) {
    println!("assetpipe dry-run");
    println!();
    print!("{plan}");
    debug!("dry-run complete (no execution)");
}

fn print_watch_dry_run(cfg: &ConfigFile, bindings: &[WatchBinding], with_server: bool) {
    println!("assetpipe dry-run (watch)");
    println!("  config.debounce_ms = {}", cfg.config.debounce_ms);
    if with_server {
        println!(
            "  serve = 127.0.0.1:{} -> {}",
            cfg.serve.port, cfg.serve.proxy
        );
    } else {
        println!("  serve = disabled");
    }
    println!();

    println!("bindings ({}):", bindings.len());
    for binding in bindings {
        println!("  - {}", binding.target);
        println!("      glob: {:?}", binding.glob);
        if !binding.exclude.is_empty() {
            println!("      exclude: {:?}", binding.exclude);
        }
    }

    debug!("dry-run complete (no execution)");
}
