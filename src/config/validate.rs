// src/config/validate.rs

use globset::Glob;
use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::cli::WATCH_TARGET;
use crate::config::model::RawConfigFile;
use crate::errors::{PipelineError, Result};
use crate::graph::Step;

/// Run semantic validation against a parsed project file.
///
/// This checks:
/// - there is at least one task
/// - task and aggregate names are unique and none is the reserved `watch`
/// - every task is either a transform task or a clean task, never both
/// - every glob compiles
/// - aggregate children and watch targets resolve
/// - aggregates do not reference themselves, directly or transitively
/// - `[config]` and `[serve]` values are in range
pub fn validate_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_tasks(cfg)?;
    validate_global_config(cfg)?;
    validate_names(cfg)?;
    validate_tasks(cfg)?;
    validate_aggregates(cfg)?;
    validate_watch(cfg)?;
    validate_dag(cfg)?;
    Ok(())
}

fn ensure_has_tasks(cfg: &RawConfigFile) -> Result<()> {
    if cfg.task.is_empty() {
        return Err(PipelineError::ConfigError(
            "project file must contain at least one [task.<name>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_global_config(cfg: &RawConfigFile) -> Result<()> {
    if !(1..=100).contains(&cfg.config.jpeg_quality) {
        return Err(PipelineError::ConfigError(format!(
            "[config].jpeg_quality must be within 1..=100 (got {})",
            cfg.config.jpeg_quality
        )));
    }

    if cfg.serve.port == 0 {
        return Err(PipelineError::ConfigError(
            "[serve].port must be non-zero".to_string(),
        ));
    }

    let proxy = cfg.serve.proxy.as_str();
    if !(proxy.starts_with("http://") || proxy.starts_with("https://")) {
        return Err(PipelineError::ConfigError(format!(
            "[serve].proxy must be an http(s) URL (got '{proxy}')"
        )));
    }

    Ok(())
}

fn validate_names(cfg: &RawConfigFile) -> Result<()> {
    for name in cfg.task.keys().chain(cfg.aggregate.keys()) {
        if name == WATCH_TARGET {
            return Err(PipelineError::ConfigError(format!(
                "'{WATCH_TARGET}' is reserved for the watch session and cannot name a task"
            )));
        }
    }

    if let Some(name) = cfg.aggregate.keys().find(|n| cfg.task.contains_key(*n)) {
        return Err(PipelineError::DuplicateTask(format!(
            "'{name}' is defined both as [task.{name}] and [aggregate.{name}]"
        )));
    }

    Ok(())
}

fn validate_tasks(cfg: &RawConfigFile) -> Result<()> {
    for (name, task) in cfg.task.iter() {
        if task.is_clean() {
            if !task.src.is_empty() || !task.steps.is_empty() || task.dest.is_some() {
                return Err(PipelineError::ConfigError(format!(
                    "task '{name}' mixes `clean` with `src`/`dest`/`steps`"
                )));
            }
            continue;
        }

        if task.src.is_empty() {
            return Err(PipelineError::ConfigError(format!(
                "task '{name}' needs either `src` or `clean`"
            )));
        }

        if task.dest.as_deref().is_none_or(str::is_empty) {
            return Err(PipelineError::ConfigError(format!(
                "task '{name}' has `src` but no `dest`"
            )));
        }

        for pattern in task.src.iter() {
            Glob::new(pattern).map_err(|e| {
                PipelineError::ConfigError(format!("task '{name}': invalid glob '{pattern}': {e}"))
            })?;
        }

        for step in task.steps.iter() {
            match step {
                Step::Concat(file) | Step::Rename(file) if file.trim().is_empty() => {
                    return Err(PipelineError::ConfigError(format!(
                        "task '{name}': step `{}` needs a file name",
                        step.label()
                    )));
                }
                _ => {}
            }
        }
    }
    Ok(())
}

fn validate_aggregates(cfg: &RawConfigFile) -> Result<()> {
    for (name, agg) in cfg.aggregate.iter() {
        match (&agg.series, &agg.parallel) {
            (Some(_), Some(_)) => {
                return Err(PipelineError::ConfigError(format!(
                    "aggregate '{name}' sets both `series` and `parallel`"
                )));
            }
            (None, None) => {
                return Err(PipelineError::ConfigError(format!(
                    "aggregate '{name}' needs `series` or `parallel`"
                )));
            }
            _ => {}
        }

        for child in agg.children() {
            if child == name {
                return Err(PipelineError::DagCycle(format!(
                    "aggregate '{name}' references itself"
                )));
            }
            if !cfg.task.contains_key(child) && !cfg.aggregate.contains_key(child) {
                return Err(PipelineError::TaskNotFound(format!(
                    "'{child}' (referenced by aggregate '{name}')"
                )));
            }
        }
    }
    Ok(())
}

fn validate_watch(cfg: &RawConfigFile) -> Result<()> {
    for (idx, binding) in cfg.watch.iter().enumerate() {
        if binding.glob.is_empty() {
            return Err(PipelineError::ConfigError(format!(
                "[[watch]] entry #{idx} has an empty `glob` list"
            )));
        }
        for pattern in binding.glob.iter().chain(binding.exclude.iter()) {
            Glob::new(pattern).map_err(|e| {
                PipelineError::ConfigError(format!(
                    "[[watch]] entry #{idx}: invalid glob '{pattern}': {e}"
                ))
            })?;
        }
        if !cfg.task.contains_key(&binding.run) && !cfg.aggregate.contains_key(&binding.run) {
            return Err(PipelineError::TaskNotFound(format!(
                "'{}' (referenced by [[watch]] entry #{idx})",
                binding.run
            )));
        }
    }
    Ok(())
}

fn validate_dag(cfg: &RawConfigFile) -> Result<()> {
    // Edge direction: aggregate -> child.
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for name in cfg.task.keys().chain(cfg.aggregate.keys()) {
        graph.add_node(name.as_str());
    }

    for (name, agg) in cfg.aggregate.iter() {
        for child in agg.children() {
            graph.add_edge(name.as_str(), child.as_str(), ());
        }
    }

    match toposort(&graph, None) {
        Ok(_order) => Ok(()),
        Err(cycle) => Err(PipelineError::DagCycle(format!(
            "cycle detected in aggregates involving '{}'",
            cycle.node_id()
        ))),
    }
}
