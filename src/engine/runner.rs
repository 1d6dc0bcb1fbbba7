// src/engine/runner.rs

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;

use anyhow::anyhow;
use tracing::{debug, error, info, warn};

use crate::config::model::{CacheMode, ConfigFile};
use crate::engine::report::{RunReport, TaskReport};
use crate::errors::{PipelineError, Result};
use crate::graph::{Plan, Task, TaskGraph, TaskKind, TransformTask};
use crate::pipeline::{
    apply_steps, clean_targets, read_sources, write_assets, ImageCache, StepContext,
    TransformOptions,
};

/// Where and how a [`Runner`] works.
#[derive(Debug, Clone)]
pub struct RunSettings {
    /// Project root; task paths are relative to it.
    pub root: PathBuf,
    pub options: TransformOptions,
    pub cache_mode: CacheMode,
}

impl RunSettings {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            options: TransformOptions::default(),
            cache_mode: CacheMode::default(),
        }
    }

    pub fn with_options(mut self, options: TransformOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_cache_mode(mut self, mode: CacheMode) -> Self {
        self.cache_mode = mode;
        self
    }
}

#[derive(Debug)]
struct RunContext {
    root: PathBuf,
    options: TransformOptions,
    cache: ImageCache,
}

/// Executes tasks and aggregates of a [`TaskGraph`].
///
/// Cheap to clone; clones share the graph and the image cache.
#[derive(Debug, Clone)]
pub struct Runner {
    graph: Arc<TaskGraph>,
    ctx: Arc<RunContext>,
}

impl Runner {
    pub fn new(graph: TaskGraph, settings: RunSettings) -> Self {
        let cache = ImageCache::new(settings.cache_mode, &settings.root);
        Self {
            graph: Arc::new(graph),
            ctx: Arc::new(RunContext {
                root: settings.root,
                options: settings.options,
                cache,
            }),
        }
    }

    /// Build the graph and settings from a validated [`ConfigFile`].
    pub fn from_config(cfg: &ConfigFile) -> Result<Self> {
        let graph = TaskGraph::from_config(cfg)?;
        let settings = RunSettings::new(cfg.root())
            .with_options(TransformOptions::from(&cfg.config))
            .with_cache_mode(cfg.config.image_cache);
        Ok(Self::new(graph, settings))
    }

    pub fn graph(&self) -> &TaskGraph {
        &self.graph
    }

    pub fn root(&self) -> &Path {
        &self.ctx.root
    }

    /// Resolve `target` and run it to completion.
    ///
    /// Resolution errors are returned before any file is read or written.
    pub async fn run(&self, target: &str) -> Result<RunReport> {
        let plan = self.graph.resolve(target)?;
        self.run_plan(plan).await
    }

    /// Run an already resolved plan.
    pub async fn run_plan(&self, plan: Plan) -> Result<RunReport> {
        let target = plan.name().to_string();
        let started = Instant::now();
        info!(run = %target, "starting");

        let result = execute(Arc::clone(&self.ctx), plan).await;

        let elapsed_ms = started.elapsed().as_millis() as u64;
        match &result {
            Ok(report) => info!(
                run = %target,
                tasks = report.tasks.len(),
                files = report.written().count(),
                elapsed_ms,
                "finished"
            ),
            Err(err) => error!(run = %target, error = %err, elapsed_ms, "failed"),
        }
        result
    }
}

type BoxedRun = Pin<Box<dyn Future<Output = Result<RunReport>> + Send>>;

/// Run a plan node.
///
/// - Series: children one after another; the first failure is returned and
///   later children never start.
/// - Parallel: all children are spawned at once and all are awaited, even
///   after a failure; the first failure in child order is returned.
fn execute(ctx: Arc<RunContext>, plan: Plan) -> BoxedRun {
    Box::pin(async move {
        match plan {
            Plan::Task(task) => run_task(&ctx, &task).await.map(RunReport::single),
            Plan::Series { name, children } => {
                let mut report = RunReport::default();
                for child in children {
                    match execute(Arc::clone(&ctx), child).await {
                        Ok(child_report) => report.merge(child_report),
                        Err(err) => {
                            warn!(aggregate = %name, "series halted after failure");
                            return Err(err);
                        }
                    }
                }
                Ok(report)
            }
            Plan::Parallel { name, children } => {
                let handles: Vec<_> = children
                    .into_iter()
                    .map(|child| tokio::spawn(execute(Arc::clone(&ctx), child)))
                    .collect();

                let mut report = RunReport::default();
                let mut first_err: Option<PipelineError> = None;

                for handle in handles {
                    let outcome = match handle.await {
                        Ok(outcome) => outcome,
                        Err(join_err) => Err(PipelineError::Other(anyhow!(
                            "task in '{name}' panicked: {join_err}"
                        ))),
                    };
                    match outcome {
                        Ok(child_report) => report.merge(child_report),
                        Err(err) => {
                            if first_err.is_none() {
                                first_err = Some(err);
                            }
                        }
                    }
                }

                match first_err {
                    Some(err) => {
                        warn!(aggregate = %name, "parallel aggregate finished with failures");
                        Err(err)
                    }
                    None => Ok(report),
                }
            }
        }
    })
}

async fn run_task(ctx: &Arc<RunContext>, task: &Arc<Task>) -> Result<TaskReport> {
    let name = task.name();
    debug!(task = %name, "task started");

    let result = match task.kind() {
        TaskKind::Clean(targets) => clean_targets(name, &ctx.root, targets)
            .await
            .map(|removed| TaskReport {
                removed,
                ..TaskReport::new(name)
            }),
        TaskKind::Transform(transform) => run_transform(ctx, name, transform).await,
    };

    match &result {
        Ok(report) => info!(
            task = %name,
            written = report.written.len(),
            removed = report.removed.len(),
            "task finished"
        ),
        Err(err) => error!(task = %name, error = %err, "task failed"),
    }
    result
}

async fn run_transform(
    ctx: &Arc<RunContext>,
    name: &str,
    transform: &TransformTask,
) -> Result<TaskReport> {
    let inputs = read_sources(name, &ctx.root, &transform.sources, transform.base.as_deref()).await?;
    if inputs.is_empty() {
        debug!(task = %name, "no sources matched; nothing to do");
        return Ok(TaskReport::new(name));
    }

    let outputs = {
        let ctx = Arc::clone(ctx);
        let task_name = name.to_string();
        let steps = transform.steps.clone();
        let include_paths: Vec<PathBuf> = transform
            .include_paths
            .iter()
            .map(|p| ctx.root.join(p))
            .collect();

        tokio::task::spawn_blocking(move || {
            let step_ctx = StepContext {
                task: &task_name,
                include_paths: &include_paths,
                options: &ctx.options,
                cache: &ctx.cache,
            };
            apply_steps(&steps, inputs, &step_ctx)
        })
        .await
        .map_err(|e| PipelineError::Other(anyhow!("task '{name}' panicked: {e}")))??
    };

    let dest = ctx.root.join(&transform.dest);
    let written = write_assets(name, &dest, &outputs).await?;

    Ok(TaskReport {
        written,
        ..TaskReport::new(name)
    })
}
