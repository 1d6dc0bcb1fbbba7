// src/graph/task.rs

use std::fmt;
use std::path::PathBuf;

use serde::Deserialize;

use crate::config::model::TaskConfig;

/// Public type alias for task names throughout the crate.
pub type TaskName = String;

/// One transform step of a task.
///
/// In TOML, steps without arguments are plain strings and steps with an
/// argument are single-key inline tables:
///
/// ```toml
/// steps = ["minify-js", { concat = "app.js" }]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Step {
    /// Reproduce inputs unchanged.
    Copy,
    /// Join all inputs, in order, into one file with the given name.
    Concat(String),
    /// Compile Sass/SCSS to CSS.
    Sass,
    /// Vendor-prefix, then minify CSS.
    Postcss,
    /// Minify JavaScript.
    MinifyJs,
    /// Losslessly (PNG, SVG) or near-losslessly (JPEG) shrink images.
    CompressImages,
    /// Rename the single input to the given file name.
    Rename(String),
}

impl Step {
    /// Short name used in logs and errors.
    pub fn label(&self) -> &'static str {
        match self {
            Step::Copy => "copy",
            Step::Concat(_) => "concat",
            Step::Sass => "sass",
            Step::Postcss => "postcss",
            Step::MinifyJs => "minify-js",
            Step::CompressImages => "compress-images",
            Step::Rename(_) => "rename",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Concat(file) | Step::Rename(file) => write!(f, "{}({})", self.label(), file),
            other => f.write_str(other.label()),
        }
    }
}

/// Source → destination pipeline of a transform task.
///
/// All paths are relative to the runner's project root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformTask {
    pub sources: Vec<String>,
    pub dest: PathBuf,
    pub base: Option<PathBuf>,
    pub steps: Vec<Step>,
    pub include_paths: Vec<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskKind {
    Transform(TransformTask),
    /// Recursively delete each target. Missing targets are fine.
    Clean(Vec<PathBuf>),
}

/// A named, immutable unit of work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    name: TaskName,
    kind: TaskKind,
}

impl Task {
    /// A transform task reading `sources` and writing into `dest`.
    pub fn new<N, I, S>(name: N, sources: I, dest: impl Into<PathBuf>, steps: Vec<Step>) -> Self
    where
        N: Into<TaskName>,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            kind: TaskKind::Transform(TransformTask {
                sources: sources.into_iter().map(Into::into).collect(),
                dest: dest.into(),
                base: None,
                steps,
                include_paths: Vec::new(),
            }),
        }
    }

    /// A clean task removing every path in `targets`.
    pub fn clean<N, I, P>(name: N, targets: I) -> Self
    where
        N: Into<TaskName>,
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            name: name.into(),
            kind: TaskKind::Clean(targets.into_iter().map(Into::into).collect()),
        }
    }

    /// Override the directory output paths are relative to.
    ///
    /// No effect on clean tasks.
    pub fn with_base(mut self, base: impl Into<PathBuf>) -> Self {
        if let TaskKind::Transform(t) = &mut self.kind {
            t.base = Some(base.into());
        }
        self
    }

    /// Add Sass load paths. No effect on clean tasks.
    pub fn with_include_paths<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        if let TaskKind::Transform(t) = &mut self.kind {
            t.include_paths.extend(paths.into_iter().map(Into::into));
        }
        self
    }

    pub fn from_config(name: &str, cfg: &TaskConfig) -> Self {
        if cfg.is_clean() {
            return Task::clean(name, cfg.clean.iter().map(PathBuf::from));
        }

        let mut task = Task::new(
            name,
            cfg.src.iter().cloned(),
            cfg.dest.clone().unwrap_or_default(),
            cfg.steps.clone(),
        )
        .with_include_paths(cfg.include_paths.iter().map(PathBuf::from));

        if let Some(base) = &cfg.base {
            task = task.with_base(base);
        }
        task
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &TaskKind {
        &self.kind
    }
}
