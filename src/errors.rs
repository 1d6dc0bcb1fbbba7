// src/errors.rs

//! Crate-wide error type and result alias.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Task already defined: {0}")]
    DuplicateTask(String),

    #[error("Cycle detected in task graph: {0}")]
    DagCycle(String),

    #[error("task '{task}': failed to compile {file:?}: {message}")]
    CompileError {
        task: String,
        file: PathBuf,
        message: String,
    },

    #[error("task '{task}': step '{step}' failed: {message}")]
    StepError {
        task: String,
        step: String,
        message: String,
    },

    #[error("task '{task}': filesystem error on {path:?}: {source}")]
    FsError {
        task: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parsing TOML config from {path:?}: {source}")]
    TomlError {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid glob pattern: {0}")]
    GlobError(#[from] globset::Error),

    #[error("Serve error: {0}")]
    ServeError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PipelineError {
    /// Name of the task this error belongs to, if it came out of a task run.
    pub fn task(&self) -> Option<&str> {
        match self {
            PipelineError::CompileError { task, .. }
            | PipelineError::StepError { task, .. }
            | PipelineError::FsError { task, .. } => Some(task),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
