// src/engine/report.rs

use std::path::PathBuf;

use crate::graph::TaskName;

/// What one task did on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskReport {
    pub name: TaskName,
    pub written: Vec<PathBuf>,
    pub removed: Vec<PathBuf>,
}

impl TaskReport {
    pub fn new(name: impl Into<TaskName>) -> Self {
        Self {
            name: name.into(),
            written: Vec::new(),
            removed: Vec::new(),
        }
    }

    /// True if the task completed without touching the destination.
    pub fn is_noop(&self) -> bool {
        self.written.is_empty() && self.removed.is_empty()
    }
}

/// Result of a successful run, in completion order.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub tasks: Vec<TaskReport>,
}

impl RunReport {
    pub fn single(task: TaskReport) -> Self {
        Self { tasks: vec![task] }
    }

    pub fn merge(&mut self, other: RunReport) {
        self.tasks.extend(other.tasks);
    }

    pub fn task(&self, name: &str) -> Option<&TaskReport> {
        self.tasks.iter().find(|t| t.name == name)
    }

    pub fn completed(&self) -> impl Iterator<Item = &str> {
        self.tasks.iter().map(|t| t.name.as_str())
    }

    pub fn written(&self) -> impl Iterator<Item = &PathBuf> {
        self.tasks.iter().flat_map(|t| t.written.iter())
    }
}
