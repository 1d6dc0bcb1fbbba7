// src/graph/plan.rs

use std::fmt;
use std::sync::Arc;

use crate::graph::task::{Task, TaskKind, TaskName};

/// A fully resolved target: every name replaced by the task it denotes.
///
/// Built by [`TaskGraph::resolve`](crate::graph::TaskGraph::resolve) before
/// any file is touched.
#[derive(Debug, Clone)]
pub enum Plan {
    Task(Arc<Task>),
    Series { name: TaskName, children: Vec<Plan> },
    Parallel { name: TaskName, children: Vec<Plan> },
}

impl Plan {
    pub fn name(&self) -> &str {
        match self {
            Plan::Task(task) => task.name(),
            Plan::Series { name, .. } | Plan::Parallel { name, .. } => name,
        }
    }

    /// Leaf task names in depth-first order. A task reachable twice is
    /// listed twice.
    pub fn task_names(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_names(&mut out);
        out
    }

    fn collect_names<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Plan::Task(task) => out.push(task.name()),
            Plan::Series { children, .. } | Plan::Parallel { children, .. } => {
                for child in children {
                    child.collect_names(out);
                }
            }
        }
    }

    fn fmt_indented(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        let pad = "  ".repeat(depth);
        match self {
            Plan::Task(task) => match task.kind() {
                TaskKind::Transform(t) => {
                    writeln!(f, "{pad}- {}", task.name())?;
                    writeln!(f, "{pad}    src: {:?}", t.sources)?;
                    writeln!(f, "{pad}    dest: {}", t.dest.display())?;
                    if !t.steps.is_empty() {
                        let steps: Vec<String> = t.steps.iter().map(|s| s.to_string()).collect();
                        writeln!(f, "{pad}    steps: {}", steps.join(" -> "))?;
                    }
                    Ok(())
                }
                TaskKind::Clean(targets) => {
                    writeln!(f, "{pad}- {}", task.name())?;
                    writeln!(f, "{pad}    clean: {:?}", targets)
                }
            },
            Plan::Series { name, children } => {
                writeln!(f, "{pad}{name} (series)")?;
                children.iter().try_for_each(|c| c.fmt_indented(f, depth + 1))
            }
            Plan::Parallel { name, children } => {
                writeln!(f, "{pad}{name} (parallel)")?;
                children.iter().try_for_each(|c| c.fmt_indented(f, depth + 1))
            }
        }
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_indented(f, 0)
    }
}
