// src/graph/graph.rs

use std::collections::BTreeMap;
use std::sync::Arc;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use tracing::{debug, warn};

use crate::config::model::ConfigFile;
use crate::errors::{PipelineError, Result};
use crate::graph::plan::Plan;
use crate::graph::task::{Task, TaskName};

/// How an aggregate runs its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositionMode {
    /// Strictly in listed order; a failure stops the sequence.
    Series,
    /// All children start together; the aggregate waits for every child.
    Parallel,
}

/// A composition of other tasks or aggregates, by name.
///
/// Names are resolved lazily by [`TaskGraph::resolve`], so an aggregate can
/// be registered before its children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aggregate {
    mode: CompositionMode,
    children: Vec<TaskName>,
}

impl Aggregate {
    pub fn mode(&self) -> CompositionMode {
        self.mode
    }

    pub fn children(&self) -> &[TaskName] {
        &self.children
    }
}

/// Build an aggregate that runs `names` in the given mode.
pub fn compose<I, S>(mode: CompositionMode, names: I) -> Aggregate
where
    I: IntoIterator<Item = S>,
    S: Into<TaskName>,
{
    Aggregate {
        mode,
        children: names.into_iter().map(Into::into).collect(),
    }
}

#[derive(Debug, Clone)]
enum Node {
    Task(Arc<Task>),
    Aggregate(Aggregate),
}

/// Explicit registry of tasks and aggregates.
///
/// Tasks and aggregates share one namespace. Registering a name twice is an
/// error unless the `*_overriding` variants are used.
#[derive(Debug, Clone, Default)]
pub struct TaskGraph {
    nodes: BTreeMap<TaskName, Node>,
}

impl TaskGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from a validated [`ConfigFile`].
    pub fn from_config(cfg: &ConfigFile) -> Result<Self> {
        let mut graph = TaskGraph::new();

        for (name, task) in cfg.task.iter() {
            graph.define_task(Task::from_config(name, task))?;
        }

        for (name, agg) in cfg.aggregate.iter() {
            let aggregate = match (&agg.series, &agg.parallel) {
                (Some(children), _) => compose(CompositionMode::Series, children.iter().cloned()),
                (None, Some(children)) => {
                    compose(CompositionMode::Parallel, children.iter().cloned())
                }
                (None, None) => {
                    return Err(PipelineError::ConfigError(format!(
                        "aggregate '{name}' needs `series` or `parallel`"
                    )));
                }
            };
            graph.define_aggregate(name.clone(), aggregate)?;
        }

        graph.validate()?;
        Ok(graph)
    }

    /// Register a task. Fails with [`PipelineError::DuplicateTask`] if the
    /// name is already taken.
    pub fn define_task(&mut self, task: Task) -> Result<()> {
        let name = task.name().to_string();
        self.insert(name, Node::Task(Arc::new(task)), false)
    }

    /// Register a task, replacing any previous definition of the name.
    pub fn define_task_overriding(&mut self, task: Task) {
        let name = task.name().to_string();
        // Cannot fail with `overwrite = true`.
        let _ = self.insert(name, Node::Task(Arc::new(task)), true);
    }

    /// Register an aggregate under `name`.
    pub fn define_aggregate(&mut self, name: impl Into<TaskName>, aggregate: Aggregate) -> Result<()> {
        self.insert(name.into(), Node::Aggregate(aggregate), false)
    }

    /// Register an aggregate, replacing any previous definition of the name.
    pub fn define_aggregate_overriding(&mut self, name: impl Into<TaskName>, aggregate: Aggregate) {
        let _ = self.insert(name.into(), Node::Aggregate(aggregate), true);
    }

    fn insert(&mut self, name: TaskName, node: Node, overwrite: bool) -> Result<()> {
        if self.nodes.contains_key(&name) {
            if !overwrite {
                return Err(PipelineError::DuplicateTask(name));
            }
            warn!(task = %name, "overriding previous definition");
        } else {
            debug!(task = %name, "registered");
        }
        self.nodes.insert(name, node);
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    /// The task registered under `name`, if it is a task (not an aggregate).
    pub fn task(&self, name: &str) -> Option<&Arc<Task>> {
        match self.nodes.get(name) {
            Some(Node::Task(task)) => Some(task),
            _ => None,
        }
    }

    /// The aggregate registered under `name`, if any.
    pub fn aggregate(&self, name: &str) -> Option<&Aggregate> {
        match self.nodes.get(name) {
            Some(Node::Aggregate(agg)) => Some(agg),
            _ => None,
        }
    }

    /// All registered names, tasks and aggregates, in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(|s| s.as_str())
    }

    /// Check that every aggregate child resolves and that aggregates form a
    /// DAG.
    pub fn validate(&self) -> Result<()> {
        // Edge direction: aggregate -> child.
        let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

        for name in self.nodes.keys() {
            graph.add_node(name.as_str());
        }

        for (name, node) in self.nodes.iter() {
            if let Node::Aggregate(agg) = node {
                for child in agg.children.iter() {
                    if !self.nodes.contains_key(child) {
                        return Err(PipelineError::TaskNotFound(format!(
                            "'{child}' (referenced by aggregate '{name}')"
                        )));
                    }
                    graph.add_edge(name.as_str(), child.as_str(), ());
                }
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

    /// Resolve `name` into a [`Plan`].
    ///
    /// Fails with [`PipelineError::TaskNotFound`] or
    /// [`PipelineError::DagCycle`] without touching the filesystem.
    pub fn resolve(&self, name: &str) -> Result<Plan> {
        let mut stack = Vec::new();
        self.resolve_inner(name, &mut stack)
    }

    fn resolve_inner(&self, name: &str, stack: &mut Vec<TaskName>) -> Result<Plan> {
        if stack.iter().any(|n| n == name) {
            stack.push(name.to_string());
            return Err(PipelineError::DagCycle(stack.join(" -> ")));
        }

        let node = self.nodes.get(name).ok_or_else(|| match stack.last() {
            Some(parent) => {
                PipelineError::TaskNotFound(format!("'{name}' (referenced by aggregate '{parent}')"))
            }
            None => PipelineError::TaskNotFound(format!("'{name}'")),
        })?;

        match node {
            Node::Task(task) => Ok(Plan::Task(Arc::clone(task))),
            Node::Aggregate(agg) => {
                stack.push(name.to_string());
                let children = agg
                    .children
                    .iter()
                    .map(|child| self.resolve_inner(child, stack))
                    .collect::<Result<Vec<_>>>()?;
                stack.pop();

                let name = name.to_string();
                Ok(match agg.mode {
                    CompositionMode::Series => Plan::Series { name, children },
                    CompositionMode::Parallel => Plan::Parallel { name, children },
                })
            }
        }
    }
}
