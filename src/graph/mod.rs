// src/graph/mod.rs

//! Task registry and resolution.
//!
//! - [`task`] defines tasks and their transform steps.
//! - [`graph`] holds the explicit [`TaskGraph`] and aggregate composition.
//! - [`plan`] is the resolved, ready-to-run form of a target.

pub mod graph;
pub mod plan;
pub mod task;

pub use graph::{compose, Aggregate, CompositionMode, TaskGraph};
pub use plan::Plan;
pub use task::{Step, Task, TaskKind, TaskName, TransformTask};
