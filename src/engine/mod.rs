// src/engine/mod.rs

//! Task execution.
//!
//! [`Runner`] resolves a target in its [`TaskGraph`](crate::graph::TaskGraph)
//! and runs the resulting plan: series children in order, parallel
//! children concurrently on the Tokio runtime.

pub mod report;
pub mod runner;

pub use report::{RunReport, TaskReport};
pub use runner::{RunSettings, Runner};
