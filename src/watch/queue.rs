// src/watch/queue.rs

use tracing::debug;

use crate::graph::TaskName;

/// Targets waiting for the next rebuild.
///
/// Triggers are coalesced: a target triggered several times before the
/// next rebuild runs once. First-trigger order is kept so rebuilds are
/// deterministic.
#[derive(Debug, Default)]
pub struct TriggerQueue {
    pending: Vec<TaskName>,
}

impl TriggerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Remember `target` for the next rebuild. Returns false if it was
    /// already pending.
    pub fn record_trigger(&mut self, target: &str) -> bool {
        if self.pending.iter().any(|t| t == target) {
            debug!(target_name = %target, "already queued; coalescing");
            return false;
        }
        self.pending.push(target.to_string());
        debug!(target_name = %target, queued = self.pending.len(), "queued for rebuild");
        true
    }

    /// Take every pending target, leaving the queue empty.
    pub fn drain_pending(&mut self) -> Vec<TaskName> {
        std::mem::take(&mut self.pending)
    }
}
