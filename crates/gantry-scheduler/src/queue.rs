//! Gate queue serialization.
//!
//! A queue is a named serialization domain shared by changes targeting the
//! same state. Only the change at the head of a queue may advance its gate
//! run; everything behind it waits. Jobs within one change's gate run are
//! free to parallelize; the queue serializes changes, not jobs.

use gantry_core::ids::ChangeId;
use std::collections::{HashMap, VecDeque};

#[derive(Debug, Default)]
pub struct GateQueue {
    queues: HashMap<String, VecDeque<ChangeId>>,
}

impl GateQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a change to a queue. Re-enqueueing an already queued change is a
    /// no-op.
    pub fn enqueue(&mut self, queue: &str, change: ChangeId) {
        let entries = self.queues.entry(queue.to_string()).or_default();
        if !entries.contains(&change) {
            entries.push_back(change);
        }
    }

    /// Whether a change holds the head of its queue and may advance.
    pub fn can_advance(&self, queue: &str, change: ChangeId) -> bool {
        self.queues
            .get(queue)
            .and_then(|entries| entries.front())
            .is_some_and(|head| *head == change)
    }

    /// Remove a change from a queue (merged or abandoned), letting the next
    /// change advance.
    pub fn complete(&mut self, queue: &str, change: ChangeId) {
        if let Some(entries) = self.queues.get_mut(queue) {
            entries.retain(|c| *c != change);
            if entries.is_empty() {
                self.queues.remove(queue);
            }
        }
    }

    /// Zero-based position of a change in its queue.
    pub fn position(&self, queue: &str, change: ChangeId) -> Option<usize> {
        self.queues
            .get(queue)?
            .iter()
            .position(|c| *c == change)
    }

    pub fn len(&self, queue: &str) -> usize {
        self.queues.get(queue).map_or(0, VecDeque::len)
    }

    pub fn is_empty(&self, queue: &str) -> bool {
        self.len(queue) == 0
    }
}
