//! Gantry Scheduler
//!
//! Decides which jobs run for a trigger event and drives them to
//! completion: path-filter relevance evaluation, gate-queue serialization,
//! and the pipeline dispatcher.

pub mod dispatcher;
pub mod queue;
pub mod relevance;

pub use dispatcher::{Dispatcher, TriggerEvent};
pub use queue::GateQueue;
pub use relevance::{PathFilter, is_relevant};
