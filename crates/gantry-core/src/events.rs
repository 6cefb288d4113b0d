//! Lifecycle events published during a dispatch.

use crate::ids::{ChangeId, RunId};
use crate::pipeline::TriggerKind;
use crate::run::RunStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// All events in the Gantry system.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    JobStarted(JobStartedPayload),
    JobSkipped(JobSkippedPayload),
    JobCompleted(JobCompletedPayload),
    TaskCompleted(TaskCompletedPayload),
    DispatchCompleted(DispatchCompletedPayload),
}

impl Event {
    /// Routing subject for this event.
    pub fn subject(&self) -> String {
        match self {
            Event::JobStarted(p) => format!("job.{}.started", p.run_id),
            Event::JobSkipped(p) => format!("job.skipped.{}", p.job),
            Event::JobCompleted(p) => format!("job.{}.completed", p.run_id),
            Event::TaskCompleted(p) => format!("job.{}.task.{}.completed", p.run_id, p.index),
            Event::DispatchCompleted(p) => format!("dispatch.completed.{}", p.change),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStartedPayload {
    pub run_id: RunId,
    pub job: String,
    pub change: ChangeId,
    pub task_count: usize,
    pub started_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSkippedPayload {
    pub job: String,
    pub change: ChangeId,
    pub skipped_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobCompletedPayload {
    pub run_id: RunId,
    pub job: String,
    pub status: RunStatus,
    pub failed_task: Option<usize>,
    pub duration_ms: u64,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskCompletedPayload {
    pub run_id: RunId,
    pub job: String,
    pub index: usize,
    pub label: String,
    pub exit_code: Option<i32>,
    pub duration_ms: u64,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchCompletedPayload {
    pub change: ChangeId,
    pub trigger: TriggerKind,
    pub jobs_passed: usize,
    pub jobs_failed: usize,
    pub jobs_skipped: usize,
    pub success: bool,
    pub completed_at: DateTime<Utc>,
}
