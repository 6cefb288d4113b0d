//! Run and result types.

use crate::ids::{ChangeId, RunId};
use crate::pipeline::TriggerKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Success,
    Failed,
    Skipped,
    /// Distinct from `Failed` so reporting can tell "broke" from "too slow".
    TimedOut,
}

impl RunStatus {
    pub fn passed(&self) -> bool {
        matches!(self, RunStatus::Success | RunStatus::Skipped)
    }
}

/// One executed (or aborted) task within a job run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRecord {
    pub index: usize,
    pub label: String,
    /// None when the task never produced an exit status (spawn failure,
    /// killed on timeout).
    pub exit_code: Option<i32>,
    pub duration_ms: u64,
}

/// Terminal outcome of a single job run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRunResult {
    pub run_id: RunId,
    pub job: String,
    pub status: RunStatus,
    pub voting: bool,
    /// Index of the first failing task, when `status` is `Failed`.
    pub failed_task: Option<usize>,
    pub tasks: Vec<TaskRecord>,
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub duration_ms: u64,
}

impl JobRunResult {
    /// Whether this result counts against the pipeline. Non-voting failures
    /// are recorded but downgraded.
    pub fn counts_as_passed(&self) -> bool {
        self.status.passed() || !self.voting
    }
}

/// Outcome of dispatching one trigger event across its assigned jobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchReport {
    pub trigger: TriggerKind,
    pub change: ChangeId,
    pub results: Vec<JobRunResult>,
    pub duration_ms: u64,
}

impl DispatchReport {
    pub fn success(&self) -> bool {
        self.results.iter().all(|r| r.counts_as_passed())
    }

    pub fn counts(&self) -> (usize, usize, usize) {
        let mut passed = 0;
        let mut failed = 0;
        let mut skipped = 0;
        for r in &self.results {
            match r.status {
                RunStatus::Success => passed += 1,
                RunStatus::Skipped => skipped += 1,
                RunStatus::Failed | RunStatus::TimedOut => failed += 1,
            }
        }
        (passed, failed, skipped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(status: RunStatus, voting: bool) -> JobRunResult {
        let now = Utc::now();
        JobRunResult {
            run_id: RunId::new(),
            job: "job".to_string(),
            status,
            voting,
            failed_task: None,
            tasks: vec![],
            error: None,
            started_at: now,
            completed_at: now,
            duration_ms: 0,
        }
    }

    #[test]
    fn test_non_voting_failure_does_not_flip_report() {
        let report = DispatchReport {
            trigger: TriggerKind::Check,
            change: ChangeId::new(),
            results: vec![
                result(RunStatus::Success, true),
                result(RunStatus::Failed, false),
            ],
            duration_ms: 10,
        };
        assert!(report.success());
        assert_eq!(report.counts(), (1, 1, 0));
    }

    #[test]
    fn test_voting_timeout_fails_report() {
        let report = DispatchReport {
            trigger: TriggerKind::Gate,
            change: ChangeId::new(),
            results: vec![result(RunStatus::TimedOut, true)],
            duration_ms: 10,
        };
        assert!(!report.success());
    }
}
