//! Task execution contracts.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gantry_core::Result;
use gantry_core::ids::RunId;
use gantry_core::job::ResolvedJob;
use gantry_core::run::{RunStatus, TaskRecord};
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::mpsc;

/// Everything a runner needs to execute one job run.
#[derive(Debug, Clone)]
pub struct JobContext {
    pub run_id: RunId,
    pub job: ResolvedJob,
    /// Acquired workspace directory; guaranteed present for the run.
    pub workspace: PathBuf,
    /// Ambient process environment the job overlay merges over.
    pub ambient: HashMap<String, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

/// A single line of task output.
#[derive(Debug, Clone)]
pub struct OutputLine {
    pub stream: OutputStream,
    pub content: String,
    pub line_number: u32,
    pub timestamp: DateTime<Utc>,
}

/// Terminal outcome of one job run's task sequence.
#[derive(Debug)]
pub struct RunOutcome {
    pub status: RunStatus,
    pub failed_task: Option<usize>,
    pub tasks: Vec<TaskRecord>,
    pub error: Option<String>,
}

/// Executes a job's tasks strictly in order, aborting on first failure.
#[async_trait]
pub trait TaskRunner: Send + Sync {
    async fn run(
        &self,
        ctx: &JobContext,
        output_tx: mpsc::Sender<OutputLine>,
    ) -> Result<RunOutcome>;
}
