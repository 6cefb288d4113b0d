//! Pipeline dispatch.
//!
//! Maps a trigger event to its assigned jobs, resolves each job, evaluates
//! relevance, and drives relevant jobs through the task runner. Jobs run
//! worker-per-job; results are reported in assignment order. Resolution
//! errors fail closed: the job is recorded as failed and no task executes.

use crate::relevance::PathFilter;
use chrono::{DateTime, Utc};
use gantry_core::config::ProjectConfig;
use gantry_core::events::{
    DispatchCompletedPayload, Event, JobCompletedPayload, JobSkippedPayload, JobStartedPayload,
    TaskCompletedPayload,
};
use gantry_core::ids::{ChangeId, RunId};
use gantry_core::pipeline::{PipelineJob, TriggerKind};
use gantry_core::ports::{EventBus, NoopMaterializer, NullEventBus, ProjectMaterializer};
use gantry_core::registry::JobRegistry;
use gantry_core::run::{DispatchReport, JobRunResult, RunStatus};
use gantry_runner::{JobContext, OutputLine, TaskRunner, Workspace};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// An event selecting a pipeline: a proposed or merged change plus the set
/// of files it touches.
#[derive(Debug, Clone)]
pub struct TriggerEvent {
    pub trigger: TriggerKind,
    pub change: ChangeId,
    pub changed_files: Vec<String>,
}

#[derive(Clone)]
pub struct Dispatcher {
    config: Arc<ProjectConfig>,
    registry: Arc<JobRegistry>,
    runner: Arc<dyn TaskRunner>,
    materializer: Arc<dyn ProjectMaterializer>,
    event_bus: Arc<dyn EventBus>,
    workspace_root: PathBuf,
}

impl Dispatcher {
    pub fn new(
        config: Arc<ProjectConfig>,
        registry: Arc<JobRegistry>,
        runner: Arc<dyn TaskRunner>,
        workspace_root: PathBuf,
    ) -> Self {
        Self {
            config,
            registry,
            runner,
            materializer: Arc::new(NoopMaterializer),
            event_bus: Arc::new(NullEventBus),
            workspace_root,
        }
    }

    pub fn with_materializer(mut self, materializer: Arc<dyn ProjectMaterializer>) -> Self {
        self.materializer = materializer;
        self
    }

    pub fn with_event_bus(mut self, event_bus: Arc<dyn EventBus>) -> Self {
        self.event_bus = event_bus;
        self
    }

    /// Dispatch one trigger event across its assigned jobs.
    pub async fn dispatch(&self, event: &TriggerEvent) -> DispatchReport {
        let start = Instant::now();

        let Some(pipeline) = self.config.pipeline(event.trigger) else {
            debug!(trigger = %event.trigger, "No pipeline assigned to trigger");
            return DispatchReport {
                trigger: event.trigger,
                change: event.change,
                results: vec![],
                duration_ms: start.elapsed().as_millis() as u64,
            };
        };

        info!(
            trigger = %event.trigger,
            change = %event.change,
            jobs = pipeline.jobs.len(),
            "Dispatching pipeline"
        );

        let mut join_set = JoinSet::new();
        for (index, entry) in pipeline.jobs.iter().cloned().enumerate() {
            let dispatcher = self.clone();
            let event = event.clone();
            join_set.spawn(async move { (index, dispatcher.run_job(entry, event).await) });
        }

        let mut slots: Vec<Option<JobRunResult>> =
            (0..pipeline.jobs.len()).map(|_| None).collect();
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((index, result)) => slots[index] = Some(result),
                Err(e) => error!(error = %e, "Job worker panicked"),
            }
        }

        let report = DispatchReport {
            trigger: event.trigger,
            change: event.change,
            results: slots.into_iter().flatten().collect(),
            duration_ms: start.elapsed().as_millis() as u64,
        };

        let (jobs_passed, jobs_failed, jobs_skipped) = report.counts();
        self.publish(Event::DispatchCompleted(DispatchCompletedPayload {
            change: event.change,
            trigger: event.trigger,
            jobs_passed,
            jobs_failed,
            jobs_skipped,
            success: report.success(),
            completed_at: Utc::now(),
        }))
        .await;

        report
    }

    async fn run_job(&self, entry: PipelineJob, event: TriggerEvent) -> JobRunResult {
        let run_id = RunId::new();
        let started_at = Utc::now();
        let start = Instant::now();

        let resolved = match self.registry.resolve(&entry.job) {
            Ok(resolved) => resolved,
            Err(e) => {
                error!(job = %entry.job, error = %e, "Job resolution failed; failing closed");
                return failed_result(
                    run_id,
                    &entry.job,
                    entry.voting.unwrap_or(true),
                    started_at,
                    start,
                    e.to_string(),
                );
            }
        };
        let voting = entry.voting.unwrap_or(resolved.voting);

        let filter = match PathFilter::compile(&resolved.irrelevant_files) {
            Ok(filter) => filter,
            Err(e) => {
                error!(job = %resolved.name, error = %e, "Invalid irrelevant-file pattern");
                return failed_result(run_id, &resolved.name, voting, started_at, start, e.to_string());
            }
        };
        if !filter.is_relevant(&event.changed_files) {
            info!(job = %resolved.name, "All changed files irrelevant; skipping");
            self.publish(Event::JobSkipped(JobSkippedPayload {
                job: resolved.name.clone(),
                change: event.change,
                skipped_at: Utc::now(),
            }))
            .await;
            let completed_at = Utc::now();
            return JobRunResult {
                run_id,
                job: resolved.name,
                status: RunStatus::Skipped,
                voting,
                failed_task: None,
                tasks: vec![],
                error: None,
                started_at,
                completed_at,
                duration_ms: start.elapsed().as_millis() as u64,
            };
        }

        let workspace = match Workspace::acquire(&self.workspace_root, run_id, &resolved.name).await
        {
            Ok(workspace) => workspace,
            Err(e) => {
                error!(job = %resolved.name, error = %e, "Workspace acquisition failed");
                return failed_result(run_id, &resolved.name, voting, started_at, start, e.to_string());
            }
        };

        if let Err(e) = self
            .materializer
            .materialize(&resolved.required_projects, workspace.path())
            .await
        {
            error!(job = %resolved.name, error = %e, "Project materialization failed");
            return failed_result(run_id, &resolved.name, voting, started_at, start, e.to_string());
        }

        self.publish(Event::JobStarted(JobStartedPayload {
            run_id,
            job: resolved.name.clone(),
            change: event.change,
            task_count: resolved.tasks.len(),
            started_at,
        }))
        .await;

        let ambient: HashMap<String, String> = std::env::vars().collect();
        let ctx = JobContext {
            run_id,
            job: resolved.clone(),
            workspace: workspace.path().to_path_buf(),
            ambient,
        };

        let (tx, mut rx) = mpsc::channel::<OutputLine>(256);
        let job_name = resolved.name.clone();
        let drain = tokio::spawn(async move {
            while let Some(line) = rx.recv().await {
                debug!(job = %job_name, line = line.line_number, "{}", line.content);
            }
        });

        let outcome = self.runner.run(&ctx, tx).await;
        let _ = drain.await;

        let completed_at = Utc::now();
        let duration_ms = start.elapsed().as_millis() as u64;

        match outcome {
            Ok(outcome) => {
                for record in &outcome.tasks {
                    self.publish(Event::TaskCompleted(TaskCompletedPayload {
                        run_id,
                        job: resolved.name.clone(),
                        index: record.index,
                        label: record.label.clone(),
                        exit_code: record.exit_code,
                        duration_ms: record.duration_ms,
                        completed_at,
                    }))
                    .await;
                }
                let result = JobRunResult {
                    run_id,
                    job: resolved.name.clone(),
                    status: outcome.status,
                    voting,
                    failed_task: outcome.failed_task,
                    tasks: outcome.tasks,
                    error: outcome.error,
                    started_at,
                    completed_at,
                    duration_ms,
                };
                self.publish(Event::JobCompleted(JobCompletedPayload {
                    run_id,
                    job: result.job.clone(),
                    status: result.status,
                    failed_task: result.failed_task,
                    duration_ms,
                    completed_at,
                }))
                .await;
                result
            }
            Err(e) => {
                error!(job = %resolved.name, error = %e, "Task runner failed");
                failed_result(run_id, &resolved.name, voting, started_at, start, e.to_string())
            }
        }
    }

    async fn publish(&self, event: Event) {
        if let Err(e) = self.event_bus.publish(event).await {
            warn!(error = %e, "Failed to publish event");
        }
    }
}

fn failed_result(
    run_id: RunId,
    job: &str,
    voting: bool,
    started_at: DateTime<Utc>,
    start: Instant,
    error: String,
) -> JobRunResult {
    JobRunResult {
        run_id,
        job: job.to_string(),
        status: RunStatus::Failed,
        voting,
        failed_task: None,
        tasks: vec![],
        error: Some(error),
        started_at,
        completed_at: Utc::now(),
        duration_ms: start.elapsed().as_millis() as u64,
    }
}
