//! Host shell execution of job task sequences.

use crate::runner::{JobContext, OutputLine, OutputStream, RunOutcome, TaskRunner};
use async_trait::async_trait;
use gantry_core::job::Task;
use gantry_core::run::{RunStatus, TaskRecord};
use gantry_core::{Error, Result};
use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Executes tasks directly on the host.
///
/// The whole sequence runs against one wall-clock budget
/// (`job.timeout_seconds`); expiry kills the in-flight child process and
/// yields a `TimedOut` outcome. No task is retried.
pub struct HostRunner;

impl HostRunner {
    pub fn new() -> Self {
        Self
    }

    async fn execute_task(
        &self,
        task: &Task,
        ctx: &JobContext,
        index: usize,
        output_tx: mpsc::Sender<OutputLine>,
    ) -> Result<i32> {
        match task {
            Task::EnsureDirectory { path } => {
                let target = ctx.workspace.join(path);
                tokio::fs::create_dir_all(&target).await?;
                debug!(task = index, path = %target.display(), "Directory ensured");
                Ok(0)
            }
            Task::RunScript {
                script,
                working_directory,
                environment,
                shell,
            } => {
                self.execute_script(ctx, index, script, working_directory.as_ref(), environment, shell, output_tx)
                    .await
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn execute_script(
        &self,
        ctx: &JobContext,
        index: usize,
        script: &str,
        working_directory: Option<&PathBuf>,
        environment: &HashMap<String, String>,
        shell: &str,
        output_tx: mpsc::Sender<OutputLine>,
    ) -> Result<i32> {
        // Task keys override the job overlay, which overrides ambient.
        let mut env = ctx.ambient.clone();
        env.extend(ctx.job.environment.iter().map(|(k, v)| (k.clone(), v.clone())));
        env.extend(environment.iter().map(|(k, v)| (k.clone(), v.clone())));

        let work_dir = working_directory
            .map(|d| ctx.workspace.join(d))
            .unwrap_or_else(|| ctx.workspace.clone());

        debug!(task = index, workdir = %work_dir.display(), "Executing script");

        let mut child = Command::new(shell)
            .arg("-c")
            .arg(script)
            .current_dir(&work_dir)
            .env_clear()
            .envs(&env)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::TaskSpawn(format!("failed to spawn '{}': {}", shell, e)))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::Internal("child stdout not captured".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| Error::Internal("child stderr not captured".to_string()))?;

        let stdout_tx = output_tx.clone();
        let stdout_handle = tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            let mut line_num = 0u32;
            while let Ok(Some(line)) = lines.next_line().await {
                line_num += 1;
                let output = OutputLine {
                    stream: OutputStream::Stdout,
                    content: line,
                    line_number: line_num,
                    timestamp: chrono::Utc::now(),
                };
                if stdout_tx.send(output).await.is_err() {
                    break;
                }
            }
        });

        let stderr_tx = output_tx;
        let stderr_handle = tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            let mut line_num = 0u32;
            while let Ok(Some(line)) = lines.next_line().await {
                line_num += 1;
                let output = OutputLine {
                    stream: OutputStream::Stderr,
                    content: line,
                    line_number: line_num,
                    timestamp: chrono::Utc::now(),
                };
                if stderr_tx.send(output).await.is_err() {
                    break;
                }
            }
        });

        let status = child
            .wait()
            .await
            .map_err(|e| Error::Internal(format!("failed to wait for task process: {}", e)))?;

        let _ = stdout_handle.await;
        let _ = stderr_handle.await;

        Ok(status.code().unwrap_or(-1))
    }
}

impl Default for HostRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TaskRunner for HostRunner {
    async fn run(
        &self,
        ctx: &JobContext,
        output_tx: mpsc::Sender<OutputLine>,
    ) -> Result<RunOutcome> {
        let deadline = Instant::now() + Duration::from_secs(ctx.job.timeout_seconds);
        let mut records = Vec::with_capacity(ctx.job.tasks.len());

        info!(
            run_id = %ctx.run_id,
            job = %ctx.job.name,
            tasks = ctx.job.tasks.len(),
            "Starting task sequence"
        );

        for (index, task) in ctx.job.tasks.iter().enumerate() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                warn!(job = %ctx.job.name, task = index, "Job budget exhausted");
                return Ok(RunOutcome {
                    status: RunStatus::TimedOut,
                    failed_task: None,
                    tasks: records,
                    error: Some(format!(
                        "job budget of {}s exhausted before task {}",
                        ctx.job.timeout_seconds, index
                    )),
                });
            }

            let start = Instant::now();
            let attempt = timeout(
                remaining,
                self.execute_task(task, ctx, index, output_tx.clone()),
            )
            .await;
            let duration_ms = start.elapsed().as_millis() as u64;

            match attempt {
                // Budget expired mid-task; the child is killed on drop.
                Err(_) => {
                    warn!(job = %ctx.job.name, task = index, "Job timed out, killing task");
                    records.push(TaskRecord {
                        index,
                        label: task.label(),
                        exit_code: None,
                        duration_ms,
                    });
                    return Ok(RunOutcome {
                        status: RunStatus::TimedOut,
                        failed_task: None,
                        tasks: records,
                        error: Some(format!(
                            "timed out after {}s during task {}",
                            ctx.job.timeout_seconds, index
                        )),
                    });
                }
                Ok(Err(e)) => {
                    records.push(TaskRecord {
                        index,
                        label: task.label(),
                        exit_code: None,
                        duration_ms,
                    });
                    return Ok(RunOutcome {
                        status: RunStatus::Failed,
                        failed_task: Some(index),
                        tasks: records,
                        error: Some(e.to_string()),
                    });
                }
                Ok(Ok(exit_code)) => {
                    debug!(task = index, exit_code, duration_ms, "Task completed");
                    records.push(TaskRecord {
                        index,
                        label: task.label(),
                        exit_code: Some(exit_code),
                        duration_ms,
                    });
                    if exit_code != 0 {
                        return Ok(RunOutcome {
                            status: RunStatus::Failed,
                            failed_task: Some(index),
                            tasks: records,
                            error: Some(format!("task {} exited with status {}", index, exit_code)),
                        });
                    }
                }
            }
        }

        Ok(RunOutcome {
            status: RunStatus::Success,
            failed_task: None,
            tasks: records,
            error: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gantry_core::ids::RunId;
    use gantry_core::job::ResolvedJob;

    fn script(cmd: &str) -> Task {
        Task::RunScript {
            script: cmd.to_string(),
            working_directory: None,
            environment: HashMap::new(),
            shell: "sh".to_string(),
        }
    }

    fn context(
        workspace: PathBuf,
        tasks: Vec<Task>,
        environment: HashMap<String, String>,
        mut ambient: HashMap<String, String>,
        timeout_seconds: u64,
    ) -> JobContext {
        // Children run with a cleared environment; keep PATH so sh and
        // friends resolve.
        ambient
            .entry("PATH".to_string())
            .or_insert_with(|| std::env::var("PATH").unwrap_or_default());
        JobContext {
            run_id: RunId::new(),
            job: ResolvedJob {
                name: "test-job".to_string(),
                lineage: vec!["test-job".to_string()],
                irrelevant_files: vec![],
                required_projects: vec![],
                timeout_seconds,
                tasks,
                environment,
                voting: true,
            },
            workspace,
            ambient,
        }
    }

    #[tokio::test]
    async fn test_sequence_success_with_output() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(
            dir.path().to_path_buf(),
            vec![
                Task::EnsureDirectory { path: "logs".into() },
                script("echo hello"),
            ],
            HashMap::new(),
            HashMap::new(),
            60,
        );

        let (tx, mut rx) = mpsc::channel(64);
        let outcome = HostRunner::new().run(&ctx, tx).await.unwrap();

        assert_eq!(outcome.status, RunStatus::Success);
        assert_eq!(outcome.tasks.len(), 2);
        assert!(dir.path().join("logs").is_dir());

        let line = rx.recv().await.unwrap();
        assert_eq!(line.content, "hello");
        assert_eq!(line.stream, OutputStream::Stdout);
    }

    #[tokio::test]
    async fn test_fail_fast_aborts_remaining_tasks() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(
            dir.path().to_path_buf(),
            vec![
                script("touch t0"),
                script("touch t1"),
                script("exit 3"),
                script("touch t3"),
            ],
            HashMap::new(),
            HashMap::new(),
            60,
        );

        let (tx, _rx) = mpsc::channel(64);
        let outcome = HostRunner::new().run(&ctx, tx).await.unwrap();

        assert_eq!(outcome.status, RunStatus::Failed);
        assert_eq!(outcome.failed_task, Some(2));
        assert_eq!(outcome.tasks.len(), 3);
        assert_eq!(outcome.tasks[2].exit_code, Some(3));
        assert!(dir.path().join("t1").exists());
        // The fourth task never ran.
        assert!(!dir.path().join("t3").exists());
    }

    #[tokio::test]
    async fn test_environment_overlay_over_ambient() {
        let dir = tempfile::tempdir().unwrap();
        let ambient = HashMap::from([
            ("X".to_string(), "0".to_string()),
            ("Y".to_string(), "2".to_string()),
        ]);
        let overlay = HashMap::from([("X".to_string(), "1".to_string())]);
        let ctx = context(
            dir.path().to_path_buf(),
            vec![script("echo \"$X-$Y\"")],
            overlay,
            ambient,
            60,
        );

        let (tx, mut rx) = mpsc::channel(64);
        let outcome = HostRunner::new().run(&ctx, tx).await.unwrap();

        assert_eq!(outcome.status, RunStatus::Success);
        let line = rx.recv().await.unwrap();
        assert_eq!(line.content, "1-2");
    }

    #[tokio::test]
    async fn test_task_environment_overrides_job_overlay() {
        let dir = tempfile::tempdir().unwrap();
        let task = Task::RunScript {
            script: "echo \"$MODE\"".to_string(),
            working_directory: None,
            environment: HashMap::from([("MODE".to_string(), "task".to_string())]),
            shell: "sh".to_string(),
        };
        let ctx = context(
            dir.path().to_path_buf(),
            vec![task],
            HashMap::from([("MODE".to_string(), "job".to_string())]),
            HashMap::new(),
            60,
        );

        let (tx, mut rx) = mpsc::channel(64);
        HostRunner::new().run(&ctx, tx).await.unwrap();
        assert_eq!(rx.recv().await.unwrap().content, "task");
    }

    #[tokio::test]
    async fn test_timeout_kills_in_flight_task() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(
            dir.path().to_path_buf(),
            vec![script("sleep 30"), script("touch after")],
            HashMap::new(),
            HashMap::new(),
            1,
        );

        let (tx, _rx) = mpsc::channel(64);
        let start = Instant::now();
        let outcome = HostRunner::new().run(&ctx, tx).await.unwrap();

        assert_eq!(outcome.status, RunStatus::TimedOut);
        assert!(outcome.failed_task.is_none());
        assert!(start.elapsed() < Duration::from_secs(10));
        assert!(!dir.path().join("after").exists());
    }

    #[tokio::test]
    async fn test_stderr_is_captured() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(
            dir.path().to_path_buf(),
            vec![script("echo oops >&2")],
            HashMap::new(),
            HashMap::new(),
            60,
        );

        let (tx, mut rx) = mpsc::channel(64);
        HostRunner::new().run(&ctx, tx).await.unwrap();
        let line = rx.recv().await.unwrap();
        assert_eq!(line.stream, OutputStream::Stderr);
        assert_eq!(line.content, "oops");
    }
}
