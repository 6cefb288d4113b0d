//! Command handlers.

use crate::bus::TracingEventBus;
use crate::git::GitMaterializer;
use console::style;
use gantry_core::config::{ProjectConfig, find_config_file};
use gantry_core::ids::ChangeId;
use gantry_core::pipeline::TriggerKind;
use gantry_core::registry::JobRegistry;
use gantry_core::run::RunStatus;
use gantry_runner::HostRunner;
use gantry_scheduler::{Dispatcher, TriggerEvent};
use std::path::{Path, PathBuf};
use std::sync::Arc;

type CliResult = Result<(), Box<dyn std::error::Error>>;

fn load(config: Option<&Path>) -> Result<(Arc<ProjectConfig>, Arc<JobRegistry>), Box<dyn std::error::Error>> {
    let path = find_config_file(config)
        .ok_or("no configuration file found (tried .gantry.yaml, gantry.yaml, .gantry/config.yaml)")?;
    let config = ProjectConfig::load(&path)?;
    let registry = JobRegistry::from_config(&config)?;
    Ok((Arc::new(config), Arc::new(registry)))
}

pub async fn validate(config: Option<&Path>) -> CliResult {
    let (config, registry) = load(config)?;

    let mut errors = 0;
    for name in registry.names() {
        if let Err(e) = registry.resolve(name) {
            println!("  {} {}: {}", style("✗").red(), name, e);
            errors += 1;
        }
    }

    if errors > 0 {
        return Err(format!("{} job(s) failed to resolve", errors).into());
    }
    println!(
        "{} Configuration valid: {} job(s), {} pipeline(s)",
        style("✓").green().bold(),
        config.jobs.len(),
        config.pipelines.len()
    );
    Ok(())
}

pub async fn jobs(config: Option<&Path>) -> CliResult {
    let (_, registry) = load(config)?;

    for name in registry.names() {
        let resolved = registry.resolve(name)?;
        let parent = registry
            .get(name)
            .and_then(|job| job.parent.clone())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {}  parent: {}  timeout: {}s  tasks: {}",
            style(name).bold(),
            parent,
            resolved.timeout_seconds,
            resolved.tasks.len()
        );
    }
    Ok(())
}

pub async fn resolve(job: &str, config: Option<&Path>) -> CliResult {
    let (_, registry) = load(config)?;
    let resolved = registry.resolve(job)?;
    print!("{}", serde_yaml::to_string(&resolved)?);
    Ok(())
}

pub async fn dispatch(
    trigger: TriggerKind,
    files: Vec<String>,
    workspace: PathBuf,
    config: Option<&Path>,
) -> CliResult {
    let (config, registry) = load(config)?;

    let dispatcher = Dispatcher::new(config, registry, Arc::new(HostRunner::new()), workspace)
        .with_materializer(Arc::new(GitMaterializer))
        .with_event_bus(Arc::new(TracingEventBus));

    let event = TriggerEvent {
        trigger,
        change: ChangeId::new(),
        changed_files: files,
    };

    println!(
        "\n{} Dispatching {} pipeline ({} changed file(s))\n",
        style("▶").cyan().bold(),
        style(trigger).bold(),
        event.changed_files.len()
    );

    let report = dispatcher.dispatch(&event).await;

    for result in &report.results {
        let seconds = result.duration_ms as f64 / 1000.0;
        match result.status {
            RunStatus::Success => {
                println!("  {} {} ({:.2}s)", style("✓").green(), result.job, seconds);
            }
            RunStatus::Skipped => {
                println!("  {} {} (skipped)", style("-").dim(), style(&result.job).dim());
            }
            RunStatus::Failed => {
                let detail = match result.failed_task {
                    Some(index) => format!("task {} failed", index),
                    None => result.error.clone().unwrap_or_else(|| "failed".to_string()),
                };
                let vote = if result.voting { "" } else { " [non-voting]" };
                println!(
                    "  {} {} ({:.2}s): {}{}",
                    style("✗").red(),
                    result.job,
                    seconds,
                    detail,
                    vote
                );
            }
            RunStatus::TimedOut => {
                println!(
                    "  {} {} timed out after {:.2}s",
                    style("✗").red(),
                    result.job,
                    seconds
                );
            }
        }
    }

    println!();
    if report.success() {
        println!(
            "{} Pipeline passed in {:.2}s",
            style("✓").green().bold(),
            report.duration_ms as f64 / 1000.0
        );
        Ok(())
    } else {
        println!(
            "{} Pipeline failed after {:.2}s",
            style("✗").red().bold(),
            report.duration_ms as f64 / 1000.0
        );
        Err("pipeline failed".into())
    }
}
