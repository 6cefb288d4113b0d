//! Job descriptor types.
//!
//! These types represent the user-authored job configuration YAML. A job is
//! a named, inheritable unit of CI work: an ordered task sequence plus the
//! metadata that decides when and how it runs.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Default wall-clock budget for a job's whole task sequence.
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 3600;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobDefinition {
    pub name: String,
    /// Single-parent inheritance; chains must be acyclic.
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Anchored regex patterns over repository-relative paths. If every
    /// changed file matches at least one, the job is skipped.
    #[serde(default)]
    pub irrelevant_files: Vec<String>,
    /// External repositories materialized into the workspace before tasks run.
    #[serde(default)]
    pub required_projects: Vec<ProjectRef>,
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
    #[serde(default)]
    pub tasks: Vec<Task>,
    /// Environment overlay, merged child-over-parent at resolution time.
    #[serde(default)]
    pub environment: HashMap<String, String>,
    #[serde(default)]
    pub voting: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRef {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub revision: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Task {
    /// Create a directory (and parents) under the workspace.
    EnsureDirectory { path: PathBuf },
    /// Run opaque command text through a shell. The exit status is
    /// authoritative; the runner never inspects what the script does.
    RunScript {
        script: String,
        #[serde(default)]
        working_directory: Option<PathBuf>,
        #[serde(default)]
        environment: HashMap<String, String>,
        #[serde(default = "default_shell")]
        shell: String,
    },
}

fn default_shell() -> String {
    "sh".to_string()
}

impl Task {
    /// Short human-readable label used in logs and task records.
    pub fn label(&self) -> String {
        match self {
            Task::EnsureDirectory { path } => format!("mkdir {}", path.display()),
            Task::RunScript { script, .. } => {
                let first = script.lines().find(|l| !l.trim().is_empty()).unwrap_or("");
                first.trim().chars().take(60).collect()
            }
        }
    }
}

/// A fully merged job definition, produced by walking the parent chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedJob {
    pub name: String,
    /// Ancestor names, root first, the job itself last.
    pub lineage: Vec<String>,
    pub irrelevant_files: Vec<String>,
    pub required_projects: Vec<ProjectRef>,
    pub timeout_seconds: u64,
    pub tasks: Vec<Task>,
    pub environment: HashMap<String, String>,
    pub voting: bool,
}
