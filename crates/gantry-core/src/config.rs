//! Declarative project configuration.
//!
//! The whole configuration surface is loaded once at startup and frozen;
//! a "reload" is a fresh registry swap, never in-place mutation.

use crate::job::JobDefinition;
use crate::pipeline::{Pipeline, TriggerKind};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub jobs: Vec<JobDefinition>,
    #[serde(default)]
    pub pipelines: Vec<Pipeline>,
}

impl ProjectConfig {
    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: ProjectConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Structural checks that don't require resolving inheritance: unique
    /// job names, pipeline entries referencing known jobs, one pipeline per
    /// trigger, gate pipelines carrying a queue.
    pub fn validate(&self) -> Result<()> {
        let mut names = HashSet::new();
        for job in &self.jobs {
            if job.name.is_empty() {
                return Err(Error::InvalidConfig("job with empty name".to_string()));
            }
            if let Some(timeout) = job.timeout_seconds
                && timeout == 0
            {
                return Err(Error::InvalidConfig(format!(
                    "job '{}' has a zero timeout",
                    job.name
                )));
            }
            if !names.insert(job.name.as_str()) {
                return Err(Error::InvalidConfig(format!(
                    "duplicate job name '{}'",
                    job.name
                )));
            }
        }

        let mut triggers = HashSet::new();
        for pipeline in &self.pipelines {
            if !triggers.insert(pipeline.trigger) {
                return Err(Error::InvalidConfig(format!(
                    "multiple pipelines assigned to trigger '{}'",
                    pipeline.trigger
                )));
            }
            if pipeline.trigger == TriggerKind::Gate && pipeline.queue.is_none() {
                return Err(Error::InvalidConfig(
                    "gate pipeline requires a queue".to_string(),
                ));
            }
            for entry in &pipeline.jobs {
                if !names.contains(entry.job.as_str()) {
                    return Err(Error::InvalidConfig(format!(
                        "pipeline '{}' references unknown job '{}'",
                        pipeline.trigger, entry.job
                    )));
                }
            }
        }

        Ok(())
    }

    pub fn pipeline(&self, trigger: TriggerKind) -> Option<&Pipeline> {
        self.pipelines.iter().find(|p| p.trigger == trigger)
    }
}

/// Locate the configuration file: an explicit path wins, otherwise the
/// standard candidates in the current directory.
pub fn find_config_file(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return path.exists().then(|| path.to_path_buf());
    }

    let candidates = [".gantry.yaml", "gantry.yaml", ".gantry/config.yaml"];
    candidates
        .into_iter()
        .map(PathBuf::from)
        .find(|path| path.exists())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::Task;

    const CONFIG: &str = r#"
jobs:
  - name: base-dsvm
    timeout_seconds: 4200
    environment:
      DEVSTACK_GATE_TIMEOUT: "60"
    tasks:
      - kind: ensure_directory
        path: logs
      - kind: run_script
        script: |
          git clone https://example.org/helper helper
          ./helper/run.sh
  - name: dsvm-reservation
    parent: base-dsvm
    irrelevant_files:
      - "doc/.*"
    voting: false

pipelines:
  - trigger: check
    jobs:
      - job: dsvm-reservation
  - trigger: gate
    queue: reservation
    jobs:
      - job: dsvm-reservation
        voting: true
"#;

    #[test]
    fn test_parse_full_config() {
        let config = ProjectConfig::from_yaml(CONFIG).unwrap();
        assert_eq!(config.jobs.len(), 2);
        assert_eq!(config.pipelines.len(), 2);
        let base = &config.jobs[0];
        assert_eq!(base.timeout_seconds, Some(4200));
        assert_eq!(base.tasks.len(), 2);
        assert!(matches!(base.tasks[0], Task::EnsureDirectory { .. }));
    }

    #[test]
    fn test_duplicate_job_name_rejected() {
        let yaml = "jobs:\n  - name: a\n  - name: a\n";
        let err = ProjectConfig::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn test_gate_pipeline_without_queue_rejected() {
        let yaml = r#"
jobs:
  - name: a
pipelines:
  - trigger: gate
    jobs:
      - job: a
"#;
        let err = ProjectConfig::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn test_unknown_pipeline_job_rejected() {
        let yaml = r#"
jobs:
  - name: a
pipelines:
  - trigger: check
    jobs:
      - job: missing
"#;
        let err = ProjectConfig::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn test_pipeline_lookup() {
        let config = ProjectConfig::from_yaml(CONFIG).unwrap();
        let gate = config.pipeline(TriggerKind::Gate).unwrap();
        assert_eq!(gate.queue.as_deref(), Some("reservation"));
        assert!(config.pipeline(TriggerKind::Check).is_some());
    }
}
