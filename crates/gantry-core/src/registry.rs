//! Job registry and inheritance resolution.
//!
//! The registry indexes job definitions by name and resolves a job by
//! walking its parent chain to the root, merging attributes root-to-leaf.
//! It is read-only after construction.

use crate::config::ProjectConfig;
use crate::job::{DEFAULT_TIMEOUT_SECONDS, JobDefinition, ProjectRef, ResolvedJob, Task};
use crate::{Error, Result};
use std::collections::{HashMap, HashSet};

#[derive(Debug)]
pub struct JobRegistry {
    jobs: HashMap<String, JobDefinition>,
}

impl JobRegistry {
    /// Build a registry from a validated configuration.
    pub fn from_config(config: &ProjectConfig) -> Result<Self> {
        config.validate()?;
        let jobs = config
            .jobs
            .iter()
            .map(|job| (job.name.clone(), job.clone()))
            .collect();
        Ok(Self { jobs })
    }

    pub fn get(&self, name: &str) -> Option<&JobDefinition> {
        self.jobs.get(name)
    }

    /// Registered job names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.jobs.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Resolve a job by merging its parent chain.
    ///
    /// Merge policy: scalar attributes (timeout, voting, task list when
    /// non-empty) nearest descendant wins; list attributes accumulate
    /// root-to-leaf; environment keys accumulate with leaf entries
    /// overriding.
    pub fn resolve(&self, name: &str) -> Result<ResolvedJob> {
        let chain = self.parent_chain(name)?;

        let mut lineage = Vec::with_capacity(chain.len());
        let mut irrelevant_files = Vec::new();
        let mut seen_patterns = HashSet::new();
        let mut required_projects: Vec<ProjectRef> = Vec::new();
        let mut seen_projects = HashSet::new();
        let mut timeout_seconds = None;
        let mut tasks: Vec<Task> = Vec::new();
        let mut environment = HashMap::new();
        let mut voting = None;

        for def in &chain {
            lineage.push(def.name.clone());
            for pattern in &def.irrelevant_files {
                if seen_patterns.insert(pattern.clone()) {
                    irrelevant_files.push(pattern.clone());
                }
            }
            for project in &def.required_projects {
                if seen_projects.insert(project.name.clone()) {
                    required_projects.push(project.clone());
                }
            }
            if def.timeout_seconds.is_some() {
                timeout_seconds = def.timeout_seconds;
            }
            if !def.tasks.is_empty() {
                tasks = def.tasks.clone();
            }
            environment.extend(
                def.environment
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone())),
            );
            if def.voting.is_some() {
                voting = def.voting;
            }
        }

        Ok(ResolvedJob {
            name: name.to_string(),
            lineage,
            irrelevant_files,
            required_projects,
            timeout_seconds: timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECONDS),
            tasks,
            environment,
            voting: voting.unwrap_or(true),
        })
    }

    /// Walk the parent chain from `name` to the root, returning definitions
    /// root first. Detects cycles with a visited set.
    fn parent_chain(&self, name: &str) -> Result<Vec<&JobDefinition>> {
        let mut chain: Vec<&JobDefinition> = Vec::new();
        let mut visited = HashSet::new();
        let mut current = Some(name);

        while let Some(job_name) = current {
            if !visited.insert(job_name.to_string()) {
                return Err(Error::CyclicInheritance {
                    job: name.to_string(),
                    chain: chain.iter().map(|def| def.name.clone()).collect(),
                });
            }
            let def = self
                .jobs
                .get(job_name)
                .ok_or_else(|| Error::UnknownJob(job_name.to_string()))?;
            chain.push(def);
            current = def.parent.as_deref();
        }

        chain.reverse();
        Ok(chain)
    }
}
