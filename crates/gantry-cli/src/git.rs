//! Git-backed project materialization.

use async_trait::async_trait;
use gantry_core::job::ProjectRef;
use gantry_core::ports::ProjectMaterializer;
use gantry_core::{Error, Result};
use std::path::Path;
use tokio::process::Command;
use tracing::{debug, info};

/// Clones required projects into the workspace with the system git.
pub struct GitMaterializer;

impl GitMaterializer {
    async fn clone_project(&self, project: &ProjectRef, target: &Path) -> Result<()> {
        info!(project = %project.name, url = %project.url, "Cloning required project");

        let status = Command::new("git")
            .arg("clone")
            .arg(&project.url)
            .arg(target)
            .status()
            .await
            .map_err(|e| Error::Materialize {
                project: project.name.clone(),
                reason: format!("failed to run git clone: {}", e),
            })?;
        if !status.success() {
            return Err(Error::Materialize {
                project: project.name.clone(),
                reason: format!("git clone exited with {:?}", status.code()),
            });
        }

        if let Some(revision) = &project.revision {
            let status = Command::new("git")
                .args(["checkout", revision])
                .current_dir(target)
                .status()
                .await
                .map_err(|e| Error::Materialize {
                    project: project.name.clone(),
                    reason: format!("failed to run git checkout: {}", e),
                })?;
            if !status.success() {
                return Err(Error::Materialize {
                    project: project.name.clone(),
                    reason: format!("git checkout {} exited with {:?}", revision, status.code()),
                });
            }
        }

        Ok(())
    }
}

#[async_trait]
impl ProjectMaterializer for GitMaterializer {
    async fn materialize(&self, projects: &[ProjectRef], workspace: &Path) -> Result<()> {
        for project in projects {
            let target = workspace.join(&project.name);
            if target.exists() {
                debug!(project = %project.name, "Already materialized");
                continue;
            }
            self.clone_project(project, &target).await?;
        }
        Ok(())
    }
}
