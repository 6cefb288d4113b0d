//! Workspace acquisition.

use gantry_core::Result;
use gantry_core::ids::RunId;
use std::path::{Path, PathBuf};
use tracing::info;

/// A per-run working directory under the workspace root.
///
/// Acquisition creates the directory tree if absent. The directory is never
/// deleted on failure; whatever the run left behind stays on disk for
/// post-run diagnostic collection.
#[derive(Debug, Clone)]
pub struct Workspace {
    path: PathBuf,
}

impl Workspace {
    pub async fn acquire(root: &Path, run_id: RunId, job_name: &str) -> Result<Self> {
        let path = root.join(run_id.to_string()).join(job_name);
        tokio::fs::create_dir_all(&path).await?;
        info!(path = %path.display(), job = job_name, "Workspace acquired");
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
