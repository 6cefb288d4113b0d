//! Port traits between the core and external adapters.

use crate::Result;
use crate::events::Event;
use crate::job::ProjectRef;
use async_trait::async_trait;
use std::path::Path;

/// Event bus for publishing lifecycle events.
#[async_trait]
pub trait EventBus: Send + Sync {
    async fn publish(&self, event: Event) -> Result<()>;
}

/// Event bus that discards everything. Default for tests and check-only
/// invocations that don't care about the event stream.
pub struct NullEventBus;

#[async_trait]
impl EventBus for NullEventBus {
    async fn publish(&self, _event: Event) -> Result<()> {
        Ok(())
    }
}

/// Materializes required projects into a workspace before a job runs.
///
/// The concrete source-control mechanics (clone, checkout, caching) live in
/// adapters; the core only requires that the named projects exist under the
/// workspace when `materialize` returns Ok.
#[async_trait]
pub trait ProjectMaterializer: Send + Sync {
    async fn materialize(&self, projects: &[ProjectRef], workspace: &Path) -> Result<()>;
}

/// Materializer that does nothing. Useful when the workspace is provisioned
/// entirely by an external collaborator.
pub struct NoopMaterializer;

#[async_trait]
impl ProjectMaterializer for NoopMaterializer {
    async fn materialize(&self, _projects: &[ProjectRef], _workspace: &Path) -> Result<()> {
        Ok(())
    }
}
