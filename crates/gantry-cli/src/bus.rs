//! Event bus adapter for local runs: publishes events to the tracing log.

use async_trait::async_trait;
use gantry_core::Result;
use gantry_core::events::Event;
use gantry_core::ports::EventBus;
use tracing::info;

pub struct TracingEventBus;

#[async_trait]
impl EventBus for TracingEventBus {
    async fn publish(&self, event: Event) -> Result<()> {
        info!(subject = %event.subject(), "event");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use gantry_core::events::JobSkippedPayload;
    use gantry_core::ids::ChangeId;

    #[tokio::test]
    async fn test_publish_never_fails() {
        let bus = TracingEventBus;
        let event = Event::JobSkipped(JobSkippedPayload {
            job: "docs".to_string(),
            change: ChangeId::new(),
            skipped_at: Utc::now(),
        });
        assert!(bus.publish(event).await.is_ok());
    }
}
