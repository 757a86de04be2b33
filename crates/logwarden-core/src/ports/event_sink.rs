//! Event sink port (driven/secondary port)
//!
//! Receives one call per status event. Delivery is fire-and-forget: a
//! failing sink is logged by the caller and never aborts a run.

use crate::domain::DeviceEvent;

/// Port trait for outbound status events
#[async_trait::async_trait]
pub trait IEventSink: Send + Sync {
    /// Hands one event to the downstream alerting system
    async fn emit(&self, event: &DeviceEvent) -> anyhow::Result<()>;
}
