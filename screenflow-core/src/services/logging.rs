//! Logging service

use crate::events::{EngineEvent, EventBus, SubscriptionId, STANDARD_EVENTS};
use crate::models::LogLevel;

/// Initialize logging with the specified level
pub fn init_logging(level: LogLevel) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let level = level.as_str();
    let filter = format!("screenflow_core={level},screenflow={level}");

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()?;

    Ok(())
}

/// Mirror every standard bus event into the tracing log.
///
/// Returns the subscriptions so the caller can detach them again.
pub fn attach_tracing(bus: &EventBus) -> Vec<(&'static str, SubscriptionId)> {
    STANDARD_EVENTS
        .iter()
        .map(|name| (*name, bus.subscribe(name, log_event)))
        .collect()
}

fn log_event(event: &EngineEvent) {
    match event {
        EngineEvent::ActionFailed { .. }
        | EngineEvent::DetectionTimeout { .. }
        | EngineEvent::ProcessFailed { .. } => {
            tracing::warn!(event = event.name(), detail = ?event, "Engine event")
        }
        _ => tracing::debug!(event = event.name(), detail = ?event, "Engine event"),
    }
}
