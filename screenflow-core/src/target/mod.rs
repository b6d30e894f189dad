//! Target capability boundary
//!
//! The engine never talks to a browser directly. Everything it needs from the
//! automated target goes through [`TargetCapability`], which a driver binding
//! implements. [`memory::InMemoryTarget`] is a scriptable implementation used
//! for tests and demos.

pub mod memory;

use crate::models::{Condition, Locator};
use async_trait::async_trait;
use serde_json::Value;
use std::path::Path;
use std::time::Duration;
use tokio::time::{sleep, Instant};

/// Failure reported by a target capability call
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CapabilityError {
    #[error("element not found: {0}")]
    ElementNotFound(String),

    #[error("element not interactable: {0}")]
    NotInteractable(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("script error: {0}")]
    Script(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("unsupported operation: {0}")]
    Unsupported(String),

    #[error("target session lost: {0}")]
    SessionLost(String),

    #[error("{0}")]
    Other(String),
}

impl CapabilityError {
    /// Whether the target session itself is gone
    pub fn is_fatal(&self) -> bool {
        matches!(self, CapabilityError::SessionLost(_))
    }
}

/// Operations the engine needs from the automated target.
///
/// Methods take `&self`; implementations hold their session behind interior
/// mutability so the detector and executor can share one instance.
#[async_trait]
pub trait TargetCapability: Send + Sync {
    async fn click(&self, locator: &Locator) -> Result<(), CapabilityError>;

    async fn type_text(&self, locator: &Locator, text: &str) -> Result<(), CapabilityError>;

    async fn clear(&self, locator: &Locator) -> Result<(), CapabilityError>;

    async fn select(&self, locator: &Locator, value: &str) -> Result<(), CapabilityError>;

    async fn navigate(&self, url: &str) -> Result<(), CapabilityError>;

    async fn refresh(&self) -> Result<(), CapabilityError>;

    async fn execute_script(&self, script: &str, args: &[Value]) -> Result<Value, CapabilityError>;

    async fn is_visible(&self, locator: &Locator) -> Result<bool, CapabilityError>;

    async fn is_existing(&self, locator: &Locator) -> Result<bool, CapabilityError>;

    async fn is_enabled(&self, locator: &Locator) -> Result<bool, CapabilityError>;

    /// Wait until `condition` holds; `Ok(false)` when the timeout elapses first
    async fn wait_for_condition(
        &self,
        condition: &Condition,
        timeout: Duration,
    ) -> Result<bool, CapabilityError>;

    async fn upload_file(&self, locator: &Locator, path: &Path) -> Result<(), CapabilityError>;

    async fn switch_to_frame(&self, locator: &Locator) -> Result<(), CapabilityError>;

    async fn switch_to_default_frame(&self) -> Result<(), CapabilityError>;

    async fn switch_window(&self, handle: &str) -> Result<(), CapabilityError>;

    async fn close_window(&self) -> Result<(), CapabilityError>;

    async fn open_new_tab(&self, url: Option<&str>) -> Result<(), CapabilityError>;
}

/// Poll `condition` against `target` until it holds or `timeout` elapses.
///
/// Helper for bindings without a native wait primitive.
pub async fn poll_condition(
    target: &dyn TargetCapability,
    condition: &Condition,
    timeout: Duration,
    interval: Duration,
) -> Result<bool, CapabilityError> {
    let deadline = Instant::now().checked_add(timeout);
    loop {
        if condition.evaluate(target).await? {
            return Ok(true);
        }
        let now = Instant::now();
        if deadline.is_some_and(|deadline| now >= deadline) {
            return Ok(false);
        }
        let remaining = deadline.map_or(interval, |deadline| deadline - now);
        sleep(interval.min(remaining)).await;
    }
}
