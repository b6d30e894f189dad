//! Screen detection against the target

use crate::error::EngineError;
use crate::events::{EngineEvent, EventBus};
use crate::models::{DetectionStrategy, ScreenDescriptor, ScreenTag};
use crate::target::{CapabilityError, TargetCapability};
use crate::workflow::stop::StopHandle;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Decides which screen, if any, the target is currently showing.
///
/// Global interrupts are checked on every poll before the expected screens, so
/// an interrupt wins over an expected screen that is present at the same time.
pub struct ScreenDetector {
    target: Arc<dyn TargetCapability>,
    screens: HashMap<ScreenTag, ScreenDescriptor>,
    interrupts: Vec<ScreenTag>,
    poll_interval: Duration,
    stop: Option<StopHandle>,
    bus: Arc<EventBus>,
}

impl ScreenDetector {
    pub fn new<I>(target: Arc<dyn TargetCapability>, screens: I, bus: Arc<EventBus>) -> Self
    where
        I: IntoIterator<Item = ScreenDescriptor>,
    {
        Self {
            target,
            screens: screens
                .into_iter()
                .map(|descriptor| (descriptor.tag().clone(), descriptor))
                .collect(),
            interrupts: Vec::new(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            stop: None,
            bus,
        }
    }

    pub fn with_interrupts(mut self, interrupts: Vec<ScreenTag>) -> Self {
        self.interrupts = interrupts;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Abort waits when `stop` is raised
    pub fn with_stop_handle(mut self, stop: StopHandle) -> Self {
        self.stop = Some(stop);
        self
    }

    pub fn interrupts(&self) -> &[ScreenTag] {
        &self.interrupts
    }

    /// Evaluate one descriptor.
    ///
    /// Capability errors read as "not present" unless the session is gone.
    pub async fn is_present(&self, descriptor: &ScreenDescriptor) -> Result<bool, EngineError> {
        match self.evaluate(descriptor).await {
            Ok(present) => Ok(present),
            Err(err) if err.is_fatal() => Err(EngineError::CapabilityFatal(err)),
            Err(err) => {
                tracing::debug!(screen = %descriptor.tag(), error = %err, "Check failed, treating as absent");
                Ok(false)
            }
        }
    }

    async fn evaluate(&self, descriptor: &ScreenDescriptor) -> Result<bool, CapabilityError> {
        let target = self.target.as_ref();
        let locator = descriptor.locator();

        let base = match descriptor.strategy() {
            DetectionStrategy::VisibleAndEnabled => {
                target.is_visible(locator).await? && target.is_enabled(locator).await?
            }
            DetectionStrategy::PresenceOnly => target.is_existing(locator).await?,
            DetectionStrategy::CustomPredicate => true,
        };
        if !base {
            return Ok(false);
        }

        for criterion in descriptor.criteria() {
            if !criterion.evaluate(target).await? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Single pass over `candidates`; the first present one in list order wins
    pub async fn detect_immediate(
        &self,
        candidates: &[ScreenTag],
    ) -> Result<Option<ScreenTag>, EngineError> {
        for tag in candidates {
            let descriptor = self
                .screens
                .get(tag)
                .ok_or_else(|| EngineError::UnknownScreen(tag.clone()))?;
            if self.is_present(descriptor).await? {
                return Ok(Some(tag.clone()));
            }
        }
        Ok(None)
    }

    /// Poll until a global interrupt or one of `candidates` is present.
    ///
    /// Publishes `detection_timeout` once and fails with
    /// [`EngineError::DetectionTimeout`] when `timeout` elapses first.
    pub async fn wait_for_screen(
        &self,
        candidates: &[ScreenTag],
        timeout: Duration,
    ) -> Result<ScreenTag, EngineError> {
        // A timeout too large to represent as an instant never expires
        let deadline = Instant::now().checked_add(timeout);
        let mut polls = 0u32;

        loop {
            if self.stop.as_ref().is_some_and(StopHandle::is_raised) {
                return Err(EngineError::StoppedByCaller);
            }

            polls += 1;
            if let Some(tag) = self.detect_immediate(&self.interrupts).await? {
                tracing::debug!(screen = %tag, polls, "Global interrupt detected");
                return Ok(tag);
            }
            if let Some(tag) = self.detect_immediate(candidates).await? {
                tracing::debug!(screen = %tag, polls, "Screen detected");
                return Ok(tag);
            }

            let now = Instant::now();
            if deadline.is_some_and(|deadline| now >= deadline) {
                tracing::warn!(expected = ?candidates, ?timeout, polls, "Screen detection timed out");
                self.bus.publish(EngineEvent::DetectionTimeout {
                    expected: candidates.to_vec(),
                });
                return Err(EngineError::DetectionTimeout {
                    expected: candidates.to_vec(),
                    timeout,
                });
            }
            let remaining = deadline.map_or(self.poll_interval, |deadline| deadline - now);
            sleep(self.poll_interval.min(remaining)).await;
        }
    }
}
