//! Typed lifecycle hooks for a single process

use super::{
    EngineEvent, EventBus, SubscriptionId, ACTION_FAILED, PROCESS_COMPLETED, PROCESS_FAILED,
    PROCESS_STARTED, SCREEN_DETECTED, STATE_CHANGED,
};
use crate::models::{Command, RunOutcome, ScreenTag};
use std::sync::Arc;

/// Optional callbacks for the lifecycle events of a run.
///
/// A thin typed layer over [`EventBus`] subscriptions: each hook that is set
/// becomes one listener when the callbacks are attached.
#[derive(Default)]
pub struct ProcessCallbacks {
    on_started: Option<Arc<dyn Fn(&str) + Send + Sync>>,
    on_state_changed: Option<Arc<dyn Fn(&str, &str) + Send + Sync>>,
    on_screen_detected: Option<Arc<dyn Fn(&ScreenTag) + Send + Sync>>,
    on_action_failed: Option<Arc<dyn Fn(&Command, &str) + Send + Sync>>,
    on_completed: Option<Arc<dyn Fn(&str, RunOutcome) + Send + Sync>>,
    on_failed: Option<Arc<dyn Fn(&str, &str) + Send + Sync>>,
}

impl ProcessCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called with the process name when the run starts
    pub fn on_started<F>(mut self, hook: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.on_started = Some(Arc::new(hook));
        self
    }

    /// Called with the previous and the new state name
    pub fn on_state_changed<F>(mut self, hook: F) -> Self
    where
        F: Fn(&str, &str) + Send + Sync + 'static,
    {
        self.on_state_changed = Some(Arc::new(hook));
        self
    }

    pub fn on_screen_detected<F>(mut self, hook: F) -> Self
    where
        F: Fn(&ScreenTag) + Send + Sync + 'static,
    {
        self.on_screen_detected = Some(Arc::new(hook));
        self
    }

    pub fn on_action_failed<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Command, &str) + Send + Sync + 'static,
    {
        self.on_action_failed = Some(Arc::new(hook));
        self
    }

    /// Called when a run closes with `process_completed`
    pub fn on_completed<F>(mut self, hook: F) -> Self
    where
        F: Fn(&str, RunOutcome) + Send + Sync + 'static,
    {
        self.on_completed = Some(Arc::new(hook));
        self
    }

    /// Called with the process name and the error when a run closes with
    /// `process_failed`
    pub fn on_failed<F>(mut self, hook: F) -> Self
    where
        F: Fn(&str, &str) + Send + Sync + 'static,
    {
        self.on_failed = Some(Arc::new(hook));
        self
    }

    /// Subscribe every set hook on `bus`
    ///
    /// Returns the subscriptions so the caller can detach them with
    /// [`EventBus::unsubscribe`].
    pub fn attach(self, bus: &EventBus) -> Vec<(&'static str, SubscriptionId)> {
        let mut subscriptions = Vec::new();

        if let Some(hook) = self.on_started {
            let id = bus.subscribe(PROCESS_STARTED, move |event| {
                if let EngineEvent::ProcessStarted { process } = event {
                    hook(process);
                }
            });
            subscriptions.push((PROCESS_STARTED, id));
        }
        if let Some(hook) = self.on_state_changed {
            let id = bus.subscribe(STATE_CHANGED, move |event| {
                if let EngineEvent::StateChanged { from, to } = event {
                    hook(from, to);
                }
            });
            subscriptions.push((STATE_CHANGED, id));
        }
        if let Some(hook) = self.on_screen_detected {
            let id = bus.subscribe(SCREEN_DETECTED, move |event| {
                if let EngineEvent::ScreenDetected { screen } = event {
                    hook(screen);
                }
            });
            subscriptions.push((SCREEN_DETECTED, id));
        }
        if let Some(hook) = self.on_action_failed {
            let id = bus.subscribe(ACTION_FAILED, move |event| {
                if let EngineEvent::ActionFailed { command, error } = event {
                    hook(command, error);
                }
            });
            subscriptions.push((ACTION_FAILED, id));
        }
        if let Some(hook) = self.on_completed {
            let id = bus.subscribe(PROCESS_COMPLETED, move |event| {
                if let EngineEvent::ProcessCompleted { process, outcome } = event {
                    hook(process, *outcome);
                }
            });
            subscriptions.push((PROCESS_COMPLETED, id));
        }
        if let Some(hook) = self.on_failed {
            let id = bus.subscribe(PROCESS_FAILED, move |event| {
                if let EngineEvent::ProcessFailed { process, error } = event {
                    hook(process, error);
                }
            });
            subscriptions.push((PROCESS_FAILED, id));
        }

        subscriptions
    }
}
