//! Current-state holder for a run

use crate::events::{EngineEvent, EventBus};
use crate::models::RunOutcome;
use crate::workflow::state::LogicalState;
use std::collections::HashMap;
use std::sync::Arc;

/// Holds the current logical state and announces every change.
///
/// There is no transition table: any state may follow any other, including
/// itself. Terminal rules are keyed by state name.
pub struct StateMachine {
    current: Box<dyn LogicalState>,
    process_name: String,
    terminals: HashMap<String, RunOutcome>,
    bus: Arc<EventBus>,
}

impl StateMachine {
    pub fn new(
        initial: Box<dyn LogicalState>,
        process_name: impl Into<String>,
        bus: Arc<EventBus>,
    ) -> Self {
        Self {
            current: initial,
            process_name: process_name.into(),
            terminals: HashMap::new(),
            bus,
        }
    }

    pub fn with_terminals(mut self, terminals: HashMap<String, RunOutcome>) -> Self {
        self.terminals = terminals;
        self
    }

    pub fn current(&self) -> &dyn LogicalState {
        self.current.as_ref()
    }

    pub fn current_name(&self) -> &str {
        self.current.name()
    }

    pub fn process_name(&self) -> &str {
        &self.process_name
    }

    /// Outcome bound to the current state, if it is terminal
    pub fn terminal_outcome(&self) -> Option<RunOutcome> {
        self.terminals.get(self.current.name()).copied()
    }

    pub fn transition_to(&mut self, next: Box<dyn LogicalState>) {
        tracing::debug!(
            process = %self.process_name,
            from = %self.current.name(),
            to = %next.name(),
            "State transition"
        );
        self.replace(next);
    }

    /// Force the current state, for external correction of a run
    pub fn reset(&mut self, to: Box<dyn LogicalState>) {
        tracing::info!(
            process = %self.process_name,
            from = %self.current.name(),
            to = %to.name(),
            "State machine reset"
        );
        self.replace(to);
    }

    fn replace(&mut self, next: Box<dyn LogicalState>) {
        let previous = std::mem::replace(&mut self.current, next);
        self.bus.publish(EngineEvent::StateChanged {
            from: previous.name().to_string(),
            to: self.current.name().to_string(),
        });
    }
}
