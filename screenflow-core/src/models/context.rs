//! Per-run execution context

use crate::workflow::state::LogicalState;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

/// Mutable bag of run inputs and scratch values shared by states and handlers.
///
/// Created once per run by the caller. The requested-transition slot is the
/// only way for state or handler code to force a transition; the runner
/// drains it at defined points of each cycle.
#[derive(Default)]
pub struct ExecutionContext {
    credentials: HashMap<String, String>,
    data: HashMap<String, Value>,
    scratch: HashMap<String, Value>,
    requested_transition: Option<Box<dyn LogicalState>>,
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credential(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.credentials.insert(key.into(), value.into());
        self
    }

    pub fn with_data(mut self, key: impl Into<String>, value: Value) -> Self {
        self.data.insert(key.into(), value);
        self
    }

    pub fn credential(&self, key: &str) -> Option<&str> {
        self.credentials.get(key).map(String::as_str)
    }

    pub fn data(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// String input value, if present and a string
    pub fn data_str(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(Value::as_str)
    }

    pub fn scratch(&self, key: &str) -> Option<&Value> {
        self.scratch.get(key)
    }

    pub fn set_scratch(&mut self, key: impl Into<String>, value: Value) {
        self.scratch.insert(key.into(), value);
    }

    pub fn remove_scratch(&mut self, key: &str) -> Option<Value> {
        self.scratch.remove(key)
    }

    /// Request a manual transition; a later request replaces an earlier one
    pub fn transition_to(&mut self, state: impl LogicalState + 'static) {
        self.requested_transition = Some(Box::new(state));
    }

    pub fn request_transition(&mut self, state: Box<dyn LogicalState>) {
        self.requested_transition = Some(state);
    }

    pub fn has_requested_transition(&self) -> bool {
        self.requested_transition.is_some()
    }

    pub fn take_requested_transition(&mut self) -> Option<Box<dyn LogicalState>> {
        self.requested_transition.take()
    }
}

impl fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut credential_keys: Vec<&String> = self.credentials.keys().collect();
        credential_keys.sort();
        f.debug_struct("ExecutionContext")
            .field("credentials", &credential_keys)
            .field("data", &self.data)
            .field("scratch", &self.scratch)
            .field(
                "requested_transition",
                &self.requested_transition.as_ref().map(|s| s.name().to_string()),
            )
            .finish()
    }
}
