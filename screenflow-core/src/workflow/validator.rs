//! Workflow validation logic

use crate::workflow::definition::Workflow;
use crate::workflow::state::LogicalState;
use std::collections::HashSet;
use std::fmt;

/// Validation error type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validation result
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: &str, message: String) {
        self.errors.push(ValidationError {
            field: field.to_string(),
            message,
        });
    }

    pub fn add_warning(&mut self, warning: String) {
        self.warnings.push(warning);
    }
}

/// Workflow validator
pub struct WorkflowValidator;

impl WorkflowValidator {
    /// Validate a workflow definition before any run starts.
    ///
    /// The initial state is instantiated once so its expected screens are
    /// checked alongside the registered states.
    pub fn validate(workflow: &Workflow) -> ValidationResult {
        let mut result = ValidationResult::new();

        if workflow.name().trim().is_empty() {
            result.add_error("name", "Workflow name cannot be empty".to_string());
        }

        if workflow.terminal_states().is_empty() {
            result.add_error(
                "terminal_states",
                "Workflow must declare at least one terminal state".to_string(),
            );
        }

        // Descriptors: unique tags, each internally consistent
        let mut described = HashSet::new();
        for descriptor in workflow.screens() {
            if !described.insert(descriptor.tag().clone()) {
                result.add_error(
                    "screens",
                    format!("Screen '{}' is described more than once", descriptor.tag()),
                );
            }
            if let Err(message) = descriptor.validate() {
                result.add_error("screens", message);
            }
        }

        let initial = workflow.initial_state();
        let states: Vec<&dyn LogicalState> = std::iter::once(&*initial)
            .chain(workflow.states().iter().map(|state| &**state))
            .collect();

        // Expected screens need descriptors; what they expect is what handlers can reach
        let mut reachable = HashSet::new();
        for state in &states {
            let expected = state.expected_screens();
            if expected.is_empty() && !workflow.is_terminal(state.name()) {
                result.add_warning(format!(
                    "State '{}' is not terminal but expects no screens",
                    state.name()
                ));
            }
            for tag in expected {
                if !described.contains(&tag) {
                    result.add_error(
                        "states",
                        format!(
                            "State '{}' expects screen '{}' which has no descriptor",
                            state.name(),
                            tag
                        ),
                    );
                }
                reachable.insert(tag);
            }
        }

        for tag in workflow.global_interrupts() {
            if !described.contains(tag) {
                result.add_error(
                    "global_interrupts",
                    format!("Interrupt screen '{}' has no descriptor", tag),
                );
            }
            if workflow.handler(tag).is_none() {
                result.add_error(
                    "global_interrupts",
                    format!("Interrupt screen '{}' has no handler", tag),
                );
            }
            reachable.insert(tag.clone());
        }

        let mut handled: Vec<_> = workflow.handled_screens().collect();
        handled.sort();
        for tag in handled {
            if !described.contains(tag) {
                result.add_error(
                    "handlers",
                    format!("Handler registered for screen '{}' which has no descriptor", tag),
                );
            }
            if !reachable.contains(tag) {
                result.add_error(
                    "handlers",
                    format!(
                        "Handler for screen '{}' is unreachable: no state or interrupt expects it",
                        tag
                    ),
                );
            }
        }

        for descriptor in workflow.screens() {
            let tag = descriptor.tag();
            if !reachable.contains(tag) && workflow.handler(tag).is_none() {
                result.add_warning(format!("Screen '{}' is never referenced", tag));
            }
        }

        result
    }
}
