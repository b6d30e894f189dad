//! Workflow definition and builder

use crate::error::EngineError;
use crate::models::{Command, ExecutionContext, RunOutcome, ScreenDescriptor, ScreenTag};
use crate::workflow::state::{LogicalState, ScreenHandler, StateFactory};
use crate::workflow::validator::WorkflowValidator;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Builds the commands a run executes once, before the first state is handled
pub type WorkflowPrelude = Arc<dyn Fn(&mut ExecutionContext) -> Vec<Command> + Send + Sync>;

/// A validated, immutable workflow: what to detect, how to react and where
/// the run ends. Shared read-only by every run created from it.
pub struct Workflow {
    name: String,
    initial_state: StateFactory,
    states: Vec<Box<dyn LogicalState>>,
    screens: Vec<ScreenDescriptor>,
    handlers: HashMap<ScreenTag, Arc<dyn ScreenHandler>>,
    terminal_states: HashMap<String, RunOutcome>,
    global_interrupts: Vec<ScreenTag>,
    prelude: Option<WorkflowPrelude>,
}

impl Workflow {
    pub fn builder(name: impl Into<String>) -> WorkflowBuilder {
        WorkflowBuilder {
            name: name.into(),
            initial_state: None,
            states: Vec::new(),
            screens: Vec::new(),
            handlers: HashMap::new(),
            terminal_states: HashMap::new(),
            global_interrupts: Vec::new(),
            prelude: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fresh instance of the initial state
    pub fn initial_state(&self) -> Box<dyn LogicalState> {
        (self.initial_state)()
    }

    /// Registered state prototypes, used for validation
    pub fn states(&self) -> &[Box<dyn LogicalState>] {
        &self.states
    }

    pub fn screens(&self) -> &[ScreenDescriptor] {
        &self.screens
    }

    pub fn descriptor(&self, tag: &ScreenTag) -> Option<&ScreenDescriptor> {
        self.screens.iter().find(|descriptor| descriptor.tag() == tag)
    }

    pub fn handler(&self, tag: &ScreenTag) -> Option<Arc<dyn ScreenHandler>> {
        self.handlers.get(tag).cloned()
    }

    pub fn handled_screens(&self) -> impl Iterator<Item = &ScreenTag> {
        self.handlers.keys()
    }

    pub fn terminal_states(&self) -> &HashMap<String, RunOutcome> {
        &self.terminal_states
    }

    pub fn terminal_outcome(&self, state_name: &str) -> Option<RunOutcome> {
        self.terminal_states.get(state_name).copied()
    }

    pub fn is_terminal(&self, state_name: &str) -> bool {
        self.terminal_states.contains_key(state_name)
    }

    pub fn global_interrupts(&self) -> &[ScreenTag] {
        &self.global_interrupts
    }

    pub fn prelude(&self) -> Option<WorkflowPrelude> {
        self.prelude.clone()
    }
}

impl fmt::Debug for Workflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut handled: Vec<_> = self.handlers.keys().collect();
        handled.sort();
        f.debug_struct("Workflow")
            .field("name", &self.name)
            .field("states", &self.states)
            .field("screens", &self.screens.len())
            .field("handlers", &handled)
            .field("terminal_states", &self.terminal_states)
            .field("global_interrupts", &self.global_interrupts)
            .field("prelude", &self.prelude.is_some())
            .finish()
    }
}

/// Builder for [`Workflow`]; `build` validates the result
pub struct WorkflowBuilder {
    name: String,
    initial_state: Option<StateFactory>,
    states: Vec<Box<dyn LogicalState>>,
    screens: Vec<ScreenDescriptor>,
    handlers: HashMap<ScreenTag, Arc<dyn ScreenHandler>>,
    terminal_states: HashMap<String, RunOutcome>,
    global_interrupts: Vec<ScreenTag>,
    prelude: Option<WorkflowPrelude>,
}

impl WorkflowBuilder {
    /// Factory for the state every run starts in
    pub fn initial_state<S, F>(mut self, factory: F) -> Self
    where
        S: LogicalState + 'static,
        F: Fn() -> S + Send + Sync + 'static,
    {
        self.initial_state = Some(Arc::new(move || Box::new(factory()) as Box<dyn LogicalState>));
        self
    }

    /// Register a state so its expected screens take part in validation
    pub fn state(mut self, prototype: impl LogicalState + 'static) -> Self {
        self.states.push(Box::new(prototype));
        self
    }

    pub fn screen(mut self, descriptor: ScreenDescriptor) -> Self {
        self.screens.push(descriptor);
        self
    }

    pub fn handler(
        mut self,
        tag: impl Into<ScreenTag>,
        handler: impl ScreenHandler + 'static,
    ) -> Self {
        self.handlers.insert(tag.into(), Arc::new(handler));
        self
    }

    /// Mark the state named `state_name` as terminal with `outcome`
    pub fn terminal(mut self, state_name: impl Into<String>, outcome: RunOutcome) -> Self {
        self.terminal_states.insert(state_name.into(), outcome);
        self
    }

    /// Screen checked on every poll regardless of the current state
    pub fn interrupt(mut self, tag: impl Into<ScreenTag>) -> Self {
        let tag = tag.into();
        if !self.global_interrupts.contains(&tag) {
            self.global_interrupts.push(tag);
        }
        self
    }

    /// Commands run once per run, after `process_started` and before the
    /// initial state is handled. A failing command ends the run.
    pub fn prelude<F>(mut self, prelude: F) -> Self
    where
        F: Fn(&mut ExecutionContext) -> Vec<Command> + Send + Sync + 'static,
    {
        self.prelude = Some(Arc::new(prelude));
        self
    }

    pub fn build(self) -> Result<Workflow, EngineError> {
        let Some(initial_state) = self.initial_state else {
            return Err(EngineError::InvalidWorkflow {
                name: self.name,
                errors: vec!["initial_state: Workflow has no initial state".to_string()],
            });
        };

        let workflow = Workflow {
            name: self.name,
            initial_state,
            states: self.states,
            screens: self.screens,
            handlers: self.handlers,
            terminal_states: self.terminal_states,
            global_interrupts: self.global_interrupts,
            prelude: self.prelude,
        };

        let result = WorkflowValidator::validate(&workflow);
        for warning in &result.warnings {
            tracing::warn!(workflow = %workflow.name, "{}", warning);
        }
        if !result.is_valid() {
            return Err(EngineError::InvalidWorkflow {
                name: workflow.name,
                errors: result.errors.iter().map(ToString::to_string).collect(),
            });
        }
        Ok(workflow)
    }
}
