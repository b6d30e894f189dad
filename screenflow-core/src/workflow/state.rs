//! Logical states and screen handlers

use crate::models::{CommandSequence, ExecutionContext, ScreenTag};
use std::fmt;
use std::sync::Arc;

/// A step of an authored workflow.
///
/// The engine only asks a state which screens it expects and how to react when
/// none of them showed up; everything else is the workflow's vocabulary. Its
/// `name` is what terminal-state rules match against.
pub trait LogicalState: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    /// Called at the top of every cycle; may request a manual transition on
    /// the context to skip detection.
    fn handle(&self, _context: &mut ExecutionContext) {}

    /// Screens that may legitimately appear while in this state, in priority order
    fn expected_screens(&self) -> Vec<ScreenTag> {
        Vec::new()
    }

    /// Called when detection timed out. Leaving the context without a
    /// requested transition makes the run fail as stuck.
    fn on_detection_failed(&self, _context: &mut ExecutionContext) {}
}

/// Turns a detected screen into the commands to run and the next state
pub trait ScreenHandler: Send + Sync {
    fn create_action_sequence(&self, context: &mut ExecutionContext) -> CommandSequence;
}

impl<F> ScreenHandler for F
where
    F: Fn(&mut ExecutionContext) -> CommandSequence + Send + Sync,
{
    fn create_action_sequence(&self, context: &mut ExecutionContext) -> CommandSequence {
        self(context)
    }
}

/// Produces a fresh state instance, so per-transition data starts clean
pub type StateFactory = Arc<dyn Fn() -> Box<dyn LogicalState> + Send + Sync>;

/// General-purpose state: a name, the expected screens and an optional state
/// to move to when detection times out.
#[derive(Clone)]
pub struct NamedState {
    name: String,
    expected: Vec<ScreenTag>,
    on_timeout: Option<StateFactory>,
}

impl NamedState {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            expected: Vec::new(),
            on_timeout: None,
        }
    }

    pub fn expecting<I, T>(mut self, screens: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<ScreenTag>,
    {
        self.expected = screens.into_iter().map(Into::into).collect();
        self
    }

    /// Transition requested when no expected screen appears in time
    pub fn on_timeout<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Box<dyn LogicalState> + Send + Sync + 'static,
    {
        self.on_timeout = Some(Arc::new(factory));
        self
    }
}

impl fmt::Debug for NamedState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NamedState")
            .field("name", &self.name)
            .field("expected", &self.expected)
            .field("on_timeout", &self.on_timeout.is_some())
            .finish()
    }
}

impl LogicalState for NamedState {
    fn name(&self) -> &str {
        &self.name
    }

    fn expected_screens(&self) -> Vec<ScreenTag> {
        self.expected.clone()
    }

    fn on_detection_failed(&self, context: &mut ExecutionContext) {
        if let Some(factory) = &self.on_timeout {
            context.request_transition(factory());
        }
    }
}
