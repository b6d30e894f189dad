//! Commands and command sequences produced by screen handlers

use crate::error::EngineError;
use crate::models::context::ExecutionContext;
use crate::models::locator::{Condition, Locator};
use crate::workflow::state::LogicalState;
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Kind-specific payload of a [`Command`]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CommandKind {
    Navigate {
        url: String,
    },
    Refresh,
    Click {
        locator: Locator,
    },
    TypeText {
        locator: Locator,
        #[serde(serialize_with = "redact")]
        text: String,
    },
    Clear {
        locator: Locator,
    },
    Select {
        locator: Locator,
        value: String,
    },
    UploadFile {
        locator: Locator,
        path: PathBuf,
    },
    Wait {
        duration: Duration,
    },
    WaitForCondition {
        condition: Condition,
        timeout: Duration,
    },
    ExecuteScript {
        script: String,
        args: Vec<Value>,
    },
    SwitchWindow {
        handle: String,
    },
    CloseWindow,
    OpenNewTab {
        url: Option<String>,
    },
    SwitchToFrame {
        locator: Locator,
    },
    SwitchToDefaultFrame,
    /// Dispatched to the executor's extension hook
    Custom {
        name: String,
        payload: Value,
    },
}

fn redact<S: Serializer>(_text: &str, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str("***")
}

impl CommandKind {
    pub fn name(&self) -> &'static str {
        match self {
            CommandKind::Navigate { .. } => "navigate",
            CommandKind::Refresh => "refresh",
            CommandKind::Click { .. } => "click",
            CommandKind::TypeText { .. } => "type_text",
            CommandKind::Clear { .. } => "clear",
            CommandKind::Select { .. } => "select",
            CommandKind::UploadFile { .. } => "upload_file",
            CommandKind::Wait { .. } => "wait",
            CommandKind::WaitForCondition { .. } => "wait_for_condition",
            CommandKind::ExecuteScript { .. } => "execute_script",
            CommandKind::SwitchWindow { .. } => "switch_window",
            CommandKind::CloseWindow => "close_window",
            CommandKind::OpenNewTab { .. } => "open_new_tab",
            CommandKind::SwitchToFrame { .. } => "switch_to_frame",
            CommandKind::SwitchToDefaultFrame => "switch_to_default_frame",
            CommandKind::Custom { .. } => "custom",
        }
    }
}

/// One immutable unit of action against the target
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Command {
    #[serde(flatten)]
    kind: CommandKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

impl Command {
    pub fn new(kind: CommandKind) -> Self {
        Self {
            kind,
            message: None,
        }
    }

    pub fn navigate(url: impl Into<String>) -> Self {
        Self::new(CommandKind::Navigate { url: url.into() })
    }

    pub fn refresh() -> Self {
        Self::new(CommandKind::Refresh)
    }

    pub fn click(locator: Locator) -> Self {
        Self::new(CommandKind::Click { locator })
    }

    pub fn type_text(locator: Locator, text: impl Into<String>) -> Self {
        Self::new(CommandKind::TypeText {
            locator,
            text: text.into(),
        })
    }

    pub fn clear(locator: Locator) -> Self {
        Self::new(CommandKind::Clear { locator })
    }

    pub fn select(locator: Locator, value: impl Into<String>) -> Self {
        Self::new(CommandKind::Select {
            locator,
            value: value.into(),
        })
    }

    pub fn upload_file(locator: Locator, path: impl Into<PathBuf>) -> Self {
        Self::new(CommandKind::UploadFile {
            locator,
            path: path.into(),
        })
    }

    pub fn wait(duration: Duration) -> Self {
        Self::new(CommandKind::Wait { duration })
    }

    pub fn wait_for(condition: Condition, timeout: Duration) -> Self {
        Self::new(CommandKind::WaitForCondition { condition, timeout })
    }

    pub fn execute_script(script: impl Into<String>, args: Vec<Value>) -> Self {
        Self::new(CommandKind::ExecuteScript {
            script: script.into(),
            args,
        })
    }

    pub fn switch_window(handle: impl Into<String>) -> Self {
        Self::new(CommandKind::SwitchWindow {
            handle: handle.into(),
        })
    }

    pub fn close_window() -> Self {
        Self::new(CommandKind::CloseWindow)
    }

    pub fn open_new_tab(url: Option<String>) -> Self {
        Self::new(CommandKind::OpenNewTab { url })
    }

    pub fn switch_to_frame(locator: Locator) -> Self {
        Self::new(CommandKind::SwitchToFrame { locator })
    }

    pub fn switch_to_default_frame() -> Self {
        Self::new(CommandKind::SwitchToDefaultFrame)
    }

    pub fn custom(name: impl Into<String>, payload: Value) -> Self {
        Self::new(CommandKind::Custom {
            name: name.into(),
            payload,
        })
    }

    /// Attach a human-facing message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn kind(&self) -> &CommandKind {
        &self.kind
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

/// Short summary that never includes typed text
impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.kind.name();
        match &self.kind {
            CommandKind::Navigate { url } => write!(f, "{} {}", name, url),
            CommandKind::Click { locator }
            | CommandKind::TypeText { locator, .. }
            | CommandKind::Clear { locator }
            | CommandKind::Select { locator, .. }
            | CommandKind::UploadFile { locator, .. }
            | CommandKind::SwitchToFrame { locator } => write!(f, "{} {}", name, locator),
            CommandKind::Wait { duration } => write!(f, "{} {:?}", name, duration),
            CommandKind::SwitchWindow { handle } => write!(f, "{} {}", name, handle),
            CommandKind::Custom { name: custom, .. } => write!(f, "{} {}", name, custom),
            _ => f.write_str(name),
        }
    }
}

pub type SuccessCallback = Box<dyn FnOnce(&mut ExecutionContext) + Send>;
pub type FailureCallback = Box<dyn FnOnce(&EngineError, &mut ExecutionContext) + Send>;

/// Ordered commands produced for one detected screen, plus where to go next.
///
/// Built fresh by a handler for every detection and consumed by the run loop.
#[derive(Default)]
pub struct CommandSequence {
    commands: Vec<Command>,
    next_state: Option<Box<dyn LogicalState>>,
    on_success: Option<SuccessCallback>,
    on_failure: Option<FailureCallback>,
}

impl CommandSequence {
    pub fn new(commands: Vec<Command>) -> Self {
        Self {
            commands,
            ..Self::default()
        }
    }

    /// Sequence without commands
    pub fn empty() -> Self {
        Self::default()
    }

    /// Set the state to transition to after the commands succeed
    pub fn then(mut self, state: impl LogicalState + 'static) -> Self {
        self.next_state = Some(Box::new(state));
        self
    }

    pub fn then_boxed(mut self, state: Box<dyn LogicalState>) -> Self {
        self.next_state = Some(state);
        self
    }

    pub fn on_success<F>(mut self, callback: F) -> Self
    where
        F: FnOnce(&mut ExecutionContext) + Send + 'static,
    {
        self.on_success = Some(Box::new(callback));
        self
    }

    /// Failure callback; requesting a transition on the context recovers the run
    pub fn on_failure<F>(mut self, callback: F) -> Self
    where
        F: FnOnce(&EngineError, &mut ExecutionContext) + Send + 'static,
    {
        self.on_failure = Some(Box::new(callback));
        self
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn next_state(&self) -> Option<&dyn LogicalState> {
        self.next_state.as_deref()
    }

    pub fn take_next_state(&mut self) -> Option<Box<dyn LogicalState>> {
        self.next_state.take()
    }

    pub fn take_on_success(&mut self) -> Option<SuccessCallback> {
        self.on_success.take()
    }

    pub fn take_on_failure(&mut self) -> Option<FailureCallback> {
        self.on_failure.take()
    }
}

impl fmt::Debug for CommandSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandSequence")
            .field("commands", &self.commands)
            .field("next_state", &self.next_state.as_ref().map(|s| s.name().to_string()))
            .field("on_success", &self.on_success.is_some())
            .field("on_failure", &self.on_failure.is_some())
            .finish()
    }
}
