//! Command execution against the target

use crate::error::EngineError;
use crate::events::{EngineEvent, EventBus};
use crate::models::{Command, CommandKind, CommandSequence, ExecutionContext};
use crate::target::{CapabilityError, TargetCapability};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// Hook that runs `Custom` commands
#[async_trait]
pub trait CommandExtension: Send + Sync {
    /// Execute the custom command `name`
    ///
    /// # Arguments
    /// * `name` - Name given to `Command::custom`
    /// * `payload` - Opaque payload carried by the command
    /// * `target` - Target the run is driving
    async fn execute(
        &self,
        name: &str,
        payload: &Value,
        target: &dyn TargetCapability,
    ) -> Result<(), CapabilityError>;
}

/// Result of a sequence that did not fail fatally
#[derive(Debug)]
pub enum SequenceOutcome {
    /// Every command ran; `on_success` has been called
    Completed,
    /// A command failed and the sequence's `on_failure` callback consumed the error
    FailureHandled(EngineError),
}

/// Runs commands one at a time, announcing each on the bus
pub struct ActionExecutor {
    target: Arc<dyn TargetCapability>,
    extension: Option<Arc<dyn CommandExtension>>,
    bus: Arc<EventBus>,
}

impl ActionExecutor {
    pub fn new(target: Arc<dyn TargetCapability>, bus: Arc<EventBus>) -> Self {
        Self {
            target,
            extension: None,
            bus,
        }
    }

    pub fn with_extension(mut self, extension: Arc<dyn CommandExtension>) -> Self {
        self.extension = Some(extension);
        self
    }

    /// Execute a single command.
    ///
    /// Publishes `action_executing` first, then `action_executed` or
    /// `action_failed`. A custom command without an extension hook is rejected
    /// before anything is published.
    pub async fn execute(&self, command: &Command) -> Result<(), EngineError> {
        if let CommandKind::Custom { name, .. } = command.kind() {
            if self.extension.is_none() {
                return Err(EngineError::Configuration(format!(
                    "custom command '{}' has no extension hook",
                    name
                )));
            }
        }

        self.bus.publish(EngineEvent::ActionExecuting {
            command: command.clone(),
        });
        if let Some(message) = command.message() {
            tracing::info!(action = command.kind().name(), "{}", message);
        }

        match self.dispatch(command).await {
            Ok(()) => {
                tracing::debug!(%command, "Action executed");
                self.bus.publish(EngineEvent::ActionExecuted {
                    command: command.clone(),
                });
                Ok(())
            }
            Err(err) => {
                tracing::warn!(%command, error = %err, "Action failed");
                self.bus.publish(EngineEvent::ActionFailed {
                    command: command.clone(),
                    error: err.to_string(),
                });
                if err.is_fatal() {
                    Err(EngineError::CapabilityFatal(err))
                } else {
                    Err(EngineError::ActionFailed {
                        command: command.clone(),
                        source: err,
                    })
                }
            }
        }
    }

    async fn dispatch(&self, command: &Command) -> Result<(), CapabilityError> {
        let target = self.target.as_ref();
        match command.kind() {
            CommandKind::Navigate { url } => target.navigate(url).await,
            CommandKind::Refresh => target.refresh().await,
            CommandKind::Click { locator } => target.click(locator).await,
            CommandKind::TypeText { locator, text } => target.type_text(locator, text).await,
            CommandKind::Clear { locator } => target.clear(locator).await,
            CommandKind::Select { locator, value } => target.select(locator, value).await,
            CommandKind::UploadFile { locator, path } => target.upload_file(locator, path).await,
            CommandKind::Wait { duration } => {
                tokio::time::sleep(*duration).await;
                Ok(())
            }
            CommandKind::WaitForCondition { condition, timeout } => {
                if target.wait_for_condition(condition, *timeout).await? {
                    Ok(())
                } else {
                    Err(CapabilityError::Timeout(*timeout))
                }
            }
            CommandKind::ExecuteScript { script, args } => {
                let result = target.execute_script(script, args).await?;
                tracing::trace!(%result, "Script returned");
                Ok(())
            }
            CommandKind::SwitchWindow { handle } => target.switch_window(handle).await,
            CommandKind::CloseWindow => target.close_window().await,
            CommandKind::OpenNewTab { url } => target.open_new_tab(url.as_deref()).await,
            CommandKind::SwitchToFrame { locator } => target.switch_to_frame(locator).await,
            CommandKind::SwitchToDefaultFrame => target.switch_to_default_frame().await,
            CommandKind::Custom { name, payload } => match &self.extension {
                Some(extension) => extension.execute(name, payload, target).await,
                None => Err(CapabilityError::Unsupported(name.clone())),
            },
        }
    }

    /// Execute a sequence strictly in order.
    ///
    /// The first failure aborts the remaining commands. An `ActionFailed` is
    /// handed to the sequence's `on_failure` callback when it has one and
    /// reported as [`SequenceOutcome::FailureHandled`]; otherwise it
    /// propagates. Configuration and fatal capability errors always propagate.
    pub async fn execute_sequence(
        &self,
        sequence: &mut CommandSequence,
        context: &mut ExecutionContext,
    ) -> Result<SequenceOutcome, EngineError> {
        let commands = sequence.commands().to_vec();
        let mut failure = None;
        for command in &commands {
            if let Err(err) = self.execute(command).await {
                failure = Some(err);
                break;
            }
        }

        let Some(err) = failure else {
            if let Some(on_success) = sequence.take_on_success() {
                on_success(context);
            }
            return Ok(SequenceOutcome::Completed);
        };

        if !matches!(err, EngineError::ActionFailed { .. }) {
            return Err(err);
        }
        match sequence.take_on_failure() {
            Some(on_failure) => {
                on_failure(&err, context);
                Ok(SequenceOutcome::FailureHandled(err))
            }
            None => Err(err),
        }
    }
}
