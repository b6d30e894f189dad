//! Process runner: the detect / dispatch / execute / transition loop

use crate::error::EngineError;
use crate::events::{EngineEvent, EventBus};
use crate::models::{EngineConfig, ExecutionContext, RunOutcome, RunStatus};
use crate::target::TargetCapability;
use crate::workflow::definition::Workflow;
use crate::workflow::detector::{ScreenDetector, DEFAULT_POLL_INTERVAL};
use crate::workflow::executor::{ActionExecutor, CommandExtension, SequenceOutcome};
use crate::workflow::state::LogicalState;
use crate::workflow::state_machine::StateMachine;
use crate::workflow::stop::StopHandle;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Timing knobs for a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunnerConfig {
    /// Upper bound for one screen detection
    pub detection_timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            detection_timeout: Duration::from_secs(10),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl From<&EngineConfig> for RunnerConfig {
    fn from(config: &EngineConfig) -> Self {
        Self {
            detection_timeout: config.detection_timeout(),
            poll_interval: config.poll_interval(),
        }
    }
}

/// Result of a single cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cycle {
    Continue,
    Finished(RunOutcome),
}

/// Drives one workflow run against one target.
///
/// A runner is single-use: once it has finished or failed it publishes no
/// further events. Every terminal or fatal path publishes exactly one closing
/// event (`process_completed` or `process_failed`).
pub struct ProcessRunner {
    run_id: Uuid,
    workflow: Arc<Workflow>,
    machine: StateMachine,
    detector: ScreenDetector,
    executor: ActionExecutor,
    bus: Arc<EventBus>,
    config: RunnerConfig,
    stop: StopHandle,
    status: RunStatus,
    outcome: Option<RunOutcome>,
    started: bool,
    prelude_pending: bool,
    closed: bool,
}

impl ProcessRunner {
    pub fn new(
        workflow: Arc<Workflow>,
        target: Arc<dyn TargetCapability>,
        bus: Arc<EventBus>,
        config: RunnerConfig,
    ) -> Self {
        let stop = StopHandle::new();
        let machine = StateMachine::new(workflow.initial_state(), workflow.name(), bus.clone())
            .with_terminals(workflow.terminal_states().clone());
        let detector = ScreenDetector::new(
            target.clone(),
            workflow.screens().iter().cloned(),
            bus.clone(),
        )
        .with_interrupts(workflow.global_interrupts().to_vec())
        .with_poll_interval(config.poll_interval)
        .with_stop_handle(stop.clone());
        let executor = ActionExecutor::new(target, bus.clone());

        Self {
            run_id: Uuid::new_v4(),
            workflow,
            machine,
            detector,
            executor,
            bus,
            config,
            stop,
            status: RunStatus::Running,
            outcome: None,
            started: false,
            prelude_pending: true,
            closed: false,
        }
    }

    /// Route `Custom` commands to `extension`
    pub fn with_extension(mut self, extension: Arc<dyn CommandExtension>) -> Self {
        self.executor = self.executor.with_extension(extension);
        self
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn workflow(&self) -> &Arc<Workflow> {
        &self.workflow
    }

    /// Handle the caller keeps to halt the run from another task
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn current_state(&self) -> &dyn LogicalState {
        self.machine.current()
    }

    pub fn status(&self) -> RunStatus {
        self.status
    }

    /// Force the current state from outside the loop
    pub fn reset_state(&mut self, state: Box<dyn LogicalState>) {
        self.machine.reset(state);
    }

    /// Run cycles until a terminal state is reached or a fatal error occurs
    pub async fn run(&mut self, context: &mut ExecutionContext) -> Result<RunOutcome, EngineError> {
        loop {
            if let Cycle::Finished(outcome) = self.step(context).await? {
                return Ok(outcome);
            }
        }
    }

    /// Run exactly one cycle
    pub async fn step(&mut self, context: &mut ExecutionContext) -> Result<Cycle, EngineError> {
        if self.closed {
            return match self.outcome {
                Some(outcome) => Ok(Cycle::Finished(outcome)),
                None => Err(EngineError::Configuration(format!(
                    "run {} has already failed",
                    self.run_id
                ))),
            };
        }

        match self.cycle(context).await {
            Ok(Cycle::Finished(outcome)) => {
                self.finish(outcome);
                Ok(Cycle::Finished(outcome))
            }
            Ok(Cycle::Continue) => Ok(Cycle::Continue),
            Err(err) => {
                self.fail(&err);
                Err(err)
            }
        }
    }

    async fn cycle(&mut self, context: &mut ExecutionContext) -> Result<Cycle, EngineError> {
        if !self.started {
            self.started = true;
            tracing::info!(
                run_id = %self.run_id,
                workflow = %self.workflow.name(),
                state = %self.machine.current_name(),
                "Starting process"
            );
            self.bus.publish(EngineEvent::ProcessStarted {
                process: self.workflow.name().to_string(),
            });
            if let Some(outcome) = self.machine.terminal_outcome() {
                return Ok(Cycle::Finished(outcome));
            }
        }

        if self.stop.is_raised() {
            return Err(EngineError::StoppedByCaller);
        }

        if std::mem::take(&mut self.prelude_pending) {
            self.run_prelude(context).await?;
        }

        // Manual transition skips detection for this cycle
        self.machine.current().handle(context);
        if let Some(next) = context.take_requested_transition() {
            self.machine.transition_to(next);
            return Ok(self.settle());
        }

        let expected = self.machine.current().expected_screens();
        let detected = match self
            .detector
            .wait_for_screen(&expected, self.config.detection_timeout)
            .await
        {
            Ok(tag) => tag,
            Err(EngineError::DetectionTimeout { .. }) => {
                self.machine.current().on_detection_failed(context);
                return match context.take_requested_transition() {
                    Some(next) => {
                        tracing::info!(
                            run_id = %self.run_id,
                            state = %self.machine.current_name(),
                            next = %next.name(),
                            "Detection failed, state requested a transition"
                        );
                        self.machine.transition_to(next);
                        Ok(self.settle())
                    }
                    None => Err(EngineError::StuckState(
                        self.machine.current_name().to_string(),
                    )),
                };
            }
            Err(err) => return Err(err),
        };

        tracing::debug!(run_id = %self.run_id, screen = %detected, "Dispatching screen");
        self.bus.publish(EngineEvent::ScreenDetected {
            screen: detected.clone(),
        });

        let handler = self
            .workflow
            .handler(&detected)
            .ok_or_else(|| EngineError::HandlerNotFound(detected.clone()))?;
        let mut sequence = handler.create_action_sequence(context);
        // Held back so only `on_failure` can recover a failed sequence
        let mut queued = context.take_requested_transition();

        match self.executor.execute_sequence(&mut sequence, context).await? {
            SequenceOutcome::Completed => {}
            SequenceOutcome::FailureHandled(err) => {
                if !context.has_requested_transition() {
                    return Err(err);
                }
                queued = None;
                tracing::warn!(run_id = %self.run_id, error = %err, "Recovered from action failure");
            }
        }

        // Callback request, then the handler's request, then the declared next
        // state; with none of them the run stays put and re-detects.
        let next = context
            .take_requested_transition()
            .or(queued)
            .or_else(|| sequence.take_next_state());
        if let Some(next) = next {
            self.machine.transition_to(next);
        }
        Ok(self.settle())
    }

    async fn run_prelude(&self, context: &mut ExecutionContext) -> Result<(), EngineError> {
        let Some(prelude) = self.workflow.prelude() else {
            return Ok(());
        };
        let commands = prelude(context);
        tracing::debug!(run_id = %self.run_id, commands = commands.len(), "Running workflow prelude");
        for command in &commands {
            self.executor.execute(command).await?;
        }
        Ok(())
    }

    fn settle(&self) -> Cycle {
        match self.machine.terminal_outcome() {
            Some(outcome) => Cycle::Finished(outcome),
            None => Cycle::Continue,
        }
    }

    fn finish(&mut self, outcome: RunOutcome) {
        self.closed = true;
        self.status = outcome.into();
        self.outcome = Some(outcome);
        let process = self.workflow.name().to_string();
        tracing::info!(
            run_id = %self.run_id,
            state = %self.machine.current_name(),
            %outcome,
            "Process finished"
        );
        match outcome {
            RunOutcome::Failure => self.bus.publish(EngineEvent::ProcessFailed {
                process,
                error: format!("reached failure state '{}'", self.machine.current_name()),
            }),
            RunOutcome::Success | RunOutcome::Retry => {
                self.bus.publish(EngineEvent::ProcessCompleted { process, outcome })
            }
        }
    }

    fn fail(&mut self, err: &EngineError) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.status = RunStatus::Failure;
        tracing::error!(
            run_id = %self.run_id,
            state = %self.machine.current_name(),
            error = %err,
            "Process failed"
        );
        self.bus.publish(EngineEvent::ProcessFailed {
            process: self.workflow.name().to_string(),
            error: err.to_string(),
        });
    }
}
