//! Workflow definition and execution

pub mod definition;
pub mod detector;
pub mod executor;
pub mod registry;
pub mod runner;
pub mod state;
pub mod state_machine;
pub mod stop;
pub mod validator;

pub use definition::{Workflow, WorkflowBuilder, WorkflowPrelude};
pub use detector::ScreenDetector;
pub use executor::{ActionExecutor, CommandExtension, SequenceOutcome};
pub use registry::{WorkflowFactory, WorkflowRegistry};
pub use runner::{Cycle, ProcessRunner, RunnerConfig};
pub use state::{LogicalState, NamedState, ScreenHandler, StateFactory};
pub use state_machine::StateMachine;
pub use stop::StopHandle;
pub use validator::{ValidationError, ValidationResult, WorkflowValidator};
