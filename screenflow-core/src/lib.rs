//! # Screenflow Core Library
//!
//! Orchestration engine for multi-step workflows against an externally rendered
//! target (typically a browser page). A workflow is a set of logical states, a
//! catalogue of screen descriptors and a handler per screen. The
//! [`ProcessRunner`](workflow::ProcessRunner) repeatedly detects which screen
//! is showing, runs the handler's commands against the target and moves to the
//! next state until a terminal state is reached.

pub mod error;
pub mod events;
pub mod models;
pub mod services;
pub mod target;
pub mod workflow;

pub use error::EngineError;
pub use events::{EngineEvent, EventBus, ProcessCallbacks, SubscriptionId};
pub use models::*;
pub use target::{CapabilityError, TargetCapability};
pub use workflow::*;
