//! Data models for screenflow

pub mod command;
pub mod configuration;
pub mod context;
pub mod locator;
pub mod outcome;
pub mod screen;

pub use command::*;
pub use configuration::*;
pub use context::*;
pub use locator::*;
pub use outcome::*;
pub use screen::*;
