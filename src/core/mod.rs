//! Runtime core: the orchestrator facade and its lifecycle.
//!
//! - [`orchestrator`]: starts the controller, spawns item processes, drives shutdown;
//! - [`builder`]: assembles bus, subscribers and router;
//! - [`config`]: controller, item and shutdown settings;
//! - [`shutdown`]: cross-platform OS signal handling.

mod builder;
mod config;
mod orchestrator;
mod shutdown;

pub use builder::OrchestratorBuilder;
pub use config::OrchestratorConfig;
pub use orchestrator::Orchestrator;
