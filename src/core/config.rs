//! # Orchestrator configuration.
//!
//! [`OrchestratorConfig`] groups the settings of the controller, of item processes and
//! of graceful shutdown.
//!
//! ## Sentinel values
//! - `controller.history_limit = 0` → the controller never continues as new
//! - `item.start_delay = 0s` → items request the slot right after registering
//! - `grace = 0s` → do not wait for item processes on shutdown

use std::time::Duration;

use crate::controller::ControllerConfig;
use crate::item::ItemConfig;

/// Configuration of an [`Orchestrator`](crate::Orchestrator).
#[derive(Clone, Debug)]
pub struct OrchestratorConfig {
    /// Controller loop settings (idle timeout, history budget, bus capacity).
    pub controller: ControllerConfig,

    /// Settings applied to every item process spawned by the orchestrator.
    pub item: ItemConfig,

    /// Maximum time to wait for item processes after a shutdown request.
    ///
    /// When exceeded, shutdown returns `RuntimeError::GraceExceeded`.
    pub grace: Duration,
}

impl Default for OrchestratorConfig {
    /// - `controller = ControllerConfig::default()`
    /// - `item = ItemConfig::default()`
    /// - `grace = 30s`
    fn default() -> Self {
        Self {
            controller: ControllerConfig::default(),
            item: ItemConfig::default(),
            grace: Duration::from_secs(30),
        }
    }
}
