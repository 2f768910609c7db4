use std::time::Duration;

/// Configuration of the controller process.
///
/// ## Sentinel values
/// - `history_limit = 0` → never continue as new.
#[derive(Clone, Debug)]
pub struct ControllerConfig {
    /// How long the controller waits without any signal before checking whether it may stop.
    ///
    /// When the timer fires and no item is registered the controller terminates;
    /// otherwise the timer is simply restarted.
    pub idle_timeout: Duration,

    /// Number of history events one controller generation may accumulate before it
    /// hands its state to a fresh generation.
    pub history_limit: usize,

    /// Capacity of the event bus ring buffer (min 1).
    pub bus_capacity: usize,
}

impl ControllerConfig {
    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for ControllerConfig {
    /// - `idle_timeout = 120s`
    /// - `history_limit = 1000`
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            idle_timeout: Duration::from_secs(120),
            history_limit: 1000,
            bus_capacity: 1024,
        }
    }
}
