use std::time::Duration;

/// Configuration of item processes.
///
/// ## Sentinel values
/// - `start_delay = 0s` → request the processing slot right after registration.
#[derive(Clone, Debug)]
pub struct ItemConfig {
    /// Pause between an accepted registration and the start-processing request.
    pub start_delay: Duration,
}

impl ItemConfig {
    /// Returns the settle delay as an `Option`.
    ///
    /// - `None` → no pause
    /// - `Some(d)` → sleep `d` before requesting the slot
    #[inline]
    pub fn settle_delay(&self) -> Option<Duration> {
        if self.start_delay == Duration::ZERO {
            None
        } else {
            Some(self.start_delay)
        }
    }
}

impl Default for ItemConfig {
    /// - `start_delay = 30s`
    fn default() -> Self {
        Self {
            start_delay: Duration::from_secs(30),
        }
    }
}
