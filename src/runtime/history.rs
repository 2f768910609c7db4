//! # History budget of one controller generation.
//!
//! Every event a generation processes (signal, timer, outbound instruction) grows its
//! history. Once the budget is spent the generation should hand its state to a fresh
//! one and stop.
//!
//! ## Sentinel values
//! - `limit = 0` → never suggest compaction.

/// Counts history events and suggests "continue as new".
#[derive(Clone, Debug)]
pub struct HistoryBudget {
    limit: usize,
    events: usize,
}

impl HistoryBudget {
    /// Creates an unspent budget of `limit` events.
    pub fn new(limit: usize) -> Self {
        Self { limit, events: 0 }
    }

    /// Records one history event.
    #[inline]
    pub fn record(&mut self) {
        self.events = self.events.saturating_add(1);
    }

    /// Events recorded so far in this generation.
    #[inline]
    pub fn events(&self) -> usize {
        self.events
    }

    /// True once the generation should compact.
    #[inline]
    pub fn continue_as_new_suggested(&self) -> bool {
        self.limit > 0 && self.events >= self.limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suggests_at_limit() {
        let mut b = HistoryBudget::new(3);
        b.record();
        b.record();
        assert!(!b.continue_as_new_suggested());
        b.record();
        assert!(b.continue_as_new_suggested());
        assert_eq!(b.events(), 3);
    }

    #[test]
    fn test_zero_limit_never_suggests() {
        let mut b = HistoryBudget::new(0);
        for _ in 0..10_000 {
            b.record();
        }
        assert!(!b.continue_as_new_suggested());
    }
}
