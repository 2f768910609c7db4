//! # Runtime events emitted by the controller and the orchestrator.
//!
//! [`EventKind`] groups events into:
//! - **controller events**: loop lifecycle and signal handling;
//! - **item events**: end of an item process;
//! - **shutdown events**: OS-signal driven shutdown of the orchestrator;
//! - **subscriber events**: overflow/panic inside subscriber workers.
//!
//! Each event carries a global, monotonically increasing `seq`.
//!
//! ## Example
//! ```rust
//! use slotvisor::{Event, EventKind, SignalType};
//!
//! let ev = Event::new(EventKind::InstructionSent)
//!     .with_item("42")
//!     .with_signal(SignalType::Register)
//!     .with_proceed(false)
//!     .with_reason("Registration denied: another item already in progress");
//!
//! assert_eq!(ev.item.as_deref(), Some("42"));
//! assert_eq!(ev.proceed, Some(false));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

use crate::protocol::SignalType;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Controller events ===
    /// A controller generation started.
    ///
    /// Sets: `generation`, `signals_handled` (carried over).
    ControllerStarted,

    /// A signal was taken from the mailbox and dispatched.
    ///
    /// Sets: `signal`, `signals_handled`.
    SignalHandled,

    /// An instruction was delivered to an item inbox.
    ///
    /// Sets: `item`, `signal` (what was answered), `proceed`, `reason`.
    InstructionSent,

    /// An instruction could not be delivered; the dispatch was abandoned.
    ///
    /// Sets: `item`, `signal`, `reason`.
    DeliveryFailed,

    /// A signal payload did not match its declared type and was dropped.
    ///
    /// Sets: `signal`, `reason`.
    PayloadRejected,

    /// The idle timer fired before any signal arrived.
    ///
    /// Sets: `registered` (live items at that moment).
    IdleTimerFired,

    /// The generation compacted and handed its state to the next one.
    ///
    /// Sets: `generation` (the one that ended), `signals_handled`.
    ContinuedAsNew,

    /// The controller stopped: idle with no registered items, or runtime shutdown.
    ///
    /// Sets: `signals_handled`, `reason`.
    ControllerTerminated,

    // === Item events ===
    /// An item process ended.
    ///
    /// Sets: `item`, `reason` (outcome or error label).
    ItemFinished,

    // === Shutdown events ===
    /// Shutdown requested (OS signal observed).
    ShutdownRequested,

    /// All item processes stopped within the grace period.
    AllStoppedWithin,

    /// Grace period exceeded; some item processes did not stop in time.
    GraceExceeded,

    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets: `item` (subscriber name), `reason` (panic message).
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets: `item` (subscriber name), `reason`.
    SubscriberOverflow,
}

/// Runtime event with optional metadata.
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Item id (or subscriber name for subscriber events).
    pub item: Option<Arc<str>>,
    /// Human-readable reason.
    pub reason: Option<Arc<str>>,
    /// Signal type involved.
    pub signal: Option<SignalType>,
    /// Go/no-go of a sent instruction.
    pub proceed: Option<bool>,
    /// Controller signal counter at the time of the event.
    pub signals_handled: Option<u64>,
    /// Controller generation (1-based, per controller start).
    pub generation: Option<u64>,
    /// Number of registered items.
    pub registered: Option<usize>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            item: None,
            reason: None,
            signal: None,
            proceed: None,
            signals_handled: None,
            generation: None,
            registered: None,
        }
    }

    #[inline]
    pub fn with_item(mut self, item: impl Into<Arc<str>>) -> Self {
        self.item = Some(item.into());
        self
    }

    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    #[inline]
    pub fn with_signal(mut self, signal: SignalType) -> Self {
        self.signal = Some(signal);
        self
    }

    #[inline]
    pub fn with_proceed(mut self, proceed: bool) -> Self {
        self.proceed = Some(proceed);
        self
    }

    #[inline]
    pub fn with_signals_handled(mut self, n: u64) -> Self {
        self.signals_handled = Some(n);
        self
    }

    #[inline]
    pub fn with_generation(mut self, n: u64) -> Self {
        self.generation = Some(n);
        self
    }

    #[inline]
    pub fn with_registered(mut self, n: usize) -> Self {
        self.registered = Some(n);
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_item(subscriber)
            .with_reason(reason)
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_item(subscriber)
            .with_reason(info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seq_is_monotonic() {
        let a = Event::new(EventKind::SignalHandled);
        let b = Event::new(EventKind::SignalHandled);
        assert!(b.seq > a.seq);
    }
}
