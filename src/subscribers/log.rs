//! # LogWriter: renders runtime events through `tracing`.
//!
//! ## Example output
//! ```text
//! INFO controller started generation=1 signals_handled=0
//! INFO instruction sent item="42" signal=register proceed=false reason="Registration denied: ..."
//! WARN delivery failed item="42" signal=start-processing reason="unknown item process ..."
//! INFO controller terminated signals_handled=12 reason="idle"
//! ```

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let item = e.item.as_deref().unwrap_or("-");
        let reason = e.reason.as_deref().unwrap_or("-");
        match e.kind {
            EventKind::ControllerStarted => {
                info!(generation = ?e.generation, signals_handled = ?e.signals_handled, "controller started");
            }
            EventKind::SignalHandled => {
                debug!(signal = ?e.signal, signals_handled = ?e.signals_handled, "signal handled");
            }
            EventKind::InstructionSent => {
                info!(item, signal = ?e.signal, proceed = ?e.proceed, reason, "instruction sent");
            }
            EventKind::DeliveryFailed => {
                warn!(item, signal = ?e.signal, reason, "delivery failed");
            }
            EventKind::PayloadRejected => {
                warn!(signal = ?e.signal, reason, "payload rejected");
            }
            EventKind::IdleTimerFired => {
                debug!(registered = ?e.registered, "idle timer fired");
            }
            EventKind::ContinuedAsNew => {
                info!(generation = ?e.generation, signals_handled = ?e.signals_handled, "continued as new");
            }
            EventKind::ControllerTerminated => {
                info!(signals_handled = ?e.signals_handled, reason, "controller terminated");
            }
            EventKind::ItemFinished => {
                info!(item, reason, "item finished");
            }
            EventKind::ShutdownRequested => info!("shutdown requested"),
            EventKind::AllStoppedWithin => info!("all item processes stopped within grace"),
            EventKind::GraceExceeded => warn!("shutdown grace exceeded"),
            EventKind::SubscriberPanicked => {
                warn!(subscriber = item, info = reason, "subscriber panicked");
            }
            EventKind::SubscriberOverflow => {
                warn!(subscriber = item, reason, "subscriber dropped event");
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
