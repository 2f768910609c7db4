//! # One controller generation: the signal-vs-idle-timer loop.
//!
//! ```text
//! loop {
//!   ├─► arm idle timer (cfg.idle_timeout)
//!   ├─► select {
//!   │     signal  ─► drop timer, dispatch(signal), signals_handled += 1
//!   │     timer   ─► registered items?
//!   │                 ├─ yes ─► loop again (timer re-armed)
//!   │                 └─ no  ─► retire router slot
//!   │                           ├─ retired          ─► exit Idle(state)
//!   │                           └─ signal was queued ─► dispatch it, keep running
//!   │     shutdown ─► exit Shutdown(state)
//!   │   }
//!   ├─► publish query snapshot
//!   └─► history budget spent? ─► exit ContinueAsNew { state, mailbox }
//! }
//! ```
//!
//! ## Rules
//! - State is owned by the engine and only mutated from this loop.
//! - A signal always wins a tie with the timer (`biased` select).
//! - On `ContinueAsNew` the mailbox is handed back untouched: queued signals survive.

use tokio::sync::watch;
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::error::RuntimeError;
use crate::events::{Bus, Event, EventKind};
use crate::runtime::{HistoryBudget, Mailbox, Retirement, Router};

use super::config::ControllerConfig;
use super::state::{ControllerState, QueryResponse};

/// How a generation ended.
#[derive(Debug)]
pub(crate) enum GenerationExit {
    /// Idle timer fired with no registered items; the controller is done.
    Idle(ControllerState),
    /// Runtime shutdown cancelled the loop.
    Shutdown(ControllerState),
    /// History budget spent; restart with this state and mailbox.
    ContinueAsNew {
        state: ControllerState,
        mailbox: Mailbox,
    },
}

/// Loop state of a single controller generation.
pub(crate) struct ControllerEngine {
    pub(super) state: ControllerState,
    pub(super) mailbox: Mailbox,
    pub(super) router: Router,
    pub(super) bus: Bus,
    pub(super) history: HistoryBudget,
    cfg: ControllerConfig,
    query: watch::Sender<QueryResponse>,
    /// Ids whose records changed since the last published snapshot.
    pub(super) touched: Vec<String>,
    generation: u64,
}

impl ControllerEngine {
    pub(crate) fn new(
        state: ControllerState,
        mailbox: Mailbox,
        router: Router,
        bus: Bus,
        cfg: ControllerConfig,
        query: watch::Sender<QueryResponse>,
        generation: u64,
    ) -> Self {
        Self {
            state,
            mailbox,
            router,
            bus,
            history: HistoryBudget::new(cfg.history_limit),
            cfg,
            query,
            touched: Vec::new(),
            generation,
        }
    }

    /// Runs the generation until it terminates, compacts, or is cancelled.
    pub(crate) async fn run(
        mut self,
        token: CancellationToken,
    ) -> Result<GenerationExit, RuntimeError> {
        info!(
            generation = self.generation,
            signals_handled = self.state.signals_handled,
            orchestrated_items = self.state.registry.len(),
            "controller started"
        );
        self.bus.publish(
            Event::new(EventKind::ControllerStarted)
                .with_generation(self.generation)
                .with_signals_handled(self.state.signals_handled),
        );
        self.query.send_replace(self.state.query());

        loop {
            let idle = time::sleep(self.cfg.idle_timeout);
            tokio::pin!(idle);

            tokio::select! {
                biased;

                msg = self.mailbox.recv() => match msg {
                    Some(signal) => self.dispatch(signal),
                    None => return Err(RuntimeError::MailboxClosed),
                },
                _ = &mut idle => {
                    if self.on_idle_timer() {
                        return Ok(GenerationExit::Idle(self.state));
                    }
                }
                _ = token.cancelled() => {
                    info!(signals_handled = self.state.signals_handled, "controller cancelled");
                    self.bus.publish(
                        Event::new(EventKind::ControllerTerminated)
                            .with_signals_handled(self.state.signals_handled)
                            .with_reason("shutdown"),
                    );
                    return Ok(GenerationExit::Shutdown(self.state));
                }
            }

            self.history.record();
            self.publish_query();

            if self.history.continue_as_new_suggested() {
                info!(
                    generation = self.generation,
                    history_events = self.history.events(),
                    orchestrated_items = self.state.registry.len(),
                    "continuing as new"
                );
                self.bus.publish(
                    Event::new(EventKind::ContinuedAsNew)
                        .with_generation(self.generation)
                        .with_signals_handled(self.state.signals_handled),
                );
                return Ok(GenerationExit::ContinueAsNew {
                    state: self.state,
                    mailbox: self.mailbox,
                });
            }
        }
    }

    /// Handles a fired idle timer. Returns `true` when the controller may terminate.
    fn on_idle_timer(&mut self) -> bool {
        let registered = self.state.registry.registered_count();
        self.bus
            .publish(Event::new(EventKind::IdleTimerFired).with_registered(registered));

        if registered > 0 {
            info!(
                registered_count = registered,
                "idle timer fired, but registered items exist; resetting timer"
            );
            return false;
        }

        match self.router.retire_controller(&mut self.mailbox) {
            Retirement::Retired => {
                info!(
                    signals_handled = self.state.signals_handled,
                    "idle timer fired and no registered items, finishing"
                );
                self.publish_query();
                self.bus.publish(
                    Event::new(EventKind::ControllerTerminated)
                        .with_signals_handled(self.state.signals_handled)
                        .with_reason("idle"),
                );
                true
            }
            Retirement::Pending(signal) => {
                warn!(
                    signal = %signal.kind,
                    "signal arrived while retiring; staying alive"
                );
                self.dispatch(signal);
                false
            }
        }
    }

    /// Patches the published snapshot with the counters and the records touched since
    /// the last call. Untouched records are not cloned again.
    pub(super) fn publish_query(&mut self) {
        let touched = std::mem::take(&mut self.touched);
        let state = &self.state;
        self.query.send_modify(|q| {
            q.signals_handled = state.signals_handled;
            q.total_items = state.registry.len();
            for id in touched {
                if let Some(record) = state.registry.get(&id) {
                    q.orchestrated_items.insert(id, record.clone());
                }
            }
        });
    }
}
