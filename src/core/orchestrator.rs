//! # Orchestrator: starts the controller, runs item processes, drives shutdown.
//!
//! ```text
//! start_item(item, work)
//!   ├─► ensure_controller()
//!   │     ├─ no live controller ─► Controller::spawn(empty state)
//!   │     └─► signal_controller(Ping)          (retried once if the controller just retired)
//!   └─► spawn_item(item, work)
//!         ├─ ProcessRef::for_item(id), open_inbox
//!         └─ TaskTracker::spawn(ItemClient::run) ─► close_inbox, publish ItemFinished
//!
//! run_until_idle()
//!   ├─ controller terminates (idle) ─► wait item processes ─► Ok(Some(state))
//!   └─ OS signal ─► ShutdownRequested
//!                   ├─ cancel item token, wait up to `grace`
//!                   │    ├─ all stopped ─► AllStoppedWithin
//!                   │    └─ timeout     ─► GraceExceeded
//!                   └─ cancel controller token, collect its final state
//! ```
//!
//! ## Rules
//! - At most one controller is live per router; `ensure_controller` is serialized.
//! - Items are cancelled before the controller so their release signals can still land.
//! - After a shutdown the orchestrator does not start new controllers.

use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

use crate::controller::{
    Controller, ControllerHandle, ControllerQuery, ControllerState, QueryResponse,
};
use crate::error::{DeliveryError, RuntimeError};
use crate::events::{Bus, Event, EventKind};
use crate::item::{ItemClient, ItemReport, ItemWork};
use crate::protocol::{Item, Signal};
use crate::runtime::{ProcessRef, Router};
use crate::subscribers::SubscriberSet;

use super::builder::OrchestratorBuilder;
use super::config::OrchestratorConfig;
use super::shutdown;

/// Entry point: one controller and any number of item processes over a shared router.
pub struct Orchestrator {
    /// Runtime configuration.
    pub cfg: OrchestratorConfig,
    /// Event bus shared by the controller and item processes.
    pub bus: Bus,
    /// Fan-out set for subscribers.
    pub subs: Arc<SubscriberSet>,

    router: Router,
    items: TaskTracker,
    items_token: CancellationToken,
    controller_token: CancellationToken,
    controller: Mutex<Option<ControllerHandle>>,
    query: RwLock<Option<ControllerQuery>>,
}

impl Orchestrator {
    /// Returns a builder.
    pub fn builder(cfg: OrchestratorConfig) -> OrchestratorBuilder {
        OrchestratorBuilder::new(cfg)
    }

    pub(super) fn new_internal(
        cfg: OrchestratorConfig,
        bus: Bus,
        subs: Arc<SubscriberSet>,
        router: Router,
    ) -> Self {
        Self {
            cfg,
            bus,
            subs,
            router,
            items: TaskTracker::new(),
            items_token: CancellationToken::new(),
            controller_token: CancellationToken::new(),
            controller: Mutex::new(None),
            query: RwLock::new(None),
        }
    }

    /// Router shared by the controller and item processes.
    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Starts the controller if none is live, then pings it.
    ///
    /// A controller that retires between the check and the ping is replaced by a fresh one.
    pub async fn ensure_controller(&self) -> Result<(), RuntimeError> {
        let mut slot = self.controller.lock().await;
        loop {
            if !self.router.controller_running() {
                if let Some(prev) = slot.take() {
                    match prev.wait().await {
                        Ok(state) => debug!(
                            signals_handled = state.signals_handled,
                            "previous controller finished"
                        ),
                        Err(e) => warn!(error = %e, "previous controller failed"),
                    }
                }

                let handle = Controller::new(
                    self.cfg.controller.clone(),
                    self.router.clone(),
                    self.bus.clone(),
                )
                .spawn(ControllerState::new(), self.controller_token.clone())?;
                *self.query.write().unwrap_or_else(PoisonError::into_inner) = Some(handle.query());
                *slot = Some(handle);
                info!("controller started");
            }

            match self.router.signal_controller(Signal::ping()) {
                Ok(()) => return Ok(()),
                Err(DeliveryError::ControllerNotRunning) => {
                    debug!("controller retired before ping; starting a new one");
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Spawns an item process running the admission protocol for `item`.
    ///
    /// Does not start the controller; see [`start_item`](Self::start_item).
    pub fn spawn_item<T, W>(&self, item: T, work: W) -> JoinHandle<ItemReport<T>>
    where
        T: Item,
        W: ItemWork<T>,
    {
        let process = ProcessRef::for_item(item.id());
        let inbox = self.router.open_inbox(process.clone());
        info!(id = %item.id(), workflow_id = %process.workflow_id, run_id = %process.run_id, "starting item process");

        let client = ItemClient::new(
            item,
            process,
            inbox,
            self.router.clone(),
            self.cfg.item.clone(),
        );
        let router = self.router.clone();
        let bus = self.bus.clone();
        let token = self.items_token.child_token();

        self.items.spawn(async move {
            let report = client.run(&work, token).await;
            router.close_inbox(&report.process);

            let reason = match &report.result {
                Ok(outcome) => outcome.as_str(),
                Err(e) => e.as_label(),
            };
            bus.publish(
                Event::new(EventKind::ItemFinished)
                    .with_item(report.item.id())
                    .with_reason(reason),
            );
            report
        })
    }

    /// [`ensure_controller`](Self::ensure_controller) followed by [`spawn_item`](Self::spawn_item).
    pub async fn start_item<T, W>(
        &self,
        item: T,
        work: W,
    ) -> Result<JoinHandle<ItemReport<T>>, RuntimeError>
    where
        T: Item,
        W: ItemWork<T>,
    {
        self.ensure_controller().await?;
        Ok(self.spawn_item(item, work))
    }

    /// Latest controller query snapshot.
    ///
    /// Still answers after the controller terminated; `None` if none was ever started.
    pub fn query(&self) -> Option<QueryResponse> {
        self.query
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(ControllerQuery::get)
    }

    /// Reader that follows the current controller's snapshots.
    pub fn query_handle(&self) -> Option<ControllerQuery> {
        self.query
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Waits for the current controller to terminate and returns its final state.
    ///
    /// `None` when no controller was started (or it was already awaited).
    pub async fn wait_controller(&self) -> Result<Option<ControllerState>, RuntimeError> {
        let handle = self.controller.lock().await.take();
        match handle {
            Some(h) => h.wait().await.map(Some),
            None => Ok(None),
        }
    }

    /// Runs until the controller terminates on its own or an OS signal requests shutdown.
    ///
    /// On a signal, item processes are cancelled and given `grace` to stop; then the
    /// controller is cancelled and its final state returned.
    pub async fn run_until_idle(&self) -> Result<Option<ControllerState>, RuntimeError> {
        let handle = self.controller.lock().await.take();
        let Some(handle) = handle else {
            return Ok(None);
        };

        let wait = handle.wait();
        tokio::pin!(wait);

        tokio::select! {
            res = &mut wait => {
                let state = res?;
                self.settle_items().await;
                return Ok(Some(state));
            }
            sig = shutdown::wait_for_shutdown_signal() => sig?,
        }

        info!("shutdown requested");
        self.bus.publish(Event::new(EventKind::ShutdownRequested));
        let grace = self.stop_items_with_grace().await;
        self.controller_token.cancel();
        let state = wait.await?;
        grace?;
        Ok(Some(state))
    }

    /// Programmatic shutdown: same sequence as an OS signal in [`run_until_idle`](Self::run_until_idle).
    pub async fn shutdown(&self) -> Result<Option<ControllerState>, RuntimeError> {
        self.bus.publish(Event::new(EventKind::ShutdownRequested));
        let grace = self.stop_items_with_grace().await;
        self.controller_token.cancel();
        let state = self.wait_controller().await?;
        grace?;
        Ok(state)
    }

    /// Waits for item processes that are still finishing.
    async fn settle_items(&self) {
        self.items.close();
        self.items.wait().await;
        self.items.reopen();
    }

    async fn stop_items_with_grace(&self) -> Result<(), RuntimeError> {
        self.items_token.cancel();
        self.items.close();

        let grace = self.cfg.grace;
        match time::timeout(grace, self.items.wait()).await {
            Ok(()) => {
                self.bus.publish(Event::new(EventKind::AllStoppedWithin));
                Ok(())
            }
            Err(_) => {
                let stuck = self.items.len();
                warn!(grace = ?grace, stuck, "item processes did not stop within grace");
                self.bus.publish(Event::new(EventKind::GraceExceeded));
                Err(RuntimeError::GraceExceeded { grace, stuck })
            }
        }
    }
}
