use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tracing::warn;

use crate::{
    core::OrchestratorConfig,
    events::Bus,
    runtime::Router,
    subscribers::{Subscribe, SubscriberSet},
};

use super::orchestrator::Orchestrator;

/// Builder for an [`Orchestrator`].
pub struct OrchestratorBuilder {
    cfg: OrchestratorConfig,
    subscribers: Vec<Arc<dyn Subscribe>>,
    router: Option<Router>,
}

impl OrchestratorBuilder {
    pub fn new(cfg: OrchestratorConfig) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
            router: None,
        }
    }

    /// Sets event subscribers.
    ///
    /// Each one gets its own worker and bounded queue.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Uses an existing router instead of a fresh one.
    pub fn with_router(mut self, router: Router) -> Self {
        self.router = Some(router);
        self
    }

    /// Builds the orchestrator and starts the subscriber fan-out.
    ///
    /// Must be called inside a Tokio runtime. No controller is started yet;
    /// see [`Orchestrator::ensure_controller`].
    pub fn build(self) -> Arc<Orchestrator> {
        let bus = Bus::new(self.cfg.controller.bus_capacity_clamped());
        let subs = Arc::new(SubscriberSet::new(self.subscribers, bus.clone()));

        if !subs.is_empty() {
            let mut rx = bus.subscribe();
            let set = Arc::clone(&subs);
            tokio::spawn(async move {
                loop {
                    match rx.recv().await {
                        Ok(ev) => set.emit(&ev),
                        Err(RecvError::Lagged(n)) => {
                            warn!(skipped = n, "subscriber listener lagged behind the bus");
                        }
                        Err(RecvError::Closed) => break,
                    }
                }
            });
        }

        Arc::new(Orchestrator::new_internal(
            self.cfg,
            bus,
            subs,
            self.router.unwrap_or_default(),
        ))
    }
}
