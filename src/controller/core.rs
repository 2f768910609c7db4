use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::error::RuntimeError;
use crate::events::Bus;
use crate::runtime::{Mailbox, Router};

use super::{
    config::ControllerConfig,
    engine::{ControllerEngine, GenerationExit},
    query::ControllerQuery,
    state::{ControllerState, QueryResponse},
};

/// Handle to a running controller process.
pub struct ControllerHandle {
    join: JoinHandle<Result<ControllerState, RuntimeError>>,
    query: ControllerQuery,
}

impl ControllerHandle {
    /// Reader of the controller query; keeps the last snapshot after termination.
    pub fn query(&self) -> ControllerQuery {
        self.query.clone()
    }

    /// True once the controller task has exited.
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Waits for the controller to terminate and returns its final state.
    pub async fn wait(self) -> Result<ControllerState, RuntimeError> {
        match self.join.await {
            Ok(res) => res,
            Err(e) => Err(RuntimeError::Join(e.to_string())),
        }
    }
}

/// Singleton controller: drives consecutive generations over one mailbox.
///
/// A generation ends on idle termination, shutdown, or when its history budget is spent.
/// In the last case the state is checkpointed, restored, and handed with the same
/// mailbox to the next generation.
pub struct Controller {
    cfg: ControllerConfig,
    router: Router,
    bus: Bus,
}

impl Controller {
    /// Creates a new controller (must call [`spawn`](Self::spawn) to start).
    pub fn new(cfg: ControllerConfig, router: Router, bus: Bus) -> Self {
        Self { cfg, router, bus }
    }

    /// Installs the controller mailbox and starts the first generation in the background.
    ///
    /// The mailbox is installed before this returns, so signals sent right after are queued.
    /// Fails with [`RuntimeError::AlreadyRunning`] if another controller is live.
    pub fn spawn(
        self,
        state: ControllerState,
        token: CancellationToken,
    ) -> Result<ControllerHandle, RuntimeError> {
        let mailbox = self.router.install_controller()?;
        let (query_tx, query) = ControllerQuery::channel(state.query());

        let join = tokio::spawn(async move {
            let res = self.run_generations(state, mailbox, query_tx, token).await;
            if let Err(e) = &res {
                error!(error = %e, label = e.as_label(), "controller terminated with error");
            }
            res
        });

        Ok(ControllerHandle { join, query })
    }

    async fn run_generations(
        self,
        mut state: ControllerState,
        mut mailbox: Mailbox,
        query_tx: watch::Sender<QueryResponse>,
        token: CancellationToken,
    ) -> Result<ControllerState, RuntimeError> {
        let mut generation = 1;
        loop {
            let engine = ControllerEngine::new(
                state,
                mailbox,
                self.router.clone(),
                self.bus.clone(),
                self.cfg.clone(),
                query_tx.clone(),
                generation,
            );

            match engine.run(token.clone()).await? {
                GenerationExit::Idle(s) | GenerationExit::Shutdown(s) => return Ok(s),
                GenerationExit::ContinueAsNew {
                    state: s,
                    mailbox: m,
                } => {
                    let bytes = s.checkpoint()?;
                    debug!(bytes = bytes.len(), generation, "controller state checkpointed");
                    state = ControllerState::restore(&bytes)?;
                    mailbox = m;
                    generation += 1;
                }
            }
        }
    }
}
