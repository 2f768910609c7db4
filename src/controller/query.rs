//! # Read-only query endpoint.
//!
//! The controller publishes a fresh [`QueryResponse`] after every event it processes.
//! Readers never touch the live state, so querying cannot race with the loop; the last
//! snapshot stays readable after the controller terminates.

use tokio::sync::watch;

use super::state::QueryResponse;

/// Cloneable reader of the latest query snapshot.
#[derive(Clone, Debug)]
pub struct ControllerQuery {
    rx: watch::Receiver<QueryResponse>,
}

impl ControllerQuery {
    pub(crate) fn channel(initial: QueryResponse) -> (watch::Sender<QueryResponse>, Self) {
        let (tx, rx) = watch::channel(initial);
        (tx, Self { rx })
    }

    /// Latest snapshot.
    pub fn get(&self) -> QueryResponse {
        self.rx.borrow().clone()
    }

    /// Waits until a snapshot newer than the last one seen is published.
    ///
    /// Returns `false` once the controller is gone and no further snapshot will come.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }

    /// Waits for the first snapshot satisfying `pred` and returns it.
    ///
    /// Returns `None` if the controller goes away first.
    pub async fn wait_for(
        &mut self,
        mut pred: impl FnMut(&QueryResponse) -> bool,
    ) -> Option<QueryResponse> {
        self.rx.wait_for(|q| pred(q)).await.ok().map(|q| q.clone())
    }
}
