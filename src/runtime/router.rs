//! # Signal router.
//!
//! [`Router`] is the only way processes reach each other. It owns:
//! - the **controller slot**: sender half of the current controller mailbox (if any);
//! - the **inbox table**: one instruction sender per live item process.
//!
//! ## Rules
//! - Sends never block: both directions use unbounded FIFO queues.
//! - Sending to the controller happens under the slot's read lock, so
//!   [`Router::retire_controller`] (write lock) observes every signal that was accepted.
//! - A mailbox outlives controller generations: compaction hands the same [`Mailbox`]
//!   to the next generation, so queued signals are not lost.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::mpsc;

use crate::error::{DeliveryError, RuntimeError};
use crate::protocol::{InstructionResponse, Signal};

use super::ProcessRef;

/// Receiving half of the controller mailbox.
#[derive(Debug)]
pub struct Mailbox {
    rx: mpsc::UnboundedReceiver<Signal>,
}

impl Mailbox {
    /// Waits for the next signal; `None` once every sender is gone.
    pub async fn recv(&mut self) -> Option<Signal> {
        self.rx.recv().await
    }
}

/// Result of an attempt to retire the controller slot.
#[derive(Debug)]
pub(crate) enum Retirement {
    /// Slot cleared; new signals fail with `ControllerNotRunning`.
    Retired,
    /// A signal arrived in the meantime; the controller must keep running.
    Pending(Signal),
}

#[derive(Default)]
struct Inner {
    controller: RwLock<Option<mpsc::UnboundedSender<Signal>>>,
    inboxes: RwLock<HashMap<ProcessRef, mpsc::UnboundedSender<InstructionResponse>>>,
}

/// Cloneable handle to the routing tables.
#[derive(Clone, Default)]
pub struct Router {
    inner: Arc<Inner>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs a fresh controller mailbox.
    ///
    /// Fails with [`RuntimeError::AlreadyRunning`] while another controller holds the slot.
    pub fn install_controller(&self) -> Result<Mailbox, RuntimeError> {
        let mut slot = self
            .inner
            .controller
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if slot.as_ref().is_some_and(|tx| !tx.is_closed()) {
            return Err(RuntimeError::AlreadyRunning);
        }
        let (tx, rx) = mpsc::unbounded_channel();
        *slot = Some(tx);
        Ok(Mailbox { rx })
    }

    /// True while a controller mailbox is installed and open.
    pub fn controller_running(&self) -> bool {
        self.inner
            .controller
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|tx| !tx.is_closed())
    }

    /// Delivers a signal to the controller mailbox.
    pub fn signal_controller(&self, signal: Signal) -> Result<(), DeliveryError> {
        let slot = self
            .inner
            .controller
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        match slot.as_ref() {
            Some(tx) => tx
                .send(signal)
                .map_err(|_| DeliveryError::ControllerNotRunning),
            None => Err(DeliveryError::ControllerNotRunning),
        }
    }

    /// Clears the controller slot unless a signal is still queued.
    ///
    /// Holding the write lock excludes concurrent [`signal_controller`](Self::signal_controller)
    /// calls, so an empty mailbox here means nothing was accepted and not handled.
    pub(crate) fn retire_controller(&self, mailbox: &mut Mailbox) -> Retirement {
        let mut slot = self
            .inner
            .controller
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        match mailbox.rx.try_recv() {
            Ok(signal) => Retirement::Pending(signal),
            Err(_) => {
                *slot = None;
                mailbox.rx.close();
                Retirement::Retired
            }
        }
    }

    /// Opens the private instruction inbox of an item process.
    ///
    /// Re-opening an existing handle replaces the previous inbox.
    pub fn open_inbox(&self, process: ProcessRef) -> mpsc::UnboundedReceiver<InstructionResponse> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner
            .inboxes
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(process, tx);
        rx
    }

    /// Forgets the inbox of an item process.
    pub fn close_inbox(&self, process: &ProcessRef) {
        self.inner
            .inboxes
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(process);
    }

    /// Delivers an instruction to one item process.
    pub fn signal_item(
        &self,
        process: &ProcessRef,
        instruction: InstructionResponse,
    ) -> Result<(), DeliveryError> {
        let inboxes = self
            .inner
            .inboxes
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        let Some(tx) = inboxes.get(process) else {
            return Err(DeliveryError::UnknownProcess {
                workflow_id: process.workflow_id.clone(),
                run_id: process.run_id.clone(),
            });
        };
        tx.send(instruction)
            .map_err(|_| DeliveryError::InboxClosed {
                workflow_id: process.workflow_id.clone(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_controller_slot_is_singleton() {
        let router = Router::new();
        assert!(!router.controller_running());
        assert_eq!(
            router.signal_controller(Signal::ping()),
            Err(DeliveryError::ControllerNotRunning)
        );

        let mut mailbox = router.install_controller().unwrap();
        assert!(router.controller_running());
        assert!(matches!(
            router.install_controller(),
            Err(RuntimeError::AlreadyRunning)
        ));

        router.signal_controller(Signal::ping()).unwrap();
        assert_eq!(mailbox.recv().await, Some(Signal::ping()));
    }

    #[tokio::test]
    async fn test_retire_keeps_running_when_signal_queued() {
        let router = Router::new();
        let mut mailbox = router.install_controller().unwrap();
        router.signal_controller(Signal::ping()).unwrap();

        match router.retire_controller(&mut mailbox) {
            Retirement::Pending(sig) => assert_eq!(sig, Signal::ping()),
            Retirement::Retired => panic!("queued signal must block retirement"),
        }
        assert!(router.controller_running());

        assert!(matches!(
            router.retire_controller(&mut mailbox),
            Retirement::Retired
        ));
        assert!(!router.controller_running());
        assert_eq!(
            router.signal_controller(Signal::ping()),
            Err(DeliveryError::ControllerNotRunning)
        );

        // slot is free again
        assert!(router.install_controller().is_ok());
    }

    #[tokio::test]
    async fn test_item_inbox_delivery() {
        let router = Router::new();
        let who = ProcessRef::new("item_1_x", "run");
        let missing = router.signal_item(&who, InstructionResponse::permit("1", "ok"));
        assert_eq!(missing.unwrap_err().as_label(), "delivery_unknown_process");

        let mut inbox = router.open_inbox(who.clone());
        router
            .signal_item(&who, InstructionResponse::permit("1", "ok"))
            .unwrap();
        assert!(inbox.recv().await.unwrap().proceed);

        drop(inbox);
        let closed = router.signal_item(&who, InstructionResponse::deny("1", "no"));
        assert_eq!(
            closed,
            Err(DeliveryError::InboxClosed {
                workflow_id: "item_1_x".into()
            })
        );

        router.close_inbox(&who);
        let gone = router.signal_item(&who, InstructionResponse::deny("1", "no"));
        assert_eq!(gone.unwrap_err().as_label(), "delivery_unknown_process");
    }
}
