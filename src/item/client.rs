//! # Item protocol client.
//!
//! One generic client drives every item kind through the admission protocol.
//!
//! ```text
//! Register(id, self, snapshot) ──► wait ──no──► Cancelled, Update ──► Halted
//!        │ yes
//!   [settle delay]
//!        ▼
//! StartProcessing(id) ──► wait ──no──► Cancelled, Update, Deregister ──► ProcessingDenied
//!        │ yes
//!        ▼
//! Processing, Update ──► work ──► Completed, Update ──► StopProcessing ──► Deregister ──► Finished
//! ```
//!
//! ## Rules
//! - Only `Register` and `StartProcessing` wait for an answer; everything else is fire-and-forget.
//! - An answer whose `id` is not this item's is logged and ignored.
//! - Any failure sets status `Failed` and is returned; nothing is retried. A panic in the
//!   work counts as a failure ([`ItemError::Panicked`]).
//! - After a failure the client makes one best-effort attempt to give back what it held:
//!   `Update(Failed)`, then `StopProcessing` if the slot was granted, then `Deregister`.

use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::error::{ItemError, ProtocolError, panic_message};
use crate::protocol::{
    InstructionResponse, Item, ItemStatus, RegisterPayload, Signal, SignalType, UpdatePayload,
};
use crate::runtime::{ProcessRef, Router};

use super::config::ItemConfig;
use super::work::ItemWork;

/// How an item process ended when the protocol itself went fine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ItemOutcome {
    /// Work done, slot released, item deregistered.
    Finished,
    /// Registration was denied.
    Halted { reason: String },
    /// Start was denied; the item deregistered itself.
    ProcessingDenied { reason: String },
}

impl ItemOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemOutcome::Finished => "Finished Successfully",
            ItemOutcome::Halted { .. } => "Halted by orchestrator",
            ItemOutcome::ProcessingDenied { .. } => "Processing denied",
        }
    }
}

impl std::fmt::Display for ItemOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Final report of an item process.
#[derive(Debug)]
pub struct ItemReport<T> {
    /// Item as it was at the end (status included).
    pub item: T,
    /// Routing handle the process ran under.
    pub process: ProcessRef,
    pub result: Result<ItemOutcome, ItemError>,
}

/// What the item holds from the controller's point of view.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Held {
    Nothing,
    Registration,
    Slot,
}

/// Protocol client of a single item process.
pub struct ItemClient<T: Item> {
    item: T,
    process: ProcessRef,
    inbox: mpsc::UnboundedReceiver<InstructionResponse>,
    router: Router,
    cfg: ItemConfig,
    held: Held,
}

impl<T: Item> ItemClient<T> {
    /// Creates a client; `inbox` must be the receiver opened for `process`.
    pub fn new(
        item: T,
        process: ProcessRef,
        inbox: mpsc::UnboundedReceiver<InstructionResponse>,
        router: Router,
        cfg: ItemConfig,
    ) -> Self {
        Self {
            item,
            process,
            inbox,
            router,
            cfg,
            held: Held::Nothing,
        }
    }

    /// Runs the whole protocol and reports how it ended.
    pub async fn run<W>(mut self, work: &W, token: CancellationToken) -> ItemReport<T>
    where
        W: ItemWork<T> + ?Sized,
    {
        info!(
            id = %self.item.id(),
            name = %self.item.name(),
            workflow_id = %self.process.workflow_id,
            "item process started"
        );
        self.item.set_status(ItemStatus::New);

        let result = self.drive(work, &token).await;
        match &result {
            Ok(outcome) => info!(
                id = %self.item.id(),
                outcome = %outcome,
                status = %self.item.status(),
                "item process finished"
            ),
            Err(e) => {
                error!(id = %self.item.id(), error = %e, label = e.as_label(), "item process failed");
                self.item.set_status(ItemStatus::Failed);
                self.give_back();
            }
        }

        ItemReport {
            item: self.item,
            process: self.process,
            result,
        }
    }

    async fn drive<W>(&mut self, work: &W, token: &CancellationToken) -> Result<ItemOutcome, ItemError>
    where
        W: ItemWork<T> + ?Sized,
    {
        let register = Signal::register(&RegisterPayload {
            id: self.item.id().to_owned(),
            process: self.process.clone(),
            item: self.snapshot(SignalType::Register)?,
        })?;
        self.send(register)?;
        self.held = Held::Registration;

        let answer = self.await_instruction(SignalType::Register, token).await?;
        if !answer.proceed {
            // the controller already marked the record deregistered
            self.held = Held::Nothing;
            warn!(id = %self.item.id(), reason = %answer.reason, "registration denied by controller");
            self.item.set_status(ItemStatus::Cancelled);
            self.send_update()?;
            return Ok(ItemOutcome::Halted {
                reason: answer.reason,
            });
        }

        if let Some(delay) = self.cfg.settle_delay() {
            info!(id = %self.item.id(), delay = ?delay, "registered; waiting before requesting start");
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = token.cancelled() => return Err(ItemError::Canceled),
            }
        } else {
            info!(id = %self.item.id(), "registered");
        }

        self.send(Signal::start_processing(self.item.id())?)?;
        let answer = self
            .await_instruction(SignalType::StartProcessing, token)
            .await?;
        if !answer.proceed {
            warn!(id = %self.item.id(), reason = %answer.reason, "start processing denied by controller");
            self.item.set_status(ItemStatus::Cancelled);
            self.send_update()?;
            self.send(Signal::deregister(self.item.id())?)?;
            self.held = Held::Nothing;
            return Ok(ItemOutcome::ProcessingDenied {
                reason: answer.reason,
            });
        }
        self.held = Held::Slot;

        info!(id = %self.item.id(), "start approved; processing");
        self.item.set_status(ItemStatus::Processing);
        self.send_update()?;

        let done = AssertUnwindSafe(work.process(&self.item, token.clone()))
            .catch_unwind()
            .await;
        match done {
            Ok(res) => res?,
            Err(payload) => {
                return Err(ItemError::Panicked {
                    info: panic_message(payload.as_ref()),
                });
            }
        }

        info!(id = %self.item.id(), "processing complete; releasing slot");
        self.item.set_status(ItemStatus::Completed);
        self.send_update()?;

        self.send(Signal::stop_processing(self.item.id())?)?;
        self.held = Held::Registration;
        self.send(Signal::deregister(self.item.id())?)?;
        self.held = Held::Nothing;

        Ok(ItemOutcome::Finished)
    }

    /// Waits for the answer to `kind`, ignoring answers addressed to other items.
    async fn await_instruction(
        &mut self,
        kind: SignalType,
        token: &CancellationToken,
    ) -> Result<InstructionResponse, ItemError> {
        loop {
            let msg = tokio::select! {
                msg = self.inbox.recv() => msg,
                _ = token.cancelled() => return Err(ItemError::Canceled),
            };
            let Some(instruction) = msg else {
                return Err(ItemError::InboxClosed { kind });
            };
            if instruction.id != self.item.id() {
                warn!(
                    id = %self.item.id(),
                    got = %instruction.id,
                    "ignoring instruction addressed to another item"
                );
                continue;
            }
            debug!(id = %self.item.id(), signal = %kind, proceed = instruction.proceed, "instruction received");
            return Ok(instruction);
        }
    }

    /// Best-effort release after a failure. Errors are logged only.
    fn give_back(&self) {
        if self.held == Held::Nothing {
            return;
        }
        let id = self.item.id();
        let mut signals = Vec::with_capacity(3);
        match self.snapshot(SignalType::Update) {
            Ok(item) => signals.push(Signal::update(&UpdatePayload {
                id: id.to_owned(),
                item,
            })),
            Err(e) => signals.push(Err(e)),
        }
        if self.held == Held::Slot {
            signals.push(Signal::stop_processing(id));
        }
        signals.push(Signal::deregister(id));

        for signal in signals {
            let res = signal
                .map_err(ItemError::from)
                .and_then(|signal| self.send(signal));
            if let Err(e) = res {
                warn!(id = %id, error = %e, "failed to release after item failure");
            }
        }
    }

    fn send_update(&self) -> Result<(), ItemError> {
        let update = Signal::update(&UpdatePayload {
            id: self.item.id().to_owned(),
            item: self.snapshot(SignalType::Update)?,
        })?;
        self.send(update)
    }

    fn send(&self, signal: Signal) -> Result<(), ItemError> {
        let kind = signal.kind;
        debug!(id = %self.item.id(), signal = %kind, "signalling controller");
        self.router
            .signal_controller(signal)
            .map_err(|source| ItemError::Send { kind, source })
    }

    fn snapshot(&self, kind: SignalType) -> Result<Value, ProtocolError> {
        serde_json::to_value(&self.item).map_err(|source| ProtocolError::PayloadEncode { kind, source })
    }
}

#[cfg(test)]
mod tests {
    use std::future::Ready;
    use std::time::Duration;

    use tokio::task::JoinHandle;

    use super::*;
    use crate::error::DeliveryError;
    use crate::item::work::WorkFn;
    use crate::protocol::{BasicItem, StartProcessingPayload};
    use crate::runtime::Mailbox;

    fn immediate() -> ItemConfig {
        ItemConfig {
            start_delay: Duration::ZERO,
        }
    }

    fn spawn_client<W>(
        router: &Router,
        id: &str,
        work: W,
        token: CancellationToken,
    ) -> (ProcessRef, JoinHandle<ItemReport<BasicItem>>)
    where
        W: ItemWork<BasicItem>,
    {
        let process = ProcessRef::new(format!("item_{id}"), "run");
        let inbox = router.open_inbox(process.clone());
        let client = ItemClient::new(
            BasicItem::new(id, format!("Item-{id}")),
            process.clone(),
            inbox,
            router.clone(),
            immediate(),
        );
        let join = tokio::spawn(async move { client.run(&work, token).await });
        (process, join)
    }

    type OkFn = fn(BasicItem, CancellationToken) -> Ready<Result<(), ItemError>>;

    fn ok_work() -> WorkFn<BasicItem, OkFn> {
        let f: OkFn = |_item, _ctx| std::future::ready(Ok(()));
        WorkFn::new(f)
    }

    async fn next(mailbox: &mut Mailbox) -> Signal {
        mailbox.recv().await.unwrap()
    }

    fn status_of(signal: &Signal) -> String {
        let p: UpdatePayload = signal.decode().unwrap();
        p.item["status"].as_str().unwrap().to_owned()
    }

    #[tokio::test]
    async fn test_happy_path_signal_sequence() {
        let router = Router::new();
        let mut mailbox = router.install_controller().unwrap();
        let (process, join) = spawn_client(&router, "X", ok_work(), CancellationToken::new());

        let register = next(&mut mailbox).await;
        assert_eq!(register.kind, SignalType::Register);
        let p: RegisterPayload = register.decode().unwrap();
        assert_eq!(p.process, process);
        assert_eq!(p.item["status"], "New");
        router
            .signal_item(&process, InstructionResponse::permit("X", "ok"))
            .unwrap();

        let start = next(&mut mailbox).await;
        let p: StartProcessingPayload = start.decode().unwrap();
        assert_eq!(p.id, "X");
        router
            .signal_item(&process, InstructionResponse::permit("X", "go"))
            .unwrap();

        assert_eq!(status_of(&next(&mut mailbox).await), "Processing");
        assert_eq!(status_of(&next(&mut mailbox).await), "Completed");
        assert_eq!(next(&mut mailbox).await.kind, SignalType::StopProcessing);
        assert_eq!(next(&mut mailbox).await.kind, SignalType::Deregister);

        let report = join.await.unwrap();
        assert_eq!(report.result.unwrap(), ItemOutcome::Finished);
        assert_eq!(report.item.status, ItemStatus::Completed);
    }

    #[tokio::test]
    async fn test_register_denied_halts_without_deregister() {
        let router = Router::new();
        let mut mailbox = router.install_controller().unwrap();
        let (process, join) = spawn_client(&router, "Z", ok_work(), CancellationToken::new());

        next(&mut mailbox).await;
        router
            .signal_item(&process, InstructionResponse::deny("Z", "busy"))
            .unwrap();

        let report = join.await.unwrap();
        assert_eq!(
            report.result.unwrap(),
            ItemOutcome::Halted {
                reason: "busy".into()
            }
        );
        assert_eq!(report.item.status, ItemStatus::Cancelled);
        assert_eq!(status_of(&next(&mut mailbox).await), "Cancelled");

        drop(router);
        assert!(mailbox.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_start_denied_deregisters() {
        let router = Router::new();
        let mut mailbox = router.install_controller().unwrap();
        let (process, join) = spawn_client(&router, "Y", ok_work(), CancellationToken::new());

        next(&mut mailbox).await;
        router
            .signal_item(&process, InstructionResponse::permit("Y", "ok"))
            .unwrap();
        next(&mut mailbox).await;
        router
            .signal_item(&process, InstructionResponse::deny("Y", "slot taken"))
            .unwrap();

        let report = join.await.unwrap();
        assert_eq!(report.result.unwrap().as_str(), "Processing denied");
        assert_eq!(status_of(&next(&mut mailbox).await), "Cancelled");
        assert_eq!(next(&mut mailbox).await.kind, SignalType::Deregister);
    }

    #[tokio::test]
    async fn test_foreign_instruction_is_ignored() {
        let router = Router::new();
        let mut mailbox = router.install_controller().unwrap();
        let (process, join) = spawn_client(&router, "X", ok_work(), CancellationToken::new());

        next(&mut mailbox).await;
        router
            .signal_item(&process, InstructionResponse::deny("other", "nope"))
            .unwrap();
        router
            .signal_item(&process, InstructionResponse::permit("X", "ok"))
            .unwrap();

        assert_eq!(next(&mut mailbox).await.kind, SignalType::StartProcessing);
        router
            .signal_item(&process, InstructionResponse::permit("X", "go"))
            .unwrap();
        assert!(join.await.unwrap().result.is_ok());
    }

    #[tokio::test]
    async fn test_work_failure_releases_slot() {
        let router = Router::new();
        let mut mailbox = router.install_controller().unwrap();
        let failing = WorkFn::new(|_item: BasicItem, _ctx: CancellationToken| async {
            Err::<(), _>(ItemError::Work {
                error: "boom".into(),
            })
        });
        let (process, join) = spawn_client(&router, "X", failing, CancellationToken::new());

        next(&mut mailbox).await;
        router
            .signal_item(&process, InstructionResponse::permit("X", "ok"))
            .unwrap();
        next(&mut mailbox).await;
        router
            .signal_item(&process, InstructionResponse::permit("X", "go"))
            .unwrap();

        let report = join.await.unwrap();
        assert!(matches!(report.result, Err(ItemError::Work { .. })));
        assert_eq!(report.item.status, ItemStatus::Failed);

        assert_eq!(status_of(&next(&mut mailbox).await), "Processing");
        assert_eq!(status_of(&next(&mut mailbox).await), "Failed");
        assert_eq!(next(&mut mailbox).await.kind, SignalType::StopProcessing);
        assert_eq!(next(&mut mailbox).await.kind, SignalType::Deregister);
    }

    #[tokio::test]
    async fn test_work_panic_releases_slot() {
        let router = Router::new();
        let mut mailbox = router.install_controller().unwrap();
        let panicking = WorkFn::new(|_item: BasicItem, _ctx: CancellationToken| async {
            if true {
                panic!("work exploded");
            }
            Ok::<(), ItemError>(())
        });
        let (process, join) = spawn_client(&router, "X", panicking, CancellationToken::new());

        next(&mut mailbox).await;
        router
            .signal_item(&process, InstructionResponse::permit("X", "ok"))
            .unwrap();
        next(&mut mailbox).await;
        router
            .signal_item(&process, InstructionResponse::permit("X", "go"))
            .unwrap();

        let report = join.await.unwrap();
        match &report.result {
            Err(ItemError::Panicked { info }) => assert_eq!(info, "work exploded"),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(report.item.status, ItemStatus::Failed);

        assert_eq!(status_of(&next(&mut mailbox).await), "Processing");
        assert_eq!(status_of(&next(&mut mailbox).await), "Failed");
        assert_eq!(next(&mut mailbox).await.kind, SignalType::StopProcessing);
        assert_eq!(next(&mut mailbox).await.kind, SignalType::Deregister);
    }

    #[tokio::test]
    async fn test_cancel_while_waiting_deregisters() {
        let router = Router::new();
        let mut mailbox = router.install_controller().unwrap();
        let token = CancellationToken::new();
        let (_process, join) = spawn_client(&router, "X", ok_work(), token.clone());

        next(&mut mailbox).await;
        token.cancel();

        let report = join.await.unwrap();
        assert!(matches!(report.result, Err(ItemError::Canceled)));
        assert_eq!(status_of(&next(&mut mailbox).await), "Failed");
        assert_eq!(next(&mut mailbox).await.kind, SignalType::Deregister);
    }

    #[tokio::test]
    async fn test_no_controller_fails_on_register() {
        let router = Router::new();
        let (_process, join) = spawn_client(&router, "X", ok_work(), CancellationToken::new());

        let report = join.await.unwrap();
        match report.result {
            Err(ItemError::Send { kind, source }) => {
                assert_eq!(kind, SignalType::Register);
                assert_eq!(source, DeliveryError::ControllerNotRunning);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(report.item.status, ItemStatus::Failed);
    }

    #[test]
    fn test_outcome_labels() {
        assert_eq!(ItemOutcome::Finished.to_string(), "Finished Successfully");
        let halted = ItemOutcome::Halted {
            reason: "busy".into(),
        };
        assert_eq!(halted.as_str(), "Halted by orchestrator");
    }
}
