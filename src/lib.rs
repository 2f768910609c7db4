//! # slotvisor
//!
//! **Slotvisor** admits work items one at a time. A singleton controller owns a registry
//! of items and grants a single processing slot; item processes register, ask to start,
//! report progress and release the slot through fire-and-forget signals.
//!
//! ## Architecture
//! ```text
//!   ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!   │  ItemClient  │   │  ItemClient  │   │  ItemClient  │
//!   │  (item X)    │   │  (item Y)    │   │  (item Z)    │
//!   └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!          │ Register / StartProcessing / Update / StopProcessing / Deregister
//!          ▼                  ▼                  ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Router                                                     │
//! │  - controller mailbox (unbounded FIFO, one live controller) │
//! │  - item inboxes (one per ProcessRef)                        │
//! └──────────────────────────┬──────────────────────────────────┘
//!                            ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Controller (generations over one mailbox)                  │
//! │  - ControllerEngine: signal vs idle timer                   │
//! │  - ItemRegistry: single-slot admission                      │
//! │  - HistoryBudget: continue-as-new with checkpointed state   │
//! └───────┬──────────────────────────────┬──────────────────────┘
//!         │ InstructionResponse          │ Event
//!         ▼                              ▼
//!    item inboxes                 Bus ──► SubscriberSet ──► Subscribe::on_event
//! ```
//!
//! ### Item lifecycle
//! ```text
//! New ──Register──► (denied) ──► Cancelled                       "Halted by orchestrator"
//!      │ accepted
//!      └─StartProcessing──► (denied) ──► Cancelled, Deregister   "Processing denied"
//!                 │ permitted
//!                 └─► Processing ──work──► Completed ──► StopProcessing ──► Deregister
//!                                                                  "Finished Successfully"
//! ```
//!
//! ## Features
//! | Area              | Description                                              | Key types / traits                          |
//! |-------------------|----------------------------------------------------------|---------------------------------------------|
//! | **Orchestration** | Start the controller, spawn item processes, shut down.  | [`Orchestrator`], [`OrchestratorConfig`]    |
//! | **Controller**    | Singleton admission loop with idle termination.          | [`Controller`], [`ControllerQuery`]         |
//! | **Registry**      | Single-slot admission over registration records.         | [`ItemRegistry`], [`RegistrationRecord`]    |
//! | **Protocol**      | Signal envelope, payloads, go/no-go instructions.        | [`Signal`], [`SignalType`], [`InstructionResponse`] |
//! | **Items**         | Generic item client and the work it runs.                | [`ItemClient`], [`ItemWork`], [`WorkFn`]    |
//! | **Subscriber API**| Observe controller and item events.                      | [`Subscribe`], [`Event`]                    |
//! | **Errors**        | Typed errors per concern.                                | [`RegistryError`], [`RuntimeError`], [`ItemError`] |
//!
//! ## Optional features
//! - `logging`: exports [`LogWriter`], a subscriber that renders events through `tracing`.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use slotvisor::{BasicItem, ItemOutcome, Orchestrator, OrchestratorConfig, SleepWork};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut cfg = OrchestratorConfig::default();
//!     cfg.controller.idle_timeout = Duration::from_millis(50);
//!     cfg.item.start_delay = Duration::ZERO;
//!
//!     let orch = Orchestrator::builder(cfg).build();
//!     let x = orch
//!         .start_item(BasicItem::new("x", "Item-x"), SleepWork::new(Duration::from_millis(10)))
//!         .await?;
//!
//!     let report = x.await?;
//!     assert_eq!(report.result?, ItemOutcome::Finished);
//!
//!     let state = orch.run_until_idle().await?.unwrap_or_default();
//!     assert_eq!(state.registry.registered_count(), 0);
//!     Ok(())
//! }
//! ```

mod controller;
mod core;
mod error;
mod events;
mod item;
mod protocol;
mod registry;
mod runtime;
mod subscribers;

// ---- Public re-exports ----

pub use controller::{
    Controller, ControllerConfig, ControllerHandle, ControllerQuery, ControllerState,
    QueryResponse, REGISTRATION_ACCEPTED, START_PERMITTED,
};
pub use core::{Orchestrator, OrchestratorBuilder, OrchestratorConfig};
pub use error::{DeliveryError, ItemError, ProtocolError, RegistryError, RuntimeError};
pub use events::{Bus, Event, EventKind};
pub use item::{ItemClient, ItemConfig, ItemOutcome, ItemReport, ItemWork, SleepWork, WorkFn};
pub use protocol::{
    BasicItem, DeregisterPayload, InstructionResponse, Item, ItemA, ItemB, ItemStatus,
    RegisterPayload, Signal, SignalType, StartProcessingPayload, StopProcessingPayload,
    UpdatePayload,
};
pub use registry::{ItemRegistry, RegistrationRecord};
pub use runtime::{HistoryBudget, Mailbox, ProcessRef, Router};
pub use subscribers::{Subscribe, SubscriberSet};

// Optional: a built-in subscriber that logs events through `tracing`.
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
