//! In-process execution substrate.
//!
//! The controller and every item process run as independent tokio tasks that only
//! talk through this module:
//! - [`ProcessRef`] routing handle of one item process instance;
//! - [`Router`] delivers signals to the controller mailbox and instructions to item inboxes;
//! - [`HistoryBudget`] tells a controller generation when to compact ("continue as new").
//!
//! ## Delivery contract
//! ```text
//! item A ──┐                                  ┌──► inbox(A)
//! item B ──┼──► Router ──► controller mailbox │
//! item N ──┘      (FIFO per sender)           └──► inbox(N)    (controller ──► item, FIFO)
//! ```
//! - Signals from one sender reach one receiver in send order.
//! - No ordering across senders.
//! - A signal accepted by [`Router::signal_controller`] is never dropped: it is
//!   handled by the current controller generation or by the next one after compaction.

mod history;
mod process;
mod router;

pub use history::HistoryBudget;
pub use process::ProcessRef;
pub use router::{Mailbox, Router};

pub(crate) use router::Retirement;
