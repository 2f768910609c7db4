//! Runtime events: types and broadcast bus.
//!
//! The controller, the orchestrator and the subscriber workers publish [`Event`]s on a
//! [`Bus`]. Events describe what happened (a signal handled, an instruction sent, the
//! controller compacting or terminating); they are observation only and never feed
//! back into the protocol.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] classification and metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
