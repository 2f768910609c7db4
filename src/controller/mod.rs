//! # Singleton controller process.
//!
//! The controller owns the [`ItemRegistry`](crate::ItemRegistry) and serializes every
//! admission decision through one mailbox.
//!
//! ```text
//!  items ──signal_controller()──► Mailbox ──► ControllerEngine (one generation)
//!                                              ├─ dispatch(): registry + answers ──► item inboxes
//!                                              ├─ idle timer: terminate or keep waiting
//!                                              └─ history budget spent ──► checkpoint ──► next generation
//! ```
//!
//! - [`Controller`] installs the mailbox and drives generations.
//! - [`ControllerHandle`] awaits the final [`ControllerState`].
//! - [`ControllerQuery`] reads [`QueryResponse`] snapshots at any time.

pub mod config;

mod core;
mod dispatch;
mod engine;
mod query;
mod state;

pub use config::ControllerConfig;
pub use core::{Controller, ControllerHandle};
pub use dispatch::{REGISTRATION_ACCEPTED, START_PERMITTED};
pub use query::ControllerQuery;
pub use state::{ControllerState, QueryResponse};
