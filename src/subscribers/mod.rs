//! # Event subscribers.
//!
//! ```text
//! Controller / Orchestrator ── publish(Event) ──► Bus ──► listener ──► SubscriberSet::emit(&Event)
//!                                                                        ├──► [queue] ─► LogWriter
//!                                                                        └──► [queue] ─► custom ...
//! ```

#[cfg(feature = "logging")]
mod log;
mod set;
mod subscribe;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use set::SubscriberSet;
pub use subscribe::Subscribe;
