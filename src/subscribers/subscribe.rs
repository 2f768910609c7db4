//! # Event subscriber trait.
//!
//! Provides [`Subscribe`], the extension point for observing controller and item events.
//!
//! Each subscriber gets:
//! - **Dedicated worker task** (runs independently)
//! - **Per-subscriber bounded queue** (capacity via [`Subscribe::queue_capacity`])
//! - **Panic isolation** (panics are caught and reported as `EventKind::SubscriberPanicked`)
//!
//! ## Rules
//! - A slow subscriber only affects its own queue.
//! - Queue overflow drops the event for this subscriber only and publishes
//!   `EventKind::SubscriberOverflow`.
//! - Events are processed sequentially (FIFO) per subscriber.
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use slotvisor::{Event, EventKind, Subscribe};
//!
//! struct Denials;
//!
//! #[async_trait]
//! impl Subscribe for Denials {
//!     async fn on_event(&self, ev: &Event) {
//!         if ev.kind == EventKind::InstructionSent && ev.proceed == Some(false) {
//!             // page someone, count it, ...
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str { "denials" }
//! }
//! ```

use async_trait::async_trait;

use crate::events::Event;

/// Observer of runtime events.
///
/// Called from a subscriber-dedicated worker task, never from the controller loop,
/// so a slow subscriber cannot delay admission decisions.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Processes a single event.
    async fn on_event(&self, event: &Event);

    /// Name used in overflow/panic events.
    ///
    /// The default uses `type_name::<Self>()`, which can be verbose.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Preferred queue capacity (clamped to a minimum of 1).
    ///
    /// Default: 1024.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
