//! Signal protocol: the vocabulary exchanged between the controller and item processes.
//!
//! Pure data contracts, no behavior. The [`Signal`] envelope carries a declared
//! [`SignalType`] and an opaque JSON payload that the receiver re-interprets for
//! that type; a mismatch is a local [`ProtocolError`](crate::ProtocolError), never
//! a reason to stop the receiver.
//!
//! ## Exchange
//! ```text
//! item ── Register{id, ref, item} ─────────► controller ── InstructionResponse ──► item
//! item ── StartProcessing{id} ─────────────► controller ── InstructionResponse ──► item
//! item ── Update{id, item} ────────────────► controller            (no answer)
//! item ── StopProcessing{id} ──────────────► controller            (no answer)
//! item ── Deregister{id} ──────────────────► controller            (no answer)
//! anyone ── Ping ──────────────────────────► controller            (no answer)
//! ```

mod instruction;
mod item;
mod payload;
mod signal;

pub use instruction::InstructionResponse;
pub use item::{BasicItem, Item, ItemA, ItemB, ItemStatus};
pub use payload::{
    DeregisterPayload, RegisterPayload, StartProcessingPayload, StopProcessingPayload,
    UpdatePayload,
};
pub use signal::{Signal, SignalType};
