//! # Item registry: id → registration record, single-slot admission.
//!
//! The registry is plain data with synchronous transitions. It is owned by the
//! controller loop and mutated through `&mut self` only, so it needs no lock.
//!
//! ## Invariants
//! - At most one record is `in_progress && !deregistered` (the admission invariant).
//! - `deregistered` never goes back from `true` to `false`; only re-registration replaces the record.
//! - Ids are unique; registering an existing id replaces its record after the admission check.
//! - Records are never removed (kept for query/audit).
//!
//! ## Transitions
//! ```text
//! register(id)          ── slot held by other ──► stored deregistered, AdmissionDenied
//!                       └─ otherwise ───────────► stored {in_progress: false, deregistered: false}
//! start_processing(id)  ── unknown ─────────────► NotRegistered
//!                       ── slot held by other ──► AdmissionDenied(record unchanged)
//!                       └─ otherwise ───────────► in_progress = true
//! stop_processing(id)   ──────────────────────► in_progress = false
//! update(id, payload)   ──────────────────────► payload replaced
//! deregister(id)        ──────────────────────► deregistered = true
//! ```

mod record;
mod store;

pub use record::RegistrationRecord;
pub use store::ItemRegistry;
