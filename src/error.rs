//! Error types used by the slotvisor registry, protocol, substrate and item clients.
//!
//! - [`RegistryError`] — admission and lookup failures of the item registry (local, never fatal).
//! - [`ProtocolError`] — malformed payload for a declared signal type (signal is dropped).
//! - [`DeliveryError`] — an outbound signal could not be handed to its receiver.
//! - [`RuntimeError`] — substrate failures that terminate the controller process.
//! - [`ItemError`] — failures that end an item process with status `Failed`.
//!
//! Every enum provides `as_label` (short snake_case label for logs/metrics).

use std::any::Any;

use thiserror::Error;

use crate::protocol::SignalType;
use crate::registry::RegistrationRecord;

/// # Errors produced by the item registry.
///
/// Both variants are local: the controller turns them into `proceed = false`
/// instructions where the protocol expects an answer.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegistryError {
    /// The operation referenced an id the registry has never seen.
    #[error("item not registered")]
    NotRegistered,

    /// Another live item holds the processing slot.
    ///
    /// `record` is the (unmodified) record of the requesting item when one exists,
    /// so the caller can still address a response to it.
    #[error("another item already in progress")]
    AdmissionDenied {
        /// Stored record of the denied item.
        record: Option<Box<RegistrationRecord>>,
    },
}

impl RegistryError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use slotvisor::RegistryError;
    ///
    /// assert_eq!(RegistryError::NotRegistered.as_label(), "registry_not_registered");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RegistryError::NotRegistered => "registry_not_registered",
            RegistryError::AdmissionDenied { .. } => "registry_admission_denied",
        }
    }

    /// True for [`RegistryError::AdmissionDenied`].
    pub fn is_admission_denied(&self) -> bool {
        matches!(self, RegistryError::AdmissionDenied { .. })
    }
}

/// # Errors produced while interpreting a signal payload.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// Payload does not match the shape expected for its declared type.
    #[error("failed to decode {kind} payload: {source}")]
    PayloadDecode {
        /// Declared signal type.
        kind: SignalType,
        /// Underlying decode error.
        #[source]
        source: serde_json::Error,
    },

    /// Payload could not be encoded into the envelope.
    #[error("failed to encode {kind} payload: {source}")]
    PayloadEncode {
        /// Signal type being built.
        kind: SignalType,
        /// Underlying encode error.
        #[source]
        source: serde_json::Error,
    },
}

impl ProtocolError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ProtocolError::PayloadDecode { .. } => "protocol_payload_decode",
            ProtocolError::PayloadEncode { .. } => "protocol_payload_encode",
        }
    }
}

/// # Errors produced when handing a signal to its receiver.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    /// No controller process is currently accepting signals.
    #[error("controller not running")]
    ControllerNotRunning,

    /// No item process is known under this routing handle.
    #[error("unknown item process {workflow_id}/{run_id}")]
    UnknownProcess {
        /// Process identifier.
        workflow_id: String,
        /// Instance identifier.
        run_id: String,
    },

    /// The item process exists but no longer receives instructions.
    #[error("inbox of item process {workflow_id} is closed")]
    InboxClosed {
        /// Process identifier.
        workflow_id: String,
    },
}

impl DeliveryError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            DeliveryError::ControllerNotRunning => "delivery_controller_not_running",
            DeliveryError::UnknownProcess { .. } => "delivery_unknown_process",
            DeliveryError::InboxClosed { .. } => "delivery_inbox_closed",
        }
    }
}

/// # Substrate failures fatal to the controller process.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// A controller generation is already installed; the singleton cannot start twice.
    #[error("controller already running")]
    AlreadyRunning,

    /// The controller mailbox closed while the controller was still running.
    #[error("controller mailbox closed")]
    MailboxClosed,

    /// State could not be checkpointed or restored across compaction.
    #[error("checkpoint failed: {0}")]
    Checkpoint(#[from] serde_json::Error),

    /// The controller task panicked or was aborted.
    #[error("controller task failed: {0}")]
    Join(String),

    /// A startup signal could not reach the controller.
    #[error(transparent)]
    Delivery(#[from] DeliveryError),

    /// Item processes did not stop within the shutdown grace period.
    #[error("shutdown grace {grace:?} exceeded; {stuck} item process(es) still running")]
    GraceExceeded {
        /// Configured grace period.
        grace: std::time::Duration,
        /// Item processes still alive when the grace expired.
        stuck: usize,
    },

    /// OS signal handlers could not be installed.
    #[error("failed to listen for OS signals: {0}")]
    Signal(#[source] std::io::Error),
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use slotvisor::RuntimeError;
    ///
    /// assert_eq!(RuntimeError::MailboxClosed.as_label(), "runtime_mailbox_closed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::AlreadyRunning => "runtime_already_running",
            RuntimeError::MailboxClosed => "runtime_mailbox_closed",
            RuntimeError::Checkpoint(_) => "runtime_checkpoint",
            RuntimeError::Join(_) => "runtime_join",
            RuntimeError::Delivery(_) => "runtime_delivery",
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
            RuntimeError::Signal(_) => "runtime_signal",
        }
    }
}

/// # Failures that end an item process.
///
/// A no-go instruction is **not** an error; it ends the process with a
/// [`ItemOutcome`](crate::ItemOutcome) instead.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ItemError {
    /// A signal to the controller could not be delivered.
    #[error("failed to send {kind} signal: {source}")]
    Send {
        /// Signal that failed.
        kind: SignalType,
        /// Delivery failure.
        #[source]
        source: DeliveryError,
    },

    /// A signal could not be built from the item snapshot.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The private instruction inbox closed before an answer arrived.
    #[error("instruction inbox closed while waiting for {kind} answer")]
    InboxClosed {
        /// Signal whose answer was awaited.
        kind: SignalType,
    },

    /// The item's unit of work failed.
    #[error("work failed: {error}")]
    Work {
        /// The underlying error message.
        error: String,
    },

    /// The item's unit of work panicked.
    #[error("work panicked: {info}")]
    Panicked {
        /// Panic message, if it was a string.
        info: String,
    },

    /// The item process was cancelled by runtime shutdown.
    #[error("context cancelled")]
    Canceled,
}

impl ItemError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ItemError::Send { .. } => "item_send",
            ItemError::Protocol(_) => "item_protocol",
            ItemError::InboxClosed { .. } => "item_inbox_closed",
            ItemError::Work { .. } => "item_work",
            ItemError::Panicked { .. } => "item_panicked",
            ItemError::Canceled => "item_canceled",
        }
    }
}

/// Message of a panic payload caught with `catch_unwind`.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_owned()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panic_message_from_payloads() {
        let literal: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(literal.as_ref()), "boom");

        let formatted: Box<dyn Any + Send> = Box::new(format!("item {} failed", 7));
        assert_eq!(panic_message(formatted.as_ref()), "item 7 failed");

        let other: Box<dyn Any + Send> = Box::new(42_u8);
        assert_eq!(panic_message(other.as_ref()), "unknown panic");
    }

    #[test]
    fn test_panicked_item_error_label() {
        let err = ItemError::Panicked {
            info: "boom".into(),
        };
        assert_eq!(err.as_label(), "item_panicked");
        assert_eq!(err.to_string(), "work panicked: boom");
    }
}
