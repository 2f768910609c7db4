//! # Signal envelope.
//!
//! A [`Signal`] is `{ "type": ..., "payload": ... }` on the wire. The payload is kept
//! as an opaque [`serde_json::Value`] until the handler for the declared type decodes
//! it with [`Signal::decode`].
//!
//! Unknown type names deserialize to [`SignalType::Unknown`] so that a newer sender
//! cannot break an older controller.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ProtocolError;

use super::payload::{
    DeregisterPayload, RegisterPayload, StartProcessingPayload, StopProcessingPayload,
    UpdatePayload,
};

/// Declared type of a [`Signal`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SignalType {
    /// Register an item (answered).
    Register,
    /// Deregister an item (not answered).
    Deregister,
    /// Ask permission to start processing (answered).
    StartProcessing,
    /// Release the processing slot (not answered).
    StopProcessing,
    /// Replace the stored item snapshot (not answered).
    Update,
    /// Liveness probe; also used to lazily start the controller.
    Ping,
    /// Any type name this build does not know.
    #[serde(other)]
    Unknown,
}

impl SignalType {
    /// Wire name of the type.
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalType::Register => "register",
            SignalType::Deregister => "deregister",
            SignalType::StartProcessing => "start-processing",
            SignalType::StopProcessing => "stop-processing",
            SignalType::Update => "update",
            SignalType::Ping => "ping",
            SignalType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for SignalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed envelope delivered to the controller mailbox.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    /// Declared payload type.
    #[serde(rename = "type")]
    pub kind: SignalType,
    /// Opaque payload, decoded per `kind`.
    #[serde(default)]
    pub payload: Value,
}

impl Signal {
    /// Builds a signal by encoding `payload` for the given type.
    pub fn new<P: Serialize>(kind: SignalType, payload: &P) -> Result<Self, ProtocolError> {
        let payload = serde_json::to_value(payload)
            .map_err(|source| ProtocolError::PayloadEncode { kind, source })?;
        Ok(Self { kind, payload })
    }

    /// Builds a signal from an already-encoded payload.
    pub fn raw(kind: SignalType, payload: Value) -> Self {
        Self { kind, payload }
    }

    /// `Ping` carries no payload.
    pub fn ping() -> Self {
        Self::raw(SignalType::Ping, Value::Null)
    }

    pub fn register(payload: &RegisterPayload) -> Result<Self, ProtocolError> {
        Self::new(SignalType::Register, payload)
    }

    pub fn start_processing(id: impl Into<String>) -> Result<Self, ProtocolError> {
        Self::new(
            SignalType::StartProcessing,
            &StartProcessingPayload { id: id.into() },
        )
    }

    pub fn stop_processing(id: impl Into<String>) -> Result<Self, ProtocolError> {
        Self::new(
            SignalType::StopProcessing,
            &StopProcessingPayload { id: id.into() },
        )
    }

    pub fn deregister(id: impl Into<String>) -> Result<Self, ProtocolError> {
        Self::new(SignalType::Deregister, &DeregisterPayload { id: id.into() })
    }

    pub fn update(payload: &UpdatePayload) -> Result<Self, ProtocolError> {
        Self::new(SignalType::Update, payload)
    }

    /// Re-interprets the payload as `P`.
    ///
    /// Fails softly with [`ProtocolError::PayloadDecode`]; the envelope is left untouched.
    pub fn decode<P: DeserializeOwned>(&self) -> Result<P, ProtocolError> {
        P::deserialize(&self.payload).map_err(|source| ProtocolError::PayloadDecode {
            kind: self.kind,
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_type_names_match_wire() {
        let sig: Signal =
            serde_json::from_value(json!({"type": "start-processing", "payload": {"id": "x"}}))
                .unwrap();
        assert_eq!(sig.kind, SignalType::StartProcessing);

        let encoded = serde_json::to_value(Signal::stop_processing("x").unwrap()).unwrap();
        assert_eq!(encoded["type"], "stop-processing");
        assert_eq!(encoded["payload"]["id"], "x");
    }

    #[test]
    fn test_unknown_type_is_representable() {
        let sig: Signal =
            serde_json::from_value(json!({"type": "reboot", "payload": null})).unwrap();
        assert_eq!(sig.kind, SignalType::Unknown);
    }

    #[test]
    fn test_missing_payload_defaults_to_null() {
        let sig: Signal = serde_json::from_value(json!({"type": "ping"})).unwrap();
        assert_eq!(sig, Signal::ping());
    }

    #[test]
    fn test_mismatched_payload_fails_softly() {
        let sig = Signal::raw(SignalType::Register, json!({"id": 42}));
        let err = sig.decode::<RegisterPayload>().unwrap_err();
        assert_eq!(err.as_label(), "protocol_payload_decode");
        assert!(err.to_string().starts_with("failed to decode register payload"));
        // envelope still intact
        assert_eq!(sig.payload, json!({"id": 42}));
    }
}
