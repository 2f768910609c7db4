//! Typed payloads carried inside a [`Signal`](super::Signal).
//!
//! Field names are part of the wire contract (`itemWorkflowId`, `itemWorkflowRunId`, ...).

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::runtime::ProcessRef;

/// Payload of [`SignalType::Register`](super::SignalType::Register).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RegisterPayload {
    /// Item identifier.
    pub id: String,
    /// Routing handle of the registering item process.
    #[serde(flatten)]
    pub process: ProcessRef,
    /// Opaque item snapshot.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub item: Value,
}

/// Payload of [`SignalType::Deregister`](super::SignalType::Deregister).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeregisterPayload {
    pub id: String,
}

/// Payload of [`SignalType::StartProcessing`](super::SignalType::StartProcessing).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartProcessingPayload {
    pub id: String,
}

/// Payload of [`SignalType::StopProcessing`](super::SignalType::StopProcessing).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopProcessingPayload {
    pub id: String,
}

/// Payload of [`SignalType::Update`](super::SignalType::Update).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UpdatePayload {
    /// Item identifier.
    pub id: String,
    /// New opaque item snapshot.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub item: Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_register_payload_flattens_process_ref() {
        let p = RegisterPayload {
            id: "42".into(),
            process: ProcessRef::new("item_42_a", "run-1"),
            item: json!({"name": "Item-42"}),
        };
        let v = serde_json::to_value(&p).unwrap();
        assert_eq!(
            v,
            json!({
                "id": "42",
                "itemWorkflowId": "item_42_a",
                "itemWorkflowRunId": "run-1",
                "item": {"name": "Item-42"}
            })
        );
        let back: RegisterPayload = serde_json::from_value(v).unwrap();
        assert_eq!(back, p);
    }

    #[test]
    fn test_item_is_optional() {
        let p: RegisterPayload = serde_json::from_value(json!({
            "id": "1",
            "itemWorkflowId": "w",
            "itemWorkflowRunId": "r"
        }))
        .unwrap();
        assert!(p.item.is_null());

        let u: UpdatePayload = serde_json::from_value(json!({"id": "1"})).unwrap();
        assert!(u.item.is_null());
    }
}
