use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::runtime::ProcessRef;

/// Registration state of one item.
///
/// Serializes as `{id, itemWorkflowId, itemWorkflowRunId, inProgress, deregistered, payload}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRecord {
    /// Stable external identity.
    pub id: String,
    /// Where instructions for this item are sent.
    #[serde(flatten)]
    pub process: ProcessRef,
    /// Holds (or held, if deregistered) the processing slot.
    pub in_progress: bool,
    /// Finished from the registry's perspective.
    pub deregistered: bool,
    /// Last snapshot reported by the item process.
    #[serde(default)]
    pub payload: Value,
}

impl RegistrationRecord {
    /// A fresh, live record that does not hold the slot.
    pub fn new(id: impl Into<String>, process: ProcessRef, payload: Value) -> Self {
        Self {
            id: id.into(),
            process,
            in_progress: false,
            deregistered: false,
            payload,
        }
    }

    /// True if this record currently holds the processing slot.
    #[inline]
    pub fn holds_slot(&self) -> bool {
        self.in_progress && !self.deregistered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wire_shape_is_stable() {
        let rec = RegistrationRecord::new(
            "A1",
            ProcessRef::new("item_A1_u", "r1"),
            json!({"status": "New"}),
        );
        assert_eq!(
            serde_json::to_value(&rec).unwrap(),
            json!({
                "id": "A1",
                "itemWorkflowId": "item_A1_u",
                "itemWorkflowRunId": "r1",
                "inProgress": false,
                "deregistered": false,
                "payload": {"status": "New"}
            })
        );
    }
}
