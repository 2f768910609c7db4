//! # Routing handle of an item process.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Process identifier + instance identifier.
///
/// Serializes as `itemWorkflowId` / `itemWorkflowRunId`, the names existing
/// consumers of the query endpoint read.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProcessRef {
    /// Stable process identifier.
    #[serde(rename = "itemWorkflowId")]
    pub workflow_id: String,
    /// Identifier of this particular run of the process.
    #[serde(rename = "itemWorkflowRunId")]
    pub run_id: String,
}

impl ProcessRef {
    pub fn new(workflow_id: impl Into<String>, run_id: impl Into<String>) -> Self {
        Self {
            workflow_id: workflow_id.into(),
            run_id: run_id.into(),
        }
    }

    /// Allocates a fresh handle for an item process: `item_<id>_<uuid>` plus a random run id.
    pub fn for_item(item_id: &str) -> Self {
        Self {
            workflow_id: format!("item_{item_id}_{}", Uuid::new_v4()),
            run_id: Uuid::new_v4().to_string(),
        }
    }
}

impl fmt::Display for ProcessRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.workflow_id, self.run_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_item_is_unique_per_call() {
        let a = ProcessRef::for_item("9");
        let b = ProcessRef::for_item("9");
        assert!(a.workflow_id.starts_with("item_9_"));
        assert_ne!(a, b);
    }
}
