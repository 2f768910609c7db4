//! # Go/no-go instruction sent by the controller to one item process.

use serde::{Deserialize, Serialize};

/// Answer to `Register` and `StartProcessing`, delivered on the item's private inbox.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstructionResponse {
    /// Item the answer refers to.
    pub id: String,
    /// `true` = go, `false` = no-go.
    pub proceed: bool,
    /// Human-readable explanation.
    pub reason: String,
}

impl InstructionResponse {
    /// A "go" instruction.
    pub fn permit(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            proceed: true,
            reason: reason.into(),
        }
    }

    /// A "no-go" instruction.
    pub fn deny(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            proceed: false,
            reason: reason.into(),
        }
    }
}
