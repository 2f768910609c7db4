//! # Durable controller state.
//!
//! [`ControllerState`] is everything the controller must keep across compaction:
//! the signal counter and the registry. It is checkpointed verbatim as JSON.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::registry::{ItemRegistry, RegistrationRecord};

/// Signal counter + item registry.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControllerState {
    /// Signals received over the controller's whole life (all generations).
    pub signals_handled: u64,
    /// Every item ever registered.
    pub registry: ItemRegistry,
}

impl ControllerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Encodes the state for a restart with fresh history.
    pub fn checkpoint(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Decodes a state produced by [`checkpoint`](Self::checkpoint).
    pub fn restore(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    /// Point-in-time answer to the controller query.
    pub fn query(&self) -> QueryResponse {
        QueryResponse {
            total_items: self.registry.len(),
            orchestrated_items: self.registry.all_items().clone(),
            signals_handled: self.signals_handled,
        }
    }
}

/// Result of the controller query.
///
/// Serializes as `{totalItems, orchestratedItems, signalsHandled}`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResponse {
    pub total_items: usize,
    pub orchestrated_items: BTreeMap<String, RegistrationRecord>,
    pub signals_handled: u64,
}
