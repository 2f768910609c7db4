use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::RegistryError;
use crate::runtime::ProcessRef;

use super::RegistrationRecord;

/// Registry of every item the controller has seen.
///
/// Serializes as a plain `id → record` map.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemRegistry {
    items: BTreeMap<String, RegistrationRecord>,
}

impl ItemRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or re-registers) an item.
    ///
    /// When another live item holds the slot the record is still stored, but already
    /// deregistered, so a denied registrant never blocks later admission checks.
    pub fn register(
        &mut self,
        id: &str,
        process: ProcessRef,
        payload: Value,
    ) -> Result<(), RegistryError> {
        let mut record = RegistrationRecord::new(id, process, payload);
        if self.slot_held_by_other(id) {
            record.deregistered = true;
            self.items.insert(id.to_owned(), record.clone());
            return Err(RegistryError::AdmissionDenied {
                record: Some(Box::new(record)),
            });
        }
        self.items.insert(id.to_owned(), record);
        Ok(())
    }

    /// Claims the processing slot for `id`.
    ///
    /// On `AdmissionDenied` the requesting record is returned inside the error, unmodified.
    pub fn start_processing(&mut self, id: &str) -> Result<RegistrationRecord, RegistryError> {
        let Some(record) = self.items.get(id) else {
            return Err(RegistryError::NotRegistered);
        };
        if self.slot_held_by_other(id) {
            return Err(RegistryError::AdmissionDenied {
                record: Some(Box::new(record.clone())),
            });
        }
        let record = self.get_mut(id)?;
        record.in_progress = true;
        Ok(record.clone())
    }

    /// Releases the processing slot held by `id`.
    pub fn stop_processing(&mut self, id: &str) -> Result<RegistrationRecord, RegistryError> {
        let record = self.get_mut(id)?;
        record.in_progress = false;
        Ok(record.clone())
    }

    /// Replaces the stored snapshot of `id`.
    pub fn update(&mut self, id: &str, payload: Value) -> Result<(), RegistryError> {
        self.get_mut(id)?.payload = payload;
        Ok(())
    }

    /// Marks `id` as finished.
    pub fn deregister(&mut self, id: &str) -> Result<(), RegistryError> {
        self.get_mut(id)?.deregistered = true;
        Ok(())
    }

    /// Every record, deregistered ones included.
    pub fn all_items(&self) -> &BTreeMap<String, RegistrationRecord> {
        &self.items
    }

    /// Records that are not deregistered.
    pub fn registered_items(&self) -> BTreeMap<String, RegistrationRecord> {
        self.items
            .iter()
            .filter(|(_, r)| !r.deregistered)
            .map(|(id, r)| (id.clone(), r.clone()))
            .collect()
    }

    /// Number of records that are not deregistered.
    pub fn registered_count(&self) -> usize {
        self.items.values().filter(|r| !r.deregistered).count()
    }

    /// The record holding the slot, if any.
    ///
    /// Scan order does not matter: the admission invariant allows at most one match.
    pub fn item_in_progress(&self) -> Option<&RegistrationRecord> {
        self.items.values().find(|r| r.holds_slot())
    }

    pub fn get(&self, id: &str) -> Option<&RegistrationRecord> {
        self.items.get(id)
    }

    /// Total number of records.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn slot_held_by_other(&self, id: &str) -> bool {
        self.item_in_progress().is_some_and(|holder| holder.id != id)
    }

    fn get_mut(&mut self, id: &str) -> Result<&mut RegistrationRecord, RegistryError> {
        self.items.get_mut(id).ok_or(RegistryError::NotRegistered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn proc(id: &str) -> ProcessRef {
        ProcessRef::new(format!("item_{id}"), "run")
    }

    fn register(reg: &mut ItemRegistry, id: &str) -> Result<(), RegistryError> {
        reg.register(id, proc(id), json!({"id": id}))
    }

    #[test]
    fn test_register_free_slot() {
        let mut reg = ItemRegistry::new();
        register(&mut reg, "X").unwrap();

        let x = reg.get("X").unwrap();
        assert!(!x.in_progress);
        assert!(!x.deregistered);
        assert_eq!(reg.registered_count(), 1);
    }

    #[test]
    fn test_second_start_denied_before_first_stops() {
        let mut reg = ItemRegistry::new();
        register(&mut reg, "X").unwrap();
        register(&mut reg, "Y").unwrap();

        let x = reg.start_processing("X").unwrap();
        assert!(x.in_progress);

        let err = reg.start_processing("Y").unwrap_err();
        match err {
            RegistryError::AdmissionDenied { record: Some(y) } => {
                assert_eq!(y.id, "Y");
                assert!(!y.in_progress);
            }
            other => panic!("unexpected {other:?}"),
        }
        let y = reg.get("Y").unwrap();
        assert!(!y.in_progress);
        assert!(!y.deregistered);
    }

    #[test]
    fn test_register_while_slot_held_is_denied_and_deregistered() {
        let mut reg = ItemRegistry::new();
        register(&mut reg, "X").unwrap();
        reg.start_processing("X").unwrap();

        let err = register(&mut reg, "Z").unwrap_err();
        assert!(err.is_admission_denied());
        assert!(reg.get("Z").unwrap().deregistered);
        assert!(!reg.registered_items().contains_key("Z"));
        assert_eq!(reg.all_items().len(), 2);
    }

    #[test]
    fn test_start_unknown_creates_nothing() {
        let mut reg = ItemRegistry::new();
        assert_eq!(
            reg.start_processing("unknown"),
            Err(RegistryError::NotRegistered)
        );
        assert!(reg.is_empty());
    }

    #[test]
    fn test_reregister_replaces_deregistered_record() {
        let mut reg = ItemRegistry::new();
        register(&mut reg, "X").unwrap();
        reg.start_processing("X").unwrap();
        reg.update("X", json!({"status": "Completed"})).unwrap();
        reg.deregister("X").unwrap();

        reg.register("X", ProcessRef::new("item_X", "run-2"), json!({"v": 2}))
            .unwrap();
        let x = reg.get("X").unwrap();
        assert!(!x.in_progress);
        assert!(!x.deregistered);
        assert_eq!(x.process.run_id, "run-2");
        assert_eq!(x.payload, json!({"v": 2}));
    }

    #[test]
    fn test_holder_may_reregister_itself() {
        let mut reg = ItemRegistry::new();
        register(&mut reg, "X").unwrap();
        reg.start_processing("X").unwrap();

        register(&mut reg, "X").unwrap();
        assert!(reg.item_in_progress().is_none());
    }

    #[test]
    fn test_stop_releases_slot() {
        let mut reg = ItemRegistry::new();
        register(&mut reg, "X").unwrap();
        register(&mut reg, "Y").unwrap();
        reg.start_processing("X").unwrap();

        let x = reg.stop_processing("X").unwrap();
        assert!(!x.in_progress);
        assert!(reg.start_processing("Y").is_ok());
        assert_eq!(reg.item_in_progress().map(|r| r.id.as_str()), Some("Y"));
    }

    #[test]
    fn test_deregistered_holder_frees_slot() {
        let mut reg = ItemRegistry::new();
        register(&mut reg, "X").unwrap();
        reg.start_processing("X").unwrap();
        reg.deregister("X").unwrap();

        assert!(reg.item_in_progress().is_none());
        register(&mut reg, "Y").unwrap();
        assert!(reg.start_processing("Y").is_ok());
    }

    #[test]
    fn test_unknown_id_operations() {
        let mut reg = ItemRegistry::new();
        assert_eq!(reg.stop_processing("a"), Err(RegistryError::NotRegistered));
        assert_eq!(reg.update("a", json!(1)), Err(RegistryError::NotRegistered));
        assert_eq!(reg.deregister("a"), Err(RegistryError::NotRegistered));
        assert!(reg.is_empty());
    }

    #[test]
    fn test_serializes_as_plain_map() {
        let mut reg = ItemRegistry::new();
        register(&mut reg, "X").unwrap();
        let v = serde_json::to_value(&reg).unwrap();
        assert_eq!(v["X"]["itemWorkflowId"], "item_X");

        let back: ItemRegistry = serde_json::from_value(v).unwrap();
        assert_eq!(back, reg);
    }
}
