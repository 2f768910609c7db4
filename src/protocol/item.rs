//! # Item snapshots.
//!
//! The controller never looks inside an item: it stores whatever the item process
//! last reported as an opaque JSON value. Item processes, on the other hand, work
//! with a concrete type implementing [`Item`], which is all the generic
//! [`ItemClient`](crate::ItemClient) needs.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Local status of an item process.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemStatus {
    #[default]
    New,
    Processing,
    Completed,
    Failed,
    Cancelled,
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::New => "New",
            ItemStatus::Processing => "Processing",
            ItemStatus::Completed => "Completed",
            ItemStatus::Failed => "Failed",
            ItemStatus::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An item competing for the processing slot.
///
/// The snapshot sent to the controller is the serde encoding of the whole value.
pub trait Item: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Stable external identity.
    fn id(&self) -> &str;

    /// Display name.
    fn name(&self) -> &str;

    /// Current local status.
    fn status(&self) -> ItemStatus;

    /// Replaces the local status.
    fn set_status(&mut self, status: ItemStatus);
}

/// Minimal item: identity, name and status.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicItem {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub status: ItemStatus,
}

impl BasicItem {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            status: ItemStatus::New,
        }
    }
}

impl Item for BasicItem {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn status(&self) -> ItemStatus {
        self.status
    }

    fn set_status(&mut self, status: ItemStatus) {
        self.status = status;
    }
}

/// Item kind "A".
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemA {
    #[serde(flatten)]
    pub basic: BasicItem,
    pub extra_field_a: String,
}

/// Item kind "B".
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemB {
    #[serde(flatten)]
    pub basic: BasicItem,
    pub extra_field_b: String,
}

macro_rules! delegate_item {
    ($ty:ty) => {
        impl Item for $ty {
            fn id(&self) -> &str {
                self.basic.id()
            }

            fn name(&self) -> &str {
                self.basic.name()
            }

            fn status(&self) -> ItemStatus {
                self.basic.status()
            }

            fn set_status(&mut self, status: ItemStatus) {
                self.basic.set_status(status);
            }
        }
    };
}

delegate_item!(ItemA);
delegate_item!(ItemB);

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_item_a_snapshot_shape() {
        let mut item = ItemA {
            basic: BasicItem::new("7", "Item-A-7"),
            extra_field_a: "Extra data for Item A".into(),
        };
        item.set_status(ItemStatus::Processing);

        assert_eq!(
            serde_json::to_value(&item).unwrap(),
            json!({
                "id": "7",
                "name": "Item-A-7",
                "status": "Processing",
                "extraFieldA": "Extra data for Item A"
            })
        );
    }
}
