//! Item type catalog.
//!
//! Parsing item definition files is handled outside the engine. The catalog
//! here is built from already-deserialized [`ItemType`] records, which may
//! come from the engine's YAML configuration or be constructed in code.

use std::collections::BTreeMap;
use std::time::Duration;

use ironhold_types::{BodySlot, ItemTypeId};
use serde::{Deserialize, Serialize};

use crate::error::WorldError;

/// Largest amount a single cumulative stack can hold.
pub const MAX_STACK: u8 = 100;

/// Default ground speed for tiles without a speed-bearing ground.
pub const DEFAULT_GROUND_SPEED: u16 = 150;

/// Static properties shared by every item of one type.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemType {
    /// Catalog identifier.
    pub id: ItemTypeId,

    /// Display name, used in look descriptions.
    pub name: String,

    /// Whether items of this type stack by amount.
    #[serde(default)]
    pub cumulative: bool,

    /// Whether creatures may move items of this type.
    #[serde(default = "default_true")]
    pub movable: bool,

    /// Whether this type is a floor tile's ground.
    #[serde(default)]
    pub ground: bool,

    /// Walking cost of a ground item (higher is slower).
    #[serde(default)]
    pub ground_speed: Option<u16>,

    /// Whether creatures and items cannot be placed on top.
    #[serde(default)]
    pub blocks_movement: bool,

    /// Whether the item blocks line of sight for throwing and combat.
    #[serde(default)]
    pub blocks_throw: bool,

    /// Slot count when this type is a container.
    #[serde(default)]
    pub container_capacity: Option<u8>,

    /// The non-hand body slot this item can be worn in.
    #[serde(default)]
    pub body_slot: Option<BodySlot>,

    /// Whether the item occupies both hands.
    #[serde(default)]
    pub two_handed: bool,

    /// How long an item of this type lasts once created.
    #[serde(default)]
    pub expires_after_ms: Option<u64>,

    /// The type an expiring item becomes; `None` means it disappears.
    #[serde(default)]
    pub expire_to: Option<ItemTypeId>,

    /// Short description appended when looked at.
    #[serde(default)]
    pub description: Option<String>,
}

const fn default_true() -> bool {
    true
}

impl ItemType {
    /// A minimal, movable, non-stacking item type.
    pub fn simple(id: u16, name: &str) -> Self {
        Self {
            id: ItemTypeId(id),
            name: name.to_owned(),
            cumulative: false,
            movable: true,
            ground: false,
            ground_speed: None,
            blocks_movement: false,
            blocks_throw: false,
            container_capacity: None,
            body_slot: None,
            two_handed: false,
            expires_after_ms: None,
            expire_to: None,
            description: None,
        }
    }

    /// Whether this type is a container.
    pub const fn is_container(&self) -> bool {
        self.container_capacity.is_some()
    }

    /// Expiration delay, when the type expires.
    pub fn expiration(&self) -> Option<Duration> {
        self.expires_after_ms.map(Duration::from_millis)
    }
}

/// Lookup table of all item types known to the world.
#[derive(Debug, Clone, Default)]
pub struct ItemCatalog {
    types: BTreeMap<ItemTypeId, ItemType>,
}

impl ItemCatalog {
    /// Build a catalog from a list of types.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::DuplicateItemType`] if two records share an id.
    pub fn from_types(types: impl IntoIterator<Item = ItemType>) -> Result<Self, WorldError> {
        let mut map = BTreeMap::new();
        for item_type in types {
            let id = item_type.id;
            if map.insert(id, item_type).is_some() {
                return Err(WorldError::DuplicateItemType(id));
            }
        }
        Ok(Self { types: map })
    }

    /// Look up a type.
    pub fn get(&self, id: ItemTypeId) -> Option<&ItemType> {
        self.types.get(&id)
    }

    /// Look up a type, failing if it is unknown.
    pub fn require(&self, id: ItemTypeId) -> Result<&ItemType, WorldError> {
        self.get(id).ok_or(WorldError::UnknownItemType(id))
    }

    /// Number of known types.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_ids_are_rejected() {
        let result = ItemCatalog::from_types([ItemType::simple(1, "a"), ItemType::simple(1, "b")]);
        assert!(matches!(result, Err(WorldError::DuplicateItemType(ItemTypeId(1)))));
    }

    #[test]
    fn yaml_defaults_apply() {
        let yaml = "id: 3031\nname: gold coin\ncumulative: true\n";
        let parsed: ItemType = serde_yml::from_str(yaml).unwrap();
        assert!(parsed.cumulative);
        assert!(parsed.movable);
        assert!(!parsed.is_container());
        assert_eq!(parsed.expiration(), None);
    }

    #[test]
    fn require_reports_unknown() {
        let catalog = ItemCatalog::from_types([ItemType::simple(1, "a")]).unwrap();
        assert!(catalog.require(ItemTypeId(1)).is_ok());
        assert!(matches!(
            catalog.require(ItemTypeId(2)),
            Err(WorldError::UnknownItemType(ItemTypeId(2)))
        ));
    }
}
