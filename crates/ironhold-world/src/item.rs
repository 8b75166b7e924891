//! Item instances and the item arena.
//!
//! Every item lives in the [`ItemStore`], keyed by [`ItemId`]. Holders
//! (tiles, containers, body slots) only keep ids, and every item records its
//! single current parent. Splitting and merging stacks always go through the
//! store so that the total amount of a type is conserved.

use std::collections::{BTreeMap, BTreeSet};

use ironhold_types::{GameTime, ItemId, ItemTypeId};

use crate::catalog::{ItemCatalog, ItemType, MAX_STACK};
use crate::error::WorldError;
use crate::holder::Holder;

/// Extra per-instance properties. Two stacks only merge when their
/// attributes are identical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ItemAttribute {
    /// Remaining uses of a rune, potion, or tool.
    Charges,
    /// Scripted behavior hook.
    ActionId,
    /// Quest-unique marker.
    UniqueId,
}

/// A single item instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    id: ItemId,
    type_id: ItemTypeId,
    amount: u8,
    attributes: BTreeMap<ItemAttribute, u32>,
    expires_at: Option<GameTime>,
    parent: Option<Holder>,
}

impl Item {
    /// The item's identifier.
    pub const fn id(&self) -> ItemId {
        self.id
    }

    /// The item's catalog type.
    pub const fn type_id(&self) -> ItemTypeId {
        self.type_id
    }

    /// Stack amount (1 for non-cumulative items).
    pub const fn amount(&self) -> u8 {
        self.amount
    }

    /// Instance attributes.
    pub const fn attributes(&self) -> &BTreeMap<ItemAttribute, u32> {
        &self.attributes
    }

    /// When the item expires, if it does.
    pub const fn expires_at(&self) -> Option<GameTime> {
        self.expires_at
    }

    /// The holder this item currently sits in, or `None` while in transit.
    pub const fn parent(&self) -> Option<Holder> {
        self.parent
    }
}

/// Outcome of merging one stack into another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The incoming item was fully absorbed and no longer exists.
    Absorbed,
    /// Some units moved; the incoming item keeps the rest.
    Partial {
        /// Units moved onto the stack.
        moved: u8,
    },
    /// The stack was already full or the items do not stack.
    Unchanged,
}

/// Arena owning every item in the world.
#[derive(Debug, Default)]
pub struct ItemStore {
    items: BTreeMap<ItemId, Item>,
}

impl ItemStore {
    /// Create an empty store.
    pub const fn new() -> Self {
        Self {
            items: BTreeMap::new(),
        }
    }

    /// Create a detached item of `item_type`.
    ///
    /// Expiring types get an expiration time relative to `now`.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidAmount`] when `amount` is zero, above
    /// [`MAX_STACK`], or above one for a non-cumulative type.
    pub fn create(
        &mut self,
        item_type: &ItemType,
        amount: u8,
        now: GameTime,
    ) -> Result<ItemId, WorldError> {
        let limit = if item_type.cumulative { MAX_STACK } else { 1 };
        if amount == 0 || amount > limit {
            return Err(WorldError::InvalidAmount {
                type_id: item_type.id,
                amount,
            });
        }
        let id = ItemId::new();
        let expires_at = item_type.expiration().map(|after| now.saturating_add(after));
        self.items.insert(
            id,
            Item {
                id,
                type_id: item_type.id,
                amount,
                attributes: BTreeMap::new(),
                expires_at,
                parent: None,
            },
        );
        Ok(id)
    }

    /// Look up an item.
    pub fn get(&self, id: ItemId) -> Option<&Item> {
        self.items.get(&id)
    }

    /// Whether the item exists.
    pub fn contains(&self, id: ItemId) -> bool {
        self.items.contains_key(&id)
    }

    /// Number of items in the world, including items in transit.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterate over all items.
    pub fn iter(&self) -> impl Iterator<Item = &Item> {
        self.items.values()
    }

    /// Sum of amounts of every item of `type_id`.
    pub fn total_amount(&self, type_id: ItemTypeId) -> u64 {
        self.items
            .values()
            .filter(|item| item.type_id == type_id)
            .fold(0_u64, |acc, item| acc.saturating_add(u64::from(item.amount)))
    }

    /// Set an instance attribute.
    pub fn set_attribute(&mut self, id: ItemId, attribute: ItemAttribute, value: u32) -> bool {
        self.items.get_mut(&id).is_some_and(|item| {
            item.attributes.insert(attribute, value);
            true
        })
    }

    /// Record a new parent for the item.
    pub(crate) fn set_parent(&mut self, id: ItemId, parent: Option<Holder>) {
        if let Some(item) = self.items.get_mut(&id) {
            item.parent = parent;
        }
    }

    /// Remove an item from the arena entirely.
    pub(crate) fn destroy(&mut self, id: ItemId) -> Option<Item> {
        self.items.remove(&id)
    }

    /// Split `amount` units off `id` into a new, detached item.
    ///
    /// Returns `None` if the item does not exist or `amount` is not strictly
    /// between zero and the stack's amount.
    pub(crate) fn split(&mut self, id: ItemId, amount: u8) -> Option<ItemId> {
        let source = self.items.get_mut(&id)?;
        if amount == 0 || amount >= source.amount {
            return None;
        }
        source.amount = source.amount.checked_sub(amount)?;
        let split = Item {
            id: ItemId::new(),
            type_id: source.type_id,
            amount,
            attributes: source.attributes.clone(),
            expires_at: source.expires_at,
            parent: None,
        };
        let split_id = split.id;
        self.items.insert(split_id, split);
        Some(split_id)
    }

    /// Whether `incoming` could be merged onto `stack`.
    pub fn stacks_with(&self, catalog: &ItemCatalog, stack: ItemId, incoming: ItemId) -> bool {
        let (Some(stack), Some(incoming)) = (self.items.get(&stack), self.items.get(&incoming))
        else {
            return false;
        };
        stack.id != incoming.id
            && stack.type_id == incoming.type_id
            && stack.attributes == incoming.attributes
            && catalog
                .get(stack.type_id)
                .is_some_and(|item_type| item_type.cumulative)
    }

    /// Move as many units of `incoming` onto `stack` as fit.
    ///
    /// A fully absorbed incoming item is removed from the arena.
    pub(crate) fn merge(&mut self, catalog: &ItemCatalog, stack: ItemId, incoming: ItemId) -> MergeOutcome {
        if !self.stacks_with(catalog, stack, incoming) {
            return MergeOutcome::Unchanged;
        }
        let Some(stack_amount) = self.items.get(&stack).map(Item::amount) else {
            return MergeOutcome::Unchanged;
        };
        let Some(incoming_amount) = self.items.get(&incoming).map(Item::amount) else {
            return MergeOutcome::Unchanged;
        };
        let room = MAX_STACK.saturating_sub(stack_amount);
        let moved = room.min(incoming_amount);
        if moved == 0 {
            return MergeOutcome::Unchanged;
        }
        if let Some(target) = self.items.get_mut(&stack) {
            target.amount = target.amount.saturating_add(moved);
        }
        let left = incoming_amount.saturating_sub(moved);
        if left == 0 {
            self.items.remove(&incoming);
            MergeOutcome::Absorbed
        } else {
            if let Some(source) = self.items.get_mut(&incoming) {
                source.amount = left;
            }
            MergeOutcome::Partial { moved }
        }
    }

    /// Container ids enclosing `id`, innermost first.
    ///
    /// Stops at the first non-container holder (a tile or a body).
    pub fn container_ancestors(&self, id: ItemId) -> Vec<ItemId> {
        let mut chain = Vec::new();
        let mut seen = BTreeSet::new();
        let mut current = id;
        while let Some(Holder::Container(parent)) = self.items.get(&current).and_then(Item::parent) {
            if !seen.insert(parent) {
                break;
            }
            chain.push(parent);
            current = parent;
        }
        chain
    }

    /// The outermost holder of `id`: the tile or body at the root of its
    /// container chain, or `None` if the chain ends at an item in transit.
    pub fn root_holder(&self, id: ItemId) -> Option<Holder> {
        let outermost = self.container_ancestors(id).last().copied().unwrap_or(id);
        match self.items.get(&outermost)?.parent? {
            Holder::Container(_) => None,
            root => Some(root),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn coins() -> ItemType {
        ItemType {
            cumulative: true,
            ..ItemType::simple(3031, "gold coin")
        }
    }

    fn catalog() -> ItemCatalog {
        ItemCatalog::from_types([coins(), ItemType::simple(2400, "sword")]).unwrap()
    }

    #[test]
    fn create_validates_amount() {
        let mut store = ItemStore::new();
        assert!(store.create(&coins(), 0, GameTime::ZERO).is_err());
        assert!(store.create(&coins(), 101, GameTime::ZERO).is_err());
        assert!(store.create(&ItemType::simple(2400, "sword"), 2, GameTime::ZERO).is_err());
        assert!(store.create(&coins(), 100, GameTime::ZERO).is_ok());
    }

    #[test]
    fn create_sets_expiration() {
        let mut store = ItemStore::new();
        let torch = ItemType {
            expires_after_ms: Some(5_000),
            ..ItemType::simple(2050, "lit torch")
        };
        let id = store.create(&torch, 1, GameTime::from_millis(100)).unwrap();
        assert_eq!(store.get(id).unwrap().expires_at(), Some(GameTime::from_millis(5_100)));
    }

    #[test]
    fn split_conserves_amount() {
        let mut store = ItemStore::new();
        let id = store.create(&coins(), 30, GameTime::ZERO).unwrap();
        let split = store.split(id, 12).unwrap();
        assert_eq!(store.get(id).unwrap().amount(), 18);
        assert_eq!(store.get(split).unwrap().amount(), 12);
        assert_eq!(store.total_amount(ItemTypeId(3031)), 30);
        assert!(store.split(id, 18).is_none());
        assert!(store.split(id, 0).is_none());
    }

    #[test]
    fn merge_caps_at_max_stack() {
        let catalog = catalog();
        let mut store = ItemStore::new();
        let stack = store.create(&coins(), 70, GameTime::ZERO).unwrap();
        let incoming = store.create(&coins(), 50, GameTime::ZERO).unwrap();
        assert_eq!(
            store.merge(&catalog, stack, incoming),
            MergeOutcome::Partial { moved: 30 }
        );
        assert_eq!(store.get(stack).unwrap().amount(), 100);
        assert_eq!(store.get(incoming).unwrap().amount(), 20);
        assert_eq!(store.total_amount(ItemTypeId(3031)), 120);
    }

    #[test]
    fn merge_absorbs_small_stack() {
        let catalog = catalog();
        let mut store = ItemStore::new();
        let stack = store.create(&coins(), 3, GameTime::ZERO).unwrap();
        let incoming = store.create(&coins(), 5, GameTime::ZERO).unwrap();
        assert_eq!(store.merge(&catalog, stack, incoming), MergeOutcome::Absorbed);
        assert!(!store.contains(incoming));
        assert_eq!(store.get(stack).unwrap().amount(), 8);
    }

    #[test]
    fn non_cumulative_items_do_not_merge() {
        let catalog = catalog();
        let mut store = ItemStore::new();
        let sword = ItemType::simple(2400, "sword");
        let a = store.create(&sword, 1, GameTime::ZERO).unwrap();
        let b = store.create(&sword, 1, GameTime::ZERO).unwrap();
        assert_eq!(store.merge(&catalog, a, b), MergeOutcome::Unchanged);
    }

    #[test]
    fn differing_attributes_do_not_merge() {
        let catalog = catalog();
        let mut store = ItemStore::new();
        let a = store.create(&coins(), 1, GameTime::ZERO).unwrap();
        let b = store.create(&coins(), 1, GameTime::ZERO).unwrap();
        store.set_attribute(b, ItemAttribute::ActionId, 1000);
        assert!(!store.stacks_with(&catalog, a, b));
    }
}
