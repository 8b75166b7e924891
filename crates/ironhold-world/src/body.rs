//! A creature's equipment slots.

use std::collections::BTreeMap;

use ironhold_types::{BodySlot, CreatureId, ItemId};

use crate::error::ContentRejection;
use crate::holder::{
    AddOutcome, Holder, HolderContext, RemoveOutcome, ReplaceOutcome, Thing, ThingHolder, WorldEvent,
    slot_accepts,
};
use crate::item::{Item, MergeOutcome};

/// Items worn or carried by one creature, one per slot.
///
/// Hands take anything, the ammo slot takes anything, every other slot only
/// takes items made for it. A two-handed item needs the other hand empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyInventory {
    owner: CreatureId,
    slots: BTreeMap<BodySlot, ItemId>,
}

impl BodyInventory {
    /// Empty slots for `owner`.
    pub const fn new(owner: CreatureId) -> Self {
        Self {
            owner,
            slots: BTreeMap::new(),
        }
    }

    /// The item in `slot`.
    pub fn get(&self, slot: BodySlot) -> Option<ItemId> {
        self.slots.get(&slot).copied()
    }

    /// The slot holding `item`.
    pub fn slot_of(&self, item: ItemId) -> Option<BodySlot> {
        self.slots
            .iter()
            .find_map(|(slot, held)| (*held == item).then_some(*slot))
    }

    /// Occupied slots.
    pub fn iter(&self) -> impl Iterator<Item = (BodySlot, ItemId)> + '_ {
        self.slots.iter().map(|(slot, item)| (*slot, *item))
    }

    /// Whether nothing is equipped.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn is_two_handed(ctx: &HolderContext<'_>, item: ItemId) -> bool {
        ctx.items
            .get(item)
            .and_then(|found| ctx.catalog.get(found.type_id()))
            .is_some_and(|item_type| item_type.two_handed)
    }

    /// Check hand exclusivity for placing `item` in `slot`, ignoring
    /// `replacing` if it is the item leaving.
    fn hands_conflict(&self, ctx: &HolderContext<'_>, slot: BodySlot, item: ItemId, replacing: Option<ItemId>) -> bool {
        let Some(other) = slot.other_hand() else {
            return false;
        };
        let Some(other_item) = self.get(other).filter(|held| Some(*held) != replacing) else {
            return false;
        };
        Self::is_two_handed(ctx, item) || Self::is_two_handed(ctx, other_item)
    }

    fn pick_slot(&self, ctx: &HolderContext<'_>, item: ItemId) -> Option<BodySlot> {
        let free = BodySlot::ALL.into_iter().find(|slot| {
            !self.slots.contains_key(slot)
                && slot_accepts(ctx.catalog, ctx.items, *slot, item)
                && !self.hands_conflict(ctx, *slot, item, None)
        });
        free.or_else(|| {
            self.slots
                .iter()
                .find_map(|(slot, held)| ctx.items.stacks_with(ctx.catalog, *held, item).then_some(*slot))
        })
    }
}

impl ThingHolder for BodyInventory {
    fn holder(&self) -> Holder {
        Holder::Body(self.owner)
    }

    fn add_content(&mut self, ctx: &mut HolderContext<'_>, thing: Thing, index: Option<u8>) -> AddOutcome {
        let Thing::Item(item) = thing else {
            return AddOutcome::Rejected {
                reason: ContentRejection::ItemsOnly,
                remainder: thing,
            };
        };
        let reject = |reason| AddOutcome::Rejected {
            reason,
            remainder: thing,
        };
        let slot = match index {
            Some(index) => match BodySlot::from_index(index) {
                Some(slot) => slot,
                None => return reject(ContentRejection::NotFound),
            },
            None => match self.pick_slot(ctx, item) {
                Some(slot) => slot,
                None => return reject(ContentRejection::NoFreeSlot),
            },
        };
        if !slot_accepts(ctx.catalog, ctx.items, slot, item) {
            return reject(ContentRejection::IncompatibleSlot(slot));
        }
        let holder = self.holder();

        if let Some(existing) = self.get(slot) {
            if !ctx.items.stacks_with(ctx.catalog, existing, item) {
                return reject(ContentRejection::SlotOccupied(slot));
            }
            let outcome = match ctx.items.merge(ctx.catalog, existing, item) {
                MergeOutcome::Absorbed => AddOutcome::Done,
                MergeOutcome::Partial { .. } => AddOutcome::Partial { remainder: item },
                MergeOutcome::Unchanged => return reject(ContentRejection::SlotOccupied(slot)),
            };
            ctx.events.push(WorldEvent::ContentUpdated {
                holder,
                index: slot.index(),
                item: existing,
            });
            return outcome;
        }

        if self.hands_conflict(ctx, slot, item, None) {
            return reject(ContentRejection::BothHandsRequired);
        }
        self.slots.insert(slot, item);
        ctx.items.set_parent(item, Some(holder));
        ctx.events.push(WorldEvent::ContentAdded {
            holder,
            index: slot.index(),
            thing,
        });
        AddOutcome::Done
    }

    fn remove_content(
        &mut self,
        ctx: &mut HolderContext<'_>,
        thing: Thing,
        index: Option<u8>,
        amount: u8,
    ) -> RemoveOutcome {
        let Thing::Item(item) = thing else {
            return RemoveOutcome::Rejected(ContentRejection::ItemsOnly);
        };
        let slot = match index.map(BodySlot::from_index) {
            Some(Some(slot)) if self.get(slot) == Some(item) => slot,
            Some(Some(_)) => return RemoveOutcome::Rejected(ContentRejection::IndexMismatch),
            Some(None) => return RemoveOutcome::Rejected(ContentRejection::NotFound),
            None => match self.slot_of(item) {
                Some(slot) => slot,
                None => return RemoveOutcome::Rejected(ContentRejection::NotFound),
            },
        };
        let Some(held) = ctx.items.get(item).map(Item::amount) else {
            return RemoveOutcome::Rejected(ContentRejection::NotFound);
        };
        if amount == 0 || amount > held {
            return RemoveOutcome::Rejected(ContentRejection::InvalidAmount);
        }
        let holder = self.holder();
        if amount < held {
            let Some(split) = ctx.items.split(item, amount) else {
                return RemoveOutcome::Rejected(ContentRejection::InvalidAmount);
            };
            ctx.events.push(WorldEvent::ContentUpdated {
                holder,
                index: slot.index(),
                item,
            });
            return RemoveOutcome::Taken(Thing::Item(split));
        }
        self.slots.remove(&slot);
        ctx.items.set_parent(item, None);
        ctx.events.push(WorldEvent::ContentRemoved {
            holder,
            index: slot.index(),
            thing,
        });
        RemoveOutcome::Taken(thing)
    }

    fn replace_content(
        &mut self,
        ctx: &mut HolderContext<'_>,
        from: Thing,
        to: Thing,
        index: Option<u8>,
        amount: u8,
    ) -> ReplaceOutcome {
        let (Thing::Item(from), Thing::Item(to)) = (from, to) else {
            return ReplaceOutcome::Rejected(ContentRejection::ItemsOnly);
        };
        let Some(slot) = self.slot_of(from) else {
            return ReplaceOutcome::Rejected(ContentRejection::NotFound);
        };
        if index.is_some_and(|index| index != slot.index()) {
            return ReplaceOutcome::Rejected(ContentRejection::IndexMismatch);
        }
        if ctx.items.get(from).map(Item::amount) != Some(amount) {
            return ReplaceOutcome::Rejected(ContentRejection::InvalidAmount);
        }
        if !slot_accepts(ctx.catalog, ctx.items, slot, to) {
            return ReplaceOutcome::Rejected(ContentRejection::IncompatibleSlot(slot));
        }
        if self.hands_conflict(ctx, slot, to, Some(from)) {
            return ReplaceOutcome::Rejected(ContentRejection::BothHandsRequired);
        }
        let holder = self.holder();
        self.slots.insert(slot, to);
        ctx.items.set_parent(from, None);
        ctx.items.set_parent(to, Some(holder));
        ctx.events.push(WorldEvent::ContentUpdated {
            holder,
            index: slot.index(),
            item: to,
        });
        ReplaceOutcome::Replaced {
            previous: Thing::Item(from),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use ironhold_types::{GameTime, ItemTypeId};

    use super::*;
    use crate::catalog::{ItemCatalog, ItemType};
    use crate::item::ItemStore;

    fn catalog() -> ItemCatalog {
        ItemCatalog::from_types([
            ItemType {
                cumulative: true,
                ..ItemType::simple(101, "arrow")
            },
            ItemType {
                two_handed: true,
                ..ItemType::simple(2432, "fire axe")
            },
            ItemType {
                body_slot: Some(BodySlot::Head),
                ..ItemType::simple(2457, "steel helmet")
            },
            ItemType::simple(2400, "sword"),
        ])
        .unwrap()
    }

    fn create(catalog: &ItemCatalog, items: &mut ItemStore, type_id: u16, amount: u8) -> ItemId {
        items
            .create(catalog.require(ItemTypeId(type_id)).unwrap(), amount, GameTime::ZERO)
            .unwrap()
    }

    #[test]
    fn stack_merges_into_occupied_slot() {
        let catalog = catalog();
        let mut items = ItemStore::new();
        let mut events = Vec::new();
        let mut body = BodyInventory::new(CreatureId(1));
        let held = create(&catalog, &mut items, 101, 3);
        let incoming = create(&catalog, &mut items, 101, 5);
        let mut ctx = HolderContext {
            items: &mut items,
            catalog: &catalog,
            events: &mut events,
        };
        let ammo = Some(BodySlot::Ammo.index());
        assert_eq!(body.add_content(&mut ctx, Thing::Item(held), ammo), AddOutcome::Done);
        assert_eq!(body.add_content(&mut ctx, Thing::Item(incoming), ammo), AddOutcome::Done);
        assert_eq!(items.get(held).unwrap().amount(), 8);
        assert!(!items.contains(incoming));
    }

    #[test]
    fn helmet_only_fits_head_or_hands() {
        let catalog = catalog();
        let mut items = ItemStore::new();
        let mut events = Vec::new();
        let mut body = BodyInventory::new(CreatureId(1));
        let helmet = create(&catalog, &mut items, 2457, 1);
        let mut ctx = HolderContext {
            items: &mut items,
            catalog: &catalog,
            events: &mut events,
        };
        assert!(matches!(
            body.add_content(&mut ctx, Thing::Item(helmet), Some(BodySlot::Feet.index())),
            AddOutcome::Rejected {
                reason: ContentRejection::IncompatibleSlot(BodySlot::Feet),
                ..
            }
        ));
        assert_eq!(
            body.add_content(&mut ctx, Thing::Item(helmet), None),
            AddOutcome::Done
        );
        assert_eq!(body.get(BodySlot::Head), Some(helmet));
    }

    #[test]
    fn two_handed_excludes_other_hand() {
        let catalog = catalog();
        let mut items = ItemStore::new();
        let mut events = Vec::new();
        let mut body = BodyInventory::new(CreatureId(1));
        let axe = create(&catalog, &mut items, 2432, 1);
        let sword = create(&catalog, &mut items, 2400, 1);
        let mut ctx = HolderContext {
            items: &mut items,
            catalog: &catalog,
            events: &mut events,
        };
        assert_eq!(
            body.add_content(&mut ctx, Thing::Item(axe), Some(BodySlot::RightHand.index())),
            AddOutcome::Done
        );
        assert!(matches!(
            body.add_content(&mut ctx, Thing::Item(sword), Some(BodySlot::LeftHand.index())),
            AddOutcome::Rejected {
                reason: ContentRejection::BothHandsRequired,
                ..
            }
        ));
    }

    #[test]
    fn removing_part_of_stack_splits() {
        let catalog = catalog();
        let mut items = ItemStore::new();
        let mut events = Vec::new();
        let mut body = BodyInventory::new(CreatureId(1));
        let arrows = create(&catalog, &mut items, 101, 10);
        let mut ctx = HolderContext {
            items: &mut items,
            catalog: &catalog,
            events: &mut events,
        };
        body.add_content(&mut ctx, Thing::Item(arrows), Some(BodySlot::Ammo.index()));
        let outcome = body.remove_content(&mut ctx, Thing::Item(arrows), Some(BodySlot::Ammo.index()), 4);
        assert!(matches!(outcome, RemoveOutcome::Taken(Thing::Item(split)) if split != arrows));
        assert_eq!(body.get(BodySlot::Ammo), Some(arrows));
        assert_eq!(items.get(arrows).unwrap().amount(), 6);
    }
}
