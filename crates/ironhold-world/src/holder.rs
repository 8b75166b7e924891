//! The uniform "holder of things" contract.
//!
//! Tiles, container items, and creature bodies all implement
//! [`ThingHolder`]. Holders never drop matter: whatever they cannot take is
//! handed back to the caller as a remainder, and every change is recorded as
//! a [`WorldEvent`] so observers of open containers can be kept in sync.

use ironhold_types::{BodySlot, CreatureId, ItemId, Position};
use serde::{Deserialize, Serialize};

use crate::catalog::ItemCatalog;
use crate::error::ContentRejection;
use crate::item::{ItemStore, MergeOutcome};

/// Something that holds things.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Holder {
    /// A map tile.
    Tile(Position),
    /// A container item.
    Container(ItemId),
    /// A creature's equipment slots.
    Body(CreatureId),
}

/// Something that can be held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Thing {
    /// An item.
    Item(ItemId),
    /// A creature; only tiles hold creatures.
    Creature(CreatureId),
}

impl Thing {
    /// The item id, if this is an item.
    pub const fn item(self) -> Option<ItemId> {
        match self {
            Self::Item(id) => Some(id),
            Self::Creature(_) => None,
        }
    }

    /// The creature id, if this is a creature.
    pub const fn creature(self) -> Option<CreatureId> {
        match self {
            Self::Creature(id) => Some(id),
            Self::Item(_) => None,
        }
    }
}

/// A change to a holder's contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorldEvent {
    /// A thing was added at `index`.
    ContentAdded {
        /// Where.
        holder: Holder,
        /// Position within the holder (slot index for bodies).
        index: u8,
        /// What.
        thing: Thing,
    },
    /// A thing was removed from `index`.
    ContentRemoved {
        /// Where.
        holder: Holder,
        /// Position the thing occupied.
        index: u8,
        /// What.
        thing: Thing,
    },
    /// The item at `index` changed amount or identity.
    ContentUpdated {
        /// Where.
        holder: Holder,
        /// Position within the holder.
        index: u8,
        /// The item now at that position.
        item: ItemId,
    },
    /// An item left the world.
    ItemDestroyed(ItemId),
    /// A creature changed tiles.
    CreatureMoved {
        /// The creature.
        creature: CreatureId,
        /// Origin tile.
        from: Position,
        /// Destination tile.
        to: Position,
    },
}

/// Result of adding a thing to a holder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// Everything was placed.
    Done,
    /// Part of the stack was merged; `remainder` was not placed and is
    /// detached.
    Partial {
        /// The unplaced rest, keeping the incoming item's id.
        remainder: ItemId,
    },
    /// Nothing was placed; the original thing is handed back.
    Rejected {
        /// Why.
        reason: ContentRejection,
        /// The original thing, untouched.
        remainder: Thing,
    },
}

impl AddOutcome {
    /// Whether at least part of the thing was placed.
    pub const fn placed_any(self) -> bool {
        !matches!(self, Self::Rejected { .. })
    }
}

/// Result of removing a thing from a holder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    /// The thing (or the split-off part of a stack) is now detached.
    Taken(Thing),
    /// Nothing was removed.
    Rejected(ContentRejection),
}

/// Result of replacing one thing with another in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplaceOutcome {
    /// `previous` is now detached and the new thing occupies its position.
    Replaced {
        /// The thing that was swapped out.
        previous: Thing,
    },
    /// Nothing changed.
    Rejected(ContentRejection),
}

/// World state a holder needs while changing its contents.
#[derive(Debug)]
pub struct HolderContext<'a> {
    /// The item arena.
    pub items: &'a mut ItemStore,
    /// Item type lookup.
    pub catalog: &'a ItemCatalog,
    /// Sink for change events.
    pub events: &'a mut Vec<WorldEvent>,
}

/// The add/remove/replace contract shared by every holder.
pub trait ThingHolder {
    /// This holder's address.
    fn holder(&self) -> Holder;

    /// Add `thing`, optionally onto the thing at `index`.
    fn add_content(&mut self, ctx: &mut HolderContext<'_>, thing: Thing, index: Option<u8>) -> AddOutcome;

    /// Remove `amount` units of `thing`, optionally checking it sits at
    /// `index`. Removing less than a whole stack splits it.
    fn remove_content(
        &mut self,
        ctx: &mut HolderContext<'_>,
        thing: Thing,
        index: Option<u8>,
        amount: u8,
    ) -> RemoveOutcome;

    /// Swap `from` (all `amount` units of it) for `to` at the same position.
    fn replace_content(
        &mut self,
        ctx: &mut HolderContext<'_>,
        from: Thing,
        to: Thing,
        index: Option<u8>,
        amount: u8,
    ) -> ReplaceOutcome;
}

// ---------------------------------------------------------------------------
// Ordered item lists (tiles and containers)
// ---------------------------------------------------------------------------

pub(crate) fn index_u8(position: usize) -> u8 {
    u8::try_from(position).unwrap_or(u8::MAX)
}

/// Find `item` in `list`, checking `index` when given.
pub(crate) fn locate(list: &[ItemId], item: ItemId, index: Option<u8>) -> Result<usize, ContentRejection> {
    match index {
        Some(index) => match list.get(usize::from(index)) {
            Some(found) if *found == item => Ok(usize::from(index)),
            Some(_) => Err(ContentRejection::IndexMismatch),
            None => Err(ContentRejection::NotFound),
        },
        None => list
            .iter()
            .position(|candidate| *candidate == item)
            .ok_or(ContentRejection::NotFound),
    }
}

/// Merge `incoming` onto the stack at `position`. Returns `None` when the two
/// do not stack, leaving everything untouched.
pub(crate) fn merge_at(
    list: &[ItemId],
    holder: Holder,
    ctx: &mut HolderContext<'_>,
    position: usize,
    incoming: ItemId,
) -> Option<AddOutcome> {
    let stack = *list.get(position)?;
    if !ctx.items.stacks_with(ctx.catalog, stack, incoming) {
        return None;
    }
    let outcome = match ctx.items.merge(ctx.catalog, stack, incoming) {
        MergeOutcome::Absorbed => AddOutcome::Done,
        MergeOutcome::Partial { .. } => AddOutcome::Partial { remainder: incoming },
        MergeOutcome::Unchanged => {
            return Some(AddOutcome::Rejected {
                reason: ContentRejection::ContainerFull,
                remainder: Thing::Item(incoming),
            });
        }
    };
    ctx.events.push(WorldEvent::ContentUpdated {
        holder,
        index: index_u8(position),
        item: stack,
    });
    Some(outcome)
}

/// Insert a detached item at the top of `list`.
pub(crate) fn push_top(list: &mut Vec<ItemId>, holder: Holder, ctx: &mut HolderContext<'_>, item: ItemId) {
    list.insert(0, item);
    ctx.items.set_parent(item, Some(holder));
    ctx.events.push(WorldEvent::ContentAdded {
        holder,
        index: 0,
        thing: Thing::Item(item),
    });
}

/// Remove `amount` of `item` from `list`, splitting partial stacks.
pub(crate) fn take_from(
    list: &mut Vec<ItemId>,
    holder: Holder,
    ctx: &mut HolderContext<'_>,
    item: ItemId,
    index: Option<u8>,
    amount: u8,
) -> RemoveOutcome {
    let position = match locate(list, item, index) {
        Ok(position) => position,
        Err(reason) => return RemoveOutcome::Rejected(reason),
    };
    let Some(held) = ctx.items.get(item).map(crate::item::Item::amount) else {
        return RemoveOutcome::Rejected(ContentRejection::NotFound);
    };
    if amount == 0 || amount > held {
        return RemoveOutcome::Rejected(ContentRejection::InvalidAmount);
    }
    if amount < held {
        let Some(split) = ctx.items.split(item, amount) else {
            return RemoveOutcome::Rejected(ContentRejection::InvalidAmount);
        };
        ctx.events.push(WorldEvent::ContentUpdated {
            holder,
            index: index_u8(position),
            item,
        });
        return RemoveOutcome::Taken(Thing::Item(split));
    }
    list.remove(position);
    ctx.items.set_parent(item, None);
    ctx.events.push(WorldEvent::ContentRemoved {
        holder,
        index: index_u8(position),
        thing: Thing::Item(item),
    });
    RemoveOutcome::Taken(Thing::Item(item))
}

/// Swap the whole of `from` for the detached `to` at the same position.
pub(crate) fn swap_in(
    list: &mut [ItemId],
    holder: Holder,
    ctx: &mut HolderContext<'_>,
    from: ItemId,
    to: ItemId,
    index: Option<u8>,
    amount: u8,
) -> ReplaceOutcome {
    let position = match locate(list, from, index) {
        Ok(position) => position,
        Err(reason) => return ReplaceOutcome::Rejected(reason),
    };
    if ctx.items.get(from).map(crate::item::Item::amount) != Some(amount) {
        return ReplaceOutcome::Rejected(ContentRejection::InvalidAmount);
    }
    if !ctx.items.contains(to) {
        return ReplaceOutcome::Rejected(ContentRejection::NotFound);
    }
    let Some(slot) = list.get_mut(position) else {
        return ReplaceOutcome::Rejected(ContentRejection::NotFound);
    };
    *slot = to;
    ctx.items.set_parent(from, None);
    ctx.items.set_parent(to, Some(holder));
    ctx.events.push(WorldEvent::ContentUpdated {
        holder,
        index: index_u8(position),
        item: to,
    });
    ReplaceOutcome::Replaced {
        previous: Thing::Item(from),
    }
}

/// Whether `slot` is a body slot that the item type may be worn in,
/// ignoring what is currently equipped.
pub(crate) fn slot_accepts(catalog: &ItemCatalog, items: &ItemStore, slot: BodySlot, item: ItemId) -> bool {
    let Some(item_type) = items.get(item).and_then(|item| catalog.get(item.type_id())) else {
        return false;
    };
    if item_type.two_handed {
        return slot.is_hand();
    }
    slot.is_hand() || slot == BodySlot::Ammo || item_type.body_slot == Some(slot)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::catalog::ItemType;
    use ironhold_types::GameTime;

    #[test]
    fn locate_checks_index_identity() {
        let a = ItemId::new();
        let b = ItemId::new();
        let list = vec![a, b];
        assert_eq!(locate(&list, b, None), Ok(1));
        assert_eq!(locate(&list, b, Some(1)), Ok(1));
        assert_eq!(locate(&list, b, Some(0)), Err(ContentRejection::IndexMismatch));
        assert_eq!(locate(&list, b, Some(5)), Err(ContentRejection::NotFound));
    }

    #[test]
    fn two_handed_items_only_fit_hands() {
        let axe = ItemType {
            two_handed: true,
            ..ItemType::simple(2432, "fire axe")
        };
        let catalog = ItemCatalog::from_types([axe.clone()]).unwrap();
        let mut items = ItemStore::new();
        let id = items.create(&axe, 1, GameTime::ZERO).unwrap();
        assert!(slot_accepts(&catalog, &items, BodySlot::RightHand, id));
        assert!(!slot_accepts(&catalog, &items, BodySlot::Ammo, id));
        assert!(!slot_accepts(&catalog, &items, BodySlot::Torso, id));
    }

    #[test]
    fn outcome_helpers() {
        assert!(AddOutcome::Done.placed_any());
        assert!(
            AddOutcome::Partial {
                remainder: ItemId::new()
            }
            .placed_any()
        );
        assert_eq!(Thing::Creature(CreatureId(1)).item(), None);
    }
}
