//! Contents of container items.

use ironhold_types::ItemId;

use crate::error::ContentRejection;
use crate::holder::{
    AddOutcome, Holder, HolderContext, RemoveOutcome, ReplaceOutcome, Thing, ThingHolder, merge_at,
    push_top, swap_in, take_from,
};

/// The ordered contents of one container item. Index 0 is the most
/// recently added item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerContents {
    id: ItemId,
    capacity: u8,
    items: Vec<ItemId>,
}

impl ContainerContents {
    /// An empty container for item `id`.
    pub const fn new(id: ItemId, capacity: u8) -> Self {
        Self {
            id,
            capacity,
            items: Vec::new(),
        }
    }

    /// The container item.
    pub const fn id(&self) -> ItemId {
        self.id
    }

    /// Maximum number of distinct items.
    pub const fn capacity(&self) -> u8 {
        self.capacity
    }

    /// Items, most recent first.
    pub fn items(&self) -> &[ItemId] {
        &self.items
    }

    /// Item at `index`.
    pub fn get(&self, index: u8) -> Option<ItemId> {
        self.items.get(usize::from(index)).copied()
    }

    /// Whether every slot is taken.
    pub fn is_full(&self) -> bool {
        self.items.len() >= usize::from(self.capacity)
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the container is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Hand the whole item list to another container of at least the same
    /// capacity, leaving this one empty.
    pub(crate) fn take_items(&mut self) -> Vec<ItemId> {
        std::mem::take(&mut self.items)
    }

    pub(crate) fn set_items(&mut self, items: Vec<ItemId>) {
        self.items = items;
    }

    fn would_contain_itself(&self, ctx: &HolderContext<'_>, item: ItemId) -> bool {
        item == self.id || ctx.items.container_ancestors(self.id).contains(&item)
    }
}

impl ThingHolder for ContainerContents {
    fn holder(&self) -> Holder {
        Holder::Container(self.id)
    }

    fn add_content(&mut self, ctx: &mut HolderContext<'_>, thing: Thing, index: Option<u8>) -> AddOutcome {
        let Thing::Item(item) = thing else {
            return AddOutcome::Rejected {
                reason: ContentRejection::ItemsOnly,
                remainder: thing,
            };
        };
        if self.would_contain_itself(ctx, item) {
            return AddOutcome::Rejected {
                reason: ContentRejection::WouldContainItself,
                remainder: thing,
            };
        }
        let holder = self.holder();

        // Dropping onto a matching stack merges, and overflow comes back.
        if let Some(position) = index.map(usize::from)
            && let Some(outcome) = merge_at(&self.items, holder, ctx, position, item)
        {
            return outcome;
        }

        if !self.is_full() {
            push_top(&mut self.items, holder, ctx, item);
            return AddOutcome::Done;
        }

        if index.is_none()
            && let Some(position) = self
                .items
                .iter()
                .position(|stack| ctx.items.stacks_with(ctx.catalog, *stack, item))
            && let Some(outcome) = merge_at(&self.items, holder, ctx, position, item)
        {
            return outcome;
        }

        AddOutcome::Rejected {
            reason: ContentRejection::ContainerFull,
            remainder: thing,
        }
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
        let holder = self.holder();
        take_from(&mut self.items, holder, ctx, item, index, amount)
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
        if self.would_contain_itself(ctx, to) {
            return ReplaceOutcome::Rejected(ContentRejection::WouldContainItself);
        }
        let holder = self.holder();
        swap_in(&mut self.items, holder, ctx, from, to, index, amount)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use ironhold_types::GameTime;

    use super::*;
    use crate::catalog::{ItemCatalog, ItemType};
    use crate::holder::WorldEvent;
    use crate::item::ItemStore;

    struct Fixture {
        catalog: ItemCatalog,
        items: ItemStore,
        events: Vec<WorldEvent>,
    }

    impl Fixture {
        fn new() -> Self {
            let catalog = ItemCatalog::from_types([
                ItemType {
                    cumulative: true,
                    ..ItemType::simple(101, "arrow")
                },
                ItemType::simple(2400, "sword"),
                ItemType {
                    container_capacity: Some(8),
                    ..ItemType::simple(1988, "backpack")
                },
            ])
            .unwrap();
            Self {
                catalog,
                items: ItemStore::new(),
                events: Vec::new(),
            }
        }

        fn create(&mut self, type_id: u16, amount: u8) -> ItemId {
            let item_type = self
                .catalog
                .require(ironhold_types::ItemTypeId(type_id))
                .unwrap()
                .clone();
            self.items.create(&item_type, amount, GameTime::ZERO).unwrap()
        }

        fn ctx(&mut self) -> HolderContext<'_> {
            HolderContext {
                items: &mut self.items,
                catalog: &self.catalog,
                events: &mut self.events,
            }
        }
    }

    #[test]
    fn add_places_on_top_and_sets_parent() {
        let mut fx = Fixture::new();
        let bag = fx.create(1988, 1);
        let sword = fx.create(2400, 1);
        let arrows = fx.create(101, 5);
        let mut contents = ContainerContents::new(bag, 8);
        assert_eq!(contents.add_content(&mut fx.ctx(), Thing::Item(sword), None), AddOutcome::Done);
        assert_eq!(contents.add_content(&mut fx.ctx(), Thing::Item(arrows), None), AddOutcome::Done);
        assert_eq!(contents.items(), &[arrows, sword]);
        assert_eq!(fx.items.get(sword).unwrap().parent(), Some(Holder::Container(bag)));
    }

    #[test]
    fn full_container_rejects_with_original() {
        let mut fx = Fixture::new();
        let bag = fx.create(1988, 1);
        let first = fx.create(2400, 1);
        let second = fx.create(2400, 1);
        let mut contents = ContainerContents::new(bag, 1);
        contents.add_content(&mut fx.ctx(), Thing::Item(first), None);
        assert_eq!(
            contents.add_content(&mut fx.ctx(), Thing::Item(second), None),
            AddOutcome::Rejected {
                reason: ContentRejection::ContainerFull,
                remainder: Thing::Item(second),
            }
        );
        assert_eq!(fx.items.get(second).unwrap().parent(), None);
    }

    #[test]
    fn merge_overflow_is_returned() {
        let mut fx = Fixture::new();
        let bag = fx.create(1988, 1);
        let stack = fx.create(101, 99);
        let incoming = fx.create(101, 2);
        let mut contents = ContainerContents::new(bag, 1);
        contents.add_content(&mut fx.ctx(), Thing::Item(stack), None);
        assert_eq!(
            contents.add_content(&mut fx.ctx(), Thing::Item(incoming), Some(0)),
            AddOutcome::Partial { remainder: incoming }
        );
        assert_eq!(fx.items.get(stack).unwrap().amount(), 100);
        assert_eq!(fx.items.get(incoming).unwrap().amount(), 1);
    }

    #[test]
    fn full_container_still_merges_matching_stack() {
        let mut fx = Fixture::new();
        let bag = fx.create(1988, 1);
        let stack = fx.create(101, 10);
        let incoming = fx.create(101, 4);
        let mut contents = ContainerContents::new(bag, 1);
        contents.add_content(&mut fx.ctx(), Thing::Item(stack), None);
        assert_eq!(contents.add_content(&mut fx.ctx(), Thing::Item(incoming), None), AddOutcome::Done);
        assert_eq!(fx.items.get(stack).unwrap().amount(), 14);
        assert!(!fx.items.contains(incoming));
    }

    #[test]
    fn container_cannot_hold_itself_or_ancestor() {
        let mut fx = Fixture::new();
        let outer = fx.create(1988, 1);
        let inner = fx.create(1988, 1);
        let mut outer_contents = ContainerContents::new(outer, 8);
        let mut inner_contents = ContainerContents::new(inner, 8);
        assert_eq!(outer_contents.add_content(&mut fx.ctx(), Thing::Item(inner), None), AddOutcome::Done);
        assert!(matches!(
            inner_contents.add_content(&mut fx.ctx(), Thing::Item(outer), None),
            AddOutcome::Rejected {
                reason: ContentRejection::WouldContainItself,
                ..
            }
        ));
        assert!(matches!(
            inner_contents.add_content(&mut fx.ctx(), Thing::Item(inner), None),
            AddOutcome::Rejected {
                reason: ContentRejection::WouldContainItself,
                ..
            }
        ));
    }

    #[test]
    fn partial_remove_splits_stack() {
        let mut fx = Fixture::new();
        let bag = fx.create(1988, 1);
        let arrows = fx.create(101, 10);
        let mut contents = ContainerContents::new(bag, 8);
        contents.add_content(&mut fx.ctx(), Thing::Item(arrows), None);
        let RemoveOutcome::Taken(Thing::Item(split)) =
            contents.remove_content(&mut fx.ctx(), Thing::Item(arrows), Some(0), 4)
        else {
            panic!("expected split");
        };
        assert_ne!(split, arrows);
        assert_eq!(fx.items.get(arrows).unwrap().amount(), 6);
        assert_eq!(fx.items.get(split).unwrap().amount(), 4);
        assert_eq!(contents.len(), 1);
    }

    #[test]
    fn replace_requires_whole_stack() {
        let mut fx = Fixture::new();
        let bag = fx.create(1988, 1);
        let arrows = fx.create(101, 10);
        let sword = fx.create(2400, 1);
        let mut contents = ContainerContents::new(bag, 8);
        contents.add_content(&mut fx.ctx(), Thing::Item(arrows), None);
        assert_eq!(
            contents.replace_content(&mut fx.ctx(), Thing::Item(arrows), Thing::Item(sword), Some(0), 3),
            ReplaceOutcome::Rejected(ContentRejection::InvalidAmount)
        );
        assert_eq!(
            contents.replace_content(&mut fx.ctx(), Thing::Item(arrows), Thing::Item(sword), Some(0), 10),
            ReplaceOutcome::Replaced {
                previous: Thing::Item(arrows)
            }
        );
        assert_eq!(contents.items(), &[sword]);
    }
}
