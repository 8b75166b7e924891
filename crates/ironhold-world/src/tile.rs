//! Map tiles.

use ironhold_types::{CreatureId, ItemId, Position};

use crate::catalog::{DEFAULT_GROUND_SPEED, ItemCatalog, ItemType};
use crate::error::ContentRejection;
use crate::holder::{
    AddOutcome, Holder, HolderContext, RemoveOutcome, ReplaceOutcome, Thing, ThingHolder, WorldEvent,
    index_u8, merge_at, push_top, swap_in, take_from,
};
use crate::item::ItemStore;

/// Most items a tile holds on top of its ground.
pub const TILE_ITEM_LIMIT: usize = 10;

/// One map tile: a ground item, a pile of items (top first), and the
/// creatures standing on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tile {
    position: Position,
    ground: Option<ItemId>,
    items: Vec<ItemId>,
    creatures: Vec<CreatureId>,
}

impl Tile {
    /// An empty tile.
    pub const fn new(position: Position) -> Self {
        Self {
            position,
            ground: None,
            items: Vec::new(),
            creatures: Vec::new(),
        }
    }

    /// The tile's position.
    pub const fn position(&self) -> Position {
        self.position
    }

    /// The ground item.
    pub const fn ground(&self) -> Option<ItemId> {
        self.ground
    }

    /// Items on the tile, top first.
    pub fn items(&self) -> &[ItemId] {
        &self.items
    }

    /// The topmost item.
    pub fn top_item(&self) -> Option<ItemId> {
        self.items.first().copied()
    }

    /// Item at `index`, counting from the top.
    pub fn item_at(&self, index: u8) -> Option<ItemId> {
        self.items.get(usize::from(index)).copied()
    }

    /// Creatures standing here.
    pub fn creatures(&self) -> &[CreatureId] {
        &self.creatures
    }

    /// Whether `creature` stands here.
    pub fn has_creature(&self, creature: CreatureId) -> bool {
        self.creatures.contains(&creature)
    }

    fn types<'a>(&'a self, catalog: &'a ItemCatalog, items: &'a ItemStore) -> impl Iterator<Item = &'a ItemType> {
        self.ground
            .iter()
            .chain(self.items.iter())
            .filter_map(move |id| items.get(*id))
            .filter_map(move |item| catalog.get(item.type_id()))
    }

    /// Whether an item on the tile blocks walking and item placement.
    pub fn blocks_movement(&self, catalog: &ItemCatalog, items: &ItemStore) -> bool {
        self.types(catalog, items).any(|item_type| item_type.blocks_movement)
    }

    /// Whether an item on the tile blocks line of sight.
    pub fn blocks_throw(&self, catalog: &ItemCatalog, items: &ItemStore) -> bool {
        self.types(catalog, items).any(|item_type| item_type.blocks_throw)
    }

    /// Whether a creature could step onto the tile.
    pub fn is_walkable(&self, catalog: &ItemCatalog, items: &ItemStore) -> bool {
        self.ground.is_some() && self.creatures.is_empty() && !self.blocks_movement(catalog, items)
    }

    /// Walking cost of the ground.
    pub fn ground_speed(&self, catalog: &ItemCatalog, items: &ItemStore) -> u16 {
        self.ground
            .and_then(|id| items.get(id))
            .and_then(|item| catalog.get(item.type_id()))
            .and_then(|item_type| item_type.ground_speed)
            .unwrap_or(DEFAULT_GROUND_SPEED)
    }

    fn add_item(&mut self, ctx: &mut HolderContext<'_>, item: ItemId, index: Option<u8>) -> AddOutcome {
        let holder = self.holder();
        let is_ground = ctx
            .items
            .get(item)
            .and_then(|found| ctx.catalog.get(found.type_id()))
            .is_some_and(|item_type| item_type.ground);
        if is_ground {
            if self.ground.is_some() {
                return AddOutcome::Rejected {
                    reason: ContentRejection::GroundOccupied,
                    remainder: Thing::Item(item),
                };
            }
            self.ground = Some(item);
            ctx.items.set_parent(item, Some(holder));
            ctx.events.push(WorldEvent::ContentAdded {
                holder,
                index: 0,
                thing: Thing::Item(item),
            });
            return AddOutcome::Done;
        }

        let target = usize::from(index.unwrap_or(0));
        let merged = merge_at(&self.items, holder, ctx, target, item);
        match merged {
            Some(AddOutcome::Done) => return AddOutcome::Done,
            Some(AddOutcome::Partial { remainder }) => {
                if self.items.len() < TILE_ITEM_LIMIT {
                    push_top(&mut self.items, holder, ctx, remainder);
                    return AddOutcome::Done;
                }
                return AddOutcome::Partial { remainder };
            }
            Some(AddOutcome::Rejected { .. }) | None => {}
        }

        if self.items.len() >= TILE_ITEM_LIMIT {
            return AddOutcome::Rejected {
                reason: ContentRejection::TileFull,
                remainder: Thing::Item(item),
            };
        }
        push_top(&mut self.items, holder, ctx, item);
        AddOutcome::Done
    }
}

impl ThingHolder for Tile {
    fn holder(&self) -> Holder {
        Holder::Tile(self.position)
    }

    fn add_content(&mut self, ctx: &mut HolderContext<'_>, thing: Thing, index: Option<u8>) -> AddOutcome {
        match thing {
            Thing::Item(item) => self.add_item(ctx, item, index),
            Thing::Creature(creature) => {
                if !self.creatures.contains(&creature) {
                    self.creatures.push(creature);
                    ctx.events.push(WorldEvent::ContentAdded {
                        holder: self.holder(),
                        index: index_u8(self.creatures.len().saturating_sub(1)),
                        thing,
                    });
                }
                AddOutcome::Done
            }
        }
    }

    fn remove_content(
        &mut self,
        ctx: &mut HolderContext<'_>,
        thing: Thing,
        index: Option<u8>,
        amount: u8,
    ) -> RemoveOutcome {
        let holder = self.holder();
        match thing {
            Thing::Item(item) => take_from(&mut self.items, holder, ctx, item, index, amount),
            Thing::Creature(creature) => {
                let Some(position) = self.creatures.iter().position(|found| *found == creature) else {
                    return RemoveOutcome::Rejected(ContentRejection::NotFound);
                };
                self.creatures.remove(position);
                ctx.events.push(WorldEvent::ContentRemoved {
                    holder,
                    index: index_u8(position),
                    thing,
                });
                RemoveOutcome::Taken(thing)
            }
        }
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
        let holder = self.holder();
        if self.ground == Some(from) {
            if !ctx.items.contains(to) {
                return ReplaceOutcome::Rejected(ContentRejection::NotFound);
            }
            self.ground = Some(to);
            ctx.items.set_parent(from, None);
            ctx.items.set_parent(to, Some(holder));
            ctx.events.push(WorldEvent::ContentUpdated {
                holder,
                index: 0,
                item: to,
            });
            return ReplaceOutcome::Replaced {
                previous: Thing::Item(from),
            };
        }
        swap_in(&mut self.items, holder, ctx, from, to, index, amount)
    }
}
