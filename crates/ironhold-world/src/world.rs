//! The world: map, items, containers, creatures, and open containers.
//!
//! [`World`] owns every piece of mutable game state and dispatches the
//! holder contract to tiles, containers, and bodies. It is mutated only by
//! the scheduler's fire loop. Every content change is recorded as a
//! [`WorldEvent`]; [`World::reconcile`] turns the accumulated events into
//! observer notifications and force-closes containers whose observers lost
//! access.

use std::collections::{BTreeMap, BTreeSet};

use ironhold_types::{
    Audience, BodySlot, CreatureId, CreatureKind, GameTime, ItemId, ItemTypeId, Location, Notification,
    Outbound, Position,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::catalog::{ItemCatalog, ItemType};
use crate::container::ContainerContents;
use crate::creature::{Creature, CreatureRegistry, CreatureTemplate};
use crate::error::WorldError;
use crate::holder::{
    AddOutcome, Holder, HolderContext, RemoveOutcome, ReplaceOutcome, Thing, ThingHolder, WorldEvent,
};
use crate::item::{Item, ItemStore};
use crate::map::Map;
use crate::tile::Tile;
use crate::visibility::{ContainerManager, Opened};

/// Static world settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldSettings {
    /// Horizontal view distance from a creature, in tiles.
    #[serde(default = "default_view_range_x")]
    pub view_range_x: u16,
    /// Vertical view distance from a creature, in tiles.
    #[serde(default = "default_view_range_y")]
    pub view_range_y: u16,
    /// Open-container positions per creature.
    #[serde(default = "default_max_open_containers")]
    pub max_open_containers: u8,
}

const fn default_view_range_x() -> u16 {
    8
}

const fn default_view_range_y() -> u16 {
    6
}

const fn default_max_open_containers() -> u8 {
    16
}

impl Default for WorldSettings {
    fn default() -> Self {
        Self {
            view_range_x: default_view_range_x(),
            view_range_y: default_view_range_y(),
            max_open_containers: default_max_open_containers(),
        }
    }
}

/// All mutable game state.
#[derive(Debug)]
pub struct World {
    catalog: ItemCatalog,
    items: ItemStore,
    containers: BTreeMap<ItemId, ContainerContents>,
    map: Map,
    creatures: CreatureRegistry,
    visibility: ContainerManager,
    events: Vec<WorldEvent>,
    settings: WorldSettings,
}

impl World {
    /// An empty world.
    pub fn new(catalog: ItemCatalog, creatures: CreatureRegistry, settings: WorldSettings) -> Self {
        Self {
            catalog,
            items: ItemStore::new(),
            containers: BTreeMap::new(),
            map: Map::new(),
            creatures,
            visibility: ContainerManager::new(settings.max_open_containers),
            events: Vec::new(),
            settings,
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// Item types.
    pub const fn catalog(&self) -> &ItemCatalog {
        &self.catalog
    }

    /// All items.
    pub const fn items(&self) -> &ItemStore {
        &self.items
    }

    /// The tile map.
    pub const fn map(&self) -> &Map {
        &self.map
    }

    /// All creatures.
    pub const fn creatures(&self) -> &CreatureRegistry {
        &self.creatures
    }

    /// All creatures, mutably. Adding or removing creatures goes through
    /// [`World::spawn_creature`] and [`World::remove_creature`] instead.
    pub const fn creatures_mut(&mut self) -> &mut CreatureRegistry {
        &mut self.creatures
    }

    /// Open-container bookkeeping.
    pub const fn visibility(&self) -> &ContainerManager {
        &self.visibility
    }

    /// Static settings.
    pub const fn settings(&self) -> &WorldSettings {
        &self.settings
    }

    /// Contents of a container item.
    pub fn container(&self, id: ItemId) -> Option<&ContainerContents> {
        self.containers.get(&id)
    }

    /// The tile at `position`.
    pub fn tile(&self, position: Position) -> Option<&Tile> {
        self.map.tile(position)
    }

    /// An item instance.
    pub fn item(&self, id: ItemId) -> Option<&Item> {
        self.items.get(id)
    }

    /// The catalog type of an item instance.
    pub fn item_type(&self, id: ItemId) -> Option<&ItemType> {
        self.items.get(id).and_then(|item| self.catalog.get(item.type_id()))
    }

    /// A creature.
    pub fn creature(&self, id: CreatureId) -> Option<&Creature> {
        self.creatures.get(id)
    }

    // -----------------------------------------------------------------------
    // Holder dispatch
    // -----------------------------------------------------------------------

    fn with_holder<R>(
        &mut self,
        holder: Holder,
        f: impl FnOnce(&mut dyn ThingHolder, &mut HolderContext<'_>) -> R,
    ) -> Result<R, WorldError> {
        let Self {
            catalog,
            items,
            containers,
            map,
            creatures,
            events,
            ..
        } = self;
        let mut ctx = HolderContext {
            items,
            catalog: &*catalog,
            events,
        };
        match holder {
            Holder::Tile(position) => {
                let tile = map.tile_mut(position).ok_or(WorldError::TileNotFound(position))?;
                Ok(f(tile, &mut ctx))
            }
            Holder::Container(id) => match containers.get_mut(&id) {
                Some(contents) => Ok(f(contents, &mut ctx)),
                None if ctx.items.contains(id) => Err(WorldError::NotAContainer(id)),
                None => Err(WorldError::ItemNotFound(id)),
            },
            Holder::Body(owner) => {
                let creature = creatures.get_mut(owner).ok_or(WorldError::CreatureNotFound(owner))?;
                Ok(f(creature.body_mut(), &mut ctx))
            }
        }
    }

    /// Add a thing to a holder.
    ///
    /// # Errors
    ///
    /// Fails only when the holder does not exist. Rejections are reported in
    /// the outcome.
    pub fn add_to(&mut self, holder: Holder, thing: Thing, index: Option<u8>) -> Result<AddOutcome, WorldError> {
        self.with_holder(holder, |target, ctx| target.add_content(ctx, thing, index))
    }

    /// Remove a thing from a holder.
    ///
    /// # Errors
    ///
    /// Fails only when the holder does not exist.
    pub fn remove_from(
        &mut self,
        holder: Holder,
        thing: Thing,
        index: Option<u8>,
        amount: u8,
    ) -> Result<RemoveOutcome, WorldError> {
        self.with_holder(holder, |target, ctx| target.remove_content(ctx, thing, index, amount))
    }

    /// Replace a thing in a holder.
    ///
    /// # Errors
    ///
    /// Fails only when the holder does not exist.
    pub fn replace_in(
        &mut self,
        holder: Holder,
        from: Thing,
        to: Thing,
        index: Option<u8>,
        amount: u8,
    ) -> Result<ReplaceOutcome, WorldError> {
        self.with_holder(holder, |target, ctx| target.replace_content(ctx, from, to, index, amount))
    }

    // -----------------------------------------------------------------------
    // Items
    // -----------------------------------------------------------------------

    /// Create a detached item; containers get empty contents.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::UnknownItemType`] or
    /// [`WorldError::InvalidAmount`].
    pub fn create_item(&mut self, type_id: ItemTypeId, amount: u8, now: GameTime) -> Result<ItemId, WorldError> {
        let item_type = self.catalog.require(type_id)?;
        let id = self.items.create(item_type, amount, now)?;
        if let Some(capacity) = item_type.container_capacity {
            self.containers.insert(id, ContainerContents::new(id, capacity));
        }
        Ok(id)
    }

    /// Create an item and place all of it in `holder`.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::Rejected`] if the holder would not take all of
    /// it; the new item is discarded in that case.
    pub fn spawn_item(
        &mut self,
        type_id: ItemTypeId,
        amount: u8,
        holder: Holder,
        index: Option<u8>,
        now: GameTime,
    ) -> Result<ItemId, WorldError> {
        let id = self.create_item(type_id, amount, now)?;
        match self.add_to(holder, Thing::Item(id), index) {
            Ok(AddOutcome::Done) => Ok(id),
            Ok(AddOutcome::Partial { remainder }) => {
                self.destroy_tree(remainder);
                Err(crate::error::ContentRejection::ContainerFull.into())
            }
            Ok(AddOutcome::Rejected { reason, .. }) => {
                self.destroy_tree(id);
                Err(reason.into())
            }
            Err(error) => {
                self.destroy_tree(id);
                Err(error)
            }
        }
    }

    /// Remove an item from its holder and destroy it with everything inside.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::ItemNotFound`], or [`WorldError::Rejected`] if
    /// its holder refuses to let go of it.
    pub fn delete_item(&mut self, id: ItemId) -> Result<(), WorldError> {
        let item = self.items.get(id).ok_or(WorldError::ItemNotFound(id))?;
        let (amount, parent) = (item.amount(), item.parent());
        if let Some(holder) = parent {
            match self.remove_from(holder, Thing::Item(id), None, amount)? {
                RemoveOutcome::Taken(_) => {}
                RemoveOutcome::Rejected(reason) => return Err(reason.into()),
            }
        }
        self.destroy_tree(id);
        Ok(())
    }

    /// Turn an item into another type in place, or delete it when `to` is
    /// `None`. Container contents carry over when the new type is a
    /// container large enough to hold them.
    ///
    /// # Errors
    ///
    /// Returns an error if the item or type is unknown, or the holder
    /// rejects the new item.
    pub fn transform_item(
        &mut self,
        id: ItemId,
        to: Option<ItemTypeId>,
        now: GameTime,
    ) -> Result<Option<ItemId>, WorldError> {
        let item = self.items.get(id).ok_or(WorldError::ItemNotFound(id))?;
        let (amount, parent) = (item.amount(), item.parent());
        let Some(to) = to else {
            self.delete_item(id)?;
            return Ok(None);
        };
        let new_amount = if self.catalog.require(to)?.cumulative { amount } else { 1 };
        let replacement = self.create_item(to, new_amount, now)?;
        if let Some(holder) = parent {
            let outcome = self.replace_in(holder, Thing::Item(id), Thing::Item(replacement), None, amount);
            match outcome {
                Ok(ReplaceOutcome::Replaced { .. }) => {}
                Ok(ReplaceOutcome::Rejected(reason)) => {
                    self.destroy_tree(replacement);
                    return Err(reason.into());
                }
                Err(error) => {
                    self.destroy_tree(replacement);
                    return Err(error);
                }
            }
        }
        self.carry_contents_over(id, replacement);
        self.destroy_tree(id);
        Ok(Some(replacement))
    }

    fn carry_contents_over(&mut self, from: ItemId, to: ItemId) {
        let fits = match (self.containers.get(&from), self.containers.get(&to)) {
            (Some(old), Some(new)) => old.len() <= usize::from(new.capacity()),
            _ => false,
        };
        if !fits {
            return;
        }
        let moved = self
            .containers
            .get_mut(&from)
            .map(ContainerContents::take_items)
            .unwrap_or_default();
        for item in &moved {
            self.items.set_parent(*item, Some(Holder::Container(to)));
        }
        if let Some(new) = self.containers.get_mut(&to) {
            new.set_items(moved);
        }
    }

    /// Destroy a detached item and, recursively, its contents.
    pub fn destroy_tree(&mut self, id: ItemId) {
        let mut pending = vec![id];
        while let Some(current) = pending.pop() {
            if let Some(contents) = self.containers.remove(&current) {
                pending.extend_from_slice(contents.items());
            }
            if self.items.destroy(current).is_some() {
                self.events.push(WorldEvent::ItemDestroyed(current));
            }
        }
    }

    // -----------------------------------------------------------------------
    // Map and creatures
    // -----------------------------------------------------------------------

    /// Create a tile with a ground item.
    ///
    /// # Errors
    ///
    /// Fails if the ground type is unknown or the tile already has ground.
    pub fn add_tile(&mut self, position: Position, ground: ItemTypeId) -> Result<(), WorldError> {
        self.map.ensure_tile(position);
        self.spawn_item(ground, 1, Holder::Tile(position), None, GameTime::ZERO)
            .map(|_| ())
    }

    /// Create a creature and put it on its tile.
    ///
    /// # Errors
    ///
    /// Fails if there is no tile at `position` or ids are exhausted.
    pub fn spawn_creature(
        &mut self,
        kind: CreatureKind,
        template: &CreatureTemplate,
        position: Position,
    ) -> Result<CreatureId, WorldError> {
        if self.map.tile(position).is_none() {
            return Err(WorldError::TileNotFound(position));
        }
        let id = self.creatures.create(kind, template, position)?;
        self.add_to(Holder::Tile(position), Thing::Creature(id), None)?;
        self.refresh_view_sets();
        Ok(id)
    }

    /// Move a creature to another tile.
    ///
    /// Only tile bookkeeping happens here; walkability is the caller's
    /// concern.
    ///
    /// # Errors
    ///
    /// Fails if the creature or destination tile does not exist.
    pub fn move_creature(&mut self, id: CreatureId, to: Position) -> Result<Position, WorldError> {
        let from = self.creatures.require(id)?.position;
        if self.map.tile(to).is_none() {
            return Err(WorldError::TileNotFound(to));
        }
        self.remove_from(Holder::Tile(from), Thing::Creature(id), None, 1)?;
        self.add_to(Holder::Tile(to), Thing::Creature(id), None)?;
        if let Some(creature) = self.creatures.get_mut(id) {
            creature.position = to;
        }
        self.events.push(WorldEvent::CreatureMoved { creature: id, from, to });
        self.refresh_view_sets();
        Ok(from)
    }

    /// Take a creature out of the world.
    ///
    /// Its open containers close, equipped items are destroyed, and every
    /// other creature forgets it.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::CreatureNotFound`].
    pub fn remove_creature(&mut self, id: CreatureId) -> Result<Creature, WorldError> {
        let position = self.creatures.require(id)?.position;
        if self.map.tile(position).is_some() {
            self.remove_from(Holder::Tile(position), Thing::Creature(id), None, 1)?;
        }
        self.visibility.close_all_for(id);
        let creature = self.creatures.remove(id).ok_or(WorldError::CreatureNotFound(id))?;
        for (_, item) in creature.body().iter() {
            self.destroy_tree(item);
        }
        for other in self.creatures.iter_mut() {
            other.combatant.forget(id);
        }
        Ok(creature)
    }

    /// Recompute every creature's hostile/neutral/friendly view sets.
    pub fn refresh_view_sets(&mut self) {
        self.creatures
            .refresh_view_sets(self.settings.view_range_x, self.settings.view_range_y);
    }

    /// Players who can see `center`.
    pub fn spectators(&self, center: Position) -> Vec<CreatureId> {
        self.spectators_within(center, self.settings.view_range_x, self.settings.view_range_y)
    }

    /// Players within an explicit range of `center`.
    pub fn spectators_within(&self, center: Position, range_x: u16, range_y: u16) -> Vec<CreatureId> {
        self.creatures
            .iter()
            .filter(|creature| {
                creature.kind == CreatureKind::Player
                    && creature.position.same_floor(center)
                    && creature.position.x.abs_diff(center.x) <= range_x
                    && creature.position.y.abs_diff(center.y) <= range_y
            })
            .map(|creature| creature.id)
            .collect()
    }

    /// Whether a creature could step onto `position` right now.
    pub fn is_walkable(&self, position: Position) -> bool {
        self.map
            .tile(position)
            .is_some_and(|tile| tile.is_walkable(&self.catalog, &self.items))
    }

    /// Ground speed of the tile at `position`, if there is one.
    pub fn ground_speed(&self, position: Position) -> Option<u16> {
        self.map
            .tile(position)
            .map(|tile| tile.ground_speed(&self.catalog, &self.items))
    }

    /// Whether nothing blocks a throw between two positions.
    pub fn line_of_sight(&self, from: Position, to: Position) -> bool {
        self.map.line_of_sight(from, to, &self.catalog, &self.items)
    }

    // -----------------------------------------------------------------------
    // Locations
    // -----------------------------------------------------------------------

    /// The holder a creature means by `location`.
    pub fn resolve_holder(&self, requestor: CreatureId, location: Location) -> Option<Holder> {
        match location {
            Location::Map(position) => Some(Holder::Tile(position)),
            Location::Body(_) => Some(Holder::Body(requestor)),
            Location::Container { slot, .. } => self
                .visibility
                .container_at(requestor, slot)
                .map(Holder::Container),
        }
    }

    /// The holder index a creature means by `location` and a tile index.
    pub const fn holder_index(location: Location, tile_index: u8) -> u8 {
        match location {
            Location::Map(_) => tile_index,
            Location::Body(slot) => slot.index(),
            Location::Container { index, .. } => index,
        }
    }

    /// The item a creature means by `location` (and `tile_index` on the map).
    pub fn item_at(&self, requestor: CreatureId, location: Location, tile_index: u8) -> Option<ItemId> {
        match location {
            Location::Map(position) => self.map.tile(position)?.item_at(tile_index),
            Location::Body(slot) => self.creatures.get(requestor)?.body().get(slot),
            Location::Container { slot, index } => {
                let container = self.visibility.container_at(requestor, slot)?;
                self.containers.get(&container)?.get(index)
            }
        }
    }

    /// The holder an item sits in at the root of its container chain.
    pub fn root_holder(&self, item: ItemId) -> Option<Holder> {
        self.items.root_holder(item)
    }

    /// The map position of a holder (a body's position is its creature's).
    pub fn holder_position(&self, holder: Holder) -> Option<Position> {
        match holder {
            Holder::Tile(position) => Some(position),
            Holder::Body(owner) => self.creatures.get(owner).map(|creature| creature.position),
            Holder::Container(id) => self.item_position(id),
        }
    }

    /// The map position of an item, following containers and carriers.
    pub fn item_position(&self, item: ItemId) -> Option<Position> {
        match self.items.root_holder(item)? {
            Holder::Tile(position) => Some(position),
            Holder::Body(owner) => self.creatures.get(owner).map(|creature| creature.position),
            Holder::Container(_) => None,
        }
    }

    /// The creature carrying an item, directly or inside containers.
    pub fn carrier_of(&self, item: ItemId) -> Option<CreatureId> {
        match self.items.root_holder(item)? {
            Holder::Body(owner) => Some(owner),
            Holder::Tile(_) | Holder::Container(_) => None,
        }
    }

    // -----------------------------------------------------------------------
    // Open containers
    // -----------------------------------------------------------------------

    /// Whether `creature` may keep `container` open: it must lie on the
    /// map next to the creature on the same floor, or be carried by them.
    pub fn has_container_access(&self, creature: CreatureId, container: ItemId) -> bool {
        let Some(viewer) = self.creatures.get(creature) else {
            return false;
        };
        if !self.containers.contains_key(&container) {
            return false;
        }
        match self.items.root_holder(container) {
            Some(Holder::Tile(position)) => viewer.position.is_adjacent_to(position),
            Some(Holder::Body(owner)) => owner == creature,
            Some(Holder::Container(_)) | None => false,
        }
    }

    /// Record `container` as open for `creature`.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::NotAContainer`] or
    /// [`WorldError::TooManyOpenContainers`].
    pub fn open_container(
        &mut self,
        creature: CreatureId,
        container: ItemId,
        slot: Option<u8>,
    ) -> Result<Opened, WorldError> {
        if !self.containers.contains_key(&container) {
            return Err(WorldError::NotAContainer(container));
        }
        self.visibility.open_container(creature, container, slot)
    }

    /// Close `creature`'s container at `slot`.
    pub fn close_container(&mut self, creature: CreatureId, slot: u8) -> Option<ItemId> {
        self.visibility.close_container(creature, slot)
    }

    /// Close every container `creature` has open.
    pub fn close_all_containers(&mut self, creature: CreatureId) -> Vec<(u8, ItemId)> {
        self.visibility.close_all_for(creature)
    }

    /// The payload describing a freshly opened container.
    pub fn container_opened_payload(&self, container: ItemId, slot: u8) -> Option<Outbound> {
        let contents = self.containers.get(&container)?;
        let type_id = self.items.get(container)?.type_id();
        Some(Outbound::ContainerOpened {
            slot,
            container,
            type_id,
            capacity: contents.capacity(),
            contents: contents.items().to_vec(),
        })
    }

    // -----------------------------------------------------------------------
    // Reconciliation
    // -----------------------------------------------------------------------

    /// Take the pending change events.
    pub fn drain_events(&mut self) -> Vec<WorldEvent> {
        std::mem::take(&mut self.events)
    }

    /// Turn pending change events into notifications and force-close
    /// containers whose observers lost access.
    pub fn reconcile(&mut self) -> Vec<Notification> {
        let events = self.drain_events();
        let mut notes = Vec::new();
        let mut touched_tiles = BTreeSet::new();

        for event in events {
            match event {
                WorldEvent::ContentAdded { holder, index, thing } => match (holder, thing) {
                    (Holder::Container(container), Thing::Item(item)) => {
                        self.notify_observers(&mut notes, container, |slot| Outbound::ContainerContentAdded {
                            slot,
                            item,
                        });
                    }
                    (Holder::Tile(position), Thing::Item(_)) => {
                        touched_tiles.insert(position);
                    }
                    (Holder::Body(owner), _) => self.notify_body(&mut notes, owner, index),
                    _ => {}
                },
                WorldEvent::ContentRemoved { holder, index, thing } => match (holder, thing) {
                    (Holder::Container(container), _) => {
                        self.notify_observers(&mut notes, container, |slot| Outbound::ContainerContentRemoved {
                            slot,
                            index,
                        });
                    }
                    (Holder::Tile(position), Thing::Item(_)) => {
                        touched_tiles.insert(position);
                    }
                    (Holder::Body(owner), _) => self.notify_body(&mut notes, owner, index),
                    (Holder::Tile(_), Thing::Creature(_)) => {}
                },
                WorldEvent::ContentUpdated { holder, index, item } => match holder {
                    Holder::Container(container) => {
                        self.notify_observers(&mut notes, container, |slot| Outbound::ContainerContentUpdated {
                            slot,
                            index,
                            item,
                        });
                    }
                    Holder::Tile(position) => {
                        touched_tiles.insert(position);
                    }
                    Holder::Body(owner) => self.notify_body(&mut notes, owner, index),
                },
                WorldEvent::ItemDestroyed(_) | WorldEvent::CreatureMoved { .. } => {}
            }
        }

        for position in touched_tiles {
            notes.push(Notification::new(
                Audience::Spectators {
                    center: position,
                    range_x: self.settings.view_range_x,
                    range_y: self.settings.view_range_y,
                },
                vec![Outbound::TileUpdated { position }],
            ));
        }

        self.close_unreachable_containers(&mut notes);
        notes
    }

    fn notify_observers(&self, notes: &mut Vec<Notification>, container: ItemId, payload: impl Fn(u8) -> Outbound) {
        for (observer, slot) in self.visibility.observers_of(container) {
            notes.push(Notification::new(Audience::Creature(observer), vec![payload(slot)]));
        }
    }

    fn notify_body(&self, notes: &mut Vec<Notification>, owner: CreatureId, index: u8) {
        let Some(slot) = BodySlot::from_index(index) else {
            return;
        };
        let item = self.creatures.get(owner).and_then(|creature| creature.body().get(slot));
        notes.push(Notification::new(
            Audience::Creature(owner),
            vec![Outbound::BodySlotUpdated { slot, item }],
        ));
    }

    fn close_unreachable_containers(&mut self, notes: &mut Vec<Notification>) {
        for container in self.visibility.observed_containers() {
            let observers: Vec<(CreatureId, u8)> = self.visibility.observers_of(container).collect();
            for (creature, slot) in observers {
                if self.has_container_access(creature, container) {
                    continue;
                }
                self.visibility.close_container(creature, slot);
                debug!(%creature, %container, slot, "container force-closed");
                if self.creatures.contains(creature) {
                    notes.push(Notification::new(
                        Audience::Creature(creature),
                        vec![Outbound::ContainerClosed { slot }],
                    ));
                }
            }
        }
    }

    /// Total amount of `type_id` across the world.
    pub fn total_amount(&self, type_id: ItemTypeId) -> u64 {
        self.items.total_amount(type_id)
    }

    /// Items whose parent link and holder contents disagree. Empty in a
    /// consistent world.
    pub fn orphaned_items(&self) -> Vec<ItemId> {
        let mut orphans = Vec::new();
        for item in self.items.iter() {
            let held = match item.parent() {
                Some(Holder::Tile(position)) => self.map.tile(position).is_some_and(|tile| {
                    tile.ground() == Some(item.id()) || tile.items().contains(&item.id())
                }),
                Some(Holder::Container(container)) => self
                    .containers
                    .get(&container)
                    .is_some_and(|contents| contents.items().contains(&item.id())),
                Some(Holder::Body(owner)) => self
                    .creatures
                    .get(owner)
                    .is_some_and(|creature| creature.body().slot_of(item.id()).is_some()),
                None => false,
            };
            if !held {
                orphans.push(item.id());
            }
        }
        if !orphans.is_empty() {
            warn!(count = orphans.len(), "orphaned items found");
        }
        orphans
    }
}
