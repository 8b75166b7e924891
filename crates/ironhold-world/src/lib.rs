//! World model for the Ironhold simulation.
//!
//! Everything an operation can touch lives here: the tile map, the item
//! arena, container contents, creatures with their equipment and combat
//! state, and the table of open containers.
//!
//! # Modules
//!
//! - [`catalog`] -- Item types and the stack size limit
//! - [`item`] -- Item instances and the item arena
//! - [`holder`] -- The add/remove/replace contract and change events
//! - [`tile`] -- Map tiles
//! - [`container`] -- Container item contents
//! - [`body`] -- Equipment slots
//! - [`map`] -- Tile storage and line of sight
//! - [`creature`] -- Creatures, combatants, and the creature registry
//! - [`visibility`] -- Open-container bookkeeping and observers
//! - [`world`] -- The [`World`] that ties it together
//! - [`error`] -- Error and rejection types

pub mod body;
pub mod catalog;
pub mod container;
pub mod creature;
pub mod error;
pub mod holder;
pub mod item;
pub mod map;
pub mod tile;
pub mod visibility;
pub mod world;

pub use body::BodyInventory;
pub use catalog::{DEFAULT_GROUND_SPEED, ItemCatalog, ItemType, MAX_STACK};
pub use container::ContainerContents;
pub use creature::{
    Combatant, Creature, CreatureIdGenerator, CreatureRegistry, CreatureTemplate, SequentialCreatureIds,
    Stance,
};
pub use error::{ContentRejection, WorldError};
pub use holder::{AddOutcome, Holder, HolderContext, RemoveOutcome, ReplaceOutcome, Thing, ThingHolder, WorldEvent};
pub use item::{Item, ItemAttribute, ItemStore, MergeOutcome};
pub use map::Map;
pub use tile::{TILE_ITEM_LIMIT, Tile};
pub use visibility::{ContainerManager, Opened};
pub use world::{World, WorldSettings};
