//! Error types for the `ironhold-world` crate.
//!
//! [`WorldError`] covers lookups and wiring mistakes that callers are
//! expected to avoid. [`ContentRejection`] is the reason a holder declined
//! an add, remove, or replace; it is an expected outcome, not a failure of
//! the world model.

use ironhold_types::{BodySlot, CreatureId, ItemId, ItemTypeId, Position};

/// Errors that can occur during world operations.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// The item type is not in the catalog.
    #[error("unknown item type: {0}")]
    UnknownItemType(ItemTypeId),

    /// The catalog was built with the same type id twice.
    #[error("duplicate item type: {0}")]
    DuplicateItemType(ItemTypeId),

    /// No item with this id exists.
    #[error("item not found: {0}")]
    ItemNotFound(ItemId),

    /// No creature with this id exists.
    #[error("creature not found: {0}")]
    CreatureNotFound(CreatureId),

    /// There is no tile at the position.
    #[error("no tile at {0}")]
    TileNotFound(Position),

    /// The item is not a container.
    #[error("item {0} is not a container")]
    NotAContainer(ItemId),

    /// A new item was requested with an amount outside `1..=100`.
    #[error("invalid amount {amount} for item type {type_id}")]
    InvalidAmount {
        /// The requested type.
        type_id: ItemTypeId,
        /// The requested amount.
        amount: u8,
    },

    /// The creature has no free open-container positions.
    #[error("creature {creature} cannot open more than {limit} containers")]
    TooManyOpenContainers {
        /// The creature.
        creature: CreatureId,
        /// The configured limit.
        limit: u8,
    },

    /// The id generator ran out of identifiers.
    #[error("creature id space exhausted")]
    CreatureIdsExhausted,

    /// A holder rejected content during world setup.
    #[error("content rejected: {0}")]
    Rejected(#[from] ContentRejection),
}

/// Why a holder declined to add, remove, or replace a thing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ContentRejection {
    /// The thing is not held here.
    #[error("thing not found in holder")]
    NotFound,

    /// The item at the requested index is not the expected item.
    #[error("index does not hold the expected thing")]
    IndexMismatch,

    /// The requested amount is zero or exceeds the stack.
    #[error("invalid amount")]
    InvalidAmount,

    /// The container has no free slots.
    #[error("container is full")]
    ContainerFull,

    /// The tile cannot take more items.
    #[error("tile is full")]
    TileFull,

    /// The body slot already holds a non-matching item.
    #[error("slot {0:?} is occupied")]
    SlotOccupied(BodySlot),

    /// The item cannot be worn in this slot.
    #[error("item cannot be placed in slot {0:?}")]
    IncompatibleSlot(BodySlot),

    /// No body slot can take the item.
    #[error("no free slot")]
    NoFreeSlot,

    /// A two-handed item conflicts with the other hand.
    #[error("both hands must be free")]
    BothHandsRequired,

    /// A container would end up inside itself.
    #[error("container cannot contain itself")]
    WouldContainItself,

    /// Creatures can only stand on tiles.
    #[error("holder only accepts items")]
    ItemsOnly,

    /// The tile already has a ground item.
    #[error("tile already has ground")]
    GroundOccupied,
}
