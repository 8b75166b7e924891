//! Shared type definitions for the Ironhold world simulation.
//!
//! This crate is the single source of truth for the small value types that
//! flow between the world model, the scheduler, and the operations.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe identifiers for items, operations, creatures
//! - [`enums`] -- Exhaustion categories, operation kinds, body slots, modes
//! - [`position`] -- Map coordinates, directions, and thing locations
//! - [`time`] -- The simulation clock's [`GameTime`]
//! - [`notifications`] -- Outbound payloads and audiences

pub mod enums;
pub mod ids;
pub mod notifications;
pub mod position;
pub mod time;

// Re-export all public types at crate root for convenience.
pub use enums::{
    BodySlot, ChaseMode, CombatCredit, CreatureKind, ExhaustionCategory, FightMode, MessageKind,
    OperationKind, SpeechType,
};
pub use ids::{CreatureId, ItemId, ItemTypeId, OperationId};
pub use notifications::{Audience, Notification, Outbound};
pub use position::{Direction, Location, Position};
pub use time::{GameTime, duration_to_millis};
