//! The operations that change the Ironhold world.
//!
//! Each operation is a small struct implementing
//! [`StandardOperation`](ironhold_core::StandardOperation) or
//! [`ElevatedOperation`](ironhold_core::ElevatedOperation), with an
//! `into_operation` that wraps it in a header naming its kind, cooldown
//! category, and requestor. [`OperationFactory`] builds any of them from a
//! [`CreationArgs`] value.
//!
//! # Modules
//!
//! - [`combat`] -- Auto-attack orchestration, strikes, and credit restoration.
//! - [`control`] -- Cancelling a creature's queued operations.
//! - [`creature`] -- Turning, combat modes, and looking at things.
//! - [`death`] -- Removing dead creatures and leaving corpses.
//! - [`error`] -- [`FactoryError`].
//! - [`factory`] -- [`CreationArgs`] and [`OperationFactory`].
//! - [`items`] -- Creating, deleting, changing, and expiring items.
//! - [`movement`] -- Moving items between holders and creatures between tiles.
//! - [`session`] -- Players logging in and out.
//! - [`spawn`] -- Monster spawn points.
//! - [`speech`] -- Whispering, saying, and yelling.
//! - [`walk`] -- Walking a route or chasing a target step by step.

pub mod combat;
pub mod control;
pub mod creature;
pub mod death;
pub mod error;
pub mod factory;
pub mod items;
mod messages;
pub mod movement;
pub mod session;
pub mod spawn;
pub mod speech;
pub mod walk;

pub use combat::{AutoAttack, AutoAttackOrchestrator, RestoreCombatCredit};
pub use control::CancelOperations;
pub use creature::{ChangeModes, LookAt, LookTarget, Turn};
pub use death::Death;
pub use error::FactoryError;
pub use factory::{CreationArgs, OperationFactory};
pub use items::{ChangeItem, CreateItem, DeleteItem, ExpireItem};
pub use movement::{MovedThing, Movement, MovementArgs};
pub use session::{LogIn, LogOut};
pub use spawn::SpawnMonsters;
pub use speech::Speech;
pub use walk::{AutoWalkOrchestrator, WalkPlan};
