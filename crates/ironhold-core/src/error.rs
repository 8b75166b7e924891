//! Error types for operation execution.
//!
//! Expected failures (a target walked away, a container is full) are not
//! errors: operations handle them and report an aborted effect. An
//! [`OperationError`] means the operation was wired up wrong or the world
//! disagrees with itself, and is logged by the fire loop.

use ironhold_types::{CreatureId, ItemId};
use ironhold_world::WorldError;

/// Errors an operation's `execute` may return.
#[derive(Debug, thiserror::Error)]
pub enum OperationError {
    /// A creature the operation depends on does not exist.
    #[error("creature not found: {0}")]
    CreatureNotFound(CreatureId),

    /// An item the operation depends on does not exist.
    #[error("item not found: {0}")]
    ItemNotFound(ItemId),

    /// The world rejected a mutation.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: WorldError,
    },

    /// The operation was built with arguments it cannot act on.
    #[error("invalid operation arguments: {reason}")]
    InvalidArguments {
        /// What was wrong.
        reason: String,
    },
}
