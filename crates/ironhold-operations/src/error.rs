//! Error types for building operations.

use ironhold_types::OperationKind;

/// Errors from [`OperationFactory`](crate::factory::OperationFactory).
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FactoryError {
    /// The arguments belong to a different kind of operation.
    #[error("operation kind {kind} does not accept {given} arguments")]
    NotSupported {
        /// The kind that was requested.
        kind: OperationKind,
        /// The kind the arguments are for.
        given: OperationKind,
    },
}
