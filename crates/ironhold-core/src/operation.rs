//! The operation contract.
//!
//! An [`Operation`] is one unit of scheduled work: an [`OperationHeader`]
//! carrying identity, requestor, exhaustion category, cost, and the
//! cancellation flag, plus a body implementing either
//! [`StandardOperation`] or [`ElevatedOperation`]. Which trait a body
//! implements decides which context it receives, and so which parts of
//! the world it can touch.
//!
//! # Execution contract
//!
//! - `execute` runs on the fire loop, sequentially with every other
//!   operation. It must be short and must not block.
//! - The returned [`ExecutionResult`] says whether the effect happened
//!   (only performed effects charge the requestor's cooldown) and whether
//!   to fire again later under the same identity.
//! - Cancelling is advisory: it prevents future firings and never
//!   interrupts a running `execute`.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use ironhold_types::{CreatureId, ExhaustionCategory, OperationId, OperationKind};

use crate::context::{ElevatedOperationContext, OperationContext};
use crate::error::OperationError;

/// Identity and bookkeeping shared by every operation.
///
/// Clones share the cancellation flag.
#[derive(Debug, Clone)]
pub struct OperationHeader {
    id: OperationId,
    requestor: Option<CreatureId>,
    kind: OperationKind,
    category: ExhaustionCategory,
    cost: Duration,
    cancellable: bool,
    cancelled: Arc<AtomicBool>,
}

impl OperationHeader {
    /// A cancellable header with zero cost and a fresh id.
    pub fn new(kind: OperationKind, category: ExhaustionCategory, requestor: Option<CreatureId>) -> Self {
        Self {
            id: OperationId::new(),
            requestor,
            kind,
            category,
            cost: Duration::ZERO,
            cancellable: true,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Set the exhaustion cost.
    #[must_use]
    pub const fn with_cost(mut self, cost: Duration) -> Self {
        self.cost = cost;
        self
    }

    /// Make the operation immune to cancellation.
    #[must_use]
    pub const fn non_cancellable(mut self) -> Self {
        self.cancellable = false;
        self
    }

    /// The operation's identity, stable across repeats.
    pub const fn id(&self) -> OperationId {
        self.id
    }

    /// The creature on whose behalf the operation runs, if any.
    pub const fn requestor(&self) -> Option<CreatureId> {
        self.requestor
    }

    /// What sort of operation this is.
    pub const fn kind(&self) -> OperationKind {
        self.kind
    }

    /// The cooldown bucket charged on a performed effect.
    pub const fn category(&self) -> ExhaustionCategory {
        self.category
    }

    /// Cooldown charged on a performed effect.
    pub const fn cost(&self) -> Duration {
        self.cost
    }

    /// Change the cost; operations that learn their cost while executing
    /// (a step on slow ground) set it here.
    pub const fn set_cost(&mut self, cost: Duration) {
        self.cost = cost;
    }

    /// Whether the operation can be cancelled.
    pub const fn is_cancellable(&self) -> bool {
        self.cancellable
    }

    /// Mark the operation cancelled. Returns `false` without effect when it
    /// is not cancellable.
    pub fn cancel(&self) -> bool {
        if !self.cancellable {
            return false;
        }
        self.cancelled.store(true, Ordering::Release);
        true
    }

    /// Whether the operation has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Whether an execution did anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// The effect happened; the cost is charged.
    Performed,
    /// Nothing happened; no cost is charged.
    Aborted,
}

/// What `execute` reports back to the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionResult {
    /// Whether the effect happened.
    pub effect: Effect,
    /// Fire again after this long, under the same identity.
    pub repeat_after: Option<Duration>,
}

impl ExecutionResult {
    /// The effect happened; do not repeat.
    pub const fn performed() -> Self {
        Self {
            effect: Effect::Performed,
            repeat_after: None,
        }
    }

    /// Nothing happened; do not repeat.
    pub const fn aborted() -> Self {
        Self {
            effect: Effect::Aborted,
            repeat_after: None,
        }
    }

    /// Fire again after `delay`.
    #[must_use]
    pub const fn repeat_after(mut self, delay: Duration) -> Self {
        self.repeat_after = Some(delay);
        self
    }

    /// Whether the effect happened.
    pub const fn is_performed(&self) -> bool {
        matches!(self.effect, Effect::Performed)
    }
}

/// Operations that read the world and mutate only creatures.
pub trait StandardOperation: Send + std::fmt::Debug {
    /// Run the operation.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError`] only for wiring bugs or world
    /// inconsistencies; expected failures abort instead.
    fn execute(
        &mut self,
        header: &mut OperationHeader,
        ctx: &mut OperationContext<'_>,
    ) -> Result<ExecutionResult, OperationError>;
}

/// Operations that may mutate anything in the world.
pub trait ElevatedOperation: Send + std::fmt::Debug {
    /// Run the operation.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError`] only for wiring bugs or world
    /// inconsistencies; expected failures abort instead.
    fn execute(
        &mut self,
        header: &mut OperationHeader,
        ctx: &mut ElevatedOperationContext<'_>,
    ) -> Result<ExecutionResult, OperationError>;
}

/// An operation body, tagged by the context it needs.
#[derive(Debug)]
pub enum OperationBody {
    /// Runs with an [`OperationContext`].
    Standard(Box<dyn StandardOperation>),
    /// Runs with an [`ElevatedOperationContext`].
    Elevated(Box<dyn ElevatedOperation>),
}

/// A schedulable unit of work.
#[derive(Debug)]
pub struct Operation {
    pub(crate) header: OperationHeader,
    pub(crate) body: OperationBody,
}

impl Operation {
    /// An operation running with the standard context.
    pub fn standard(header: OperationHeader, body: impl StandardOperation + 'static) -> Self {
        Self {
            header,
            body: OperationBody::Standard(Box::new(body)),
        }
    }

    /// An operation running with the elevated context.
    pub fn elevated(header: OperationHeader, body: impl ElevatedOperation + 'static) -> Self {
        Self {
            header,
            body: OperationBody::Elevated(Box::new(body)),
        }
    }

    /// The header.
    pub const fn header(&self) -> &OperationHeader {
        &self.header
    }

    /// The operation's identity.
    pub const fn id(&self) -> OperationId {
        self.header.id
    }

    /// The body.
    pub const fn body(&self) -> &OperationBody {
        &self.body
    }

    /// Whether the body needs the elevated context.
    pub const fn is_elevated(&self) -> bool {
        matches!(self.body, OperationBody::Elevated(_))
    }
}
