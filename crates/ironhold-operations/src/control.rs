//! Cancelling what a creature has queued.

use ironhold_core::{ExecutionResult, Operation, OperationContext, OperationError, OperationHeader, StandardOperation};
use ironhold_types::{Audience, CreatureId, ExhaustionCategory, OperationKind, Outbound};
use tracing::debug;

/// Cancels a creature's pending operations, of one kind or all of them.
///
/// Cancelling everything also drops the creature's attack and chase
/// targets, the way a player's "stop" does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CancelOperations {
    creature: CreatureId,
    kind: Option<OperationKind>,
}

impl CancelOperations {
    /// Cancel `creature`'s pending operations of `kind`, or all when `None`.
    pub const fn new(creature: CreatureId, kind: Option<OperationKind>) -> Self {
        Self { creature, kind }
    }

    /// Wrap into a schedulable operation.
    pub fn into_operation(self) -> Operation {
        let header = OperationHeader::new(OperationKind::CancelOperations, ExhaustionCategory::System, Some(self.creature))
            .non_cancellable();
        Operation::standard(header, self)
    }
}

impl StandardOperation for CancelOperations {
    fn execute(
        &mut self,
        _header: &mut OperationHeader,
        ctx: &mut OperationContext<'_>,
    ) -> Result<ExecutionResult, OperationError> {
        if !ctx.world().creatures().contains(self.creature) {
            return Ok(ExecutionResult::aborted());
        }
        let cancelled = match self.kind {
            Some(kind) => ctx.cancel_all_for(self.creature, kind),
            None => ctx.cancel_everything_for(self.creature),
        };

        let mut had_target = false;
        if self.kind.is_none()
            && let Some(creature) = ctx.creature_mut(self.creature)
        {
            had_target = creature.combatant.auto_attack_target.is_some();
            creature.combatant.clear_targets();
            creature.combatant.orchestrator = None;
            creature.combatant.pending_auto_attack = None;
        }
        if had_target {
            ctx.notify(Audience::Creature(self.creature), vec![Outbound::AttackTargetCleared]);
        }

        debug!(creature = %self.creature, kind = ?self.kind, cancelled, "operations cancelled");
        Ok(if cancelled > 0 || had_target {
            ExecutionResult::performed()
        } else {
            ExecutionResult::aborted()
        })
    }
}
