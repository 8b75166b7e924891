//! A creature running out of health.

use std::time::Duration;

use ironhold_core::{ElevatedOperation, ElevatedOperationContext, ExecutionResult, Operation, OperationError, OperationHeader};
use ironhold_types::{Audience, CreatureId, CreatureKind, ExhaustionCategory, MessageKind, OperationKind, Outbound};
use ironhold_world::Holder;
use tracing::{info, warn};

use crate::items::schedule_expiry;
use crate::messages::YOU_ARE_DEAD;

/// Takes a dead creature out of the world and leaves its corpse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Death {
    victim: CreatureId,
    killer: Option<CreatureId>,
}

impl Death {
    /// `victim` died, struck last by `killer`.
    pub const fn new(victim: CreatureId, killer: Option<CreatureId>) -> Self {
        Self { victim, killer }
    }

    /// Wrap into a schedulable operation. Death cannot be cancelled.
    pub fn into_operation(self) -> Operation {
        let header =
            OperationHeader::new(OperationKind::Death, ExhaustionCategory::System, Some(self.victim)).non_cancellable();
        Operation::elevated(header, self)
    }
}

impl ElevatedOperation for Death {
    fn execute(
        &mut self,
        _header: &mut OperationHeader,
        ctx: &mut ElevatedOperationContext<'_>,
    ) -> Result<ExecutionResult, OperationError> {
        let now = ctx.now();
        let Some(victim) = ctx.world().creature(self.victim) else {
            return Ok(ExecutionResult::aborted());
        };
        let (position, kind, corpse_type, name) = (victim.position, victim.kind, victim.corpse_type, victim.name.clone());

        let attackers = ctx.world().creatures().attackers_of(self.victim);
        for attacker in &attackers {
            if let Some(creature) = ctx.creature_mut(*attacker) {
                creature.combatant.clear_targets();
                creature.combatant.orchestrator = None;
            }
        }
        if !attackers.is_empty() {
            ctx.notify(Audience::Creatures(attackers), vec![Outbound::AttackTargetCleared]);
        }

        ctx.cancel_everything_for(self.victim);
        ctx.forget_cooldowns(self.victim);
        let closed = ctx.world_mut().close_all_containers(self.victim);
        if !closed.is_empty() {
            let payloads = closed
                .into_iter()
                .map(|(slot, _)| Outbound::ContainerClosed { slot })
                .collect();
            ctx.notify(Audience::Creature(self.victim), payloads);
        }
        if kind == CreatureKind::Player {
            ctx.message(self.victim, MessageKind::StatusSmall, YOU_ARE_DEAD);
        }

        ctx.world_mut().remove_creature(self.victim)?;
        ctx.notify_spectators(position, vec![Outbound::CreatureRemoved {
            creature: self.victim,
            position,
        }]);

        if let Some(corpse_type) = corpse_type {
            match ctx
                .world_mut()
                .spawn_item(corpse_type, 1, Holder::Tile(position), None, now)
            {
                Ok(corpse) => schedule_expiry(ctx, corpse),
                Err(error) => warn!(creature = %self.victim, error = %error, "corpse could not be placed"),
            }
        }

        info!(creature = %self.victim, name = %name, killer = ?self.killer, "creature died");
        Ok(ExecutionResult::performed())
    }
}
