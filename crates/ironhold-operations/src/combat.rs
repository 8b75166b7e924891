//! Automatic combat: the orchestrator, strikes, and credit restoration.
//!
//! ## Combat flow
//!
//! 1. An [`AutoAttackOrchestrator`] fires for the attacker. On its first
//!    firing it records the target (cancelling any other orchestrator the
//!    attacker had) and, in chase mode, starts following the target.
//! 2. Every cycle, one combat round divided by the attacker's attack
//!    speed, it cancels the strike it tracked last and schedules a fresh
//!    [`AutoAttack`].
//! 3. The strike checks its preconditions when it fires. A target that
//!    changed or died, or an attacker without credits, aborts silently. A
//!    target out of range or out of sight keeps the strike tracked and
//!    retries it after twice the cycle, at no cost.
//! 4. A landed strike spends an attack credit (and a defense credit of the
//!    target, if it has one), rolls damage, and schedules the credits'
//!    [`RestoreCombatCredit`]. A target left without health is handed to
//!    [`Death`].
//!
//! The orchestrator stops the moment the attacker's target is cleared.

use std::time::Duration;

use ironhold_core::{
    ExecutionResult, Operation, OperationContext, OperationError, OperationHeader, StandardOperation,
};
use ironhold_types::{
    Audience, ChaseMode, CombatCredit, CreatureId, ExhaustionCategory, MessageKind, OperationId, OperationKind, Outbound,
};
use rand::Rng;
use tracing::debug;

use crate::death::Death;
use crate::messages::TARGET_LOST;
use crate::walk::AutoWalkOrchestrator;

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Drives an attacker's strikes against one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutoAttackOrchestrator {
    attacker: CreatureId,
    target: Option<CreatureId>,
    started: bool,
}

impl AutoAttackOrchestrator {
    /// An orchestrator setting `attacker`'s target. `None` stops attacking.
    pub const fn new(attacker: CreatureId, target: Option<CreatureId>) -> Self {
        Self {
            attacker,
            target,
            started: false,
        }
    }

    /// Wrap into a schedulable operation.
    pub fn into_operation(self) -> Operation {
        let header = OperationHeader::new(
            OperationKind::AutoAttackOrchestrator,
            ExhaustionCategory::System,
            Some(self.attacker),
        );
        Operation::standard(header, self)
    }

    fn start(&mut self, ctx: &mut OperationContext<'_>) -> Result<(), OperationError> {
        self.started = true;
        let current = ctx.current();
        ctx.cancel_all_for(self.attacker, OperationKind::AutoAttackOrchestrator);

        let attacker = ctx
            .creature_mut(self.attacker)
            .ok_or(OperationError::CreatureNotFound(self.attacker))?;
        let combatant = &mut attacker.combatant;
        combatant.auto_attack_target = self.target;
        combatant.orchestrator = self.target.map(|_| current);
        let previous_strike = combatant.pending_auto_attack.take();
        let chase = match self.target {
            Some(target) if combatant.chase_mode == ChaseMode::Chase => {
                combatant.chase_target = Some(target);
                Some(target)
            }
            Some(_) => None,
            None => {
                combatant.chase_target = None;
                None
            }
        };

        if let Some(strike) = previous_strike {
            ctx.cancel(strike);
        }
        if let Some(target) = chase {
            ctx.cancel_all_for(self.attacker, OperationKind::AutoWalkOrchestrator);
            ctx.schedule(AutoWalkOrchestrator::chasing(self.attacker, target).into_operation(), Duration::ZERO);
        }
        if self.target.is_none() {
            ctx.notify(Audience::Creature(self.attacker), vec![Outbound::AttackTargetCleared]);
        }
        debug!(attacker = %self.attacker, target = ?self.target, "attack target set");
        Ok(())
    }

    /// Clear the attacker's target and tell them.
    fn lose_target(&self, ctx: &mut OperationContext<'_>) {
        let mut strike = None;
        if let Some(attacker) = ctx.creature_mut(self.attacker) {
            attacker.combatant.clear_targets();
            attacker.combatant.orchestrator = None;
            strike = attacker.combatant.pending_auto_attack.take();
        }
        if let Some(strike) = strike {
            ctx.cancel(strike);
        }
        ctx.notify(Audience::Creature(self.attacker), vec![Outbound::AttackTargetCleared]);
        ctx.message(self.attacker, MessageKind::StatusSmall, TARGET_LOST);
    }
}

impl StandardOperation for AutoAttackOrchestrator {
    fn execute(
        &mut self,
        _header: &mut OperationHeader,
        ctx: &mut OperationContext<'_>,
    ) -> Result<ExecutionResult, OperationError> {
        if !ctx.world().creatures().contains(self.attacker) {
            return Ok(ExecutionResult::aborted());
        }
        if !self.started {
            self.start(ctx)?;
        }

        let current = ctx.current();
        let Some(attacker) = ctx.world().creature(self.attacker) else {
            return Ok(ExecutionResult::aborted());
        };
        let combatant = &attacker.combatant;
        let Some(target) = combatant.auto_attack_target else {
            return Ok(ExecutionResult::performed());
        };
        if self.target != Some(target) || combatant.orchestrator != Some(current) {
            return Ok(ExecutionResult::performed());
        }
        let attack_speed = combatant.attack_speed;
        let previous_strike = combatant.pending_auto_attack;

        let target_alive = ctx.world().creature(target).is_some_and(|found| !found.is_dead());
        if !target_alive {
            self.lose_target(ctx);
            return Ok(ExecutionResult::performed());
        }

        if let Some(strike) = previous_strike {
            ctx.cancel(strike);
        }
        let strike = ctx.schedule(AutoAttack::new(self.attacker, target).into_operation(), Duration::ZERO);
        if let Some(attacker) = ctx.creature_mut(self.attacker) {
            attacker.combatant.pending_auto_attack = Some(strike);
        }

        let cycle = ctx.rules().combat.round_for(attack_speed);
        Ok(ExecutionResult::performed().repeat_after(cycle))
    }
}

// ---------------------------------------------------------------------------
// Strike
// ---------------------------------------------------------------------------

/// One strike against a captured target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutoAttack {
    attacker: CreatureId,
    target: CreatureId,
}

impl AutoAttack {
    /// A strike by `attacker` on `target`.
    pub const fn new(attacker: CreatureId, target: CreatureId) -> Self {
        Self { attacker, target }
    }

    /// Wrap into a schedulable operation.
    pub fn into_operation(self) -> Operation {
        let header = OperationHeader::new(OperationKind::AutoAttack, ExhaustionCategory::Combat, Some(self.attacker));
        Operation::standard(header, self)
    }

    /// Stop tracking this strike if the attacker still tracks it.
    fn untrack(self, ctx: &mut OperationContext<'_>) {
        let current = ctx.current();
        if let Some(attacker) = ctx.creature_mut(self.attacker)
            && attacker.combatant.pending_auto_attack == Some(current)
        {
            attacker.combatant.pending_auto_attack = None;
        }
    }
}

impl StandardOperation for AutoAttack {
    fn execute(
        &mut self,
        header: &mut OperationHeader,
        ctx: &mut OperationContext<'_>,
    ) -> Result<ExecutionResult, OperationError> {
        let current = ctx.current();
        let Some(attacker) = ctx.world().creature(self.attacker) else {
            return Ok(ExecutionResult::aborted());
        };
        let (from, attack_speed, range, skill, credits) = (
            attacker.position,
            attacker.combatant.attack_speed,
            attacker.combatant.attack_range,
            attacker.combatant.skill,
            attacker.combatant.attack_credits,
        );
        if attacker.combatant.auto_attack_target != Some(self.target) {
            self.untrack(ctx);
            return Ok(ExecutionResult::aborted());
        }
        let Some(target) = ctx.world().creature(self.target).filter(|found| !found.is_dead()) else {
            self.untrack(ctx);
            return Ok(ExecutionResult::aborted());
        };
        let (to, armor, defense_speed) = (target.position, target.combatant.armor, target.combatant.defense_speed);
        if credits == 0 {
            self.untrack(ctx);
            return Ok(ExecutionResult::aborted());
        }

        if !from.within_range(to, range) || !ctx.world().line_of_sight(from, to) {
            if let Some(attacker) = ctx.creature_mut(self.attacker) {
                attacker.combatant.pending_auto_attack = Some(current);
            }
            header.set_cost(Duration::ZERO);
            let retry = ctx.rules().combat.retry_for(attack_speed);
            debug!(attacker = %self.attacker, target = %self.target, "target out of reach, strike re-tracked");
            return Ok(ExecutionResult::aborted().repeat_after(retry));
        }

        let roll = ctx.rng().random_range(1..=skill.max(1));
        let damage = roll.saturating_sub(armor);
        let mut defended = false;
        let mut health_percent = 0;
        let mut died = false;
        if let Some(target) = ctx.creature_mut(self.target) {
            defended = target.combatant.consume_defense_credit();
            target.apply_damage(damage);
            health_percent = target.health_percent();
            died = target.is_dead();
        }
        if let Some(attacker) = ctx.creature_mut(self.attacker) {
            attacker.combatant.consume_attack_credit();
        }
        self.untrack(ctx);

        ctx.notify_spectators(
            to,
            vec![
                Outbound::DamageDealt {
                    attacker: self.attacker,
                    target: self.target,
                    amount: damage,
                },
                Outbound::CreatureHealth {
                    creature: self.target,
                    health_percent,
                },
            ],
        );
        debug!(attacker = %self.attacker, target = %self.target, damage, "strike landed");

        let rules = &ctx.rules().combat;
        let attack_round = rules.round_for(attack_speed);
        let defense_round = rules.round_for(defense_speed);
        ctx.schedule(
            RestoreCombatCredit::new(self.attacker, CombatCredit::Attack).into_operation(),
            attack_round,
        );
        if defended {
            ctx.schedule(
                RestoreCombatCredit::new(self.target, CombatCredit::Defense).into_operation(),
                defense_round,
            );
        }
        if died {
            ctx.schedule(Death::new(self.target, Some(self.attacker)).into_operation(), Duration::ZERO);
        }
        Ok(ExecutionResult::performed())
    }
}

// ---------------------------------------------------------------------------
// Credit restoration
// ---------------------------------------------------------------------------

/// Gives back one combat credit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestoreCombatCredit {
    creature: CreatureId,
    credit: CombatCredit,
}

impl RestoreCombatCredit {
    /// Restore one `credit` to `creature`.
    pub const fn new(creature: CreatureId, credit: CombatCredit) -> Self {
        Self { creature, credit }
    }

    /// Wrap into a schedulable, non-cancellable operation.
    pub fn into_operation(self) -> Operation {
        let header = OperationHeader::new(
            OperationKind::RestoreCombatCredit,
            ExhaustionCategory::System,
            Some(self.creature),
        )
        .non_cancellable();
        Operation::standard(header, self)
    }
}

impl StandardOperation for RestoreCombatCredit {
    fn execute(
        &mut self,
        _header: &mut OperationHeader,
        ctx: &mut OperationContext<'_>,
    ) -> Result<ExecutionResult, OperationError> {
        match ctx.creature_mut(self.creature) {
            Some(creature) => {
                creature.combatant.restore_credit(self.credit);
                Ok(ExecutionResult::performed())
            }
            None => Ok(ExecutionResult::aborted()),
        }
    }
}

/// The strike `attacker` currently tracks, if its target has come into
/// range and sight. Used by movement to fire waiting strikes early.
pub(crate) fn strike_now_in_range(ctx: &OperationContext<'_>, attacker: CreatureId) -> Option<OperationId> {
    let world = ctx.world();
    let creature = world.creature(attacker)?;
    let strike = creature.combatant.pending_auto_attack?;
    let target = world.creature(creature.combatant.auto_attack_target?)?;
    let (from, to) = (creature.position, target.position);
    (from.within_range(to, creature.combatant.attack_range) && world.line_of_sight(from, to)).then_some(strike)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use ironhold_core::{Effect, Services, Simulation};
    use ironhold_types::{CreatureKind, GameTime, ItemTypeId, Position};
    use ironhold_world::{CreatureRegistry, CreatureTemplate, ItemCatalog, ItemType, World, WorldSettings};

    use super::*;

    fn simulation() -> (Simulation, CreatureId, CreatureId) {
        let catalog = ItemCatalog::from_types([ItemType {
            ground: true,
            movable: false,
            ..ItemType::simple(102, "grass")
        }])
        .unwrap();
        let mut world = World::new(catalog, CreatureRegistry::default(), WorldSettings::default());
        for x in 0..6 {
            world.add_tile(Position::new(x, 0, 7), ItemTypeId(102)).unwrap();
        }
        let knight = world
            .spawn_creature(CreatureKind::Player, &CreatureTemplate::named("Knight"), Position::new(0, 0, 7))
            .unwrap();
        let rat = world
            .spawn_creature(CreatureKind::Monster, &CreatureTemplate::named("Rat"), Position::new(1, 0, 7))
            .unwrap();
        let (services, _) = Services::buffered(3);
        (Simulation::new(world, services), knight, rat)
    }

    #[test]
    fn restore_is_capped_at_pool_size() {
        let (mut sim, knight, _) = simulation();
        sim.schedule(
            RestoreCombatCredit::new(knight, CombatCredit::Attack).into_operation(),
            Duration::ZERO,
        );
        sim.step_to(GameTime::ZERO).unwrap();
        assert_eq!(sim.world().creature(knight).unwrap().combatant.attack_credits, 1);
    }

    #[test]
    fn strike_on_untargeted_creature_aborts() {
        let (mut sim, knight, rat) = simulation();
        sim.schedule(AutoAttack::new(knight, rat).into_operation(), Duration::ZERO);
        let fired = sim.step_to(GameTime::ZERO).unwrap();
        assert_eq!(fired.first().unwrap().effect, Some(Effect::Aborted));
        assert_eq!(sim.world().creature(rat).unwrap().health, 100);
    }

    #[test]
    fn clearing_the_target_stops_the_orchestrator() {
        let (mut sim, knight, rat) = simulation();
        let id = sim.schedule(
            AutoAttackOrchestrator::new(knight, Some(rat)).into_operation(),
            Duration::ZERO,
        );
        sim.step_to(GameTime::ZERO).unwrap();
        assert!(sim.scheduler().is_pending(id));

        sim.world_mut().creatures_mut().get_mut(knight).unwrap().combatant.clear_targets();
        sim.step_to(GameTime::from_millis(2000)).unwrap();
        assert!(!sim.scheduler().is_pending(id));
    }
}
