//! Players entering and leaving the world.

use ironhold_core::{ElevatedOperation, ElevatedOperationContext, ExecutionResult, Operation, OperationError, OperationHeader};
use ironhold_types::{Audience, CreatureId, CreatureKind, ExhaustionCategory, OperationKind, Outbound, Position};
use ironhold_world::CreatureTemplate;
use tracing::{info, warn};

// ---------------------------------------------------------------------------
// LogIn
// ---------------------------------------------------------------------------

/// Places a new player on the map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogIn {
    template: CreatureTemplate,
    position: Position,
}

impl LogIn {
    /// Log in a player built from `template` at `position`.
    pub const fn new(template: CreatureTemplate, position: Position) -> Self {
        Self { template, position }
    }

    /// Wrap into a schedulable operation.
    pub fn into_operation(self) -> Operation {
        let header = OperationHeader::new(OperationKind::LogIn, ExhaustionCategory::System, None).non_cancellable();
        Operation::elevated(header, self)
    }
}

impl ElevatedOperation for LogIn {
    fn execute(
        &mut self,
        _header: &mut OperationHeader,
        ctx: &mut ElevatedOperationContext<'_>,
    ) -> Result<ExecutionResult, OperationError> {
        if !ctx.world().is_walkable(self.position) {
            warn!(name = %self.template.name, position = %self.position, "login position is blocked");
            return Ok(ExecutionResult::aborted());
        }
        let id = ctx
            .world_mut()
            .spawn_creature(CreatureKind::Player, &self.template, self.position)?;

        let mut audience = ctx.world().spectators(self.position);
        if !audience.contains(&id) {
            audience.push(id);
        }
        ctx.notify(Audience::Creatures(audience), vec![Outbound::CreatureAppeared {
            creature: id,
            name: self.template.name.clone(),
            position: self.position,
        }]);
        info!(creature = %id, name = %self.template.name, position = %self.position, "player logged in");
        Ok(ExecutionResult::performed())
    }
}

// ---------------------------------------------------------------------------
// LogOut
// ---------------------------------------------------------------------------

/// Takes a player off the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogOut {
    creature: CreatureId,
}

impl LogOut {
    /// Log out `creature`.
    pub const fn new(creature: CreatureId) -> Self {
        Self { creature }
    }

    /// Wrap into a schedulable operation.
    pub fn into_operation(self) -> Operation {
        let header =
            OperationHeader::new(OperationKind::LogOut, ExhaustionCategory::System, Some(self.creature)).non_cancellable();
        Operation::elevated(header, self)
    }
}

impl ElevatedOperation for LogOut {
    fn execute(
        &mut self,
        _header: &mut OperationHeader,
        ctx: &mut ElevatedOperationContext<'_>,
    ) -> Result<ExecutionResult, OperationError> {
        let Some(creature) = ctx.world().creature(self.creature) else {
            return Ok(ExecutionResult::aborted());
        };
        let position = creature.position;

        let cancelled = ctx.cancel_everything_for(self.creature);
        let attackers = ctx.world().creatures().attackers_of(self.creature);
        ctx.world_mut().close_all_containers(self.creature);
        ctx.world_mut().remove_creature(self.creature)?;
        ctx.forget_cooldowns(self.creature);

        if !attackers.is_empty() {
            ctx.notify(Audience::Creatures(attackers), vec![Outbound::AttackTargetCleared]);
        }
        ctx.notify_spectators(position, vec![Outbound::CreatureRemoved {
            creature: self.creature,
            position,
        }]);
        info!(creature = %self.creature, cancelled, "player logged out");
        Ok(ExecutionResult::performed())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use ironhold_core::{Services, Simulation};
    use ironhold_types::{Direction, GameTime, ItemTypeId};
    use ironhold_world::{CreatureRegistry, ItemCatalog, ItemType, World, WorldSettings};

    use super::*;
    use crate::walk::AutoWalkOrchestrator;

    fn simulation() -> Simulation {
        let catalog = ItemCatalog::from_types([ItemType {
            ground: true,
            movable: false,
            ..ItemType::simple(102, "grass")
        }])
        .unwrap();
        let mut world = World::new(catalog, CreatureRegistry::default(), WorldSettings::default());
        for x in 0..3 {
            world.add_tile(Position::new(x, 2, 7), ItemTypeId(102)).unwrap();
        }
        world.drain_events();
        let (services, _) = Services::buffered(9);
        Simulation::new(world, services)
    }

    #[test]
    fn login_places_the_player_and_logout_removes_them() {
        let mut sim = simulation();
        let spot = Position::new(1, 2, 7);
        sim.schedule(LogIn::new(CreatureTemplate::named("Ysolde"), spot).into_operation(), Duration::ZERO);
        sim.step_to(GameTime::ZERO).unwrap();

        let player = sim.world().spectators(spot).first().copied().unwrap();
        assert_eq!(sim.world().creature(player).unwrap().name, "Ysolde");

        let walk = sim.schedule(
            AutoWalkOrchestrator::along(player, [Direction::East]).into_operation(),
            Duration::from_secs(10),
        );
        sim.schedule(LogOut::new(player).into_operation(), Duration::from_millis(5));
        sim.step_to(GameTime::from_millis(5)).unwrap();

        assert!(sim.world().creature(player).is_none());
        assert!(!sim.scheduler().is_pending(walk));
        assert!(sim.world().is_walkable(spot));
    }

    #[test]
    fn login_on_an_occupied_tile_aborts() {
        let mut sim = simulation();
        let spot = Position::new(0, 2, 7);
        sim.schedule(LogIn::new(CreatureTemplate::named("First"), spot).into_operation(), Duration::ZERO);
        sim.schedule(LogIn::new(CreatureTemplate::named("Second"), spot).into_operation(), Duration::ZERO);
        sim.step_to(GameTime::ZERO).unwrap();

        assert_eq!(sim.world().creatures().len(), 1);
    }
}
