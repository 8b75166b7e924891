//! Keeping spawn points populated.

use std::time::Duration;

use ironhold_core::{
    ElevatedOperation, ElevatedOperationContext, ExecutionResult, Operation, OperationError, OperationHeader, SpawnPoint,
};
use ironhold_types::{Audience, CreatureId, CreatureKind, ExhaustionCategory, OperationKind, Outbound, Position};
use ironhold_world::CreatureTemplate;
use rand::Rng;
use tracing::{debug, info};

/// Placement tries per missing monster before giving up until the next check.
const ATTEMPTS_PER_MONSTER: u16 = 8;

/// Refills one spawn point up to its count, then checks again later.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpawnMonsters {
    spawn: SpawnPoint,
    template: CreatureTemplate,
    alive: Vec<CreatureId>,
}

impl SpawnMonsters {
    /// Populate `spawn` with monsters built from `template`.
    pub const fn new(spawn: SpawnPoint, template: CreatureTemplate) -> Self {
        Self {
            spawn,
            template,
            alive: Vec::new(),
        }
    }

    /// Wrap into a schedulable operation.
    pub fn into_operation(self) -> Operation {
        let header = OperationHeader::new(OperationKind::SpawnMonsters, ExhaustionCategory::System, None);
        Operation::elevated(header, self)
    }

    fn pick_position(&self, ctx: &mut ElevatedOperationContext<'_>) -> Option<Position> {
        let radius = i32::from(self.spawn.radius);
        let center = self.spawn.position;
        let dx = ctx.rng().random_range(-radius..=radius);
        let dy = ctx.rng().random_range(-radius..=radius);
        let x = u16::try_from(i32::from(center.x).checked_add(dx)?).ok()?;
        let y = u16::try_from(i32::from(center.y).checked_add(dy)?).ok()?;
        let position = Position::new(x, y, center.z);
        ctx.world().is_walkable(position).then_some(position)
    }
}

impl ElevatedOperation for SpawnMonsters {
    fn execute(
        &mut self,
        _header: &mut OperationHeader,
        ctx: &mut ElevatedOperationContext<'_>,
    ) -> Result<ExecutionResult, OperationError> {
        let world = ctx.world();
        self.alive
            .retain(|id| world.creature(*id).is_some_and(|creature| !creature.is_dead()));

        let missing = usize::from(self.spawn.count).saturating_sub(self.alive.len());
        let mut attempts = u16::try_from(missing)
            .unwrap_or(u16::MAX)
            .saturating_mul(ATTEMPTS_PER_MONSTER);
        let mut spawned: usize = 0;

        while self.alive.len() < usize::from(self.spawn.count) && attempts > 0 {
            attempts = attempts.saturating_sub(1);
            let Some(position) = self.pick_position(ctx) else {
                continue;
            };
            let id = ctx
                .world_mut()
                .spawn_creature(CreatureKind::Monster, &self.template, position)?;
            self.alive.push(id);
            spawned = spawned.saturating_add(1);
            let audience = ctx.world().spectators(position);
            ctx.notify(Audience::Creatures(audience), vec![Outbound::CreatureAppeared {
                creature: id,
                name: self.template.name.clone(),
                position,
            }]);
            debug!(creature = %id, monster = %self.spawn.monster, position = %position, "monster spawned");
        }

        if spawned > 0 {
            info!(monster = %self.spawn.monster, spawned, alive = self.alive.len(), "spawn point refilled");
        }
        let next = Duration::from_millis(self.spawn.respawn_ms);
        let result = if spawned > 0 {
            ExecutionResult::performed()
        } else {
            ExecutionResult::aborted()
        };
        Ok(result.repeat_after(next))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use ironhold_core::{Services, Simulation};
    use ironhold_types::{GameTime, ItemTypeId};
    use ironhold_world::{CreatureRegistry, ItemCatalog, ItemType, World, WorldSettings};

    use super::*;
    use crate::death::Death;

    fn simulation() -> Simulation {
        let catalog = ItemCatalog::from_types([ItemType {
            ground: true,
            movable: false,
            ..ItemType::simple(102, "grass")
        }])
        .unwrap();
        let mut world = World::new(catalog, CreatureRegistry::default(), WorldSettings::default());
        for x in 0..5 {
            for y in 0..5 {
                world.add_tile(Position::new(x, y, 7), ItemTypeId(102)).unwrap();
            }
        }
        world.drain_events();
        let (services, _) = Services::buffered(11);
        Simulation::new(world, services)
    }

    fn spawn_point() -> SpawnPoint {
        SpawnPoint {
            monster: "rat".to_owned(),
            position: Position::new(2, 2, 7),
            radius: 2,
            count: 3,
            respawn_ms: 10_000,
        }
    }

    #[test]
    fn spawn_point_is_filled_and_refilled() {
        let mut sim = simulation();
        let op = SpawnMonsters::new(spawn_point(), CreatureTemplate::named("rat"));
        sim.schedule(op.into_operation(), Duration::ZERO);
        sim.step_to(GameTime::ZERO).unwrap();
        assert_eq!(sim.world().creatures().len(), 3);

        let victim = sim.world().creatures().iter().next().unwrap().id;
        sim.schedule(Death::new(victim, None).into_operation(), Duration::from_millis(100));
        sim.step_to(GameTime::from_millis(100)).unwrap();
        assert_eq!(sim.world().creatures().len(), 2);

        sim.step_to(GameTime::from_millis(10_000)).unwrap();
        assert_eq!(sim.world().creatures().len(), 3);
        assert!(sim.world().creatures().iter().all(|rat| rat.position.distance_to(Position::new(2, 2, 7)) <= 2));
    }
}
