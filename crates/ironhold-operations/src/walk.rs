//! Automatic walking: along a fixed route or after a chase target.
//!
//! The orchestrator schedules one [`Movement`] step at a time and re-fires
//! when that step is due, so each step waits out the walking cooldown the
//! previous one charged. A fixed route stops at its end or at the first
//! step that did not happen; a chase stops when the walker's chase target
//! changes, the walker stops chasing, or the target leaves the floor.

use std::collections::VecDeque;
use std::time::Duration;

use ironhold_core::{
    ExecutionResult, Operation, OperationContext, OperationError, OperationHeader, PathState, StandardOperation,
};
use ironhold_types::{
    ChaseMode, CreatureId, Direction, ExhaustionCategory, OperationId, OperationKind, Position,
};
use ironhold_world::DEFAULT_GROUND_SPEED;
use tracing::debug;

use crate::movement::{Movement, MovementArgs};

/// Where the walker is headed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalkPlan {
    /// Steps to take, in order.
    Route(VecDeque<Direction>),
    /// A creature to follow.
    Chase(CreatureId),
}

#[derive(Debug, Clone, Copy)]
enum NextStep {
    Step(Direction),
    Wait,
    Stop,
}

/// Drives a creature's steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutoWalkOrchestrator {
    creature: CreatureId,
    plan: WalkPlan,
    pending_step: Option<OperationId>,
    expected: Option<Position>,
}

impl AutoWalkOrchestrator {
    /// Walk `creature` according to `plan`.
    pub const fn new(creature: CreatureId, plan: WalkPlan) -> Self {
        Self {
            creature,
            plan,
            pending_step: None,
            expected: None,
        }
    }

    /// Walk `creature` along `directions`.
    pub fn along(creature: CreatureId, directions: impl IntoIterator<Item = Direction>) -> Self {
        Self::new(creature, WalkPlan::Route(directions.into_iter().collect()))
    }

    /// Follow `target` while `creature` keeps chasing it.
    pub const fn chasing(creature: CreatureId, target: CreatureId) -> Self {
        Self::new(creature, WalkPlan::Chase(target))
    }

    /// Wrap into a schedulable operation.
    pub fn into_operation(self) -> Operation {
        let header = OperationHeader::new(
            OperationKind::AutoWalkOrchestrator,
            ExhaustionCategory::System,
            Some(self.creature),
        );
        Operation::standard(header, self)
    }

    fn next_step(&mut self, ctx: &OperationContext<'_>, from: Position) -> NextStep {
        match &mut self.plan {
            WalkPlan::Route(steps) => steps.pop_front().map_or(NextStep::Stop, NextStep::Step),
            WalkPlan::Chase(target) => {
                let target = *target;
                let world = ctx.world();
                let Some(walker) = world.creature(self.creature) else {
                    return NextStep::Stop;
                };
                if walker.combatant.chase_target != Some(target) || walker.combatant.chase_mode != ChaseMode::Chase {
                    return NextStep::Stop;
                }
                let Some(destination) = world
                    .creature(target)
                    .filter(|found| !found.is_dead())
                    .map(|found| found.position)
                else {
                    return NextStep::Stop;
                };
                if !from.same_floor(destination) {
                    return NextStep::Stop;
                }
                let keep_away = ctx.rules().combat.chase_distance;
                if from.distance_to(destination) <= keep_away {
                    return NextStep::Wait;
                }
                let path = ctx.find_path(from, destination, self.creature, keep_away);
                match (path.state, path.directions.first()) {
                    (PathState::Unreachable, _) | (_, None) => NextStep::Wait,
                    (_, Some(direction)) => NextStep::Step(*direction),
                }
            }
        }
    }
}

impl StandardOperation for AutoWalkOrchestrator {
    fn execute(
        &mut self,
        _header: &mut OperationHeader,
        ctx: &mut OperationContext<'_>,
    ) -> Result<ExecutionResult, OperationError> {
        let now = ctx.now();
        let Some(walker) = ctx.world().creature(self.creature) else {
            return Ok(ExecutionResult::aborted());
        };
        let (position, speed) = (walker.position, walker.speed);

        if let Some(step) = self.pending_step.take()
            && let Some(due) = ctx.fire_time(step)
            && ctx.is_pending(step)
        {
            self.pending_step = Some(step);
            return Ok(ExecutionResult::performed().repeat_after(due.saturating_duration_since(now)));
        }
        if let WalkPlan::Route(_) = self.plan
            && self.expected.is_some_and(|expected| expected != position)
        {
            debug!(creature = %self.creature, "route interrupted");
            return Ok(ExecutionResult::performed());
        }

        let to = match self.next_step(ctx, position) {
            NextStep::Step(direction) => match position.step(direction) {
                Some(to) => to,
                None => return Ok(ExecutionResult::performed()),
            },
            NextStep::Wait => {
                let ground = ctx.world().ground_speed(position).unwrap_or(DEFAULT_GROUND_SPEED);
                let recheck = ctx.rules().movement.step_duration(ground, speed, false, false);
                return Ok(ExecutionResult::performed().repeat_after(recheck));
            }
            NextStep::Stop => return Ok(ExecutionResult::performed()),
        };

        let step = Movement::new(MovementArgs::step(self.creature, position, to)).into_operation(Duration::ZERO);
        let id = ctx.schedule(step, Duration::ZERO);
        self.pending_step = Some(id);
        self.expected = Some(to);
        let wait = ctx
            .fire_time(id)
            .map_or(Duration::ZERO, |due| due.saturating_duration_since(now));
        Ok(ExecutionResult::performed().repeat_after(wait))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use ironhold_core::{Services, Simulation};
    use ironhold_types::{CreatureKind, GameTime, ItemTypeId};
    use ironhold_world::{CreatureRegistry, CreatureTemplate, ItemCatalog, ItemType, World, WorldSettings};

    use super::*;

    fn simulation() -> (Simulation, CreatureId) {
        let catalog = ItemCatalog::from_types([ItemType {
            ground: true,
            movable: false,
            ground_speed: Some(100),
            ..ItemType::simple(102, "grass")
        }])
        .unwrap();
        let mut world = World::new(catalog, CreatureRegistry::default(), WorldSettings::default());
        for x in 0..8 {
            world.add_tile(Position::new(x, 0, 7), ItemTypeId(102)).unwrap();
        }
        let template = CreatureTemplate {
            speed: 100,
            ..CreatureTemplate::named("Scout")
        };
        let scout = world
            .spawn_creature(CreatureKind::Player, &template, Position::new(0, 0, 7))
            .unwrap();
        let (services, _) = Services::buffered(1);
        (Simulation::new(world, services), scout)
    }

    #[test]
    fn route_steps_once_per_walk_cooldown() {
        let (mut sim, scout) = simulation();
        let walk = AutoWalkOrchestrator::along(scout, [Direction::East, Direction::East, Direction::East]);
        sim.schedule(walk.into_operation(), Duration::ZERO);

        sim.step_to(GameTime::ZERO).unwrap();
        assert_eq!(sim.world().creature(scout).unwrap().position, Position::new(1, 0, 7));
        sim.step_to(GameTime::from_millis(999)).unwrap();
        assert_eq!(sim.world().creature(scout).unwrap().position, Position::new(1, 0, 7));
        sim.step_to(GameTime::from_millis(1000)).unwrap();
        assert_eq!(sim.world().creature(scout).unwrap().position, Position::new(2, 0, 7));
        sim.step_to(GameTime::from_millis(5000)).unwrap();
        assert_eq!(sim.world().creature(scout).unwrap().position, Position::new(3, 0, 7));
    }

    #[test]
    fn route_off_the_map_stops() {
        let (mut sim, scout) = simulation();
        let walk = AutoWalkOrchestrator::along(scout, [Direction::North, Direction::East]);
        let id = sim.schedule(walk.into_operation(), Duration::ZERO);
        sim.step_to(GameTime::from_millis(3000)).unwrap();
        assert_eq!(sim.world().creature(scout).unwrap().position, Position::new(0, 0, 7));
        assert!(!sim.scheduler().is_pending(id));
    }
}
