//! A creature's own state: facing, modes, and what it looks at.

use std::time::Duration;

use ironhold_core::{
    ExecutionResult, Operation, OperationContext, OperationError, OperationHeader, StandardOperation,
};
use ironhold_types::{
    Audience, ChaseMode, CreatureId, Direction, ExhaustionCategory, FightMode, Location, MessageKind, OperationKind,
    Outbound, Position,
};
use tracing::debug;

use crate::messages::{CANNOT_SEE, refuse};
use crate::walk::AutoWalkOrchestrator;

// ---------------------------------------------------------------------------
// Turn
// ---------------------------------------------------------------------------

/// Changes which way a creature faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Turn {
    creature: CreatureId,
    direction: Direction,
}

impl Turn {
    /// Turn `creature` towards `direction`.
    pub const fn new(creature: CreatureId, direction: Direction) -> Self {
        Self { creature, direction }
    }

    /// Wrap into a schedulable operation.
    pub fn into_operation(self) -> Operation {
        let header = OperationHeader::new(OperationKind::Turn, ExhaustionCategory::Walking, Some(self.creature));
        Operation::standard(header, self)
    }
}

impl StandardOperation for Turn {
    fn execute(
        &mut self,
        _header: &mut OperationHeader,
        ctx: &mut OperationContext<'_>,
    ) -> Result<ExecutionResult, OperationError> {
        let direction = self.direction.facing();
        let Some(creature) = ctx.creature_mut(self.creature) else {
            return Ok(ExecutionResult::aborted());
        };
        if creature.facing == direction {
            return Ok(ExecutionResult::aborted());
        }
        creature.facing = direction;
        let position = creature.position;
        ctx.notify_spectators(position, vec![Outbound::CreatureTurned {
            creature: self.creature,
            direction,
        }]);
        Ok(ExecutionResult::performed())
    }
}

// ---------------------------------------------------------------------------
// ChangeModes
// ---------------------------------------------------------------------------

/// Sets a creature's fight, chase, and safe modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeModes {
    creature: CreatureId,
    fight_mode: FightMode,
    chase_mode: ChaseMode,
    safe_mode: bool,
}

impl ChangeModes {
    /// Put `creature` into the given modes.
    pub const fn new(creature: CreatureId, fight_mode: FightMode, chase_mode: ChaseMode, safe_mode: bool) -> Self {
        Self {
            creature,
            fight_mode,
            chase_mode,
            safe_mode,
        }
    }

    /// Wrap into a schedulable operation.
    pub fn into_operation(self) -> Operation {
        let header = OperationHeader::new(OperationKind::ChangeModes, ExhaustionCategory::System, Some(self.creature));
        Operation::standard(header, self)
    }
}

impl StandardOperation for ChangeModes {
    fn execute(
        &mut self,
        _header: &mut OperationHeader,
        ctx: &mut OperationContext<'_>,
    ) -> Result<ExecutionResult, OperationError> {
        let Some(creature) = ctx.creature_mut(self.creature) else {
            return Ok(ExecutionResult::aborted());
        };
        let combatant = &mut creature.combatant;
        let previous_chase = combatant.chase_mode;
        if (combatant.fight_mode, previous_chase, combatant.safe_mode) == (self.fight_mode, self.chase_mode, self.safe_mode)
        {
            return Ok(ExecutionResult::aborted());
        }
        combatant.fight_mode = self.fight_mode;
        combatant.chase_mode = self.chase_mode;
        combatant.safe_mode = self.safe_mode;

        let start_chasing = match self.chase_mode {
            ChaseMode::Chase if previous_chase != ChaseMode::Chase => {
                combatant.chase_target = combatant.auto_attack_target;
                combatant.chase_target
            }
            ChaseMode::Stand => {
                combatant.chase_target = None;
                None
            }
            ChaseMode::Chase => None,
        };

        if self.chase_mode == ChaseMode::Stand || start_chasing.is_some() {
            ctx.cancel_all_for(self.creature, OperationKind::AutoWalkOrchestrator);
        }
        if let Some(target) = start_chasing {
            ctx.schedule(AutoWalkOrchestrator::chasing(self.creature, target).into_operation(), Duration::ZERO);
        }
        ctx.notify(Audience::Creature(self.creature), vec![Outbound::ModesChanged {
            fight_mode: self.fight_mode,
            chase_mode: self.chase_mode,
            safe_mode: self.safe_mode,
        }]);
        debug!(creature = %self.creature, fight = ?self.fight_mode, chase = ?self.chase_mode, safe = self.safe_mode, "modes changed");
        Ok(ExecutionResult::performed())
    }
}

// ---------------------------------------------------------------------------
// LookAt
// ---------------------------------------------------------------------------

/// What is being looked at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookTarget {
    /// An item at a location; `index` counts from the top of a tile.
    Item {
        /// Where the item is.
        location: Location,
        /// Which item on a tile.
        index: u8,
    },
    /// A creature.
    Creature(CreatureId),
}

/// Describes a thing to the looker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LookAt {
    looker: CreatureId,
    target: LookTarget,
}

impl LookAt {
    /// `looker` looks at `target`.
    pub const fn new(looker: CreatureId, target: LookTarget) -> Self {
        Self { looker, target }
    }

    /// Wrap into a schedulable operation.
    pub fn into_operation(self) -> Operation {
        let header = OperationHeader::new(OperationKind::LookAt, ExhaustionCategory::Action, Some(self.looker));
        Operation::standard(header, self)
    }

    fn describe(&self, ctx: &OperationContext<'_>, from: Position) -> Option<String> {
        let world = ctx.world();
        let settings = world.settings();
        let in_view = |at: Position| {
            at.same_floor(from)
                && at.x.abs_diff(from.x) <= settings.view_range_x
                && at.y.abs_diff(from.y) <= settings.view_range_y
        };
        match self.target {
            LookTarget::Creature(id) if id == self.looker => Some("You see yourself.".to_owned()),
            LookTarget::Creature(id) => {
                let creature = world.creature(id)?;
                in_view(creature.position).then(|| format!("You see {}.", creature.name))
            }
            LookTarget::Item { location, index } => {
                if let Location::Map(at) = location
                    && !in_view(at)
                {
                    return None;
                }
                let item = world.item_at(self.looker, location, index)?;
                let amount = world.item(item)?.amount();
                let item_type = world.item_type(item)?;
                let mut text = if item_type.cumulative && amount > 1 {
                    format!("You see {amount} {}s.", item_type.name)
                } else {
                    format!("You see {}.", item_type.name)
                };
                if let Some(description) = &item_type.description {
                    text.push(' ');
                    text.push_str(description);
                }
                Some(text)
            }
        }
    }
}

impl StandardOperation for LookAt {
    fn execute(
        &mut self,
        _header: &mut OperationHeader,
        ctx: &mut OperationContext<'_>,
    ) -> Result<ExecutionResult, OperationError> {
        let Some(looker) = ctx.world().creature(self.looker) else {
            return Ok(ExecutionResult::aborted());
        };
        let from = looker.position;
        match self.describe(ctx, from) {
            Some(text) => {
                ctx.message(self.looker, MessageKind::Description, text);
                Ok(ExecutionResult::performed())
            }
            None => Ok(refuse(ctx, self.looker, CANNOT_SEE)),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use ironhold_core::{BufferedSink, Effect, Services, Simulation};
    use ironhold_types::{CreatureKind, GameTime, ItemTypeId};
    use ironhold_world::{CreatureRegistry, CreatureTemplate, Holder, ItemCatalog, ItemType, World, WorldSettings};

    use super::*;

    fn simulation() -> (Simulation, BufferedSink, CreatureId, CreatureId) {
        let catalog = ItemCatalog::from_types([
            ItemType {
                ground: true,
                movable: false,
                ..ItemType::simple(102, "grass")
            },
            ItemType {
                cumulative: true,
                description: Some("Minted in the old capital.".to_owned()),
                ..ItemType::simple(3031, "gold coin")
            },
        ])
        .unwrap();
        let mut world = World::new(catalog, CreatureRegistry::default(), WorldSettings::default());
        for x in 0..12 {
            world.add_tile(Position::new(x, 0, 7), ItemTypeId(102)).unwrap();
        }
        let watcher = world
            .spawn_creature(CreatureKind::Player, &CreatureTemplate::named("Watcher"), Position::new(0, 0, 7))
            .unwrap();
        let wolf = world
            .spawn_creature(CreatureKind::Monster, &CreatureTemplate::named("wolf"), Position::new(3, 0, 7))
            .unwrap();
        world
            .spawn_item(ItemTypeId(3031), 5, Holder::Tile(Position::new(1, 0, 7)), None, GameTime::ZERO)
            .unwrap();
        world.spawn_item(ItemTypeId(3031), 1, Holder::Tile(Position::new(11, 0, 7)), None, GameTime::ZERO)
            .unwrap();
        world.drain_events();
        let (services, sink) = Services::buffered(2);
        (Simulation::new(world, services), sink, watcher, wolf)
    }

    fn texts(sink: &BufferedSink) -> Vec<String> {
        sink.drain()
            .into_iter()
            .flat_map(|note| note.payloads)
            .filter_map(|payload| match payload {
                Outbound::TextMessage { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn looking_at_a_stack_names_amount_and_description() {
        let (mut sim, sink, watcher, _) = simulation();
        let target = LookTarget::Item {
            location: Location::Map(Position::new(1, 0, 7)),
            index: 0,
        };
        sim.schedule(LookAt::new(watcher, target).into_operation(), Duration::ZERO);
        sim.step_to(GameTime::ZERO).unwrap();
        assert_eq!(texts(&sink), vec!["You see 5 gold coins. Minted in the old capital.".to_owned()]);
    }

    #[test]
    fn looking_past_the_view_range_is_refused() {
        let (mut sim, sink, watcher, wolf) = simulation();
        let far = LookTarget::Item {
            location: Location::Map(Position::new(11, 0, 7)),
            index: 0,
        };
        sim.schedule(LookAt::new(watcher, far).into_operation(), Duration::ZERO);
        sim.schedule(LookAt::new(watcher, LookTarget::Creature(wolf)).into_operation(), Duration::ZERO);
        sim.step_to(GameTime::ZERO).unwrap();
        assert_eq!(texts(&sink), vec![CANNOT_SEE.to_owned(), "You see wolf.".to_owned()]);
    }

    #[test]
    fn turning_the_same_way_twice_does_nothing() {
        let (mut sim, _, watcher, _) = simulation();
        sim.schedule(Turn::new(watcher, Direction::East).into_operation(), Duration::ZERO);
        sim.schedule(Turn::new(watcher, Direction::East).into_operation(), Duration::ZERO);
        let records = sim.step_to(GameTime::ZERO).unwrap();
        let performed = records
            .iter()
            .filter(|record| record.effect == Some(Effect::Performed))
            .count();
        assert_eq!(performed, 1);
        assert_eq!(sim.world().creature(watcher).unwrap().facing, Direction::East);
    }

    #[test]
    fn chase_mode_follows_the_current_target() {
        let (mut sim, _, watcher, wolf) = simulation();
        sim.world_mut()
            .creatures_mut()
            .get_mut(watcher)
            .unwrap()
            .combatant
            .auto_attack_target = Some(wolf);
        let modes = ChangeModes::new(watcher, FightMode::FullAttack, ChaseMode::Chase, false);
        sim.schedule(modes.into_operation(), Duration::ZERO);
        sim.step_to(GameTime::from_millis(3_000)).unwrap();

        let watcher = sim.world().creature(watcher).unwrap();
        assert_eq!(watcher.combatant.chase_target, Some(wolf));
        assert_eq!(watcher.position, Position::new(2, 0, 7));
    }
}
