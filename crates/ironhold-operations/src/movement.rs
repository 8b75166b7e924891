//! Moving things between tiles, containers, and body slots.
//!
//! One operation covers all nine source and destination combinations
//! (map, body slot, open container on either side) plus creatures stepping
//! or being pushed between tiles.
//!
//! ## Precondition chain
//!
//! Checked in order; the first failure sends exactly one message to the
//! requestor and aborts with no cost:
//!
//! 1. **Existence** -- the thing is where the request says it is
//! 2. **Identity** -- it is the item type the request names
//! 3. **Movability** -- its type may be moved, in the requested amount
//! 4. **Range** -- the source is carried or adjacent, and the destination
//!    is reachable
//! 5. **Capacity** -- the destination is not blocked or full
//! 6. **Line of sight** -- for map destinations only
//!
//! ## Transfer
//!
//! The thing is removed from its source (a refusal there aborts with no
//! effect) and added to the destination. Whatever the destination does
//! not take is put back: into the source, else onto the source's tile,
//! else onto the tile under the requestor. Only when all three refuse is
//! the remainder lost, and that is logged as a consistency failure.

use std::time::Duration;

use ironhold_core::{
    ElevatedOperation, ElevatedOperationContext, ExecutionResult, Operation, OperationError, OperationHeader,
};
use ironhold_types::{
    Audience, CreatureId, Direction, ExhaustionCategory, ItemId, ItemTypeId, Location, OperationKind, Outbound,
    Position,
};
use ironhold_world::{AddOutcome, DEFAULT_GROUND_SPEED, Holder, RemoveOutcome, Thing, World};
use tracing::{debug, error, warn};

use crate::combat::strike_now_in_range;
use crate::messages::{
    CANNOT_MOVE, CANNOT_THROW, CONTAINER_FULL, IMPOSSIBLE, NO_ROOM, NOT_POSSIBLE, OUT_OF_RANGE, TOO_FAR, refuse,
    rejection_text,
};

/// What a movement request names as the thing to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovedThing {
    /// An item, identified by the type the requestor saw.
    Item(ItemTypeId),
    /// A creature.
    Creature(CreatureId),
}

/// Arguments of a [`Movement`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MovementArgs {
    /// Who asked for the move.
    pub requestor: CreatureId,
    /// What to move.
    pub thing: MovedThing,
    /// Where it is.
    pub from: Location,
    /// Stack index on the source tile; ignored elsewhere.
    pub from_index: u8,
    /// Whose body or open containers `from` refers to; the requestor if
    /// `None`.
    pub from_creature: Option<CreatureId>,
    /// Where it should go.
    pub to: Location,
    /// Whose body or open containers `to` refers to; the requestor if
    /// `None`.
    pub to_creature: Option<CreatureId>,
    /// How many of a stack to move.
    pub amount: u8,
}

impl MovementArgs {
    /// A creature stepping from one tile to another.
    pub const fn step(creature: CreatureId, from: Position, to: Position) -> Self {
        Self {
            requestor: creature,
            thing: MovedThing::Creature(creature),
            from: Location::Map(from),
            from_index: 0,
            from_creature: None,
            to: Location::Map(to),
            to_creature: None,
            amount: 1,
        }
    }

    /// Whether this moves the requestor itself.
    pub fn is_walk(&self) -> bool {
        self.thing == MovedThing::Creature(self.requestor)
    }
}

/// Moves one thing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Movement {
    args: MovementArgs,
}

impl Movement {
    /// A movement with `args`.
    pub const fn new(args: MovementArgs) -> Self {
        Self { args }
    }

    /// Wrap into a schedulable operation.
    ///
    /// Walking is charged in the walking category at a cost that depends on
    /// the step; everything else is an action costing `item_cost`.
    pub fn into_operation(self, item_cost: Duration) -> Operation {
        let header = if self.args.is_walk() {
            OperationHeader::new(OperationKind::Movement, ExhaustionCategory::Walking, Some(self.args.requestor))
        } else {
            OperationHeader::new(OperationKind::Movement, ExhaustionCategory::Action, Some(self.args.requestor))
                .with_cost(item_cost)
        };
        Operation::elevated(header, self)
    }

    fn from_owner(&self) -> CreatureId {
        self.args.from_creature.unwrap_or(self.args.requestor)
    }

    fn to_owner(&self) -> CreatureId {
        self.args.to_creature.unwrap_or(self.args.requestor)
    }

    // -----------------------------------------------------------------------
    // Items
    // -----------------------------------------------------------------------

    #[allow(clippy::too_many_lines)]
    fn move_item(
        &self,
        ctx: &mut ElevatedOperationContext<'_>,
        expected: ItemTypeId,
    ) -> Result<ExecutionResult, OperationError> {
        let requestor = self.args.requestor;
        let world = ctx.world();
        let Some(actor) = world.creature(requestor) else {
            return Ok(ExecutionResult::aborted());
        };
        let actor_position = actor.position;

        // Existence
        let found = world
            .item_at(self.from_owner(), self.args.from, self.args.from_index)
            .zip(world.resolve_holder(self.from_owner(), self.args.from));
        let Some((item, source)) = found else {
            return Ok(refuse(ctx, requestor, NOT_POSSIBLE));
        };
        let (Some(instance), Some(item_type)) = (world.item(item), world.item_type(item)) else {
            return Ok(refuse(ctx, requestor, NOT_POSSIBLE));
        };

        // Identity
        if item_type.id != expected {
            return Ok(refuse(ctx, requestor, NOT_POSSIBLE));
        }

        // Movability
        if !item_type.movable {
            return Ok(refuse(ctx, requestor, CANNOT_MOVE));
        }
        if self.args.amount == 0 || self.args.amount > instance.amount() {
            return Ok(refuse(ctx, requestor, NOT_POSSIBLE));
        }

        // Range
        match world.carrier_of(item) {
            Some(carrier) if carrier != requestor => return Ok(refuse(ctx, requestor, NOT_POSSIBLE)),
            Some(_) => {}
            None => {
                let near = world
                    .item_position(item)
                    .is_some_and(|position| actor_position.is_adjacent_to(position));
                if !near {
                    return Ok(refuse(ctx, requestor, TOO_FAR));
                }
            }
        }
        let Some(destination) = world.resolve_holder(self.to_owner(), self.args.to) else {
            return Ok(refuse(ctx, requestor, NOT_POSSIBLE));
        };
        match (self.args.to, destination) {
            (Location::Map(position), _) => {
                let settings = world.settings();
                let reachable = actor_position.same_floor(position)
                    && actor_position.x.abs_diff(position.x) <= settings.view_range_x
                    && actor_position.y.abs_diff(position.y) <= settings.view_range_y;
                if !reachable {
                    return Ok(refuse(ctx, requestor, OUT_OF_RANGE));
                }
            }
            (Location::Body(_), _) => {
                if self.to_owner() != requestor {
                    return Ok(refuse(ctx, requestor, NOT_POSSIBLE));
                }
            }
            (Location::Container { .. }, Holder::Container(container)) => {
                if self.to_owner() != requestor || !world.has_container_access(requestor, container) {
                    return Ok(refuse(ctx, requestor, TOO_FAR));
                }
            }
            (Location::Container { .. }, _) => return Ok(refuse(ctx, requestor, NOT_POSSIBLE)),
        }

        // Capacity
        match destination {
            Holder::Tile(position) => {
                let blocked = world
                    .tile(position)
                    .is_none_or(|tile| tile.blocks_movement(world.catalog(), world.items()));
                if blocked {
                    return Ok(refuse(ctx, requestor, NO_ROOM));
                }
            }
            Holder::Container(container) => {
                if container == item || world.items().container_ancestors(container).contains(&item) {
                    return Ok(refuse(ctx, requestor, IMPOSSIBLE));
                }
                let full = world
                    .container(container)
                    .is_some_and(|contents| contents.is_full() && !item_type.cumulative);
                if full {
                    return Ok(refuse(ctx, requestor, CONTAINER_FULL));
                }
            }
            Holder::Body(_) => {}
        }

        // Line of sight
        if let Location::Map(position) = self.args.to
            && !world.line_of_sight(actor_position, position)
        {
            return Ok(refuse(ctx, requestor, CANNOT_THROW));
        }

        // Transfer
        let source_index = World::holder_index(self.args.from, self.args.from_index);
        let removed = ctx
            .world_mut()
            .remove_from(source, Thing::Item(item), Some(source_index), self.args.amount)?;
        let moving = match removed {
            RemoveOutcome::Taken(Thing::Item(moving)) => moving,
            RemoveOutcome::Taken(Thing::Creature(_)) | RemoveOutcome::Rejected(_) => {
                return Ok(refuse(ctx, requestor, NOT_POSSIBLE));
            }
        };

        let target_index = match self.args.to {
            Location::Map(_) => None,
            Location::Body(slot) => Some(slot.index()),
            Location::Container { index, .. } => Some(index),
        };
        let added = ctx.world_mut().add_to(destination, Thing::Item(moving), target_index);
        match added {
            Ok(AddOutcome::Done) => {
                debug!(%requestor, %item, ?source, ?destination, "item moved");
                Ok(ExecutionResult::performed())
            }
            Ok(AddOutcome::Partial { remainder }) => {
                roll_back(ctx.world_mut(), remainder, source, source_index, requestor);
                Ok(ExecutionResult::performed())
            }
            Ok(AddOutcome::Rejected { reason, .. }) => {
                roll_back(ctx.world_mut(), moving, source, source_index, requestor);
                Ok(refuse(ctx, requestor, rejection_text(reason)))
            }
            Err(err) => {
                warn!(%requestor, %item, error = %err, "destination vanished mid-move");
                roll_back(ctx.world_mut(), moving, source, source_index, requestor);
                Ok(refuse(ctx, requestor, NOT_POSSIBLE))
            }
        }
    }

    // -----------------------------------------------------------------------
    // Creatures
    // -----------------------------------------------------------------------

    fn move_creature(
        &self,
        header: &mut OperationHeader,
        ctx: &mut ElevatedOperationContext<'_>,
        creature: CreatureId,
    ) -> Result<ExecutionResult, OperationError> {
        let requestor = self.args.requestor;
        let world = ctx.world();
        let (Some(actor), Some(mover)) = (world.creature(requestor), world.creature(creature)) else {
            return Ok(ExecutionResult::aborted());
        };
        let (actor_position, from, speed) = (actor.position, mover.position, mover.speed);

        // Existence
        let Location::Map(to) = self.args.to else {
            return Ok(refuse(ctx, requestor, NOT_POSSIBLE));
        };
        if self.args.from != Location::Map(from) {
            return Ok(refuse(ctx, requestor, NOT_POSSIBLE));
        }
        if from == to {
            return Ok(ExecutionResult::aborted());
        }

        // Range
        let floor_change = from.z != to.z;
        let step_ok = from.distance_to(to) <= 1 && from.z.abs_diff(to.z) <= 1;
        if !step_ok {
            return Ok(refuse(ctx, requestor, TOO_FAR));
        }
        let walking = requestor == creature;
        if !walking && (floor_change || !actor_position.is_adjacent_to(from)) {
            return Ok(refuse(ctx, requestor, TOO_FAR));
        }

        // Obstruction
        if !world.is_walkable(to) {
            return Ok(refuse(ctx, requestor, NO_ROOM));
        }
        let ground_speed = world.ground_speed(to).unwrap_or(DEFAULT_GROUND_SPEED);

        ctx.world_mut().move_creature(creature, to)?;
        let direction = from.direction_to(to);
        if let Some(mover) = ctx.creature_mut(creature)
            && let Some(direction) = direction
        {
            mover.facing = direction.facing();
        }
        if walking {
            let diagonal = direction.is_some_and(Direction::is_diagonal);
            let cost = ctx
                .rules()
                .movement
                .step_duration(ground_speed, speed, diagonal, floor_change);
            header.set_cost(cost);
        }

        let mut audience = ctx.world().spectators(from);
        for spectator in ctx.world().spectators(to) {
            if !audience.contains(&spectator) {
                audience.push(spectator);
            }
        }
        ctx.notify(
            Audience::Creatures(audience),
            vec![Outbound::CreatureMoved { creature, from, to }],
        );

        expedite_strikes(ctx, creature);
        debug!(%creature, %from, %to, walking, "creature moved");
        Ok(ExecutionResult::performed())
    }
}

impl ElevatedOperation for Movement {
    fn execute(
        &mut self,
        header: &mut OperationHeader,
        ctx: &mut ElevatedOperationContext<'_>,
    ) -> Result<ExecutionResult, OperationError> {
        match self.args.thing {
            MovedThing::Item(expected) => self.move_item(ctx, expected),
            MovedThing::Creature(creature) => self.move_creature(header, ctx, creature),
        }
    }
}

/// Put a remainder back: onto the slot it came from, anywhere in the
/// source, onto the source's tile, onto the requestor's tile. Logs and
/// destroys it if none of them take it.
fn roll_back(world: &mut World, remainder: ItemId, source: Holder, source_index: u8, requestor: CreatureId) {
    let source_tile = world.holder_position(source).map(Holder::Tile);
    let requestor_tile = world
        .creature(requestor)
        .map(|creature| Holder::Tile(creature.position));
    let candidates = [
        Some((source, Some(source_index))),
        Some((source, None)),
        source_tile.map(|tile| (tile, None)),
        requestor_tile.map(|tile| (tile, None)),
    ];

    let mut left = remainder;
    let mut tried: Vec<(Holder, Option<u8>)> = Vec::with_capacity(candidates.len());
    for (holder, index) in candidates.into_iter().flatten() {
        if tried.contains(&(holder, index)) {
            continue;
        }
        tried.push((holder, index));
        match world.add_to(holder, Thing::Item(left), index) {
            Ok(AddOutcome::Done) => {
                debug!(%remainder, ?holder, ?index, "remainder rolled back");
                return;
            }
            Ok(AddOutcome::Partial { remainder }) => left = remainder,
            Ok(AddOutcome::Rejected { .. }) | Err(_) => {}
        }
    }

    let amount = world.item(left).map_or(0, ironhold_world::Item::amount);
    error!(
        item = %left,
        amount,
        %requestor,
        ?source,
        "consistency failure: movement remainder could not be placed anywhere"
    );
    world.destroy_tree(left);
}

/// Fire early every tracked strike that `moved` just brought into range:
/// its own, and those of creatures attacking it.
fn expedite_strikes(ctx: &mut ElevatedOperationContext<'_>, moved: CreatureId) {
    let mut attackers = ctx.world().creatures().attackers_of(moved);
    attackers.push(moved);
    for attacker in attackers {
        if let Some(strike) = strike_now_in_range(ctx, attacker)
            && ctx.expedite(strike)
        {
            debug!(%attacker, operation = %strike, "strike expedited");
        }
    }
}
