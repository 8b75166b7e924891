//! Item lifecycle: creation, deletion, transformation, and expiry.

use std::time::Duration;

use ironhold_core::{
    ElevatedOperation, ElevatedOperationContext, ExecutionResult, Operation, OperationContext, OperationError,
    OperationHeader,
};
use ironhold_types::{CreatureId, ExhaustionCategory, ItemId, ItemTypeId, Location, OperationKind};
use ironhold_world::{Holder, World, WorldError};
use tracing::{debug, warn};

use crate::messages::{NOT_POSSIBLE, refuse, rejection_text};

/// Queue the expiry of `item` if its type decays.
pub(crate) fn schedule_expiry(ctx: &mut OperationContext<'_>, item: ItemId) {
    let Some(expires_at) = ctx.world().item(item).and_then(|found| found.expires_at()) else {
        return;
    };
    let delay = ctx.now().saturating_duration_until(expires_at);
    ctx.schedule(ExpireItem::new(item).into_operation(), delay);
}

/// The holder and index `location` names, on behalf of `requestor`.
fn destination(world: &World, requestor: Option<CreatureId>, location: Location) -> Option<(Holder, Option<u8>)> {
    let holder = match (location, requestor) {
        (Location::Map(position), _) => Holder::Tile(position),
        (_, Some(requestor)) => world.resolve_holder(requestor, location)?,
        (_, None) => return None,
    };
    let index = match location {
        Location::Map(_) => None,
        Location::Body(_) | Location::Container { .. } => Some(World::holder_index(location, 0)),
    };
    Some((holder, index))
}

// ---------------------------------------------------------------------------
// CreateItem
// ---------------------------------------------------------------------------

/// Creates `amount` of an item type at a location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreateItem {
    type_id: ItemTypeId,
    amount: u8,
    at: Location,
    requestor: Option<CreatureId>,
}

impl CreateItem {
    /// Body and container locations are resolved against `requestor`.
    pub const fn new(type_id: ItemTypeId, amount: u8, at: Location, requestor: Option<CreatureId>) -> Self {
        Self {
            type_id,
            amount,
            at,
            requestor,
        }
    }

    /// Wrap into a schedulable operation.
    pub fn into_operation(self) -> Operation {
        let header = OperationHeader::new(OperationKind::CreateItem, ExhaustionCategory::System, self.requestor);
        Operation::elevated(header, self)
    }
}

impl ElevatedOperation for CreateItem {
    fn execute(
        &mut self,
        _header: &mut OperationHeader,
        ctx: &mut ElevatedOperationContext<'_>,
    ) -> Result<ExecutionResult, OperationError> {
        let now = ctx.now();
        let Some((holder, index)) = destination(ctx.world(), self.requestor, self.at) else {
            debug!(location = ?self.at, "nowhere to create item");
            return Ok(ExecutionResult::aborted());
        };
        match ctx.world_mut().spawn_item(self.type_id, self.amount, holder, index, now) {
            Ok(item) => {
                schedule_expiry(ctx, item);
                Ok(ExecutionResult::performed())
            }
            Err(WorldError::Rejected(reason)) => Ok(match self.requestor {
                Some(requestor) => refuse(ctx, requestor, rejection_text(reason)),
                None => ExecutionResult::aborted(),
            }),
            Err(error) => Err(error.into()),
        }
    }
}

// ---------------------------------------------------------------------------
// DeleteItem
// ---------------------------------------------------------------------------

/// Removes an item, and everything inside it, from the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteItem {
    item: ItemId,
}

impl DeleteItem {
    /// Delete `item`.
    pub const fn new(item: ItemId) -> Self {
        Self { item }
    }

    /// Wrap into a schedulable operation.
    pub fn into_operation(self) -> Operation {
        let header = OperationHeader::new(OperationKind::DeleteItem, ExhaustionCategory::System, None);
        Operation::elevated(header, self)
    }
}

impl ElevatedOperation for DeleteItem {
    fn execute(
        &mut self,
        _header: &mut OperationHeader,
        ctx: &mut ElevatedOperationContext<'_>,
    ) -> Result<ExecutionResult, OperationError> {
        match ctx.world_mut().delete_item(self.item) {
            Ok(()) => Ok(ExecutionResult::performed()),
            Err(WorldError::ItemNotFound(_)) => Ok(ExecutionResult::aborted()),
            Err(WorldError::Rejected(reason)) => {
                warn!(item = %self.item, ?reason, "holder refused to release item");
                Ok(ExecutionResult::aborted())
            }
            Err(error) => Err(error.into()),
        }
    }
}

// ---------------------------------------------------------------------------
// ChangeItem
// ---------------------------------------------------------------------------

/// Turns an item into another type where it lies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeItem {
    item: ItemId,
    to: ItemTypeId,
    requestor: Option<CreatureId>,
}

impl ChangeItem {
    /// Change `item` into `to`, on behalf of `requestor`.
    pub const fn new(item: ItemId, to: ItemTypeId, requestor: Option<CreatureId>) -> Self {
        Self { item, to, requestor }
    }

    /// Wrap into a schedulable operation.
    pub fn into_operation(self) -> Operation {
        let header = OperationHeader::new(OperationKind::ChangeItem, ExhaustionCategory::Action, self.requestor);
        Operation::elevated(header, self)
    }
}

impl ElevatedOperation for ChangeItem {
    fn execute(
        &mut self,
        _header: &mut OperationHeader,
        ctx: &mut ElevatedOperationContext<'_>,
    ) -> Result<ExecutionResult, OperationError> {
        let now = ctx.now();
        if ctx.world().item(self.item).is_none() {
            return Ok(ExecutionResult::aborted());
        }
        match ctx.world_mut().transform_item(self.item, Some(self.to), now) {
            Ok(Some(replacement)) => {
                schedule_expiry(ctx, replacement);
                Ok(ExecutionResult::performed())
            }
            Ok(None) => Ok(ExecutionResult::performed()),
            Err(WorldError::Rejected(reason)) => Ok(match self.requestor {
                Some(requestor) => refuse(ctx, requestor, rejection_text(reason)),
                None => ExecutionResult::aborted(),
            }),
            Err(WorldError::UnknownItemType(type_id)) => {
                warn!(item = %self.item, %type_id, "change to unknown item type");
                Ok(match self.requestor {
                    Some(requestor) => refuse(ctx, requestor, NOT_POSSIBLE),
                    None => ExecutionResult::aborted(),
                })
            }
            Err(error) => Err(error.into()),
        }
    }
}

// ---------------------------------------------------------------------------
// ExpireItem
// ---------------------------------------------------------------------------

/// Turns a timed item into its decay type, or deletes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpireItem {
    item: ItemId,
}

impl ExpireItem {
    /// Expire `item` once it is due.
    pub const fn new(item: ItemId) -> Self {
        Self { item }
    }

    /// Wrap into a schedulable operation.
    pub fn into_operation(self) -> Operation {
        let header =
            OperationHeader::new(OperationKind::ExpireItem, ExhaustionCategory::System, None).non_cancellable();
        Operation::elevated(header, self)
    }
}

impl ElevatedOperation for ExpireItem {
    fn execute(
        &mut self,
        _header: &mut OperationHeader,
        ctx: &mut ElevatedOperationContext<'_>,
    ) -> Result<ExecutionResult, OperationError> {
        let now = ctx.now();
        let Some(item) = ctx.world().item(self.item) else {
            return Ok(ExecutionResult::aborted());
        };
        let Some(expires_at) = item.expires_at() else {
            return Ok(ExecutionResult::aborted());
        };
        if expires_at > now {
            return Ok(ExecutionResult::aborted().repeat_after(now.saturating_duration_until(expires_at)));
        }
        let expire_to = ctx.world().item_type(self.item).and_then(|item_type| item_type.expire_to);

        match ctx.world_mut().transform_item(self.item, expire_to, now) {
            Ok(Some(replacement)) => {
                debug!(item = %self.item, %replacement, "item decayed");
                schedule_expiry(ctx, replacement);
                Ok(ExecutionResult::performed())
            }
            Ok(None) => {
                debug!(item = %self.item, "item expired");
                Ok(ExecutionResult::performed())
            }
            Err(WorldError::Rejected(reason)) => {
                warn!(item = %self.item, ?reason, "expired item could not be replaced; retrying");
                Ok(ExecutionResult::aborted().repeat_after(Duration::from_secs(1)))
            }
            Err(error) => Err(error.into()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use ironhold_core::{Services, Simulation};
    use ironhold_types::{BodySlot, CreatureKind, GameTime, Position};
    use ironhold_world::{CreatureRegistry, CreatureTemplate, ItemCatalog, ItemType, WorldSettings};

    use super::*;

    const GRASS: ItemTypeId = ItemTypeId(102);
    const TORCH: ItemTypeId = ItemTypeId(2050);
    const BURNT: ItemTypeId = ItemTypeId(2051);
    const BAG: ItemTypeId = ItemTypeId(1987);
    const COIN: ItemTypeId = ItemTypeId(3031);
    const HERE: Position = Position::new(1, 1, 7);

    fn simulation() -> (Simulation, CreatureId) {
        let catalog = ItemCatalog::from_types([
            ItemType {
                ground: true,
                movable: false,
                ..ItemType::simple(102, "grass")
            },
            ItemType {
                expires_after_ms: Some(5_000),
                expire_to: Some(BURNT),
                ..ItemType::simple(2050, "lit torch")
            },
            ItemType {
                expires_after_ms: Some(2_000),
                ..ItemType::simple(2051, "burnt torch")
            },
            ItemType {
                container_capacity: Some(8),
                ..ItemType::simple(1987, "bag")
            },
            ItemType {
                cumulative: true,
                ..ItemType::simple(3031, "gold coin")
            },
        ])
        .unwrap();
        let mut world = World::new(catalog, CreatureRegistry::default(), WorldSettings::default());
        world.add_tile(HERE, GRASS).unwrap();
        let keeper = world
            .spawn_creature(CreatureKind::Player, &CreatureTemplate::named("Keeper"), HERE)
            .unwrap();
        world.drain_events();
        let (services, _) = Services::buffered(3);
        (Simulation::new(world, services), keeper)
    }

    #[test]
    fn timed_item_decays_then_disappears() {
        let (mut sim, _) = simulation();
        sim.schedule(CreateItem::new(TORCH, 1, Location::Map(HERE), None).into_operation(), Duration::ZERO);

        sim.step_to(GameTime::from_millis(4_999)).unwrap();
        assert_eq!(sim.world().total_amount(TORCH), 1);
        sim.step_to(GameTime::from_millis(5_000)).unwrap();
        assert_eq!(sim.world().total_amount(TORCH), 0);
        assert_eq!(sim.world().total_amount(BURNT), 1);
        sim.step_to(GameTime::from_millis(7_000)).unwrap();
        assert_eq!(sim.world().total_amount(BURNT), 0);
        assert!(sim.world().tile(HERE).unwrap().item_at(0).is_none());
    }

    #[test]
    fn created_in_a_hand_of_the_requestor() {
        let (mut sim, keeper) = simulation();
        let create = CreateItem::new(COIN, 40, Location::Body(BodySlot::LeftHand), Some(keeper));
        sim.schedule(create.into_operation(), Duration::ZERO);
        sim.step_to(GameTime::ZERO).unwrap();

        let coins = sim.world().creature(keeper).unwrap().body().get(BodySlot::LeftHand).unwrap();
        assert_eq!(sim.world().item(coins).unwrap().amount(), 40);
    }

    #[test]
    fn deleting_a_bag_deletes_what_it_holds() {
        let (mut sim, _) = simulation();
        let bag = sim
            .world_mut()
            .spawn_item(BAG, 1, Holder::Tile(HERE), None, GameTime::ZERO)
            .unwrap();
        sim.world_mut()
            .spawn_item(COIN, 12, Holder::Container(bag), None, GameTime::ZERO)
            .unwrap();
        sim.schedule(DeleteItem::new(bag).into_operation(), Duration::ZERO);
        sim.step_to(GameTime::ZERO).unwrap();

        assert!(sim.world().item(bag).is_none());
        assert_eq!(sim.world().total_amount(COIN), 0);
        assert!(sim.world().orphaned_items().is_empty());
    }

    #[test]
    fn change_keeps_the_item_in_place() {
        let (mut sim, keeper) = simulation();
        let coins = sim
            .world_mut()
            .spawn_item(COIN, 7, Holder::Body(keeper), Some(BodySlot::RightHand.index()), GameTime::ZERO)
            .unwrap();
        sim.schedule(ChangeItem::new(coins, BAG, Some(keeper)).into_operation(), Duration::ZERO);
        sim.step_to(GameTime::ZERO).unwrap();

        let held = sim.world().creature(keeper).unwrap().body().get(BodySlot::RightHand).unwrap();
        assert_eq!(sim.world().item(held).unwrap().type_id(), BAG);
        assert!(sim.world().container(held).is_some());
        assert_eq!(sim.world().total_amount(COIN), 0);
    }
}
