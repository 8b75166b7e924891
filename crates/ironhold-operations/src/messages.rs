//! Player-facing refusal texts.

use ironhold_core::{ExecutionResult, OperationContext};
use ironhold_types::{CreatureId, MessageKind};
use ironhold_world::ContentRejection;

pub(crate) const NOT_POSSIBLE: &str = "Sorry, not possible.";
pub(crate) const CANNOT_MOVE: &str = "You cannot move this object.";
pub(crate) const TOO_FAR: &str = "You are too far away.";
pub(crate) const OUT_OF_RANGE: &str = "Destination is out of range.";
pub(crate) const NO_ROOM: &str = "There is not enough room.";
pub(crate) const CONTAINER_FULL: &str = "You cannot put more objects in this container.";
pub(crate) const IMPOSSIBLE: &str = "This is impossible.";
pub(crate) const CANNOT_THROW: &str = "You cannot throw there.";
pub(crate) const CANNOT_DRESS: &str = "You cannot dress this object there.";
pub(crate) const BOTH_HANDS: &str = "Both hands need to be free.";
pub(crate) const CANNOT_SEE: &str = "You cannot see that.";
pub(crate) const YOU_ARE_DEAD: &str = "You are dead.";
pub(crate) const TARGET_LOST: &str = "Target lost.";

/// Tell `to` why nothing happened and report an aborted effect.
pub(crate) fn refuse(ctx: &mut OperationContext<'_>, to: CreatureId, text: &str) -> ExecutionResult {
    ctx.message(to, MessageKind::StatusSmall, text);
    ExecutionResult::aborted()
}

/// The refusal text for a holder's rejection.
pub(crate) const fn rejection_text(reason: ContentRejection) -> &'static str {
    match reason {
        ContentRejection::ContainerFull => CONTAINER_FULL,
        ContentRejection::TileFull | ContentRejection::SlotOccupied(_) | ContentRejection::NoFreeSlot => NO_ROOM,
        ContentRejection::IncompatibleSlot(_) => CANNOT_DRESS,
        ContentRejection::BothHandsRequired => BOTH_HANDS,
        ContentRejection::WouldContainItself => IMPOSSIBLE,
        ContentRejection::NotFound
        | ContentRejection::IndexMismatch
        | ContentRejection::InvalidAmount
        | ContentRejection::ItemsOnly
        | ContentRejection::GroundOccupied => NOT_POSSIBLE,
    }
}
