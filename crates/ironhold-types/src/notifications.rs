//! Outbound notification payloads.
//!
//! Operations never write to the network. They hand an [`Audience`] and a
//! list of [`Outbound`] payloads to a notification sink; encoding the
//! payloads for a particular client protocol happens elsewhere.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::{BodySlot, ChaseMode, FightMode, MessageKind, SpeechType};
use crate::ids::{CreatureId, ItemId, ItemTypeId};
use crate::position::{Direction, Position};

/// Who should receive a notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Audience {
    /// A single creature.
    Creature(CreatureId),
    /// An explicit list of creatures.
    Creatures(Vec<CreatureId>),
    /// Every player who can see `center`.
    Spectators {
        /// Center of the visible area.
        center: Position,
        /// Horizontal reach in tiles.
        range_x: u16,
        /// Vertical reach in tiles.
        range_y: u16,
    },
}

/// A single outbound payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outbound {
    /// A text line for the receiving player.
    TextMessage {
        /// Message category.
        kind: MessageKind,
        /// The text.
        text: String,
    },
    /// A creature entered view.
    CreatureAppeared {
        /// The creature.
        creature: CreatureId,
        /// Its display name.
        name: String,
        /// Where it appeared.
        position: Position,
    },
    /// A creature left the world or the view.
    CreatureRemoved {
        /// The creature.
        creature: CreatureId,
        /// Where it was.
        position: Position,
    },
    /// A creature stepped from one tile to another.
    CreatureMoved {
        /// The creature.
        creature: CreatureId,
        /// Origin tile.
        from: Position,
        /// Destination tile.
        to: Position,
    },
    /// A creature changed facing.
    CreatureTurned {
        /// The creature.
        creature: CreatureId,
        /// New facing.
        direction: Direction,
    },
    /// A creature's health changed.
    CreatureHealth {
        /// The creature.
        creature: CreatureId,
        /// Health as a percentage of maximum.
        health_percent: u8,
    },
    /// A creature spoke.
    CreatureSpeech {
        /// The speaker.
        creature: CreatureId,
        /// The speaker's name.
        name: String,
        /// Loudness.
        speech_type: SpeechType,
        /// What was said.
        text: String,
    },
    /// A strike landed.
    DamageDealt {
        /// Who struck.
        attacker: CreatureId,
        /// Who was struck.
        target: CreatureId,
        /// Health removed.
        amount: u32,
    },
    /// The contents of a tile changed.
    TileUpdated {
        /// The tile.
        position: Position,
    },
    /// A container was opened for the receiving player.
    ContainerOpened {
        /// The receiver's open-container position.
        slot: u8,
        /// The container item.
        container: ItemId,
        /// The container's item type.
        type_id: ItemTypeId,
        /// Maximum number of items.
        capacity: u8,
        /// Current contents, most recent first.
        contents: Vec<ItemId>,
    },
    /// A container was closed for the receiving player.
    ContainerClosed {
        /// The receiver's open-container position.
        slot: u8,
    },
    /// An item was added to an open container.
    ContainerContentAdded {
        /// The receiver's open-container position.
        slot: u8,
        /// The new item.
        item: ItemId,
    },
    /// An item was removed from an open container.
    ContainerContentRemoved {
        /// The receiver's open-container position.
        slot: u8,
        /// The index the item occupied.
        index: u8,
    },
    /// An item inside an open container changed (amount or type).
    ContainerContentUpdated {
        /// The receiver's open-container position.
        slot: u8,
        /// Index of the item.
        index: u8,
        /// The item now at that index.
        item: ItemId,
    },
    /// A body slot changed.
    BodySlotUpdated {
        /// The slot.
        slot: BodySlot,
        /// The item now in the slot.
        item: Option<ItemId>,
    },
    /// Combat modes changed.
    ModesChanged {
        /// Fight stance.
        fight_mode: FightMode,
        /// Chase behavior.
        chase_mode: ChaseMode,
        /// Whether safe mode is on.
        safe_mode: bool,
    },
    /// The receiver's attack target was cleared by the engine.
    AttackTargetCleared,
}

/// A batch of payloads addressed to one audience.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Who receives it.
    pub audience: Audience,
    /// What they receive, in order.
    pub payloads: Vec<Outbound>,
    /// Wall-clock time the notification was produced.
    pub issued_at: DateTime<Utc>,
}

impl Notification {
    /// Build a notification stamped with the current wall-clock time.
    pub fn new(audience: Audience, payloads: Vec<Outbound>) -> Self {
        Self {
            audience,
            payloads,
            issued_at: Utc::now(),
        }
    }

    /// A single status-bar text message to one creature.
    pub fn text(to: CreatureId, kind: MessageKind, text: impl Into<String>) -> Self {
        Self::new(
            Audience::Creature(to),
            vec![Outbound::TextMessage {
                kind,
                text: text.into(),
            }],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_helper_targets_one_creature() {
        let note = Notification::text(CreatureId(3), MessageKind::StatusSmall, "Sorry, not possible.");
        assert_eq!(note.audience, Audience::Creature(CreatureId(3)));
        assert_eq!(note.payloads.len(), 1);
    }

    #[test]
    fn notification_serializes() {
        let note = Notification::new(
            Audience::Spectators {
                center: Position::new(1, 2, 7),
                range_x: 8,
                range_y: 6,
            },
            vec![Outbound::TileUpdated {
                position: Position::new(1, 2, 7),
            }],
        );
        let json = serde_json::to_string(&note);
        assert!(json.is_ok());
    }
}
