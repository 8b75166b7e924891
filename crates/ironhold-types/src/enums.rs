//! Enumeration types shared across the Ironhold workspace.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Exhaustion
// ---------------------------------------------------------------------------

/// The cooldown bucket an operation charges when it performs its effect.
///
/// An actor's cooldown in one category never delays operations of another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ExhaustionCategory {
    /// Item interaction: moving, using, looking.
    Action,
    /// Melee and distance strikes.
    Combat,
    /// A creature stepping between tiles.
    Walking,
    /// Talking.
    Speech,
    /// Bookkeeping performed by the engine itself; never charged.
    System,
}

// ---------------------------------------------------------------------------
// Operation kinds
// ---------------------------------------------------------------------------

/// The closed set of operation kinds the factory can build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum OperationKind {
    /// A single strike against the attacker's target.
    AutoAttack,
    /// Self-repeating driver that spawns strikes every combat round.
    AutoAttackOrchestrator,
    /// Self-repeating driver that walks a creature along a path.
    AutoWalkOrchestrator,
    /// Transfer of an item or creature between two locations.
    Movement,
    /// Creation of a new item.
    CreateItem,
    /// Removal of an item from the world.
    DeleteItem,
    /// In-place transformation of an item into another type.
    ChangeItem,
    /// Expiration of a timed item.
    ExpireItem,
    /// Death of a creature.
    Death,
    /// A player entering the world.
    LogIn,
    /// A player leaving the world.
    LogOut,
    /// Describing a thing to the requestor.
    LookAt,
    /// Changing fight, chase, or safe modes.
    ChangeModes,
    /// Talking.
    Speech,
    /// Changing facing direction.
    Turn,
    /// Regenerating one attack or defense credit.
    RestoreCombatCredit,
    /// Populating spawn points with monsters.
    SpawnMonsters,
    /// Cancelling an actor's pending operations.
    CancelOperations,
}

impl OperationKind {
    /// Stable snake-case name used in logs.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AutoAttack => "auto_attack",
            Self::AutoAttackOrchestrator => "auto_attack_orchestrator",
            Self::AutoWalkOrchestrator => "auto_walk_orchestrator",
            Self::Movement => "movement",
            Self::CreateItem => "create_item",
            Self::DeleteItem => "delete_item",
            Self::ChangeItem => "change_item",
            Self::ExpireItem => "expire_item",
            Self::Death => "death",
            Self::LogIn => "log_in",
            Self::LogOut => "log_out",
            Self::LookAt => "look_at",
            Self::ChangeModes => "change_modes",
            Self::Speech => "speech",
            Self::Turn => "turn",
            Self::RestoreCombatCredit => "restore_combat_credit",
            Self::SpawnMonsters => "spawn_monsters",
            Self::CancelOperations => "cancel_operations",
        }
    }
}

impl core::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Body
// ---------------------------------------------------------------------------

/// An equipment slot on a creature's body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BodySlot {
    /// Helmets.
    Head,
    /// Amulets.
    Necklace,
    /// Backpacks and bags.
    Back,
    /// Armor.
    Torso,
    /// Right hand (weapons, shields, anything carried).
    RightHand,
    /// Left hand (weapons, shields, anything carried).
    LeftHand,
    /// Leg armor.
    Legs,
    /// Boots.
    Feet,
    /// Rings.
    Ring,
    /// Ammunition.
    Ammo,
}

impl BodySlot {
    /// Every slot, in display order.
    pub const ALL: [Self; 10] = [
        Self::Head,
        Self::Necklace,
        Self::Back,
        Self::Torso,
        Self::RightHand,
        Self::LeftHand,
        Self::Legs,
        Self::Feet,
        Self::Ring,
        Self::Ammo,
    ];

    /// Position of the slot within [`BodySlot::ALL`].
    pub const fn index(self) -> u8 {
        match self {
            Self::Head => 0,
            Self::Necklace => 1,
            Self::Back => 2,
            Self::Torso => 3,
            Self::RightHand => 4,
            Self::LeftHand => 5,
            Self::Legs => 6,
            Self::Feet => 7,
            Self::Ring => 8,
            Self::Ammo => 9,
        }
    }

    /// The slot at `index` within [`BodySlot::ALL`].
    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(usize::from(index)).copied()
    }

    /// Whether this is one of the two hands.
    pub const fn is_hand(self) -> bool {
        matches!(self, Self::RightHand | Self::LeftHand)
    }

    /// The opposite hand, for hand slots.
    pub const fn other_hand(self) -> Option<Self> {
        match self {
            Self::RightHand => Some(Self::LeftHand),
            Self::LeftHand => Some(Self::RightHand),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Creatures and combat
// ---------------------------------------------------------------------------

/// What sort of creature this is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CreatureKind {
    /// A connected player.
    Player,
    /// A hostile, AI-driven creature.
    Monster,
    /// A scripted non-player character.
    Npc,
}

/// Offensive stance of a combatant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FightMode {
    /// Full attack, no defense bonus.
    FullAttack,
    /// Balanced.
    #[default]
    Balanced,
    /// Full defense.
    FullDefense,
}

/// Whether a combatant follows its attack target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChaseMode {
    /// Stay in place.
    #[default]
    Stand,
    /// Chase the attack target.
    Chase,
}

/// Which of the two regenerating credit pools an operation refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CombatCredit {
    /// Gates how often a combatant may strike.
    Attack,
    /// Gates how often a combatant may parry.
    Defense,
}

/// How loudly a creature speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpeechType {
    /// Heard by creatures within one tile.
    Whisper,
    /// Heard by creatures in view.
    Say,
    /// Heard by creatures in an extended view.
    Yell,
}

/// Category of a text message delivered to a single player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageKind {
    /// A failed action ("Sorry, not possible.").
    StatusSmall,
    /// A look description.
    Description,
    /// A system announcement.
    Event,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hands_are_each_others_other_hand() {
        assert_eq!(BodySlot::RightHand.other_hand(), Some(BodySlot::LeftHand));
        assert_eq!(BodySlot::LeftHand.other_hand(), Some(BodySlot::RightHand));
        assert_eq!(BodySlot::Head.other_hand(), None);
        assert!(BodySlot::ALL.iter().filter(|slot| slot.is_hand()).count() == 2);
    }

    #[test]
    fn slot_index_matches_all_order() {
        for slot in BodySlot::ALL {
            assert_eq!(BodySlot::from_index(slot.index()), Some(slot));
        }
        assert_eq!(BodySlot::from_index(10), None);
    }

    #[test]
    fn operation_kind_names_are_snake_case() {
        assert_eq!(OperationKind::AutoAttackOrchestrator.to_string(), "auto_attack_orchestrator");
        assert_eq!(OperationKind::RestoreCombatCredit.as_str(), "restore_combat_credit");
    }
}
