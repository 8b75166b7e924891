//! Creatures, their combat state, and the creature registry.
//!
//! The registry hands out identifiers through an injected
//! [`CreatureIdGenerator`], so tests and the engine binary control the id
//! space and there is no process-wide counter.

use std::collections::{BTreeMap, BTreeSet};

use ironhold_types::{
    ChaseMode, CombatCredit, CreatureId, CreatureKind, Direction, FightMode, OperationId, Position,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::body::BodyInventory;
use crate::error::WorldError;

// ---------------------------------------------------------------------------
// Templates
// ---------------------------------------------------------------------------

/// Stats a creature is created with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatureTemplate {
    /// Display name.
    pub name: String,
    /// Starting and maximum health.
    #[serde(default = "default_health")]
    pub health: u32,
    /// Walking speed (higher is faster).
    #[serde(default = "default_speed")]
    pub speed: u16,
    /// Strikes per combat round.
    #[serde(default = "default_combat_speed")]
    pub attack_speed: Decimal,
    /// Parries per combat round.
    #[serde(default = "default_combat_speed")]
    pub defense_speed: Decimal,
    /// Upper bound of the damage roll.
    #[serde(default = "default_skill")]
    pub skill: u32,
    /// Flat damage reduction.
    #[serde(default)]
    pub armor: u32,
    /// Maximum strike distance in tiles.
    #[serde(default = "default_attack_range")]
    pub attack_range: u16,
    /// Attack credit pool size.
    #[serde(default = "default_credits")]
    pub max_attack_credits: u8,
    /// Defense credit pool size.
    #[serde(default = "default_credits")]
    pub max_defense_credits: u8,
    /// Item type left behind on death.
    #[serde(default)]
    pub corpse_type: Option<ironhold_types::ItemTypeId>,
}

const fn default_health() -> u32 {
    100
}

const fn default_speed() -> u16 {
    220
}

const fn default_combat_speed() -> Decimal {
    Decimal::ONE
}

const fn default_skill() -> u32 {
    10
}

const fn default_attack_range() -> u16 {
    1
}

const fn default_credits() -> u8 {
    1
}

impl CreatureTemplate {
    /// A template with default stats.
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            health: default_health(),
            speed: default_speed(),
            attack_speed: default_combat_speed(),
            defense_speed: default_combat_speed(),
            skill: default_skill(),
            armor: 0,
            attack_range: default_attack_range(),
            max_attack_credits: default_credits(),
            max_defense_credits: default_credits(),
            corpse_type: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Combatant
// ---------------------------------------------------------------------------

/// Combat state carried by every creature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Combatant {
    /// Who this creature is attacking.
    pub auto_attack_target: Option<CreatureId>,
    /// Who this creature is following.
    pub chase_target: Option<CreatureId>,
    /// Available attack credits.
    pub attack_credits: u8,
    /// Available defense credits.
    pub defense_credits: u8,
    /// Attack credit pool size.
    pub max_attack_credits: u8,
    /// Defense credit pool size.
    pub max_defense_credits: u8,
    /// Strikes per combat round.
    pub attack_speed: Decimal,
    /// Parries per combat round.
    pub defense_speed: Decimal,
    /// Maximum strike distance.
    pub attack_range: u16,
    /// Upper bound of the damage roll.
    pub skill: u32,
    /// Flat damage reduction.
    pub armor: u32,
    /// Hostile creatures currently in view.
    pub hostiles_in_view: BTreeSet<CreatureId>,
    /// Neutral creatures currently in view.
    pub neutrals_in_view: BTreeSet<CreatureId>,
    /// Friendly creatures currently in view.
    pub friendly_in_view: BTreeSet<CreatureId>,
    /// The strike currently tracked for this attacker.
    pub pending_auto_attack: Option<OperationId>,
    /// The orchestrator driving this attacker's strikes.
    pub orchestrator: Option<OperationId>,
    /// Offensive stance.
    pub fight_mode: FightMode,
    /// Whether to follow the target.
    pub chase_mode: ChaseMode,
    /// Whether attacking unmarked players is blocked.
    pub safe_mode: bool,
}

impl Combatant {
    /// A combatant with full credits from `template`.
    pub fn from_template(template: &CreatureTemplate) -> Self {
        Self {
            auto_attack_target: None,
            chase_target: None,
            attack_credits: template.max_attack_credits,
            defense_credits: template.max_defense_credits,
            max_attack_credits: template.max_attack_credits,
            max_defense_credits: template.max_defense_credits,
            attack_speed: template.attack_speed,
            defense_speed: template.defense_speed,
            attack_range: template.attack_range,
            skill: template.skill,
            armor: template.armor,
            hostiles_in_view: BTreeSet::new(),
            neutrals_in_view: BTreeSet::new(),
            friendly_in_view: BTreeSet::new(),
            pending_auto_attack: None,
            orchestrator: None,
            fight_mode: FightMode::default(),
            chase_mode: ChaseMode::default(),
            safe_mode: true,
        }
    }

    /// Take one attack credit. Returns `false` if none is left.
    pub const fn consume_attack_credit(&mut self) -> bool {
        if let Some(left) = self.attack_credits.checked_sub(1) {
            self.attack_credits = left;
            true
        } else {
            false
        }
    }

    /// Take one defense credit. Returns `false` if none is left.
    pub const fn consume_defense_credit(&mut self) -> bool {
        if let Some(left) = self.defense_credits.checked_sub(1) {
            self.defense_credits = left;
            true
        } else {
            false
        }
    }

    /// Give back one credit, capped at the pool size.
    pub fn restore_credit(&mut self, credit: CombatCredit) {
        match credit {
            CombatCredit::Attack => {
                self.attack_credits = self.attack_credits.saturating_add(1).min(self.max_attack_credits);
            }
            CombatCredit::Defense => {
                self.defense_credits = self.defense_credits.saturating_add(1).min(self.max_defense_credits);
            }
        }
    }

    /// Drop the attack target and chase target.
    pub const fn clear_targets(&mut self) {
        self.auto_attack_target = None;
        self.chase_target = None;
    }

    /// Forget `other` in every view set and as a target.
    pub fn forget(&mut self, other: CreatureId) {
        self.hostiles_in_view.remove(&other);
        self.neutrals_in_view.remove(&other);
        self.friendly_in_view.remove(&other);
        if self.auto_attack_target == Some(other) {
            self.auto_attack_target = None;
        }
        if self.chase_target == Some(other) {
            self.chase_target = None;
        }
    }
}

// ---------------------------------------------------------------------------
// Creature
// ---------------------------------------------------------------------------

/// A player, monster, or NPC in the world.
#[derive(Debug, Clone)]
pub struct Creature {
    /// Identifier.
    pub id: CreatureId,
    /// What sort of creature this is.
    pub kind: CreatureKind,
    /// Display name.
    pub name: String,
    /// Tile the creature stands on.
    pub position: Position,
    /// Facing direction (cardinal only).
    pub facing: Direction,
    /// Current health.
    pub health: u32,
    /// Maximum health.
    pub max_health: u32,
    /// Walking speed.
    pub speed: u16,
    /// Combat state.
    pub combatant: Combatant,
    /// Item type left behind on death.
    pub corpse_type: Option<ironhold_types::ItemTypeId>,
    body: BodyInventory,
}

impl Creature {
    /// Build a creature from a template.
    pub fn new(id: CreatureId, kind: CreatureKind, template: &CreatureTemplate, position: Position) -> Self {
        Self {
            id,
            kind,
            name: template.name.clone(),
            position,
            facing: Direction::South,
            health: template.health,
            max_health: template.health,
            speed: template.speed,
            combatant: Combatant::from_template(template),
            corpse_type: template.corpse_type,
            body: BodyInventory::new(id),
        }
    }

    /// The creature's equipment.
    pub const fn body(&self) -> &BodyInventory {
        &self.body
    }

    pub(crate) const fn body_mut(&mut self) -> &mut BodyInventory {
        &mut self.body
    }

    /// Whether health has run out.
    pub const fn is_dead(&self) -> bool {
        self.health == 0
    }

    /// Remove `amount` health, stopping at zero. Returns the amount removed.
    pub fn apply_damage(&mut self, amount: u32) -> u32 {
        let dealt = amount.min(self.health);
        self.health = self.health.saturating_sub(dealt);
        dealt
    }

    /// Health as a percentage of maximum.
    pub fn health_percent(&self) -> u8 {
        if self.max_health == 0 {
            return 0;
        }
        let percent = u64::from(self.health)
            .saturating_mul(100)
            .checked_div(u64::from(self.max_health))
            .unwrap_or(0);
        u8::try_from(percent).unwrap_or(100)
    }

    /// How this creature regards `other`.
    pub const fn stance_towards(&self, other: CreatureKind) -> Stance {
        match (self.kind, other) {
            (CreatureKind::Npc, _) | (_, CreatureKind::Npc) => Stance::Neutral,
            (CreatureKind::Player, CreatureKind::Monster) | (CreatureKind::Monster, CreatureKind::Player) => {
                Stance::Hostile
            }
            (CreatureKind::Player, CreatureKind::Player) | (CreatureKind::Monster, CreatureKind::Monster) => {
                Stance::Friendly
            }
        }
    }
}

/// How one creature regards another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stance {
    /// Will fight.
    Hostile,
    /// Ignores.
    Neutral,
    /// Same side.
    Friendly,
}

// ---------------------------------------------------------------------------
// Identifier generation
// ---------------------------------------------------------------------------

/// Source of fresh creature identifiers.
pub trait CreatureIdGenerator: Send + Sync + std::fmt::Debug {
    /// The next unused identifier, or `None` once exhausted.
    fn next_id(&mut self) -> Option<CreatureId>;
}

/// Hands out consecutive identifiers starting at a fixed value.
#[derive(Debug, Clone)]
pub struct SequentialCreatureIds {
    next: Option<u32>,
}

impl SequentialCreatureIds {
    /// Start at `first`.
    pub const fn starting_at(first: u32) -> Self {
        Self { next: Some(first) }
    }
}

impl Default for SequentialCreatureIds {
    fn default() -> Self {
        Self::starting_at(1)
    }
}

impl CreatureIdGenerator for SequentialCreatureIds {
    fn next_id(&mut self) -> Option<CreatureId> {
        let current = self.next?;
        self.next = current.checked_add(1);
        Some(CreatureId(current))
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// All creatures currently in the world.
#[derive(Debug)]
pub struct CreatureRegistry {
    creatures: BTreeMap<CreatureId, Creature>,
    ids: Box<dyn CreatureIdGenerator>,
}

impl Default for CreatureRegistry {
    fn default() -> Self {
        Self::new(Box::new(SequentialCreatureIds::default()))
    }
}

impl CreatureRegistry {
    /// An empty registry drawing ids from `ids`.
    pub fn new(ids: Box<dyn CreatureIdGenerator>) -> Self {
        Self {
            creatures: BTreeMap::new(),
            ids,
        }
    }

    /// Create and register a creature. Placing it on the map is the
    /// caller's job.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::CreatureIdsExhausted`] when the generator has
    /// no ids left.
    pub fn create(
        &mut self,
        kind: CreatureKind,
        template: &CreatureTemplate,
        position: Position,
    ) -> Result<CreatureId, WorldError> {
        let id = self.ids.next_id().ok_or(WorldError::CreatureIdsExhausted)?;
        self.creatures.insert(id, Creature::new(id, kind, template, position));
        Ok(id)
    }

    /// Look up a creature.
    pub fn get(&self, id: CreatureId) -> Option<&Creature> {
        self.creatures.get(&id)
    }

    /// Look up a creature mutably.
    pub fn get_mut(&mut self, id: CreatureId) -> Option<&mut Creature> {
        self.creatures.get_mut(&id)
    }

    /// Look up a creature, failing if absent.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::CreatureNotFound`].
    pub fn require(&self, id: CreatureId) -> Result<&Creature, WorldError> {
        self.get(id).ok_or(WorldError::CreatureNotFound(id))
    }

    /// Whether the creature exists.
    pub fn contains(&self, id: CreatureId) -> bool {
        self.creatures.contains_key(&id)
    }

    /// Remove a creature.
    pub fn remove(&mut self, id: CreatureId) -> Option<Creature> {
        self.creatures.remove(&id)
    }

    /// Iterate over all creatures.
    pub fn iter(&self) -> impl Iterator<Item = &Creature> {
        self.creatures.values()
    }

    /// Iterate mutably over all creatures.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Creature> {
        self.creatures.values_mut()
    }

    /// Number of creatures.
    pub fn len(&self) -> usize {
        self.creatures.len()
    }

    /// Whether there are no creatures.
    pub fn is_empty(&self) -> bool {
        self.creatures.is_empty()
    }

    /// Creatures attacking `target`.
    pub fn attackers_of(&self, target: CreatureId) -> Vec<CreatureId> {
        self.creatures
            .values()
            .filter(|creature| creature.combatant.auto_attack_target == Some(target))
            .map(|creature| creature.id)
            .collect()
    }

    /// Recompute every creature's view sets.
    ///
    /// A creature sees others on its floor within `range_x` by `range_y`.
    pub fn refresh_view_sets(&mut self, range_x: u16, range_y: u16) {
        let snapshot: Vec<(CreatureId, CreatureKind, Position)> = self
            .creatures
            .values()
            .map(|creature| (creature.id, creature.kind, creature.position))
            .collect();
        for creature in self.creatures.values_mut() {
            let mut hostiles = BTreeSet::new();
            let mut neutrals = BTreeSet::new();
            let mut friends = BTreeSet::new();
            for (other, kind, position) in &snapshot {
                if *other == creature.id
                    || !creature.position.same_floor(*position)
                    || creature.position.x.abs_diff(position.x) > range_x
                    || creature.position.y.abs_diff(position.y) > range_y
                {
                    continue;
                }
                match creature.stance_towards(*kind) {
                    Stance::Hostile => hostiles.insert(*other),
                    Stance::Neutral => neutrals.insert(*other),
                    Stance::Friendly => friends.insert(*other),
                };
            }
            creature.combatant.hostiles_in_view = hostiles;
            creature.combatant.neutrals_in_view = neutrals;
            creature.combatant.friendly_in_view = friends;
        }
    }
}
