//! Building operations from a kind and its arguments.
//!
//! Every [`OperationKind`] has one [`CreationArgs`] variant. The factory
//! fills in what the arguments leave to configuration (item-move and
//! speech costs) and refuses arguments meant for a different kind.

use std::time::Duration;

use ironhold_core::{Operation, Rules, SpawnPoint};
use ironhold_types::{
    ChaseMode, CombatCredit, CreatureId, Direction, FightMode, ItemId, ItemTypeId, Location, OperationKind, Position,
    SpeechType,
};
use ironhold_world::CreatureTemplate;

use crate::combat::{AutoAttack, AutoAttackOrchestrator, RestoreCombatCredit};
use crate::control::CancelOperations;
use crate::creature::{ChangeModes, LookAt, LookTarget, Turn};
use crate::death::Death;
use crate::error::FactoryError;
use crate::items::{ChangeItem, CreateItem, DeleteItem, ExpireItem};
use crate::movement::{Movement, MovementArgs};
use crate::session::{LogIn, LogOut};
use crate::spawn::SpawnMonsters;
use crate::speech::Speech;
use crate::walk::{AutoWalkOrchestrator, WalkPlan};

/// Arguments for creating an operation, one variant per kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreationArgs {
    /// One strike.
    AutoAttack {
        /// Who strikes.
        attacker: CreatureId,
        /// Who is struck.
        target: CreatureId,
    },
    /// Set or clear an attack target.
    AutoAttackOrchestrator {
        /// Who attacks.
        attacker: CreatureId,
        /// The new target; `None` stops attacking.
        target: Option<CreatureId>,
    },
    /// Walk a route or follow a creature.
    AutoWalkOrchestrator {
        /// Who walks.
        creature: CreatureId,
        /// Where to.
        plan: WalkPlan,
    },
    /// Move an item or a creature.
    Movement(MovementArgs),
    /// Create an item.
    CreateItem {
        /// Type to create.
        type_id: ItemTypeId,
        /// Stack size.
        amount: u8,
        /// Where it appears.
        at: Location,
        /// Creature the location is relative to.
        requestor: Option<CreatureId>,
    },
    /// Delete an item.
    DeleteItem {
        /// The item.
        item: ItemId,
    },
    /// Transform an item.
    ChangeItem {
        /// The item.
        item: ItemId,
        /// Its new type.
        to: ItemTypeId,
        /// Who asked.
        requestor: Option<CreatureId>,
    },
    /// Expire a timed item.
    ExpireItem {
        /// The item.
        item: ItemId,
    },
    /// Kill a creature.
    Death {
        /// Who died.
        victim: CreatureId,
        /// Who struck last.
        killer: Option<CreatureId>,
    },
    /// Log a player in.
    LogIn {
        /// The player's stats.
        template: CreatureTemplate,
        /// Where they appear.
        position: Position,
    },
    /// Log a player out.
    LogOut {
        /// The player.
        creature: CreatureId,
    },
    /// Describe something.
    LookAt {
        /// Who looks.
        looker: CreatureId,
        /// At what.
        target: LookTarget,
    },
    /// Change combat modes.
    ChangeModes {
        /// Whose modes.
        creature: CreatureId,
        /// Fight stance.
        fight_mode: FightMode,
        /// Chase behavior.
        chase_mode: ChaseMode,
        /// Safe mode.
        safe_mode: bool,
    },
    /// Talk.
    Speech {
        /// Who talks.
        speaker: CreatureId,
        /// How loud.
        speech_type: SpeechType,
        /// What is said.
        text: String,
    },
    /// Face a direction.
    Turn {
        /// Who turns.
        creature: CreatureId,
        /// Which way.
        direction: Direction,
    },
    /// Give back one combat credit.
    RestoreCombatCredit {
        /// Whose credit.
        creature: CreatureId,
        /// Which pool.
        credit: CombatCredit,
    },
    /// Keep a spawn point populated.
    SpawnMonsters {
        /// The spawn point.
        spawn: SpawnPoint,
        /// Monster stats.
        template: CreatureTemplate,
    },
    /// Cancel pending operations.
    CancelOperations {
        /// Whose operations.
        creature: CreatureId,
        /// Only this kind, or everything.
        kind: Option<OperationKind>,
    },
}

impl CreationArgs {
    /// The kind these arguments build.
    pub const fn kind(&self) -> OperationKind {
        match self {
            Self::AutoAttack { .. } => OperationKind::AutoAttack,
            Self::AutoAttackOrchestrator { .. } => OperationKind::AutoAttackOrchestrator,
            Self::AutoWalkOrchestrator { .. } => OperationKind::AutoWalkOrchestrator,
            Self::Movement(_) => OperationKind::Movement,
            Self::CreateItem { .. } => OperationKind::CreateItem,
            Self::DeleteItem { .. } => OperationKind::DeleteItem,
            Self::ChangeItem { .. } => OperationKind::ChangeItem,
            Self::ExpireItem { .. } => OperationKind::ExpireItem,
            Self::Death { .. } => OperationKind::Death,
            Self::LogIn { .. } => OperationKind::LogIn,
            Self::LogOut { .. } => OperationKind::LogOut,
            Self::LookAt { .. } => OperationKind::LookAt,
            Self::ChangeModes { .. } => OperationKind::ChangeModes,
            Self::Speech { .. } => OperationKind::Speech,
            Self::Turn { .. } => OperationKind::Turn,
            Self::RestoreCombatCredit { .. } => OperationKind::RestoreCombatCredit,
            Self::SpawnMonsters { .. } => OperationKind::SpawnMonsters,
            Self::CancelOperations { .. } => OperationKind::CancelOperations,
        }
    }
}

/// Builds operations, applying configured costs.
#[derive(Debug, Clone, Default)]
pub struct OperationFactory {
    rules: Rules,
}

impl OperationFactory {
    /// A factory using `rules` for costs.
    pub const fn new(rules: Rules) -> Self {
        Self { rules }
    }

    /// Build an operation of `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`FactoryError::NotSupported`] if `args` are for another kind.
    pub fn create(&self, kind: OperationKind, args: CreationArgs) -> Result<Operation, FactoryError> {
        let given = args.kind();
        if given != kind {
            return Err(FactoryError::NotSupported { kind, given });
        }
        Ok(self.build(args))
    }

    /// Build the operation `args` describe.
    pub fn build(&self, args: CreationArgs) -> Operation {
        match args {
            CreationArgs::AutoAttack { attacker, target } => AutoAttack::new(attacker, target).into_operation(),
            CreationArgs::AutoAttackOrchestrator { attacker, target } => {
                AutoAttackOrchestrator::new(attacker, target).into_operation()
            }
            CreationArgs::AutoWalkOrchestrator { creature, plan } => {
                AutoWalkOrchestrator::new(creature, plan).into_operation()
            }
            CreationArgs::Movement(movement) => {
                let cost = Duration::from_millis(self.rules.movement.item_move_cost_ms);
                Movement::new(movement).into_operation(cost)
            }
            CreationArgs::CreateItem {
                type_id,
                amount,
                at,
                requestor,
            } => CreateItem::new(type_id, amount, at, requestor).into_operation(),
            CreationArgs::DeleteItem { item } => DeleteItem::new(item).into_operation(),
            CreationArgs::ChangeItem { item, to, requestor } => ChangeItem::new(item, to, requestor).into_operation(),
            CreationArgs::ExpireItem { item } => ExpireItem::new(item).into_operation(),
            CreationArgs::Death { victim, killer } => Death::new(victim, killer).into_operation(),
            CreationArgs::LogIn { template, position } => LogIn::new(template, position).into_operation(),
            CreationArgs::LogOut { creature } => LogOut::new(creature).into_operation(),
            CreationArgs::LookAt { looker, target } => LookAt::new(looker, target).into_operation(),
            CreationArgs::ChangeModes {
                creature,
                fight_mode,
                chase_mode,
                safe_mode,
            } => ChangeModes::new(creature, fight_mode, chase_mode, safe_mode).into_operation(),
            CreationArgs::Speech {
                speaker,
                speech_type,
                text,
            } => {
                let cost = Duration::from_millis(self.rules.speech.cost_ms);
                Speech::new(speaker, speech_type, text).into_operation(cost)
            }
            CreationArgs::Turn { creature, direction } => Turn::new(creature, direction).into_operation(),
            CreationArgs::RestoreCombatCredit { creature, credit } => {
                RestoreCombatCredit::new(creature, credit).into_operation()
            }
            CreationArgs::SpawnMonsters { spawn, template } => SpawnMonsters::new(spawn, template).into_operation(),
            CreationArgs::CancelOperations { creature, kind } => CancelOperations::new(creature, kind).into_operation(),
        }
    }
}
