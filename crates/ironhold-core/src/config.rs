//! Configuration loading and typed config structures for the Ironhold engine.
//!
//! The canonical configuration lives in `ironhold-config.yaml` at the
//! project root. Every field has a default, so an empty file is a valid
//! configuration.

use std::path::Path;
use std::time::Duration;

use ironhold_types::{ItemTypeId, Position};
use ironhold_world::{CreatureTemplate, ItemType, WorldSettings};
use rust_decimal::Decimal;
use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level engine configuration.
///
/// Mirrors the structure of `ironhold-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct EngineConfig {
    /// World-level settings.
    #[serde(default)]
    pub world: WorldConfig,

    /// Fire-loop pacing and run bounds.
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// Combat timing.
    #[serde(default)]
    pub combat: CombatConfig,

    /// Walking cost multipliers.
    #[serde(default)]
    pub movement: MovementConfig,

    /// Speech ranges.
    #[serde(default)]
    pub speech: SpeechConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Item types known to the catalog.
    #[serde(default)]
    pub items: Vec<ItemType>,

    /// Monster templates, referenced by name from spawns.
    #[serde(default)]
    pub monsters: Vec<CreatureTemplate>,

    /// Monster spawn points.
    #[serde(default)]
    pub spawns: Vec<SpawnPoint>,
}

impl EngineConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values:
    /// - `IRONHOLD_SEED` overrides `world.seed`
    /// - `IRONHOLD_LOG` overrides `logging.level`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Some(seed) = std::env::var("IRONHOLD_SEED").ok().and_then(|val| val.parse().ok()) {
            self.world.seed = seed;
        }
        if let Ok(val) = std::env::var("IRONHOLD_LOG") {
            self.logging.level = val;
        }
    }

    /// The world settings derived from this configuration.
    pub const fn world_settings(&self) -> WorldSettings {
        WorldSettings {
            view_range_x: self.world.view_range_x,
            view_range_y: self.world.view_range_y,
            max_open_containers: self.world.max_open_containers,
        }
    }

    /// The gameplay rules operations consult.
    pub fn rules(&self) -> Rules {
        Rules {
            combat: self.combat.clone(),
            movement: self.movement.clone(),
            speech: self.speech.clone(),
        }
    }

    /// Look up a monster template by name.
    pub fn monster(&self, name: &str) -> Option<&CreatureTemplate> {
        self.monsters.iter().find(|template| template.name == name)
    }
}

/// World-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorldConfig {
    /// Human-readable world name.
    #[serde(default = "default_world_name")]
    pub name: String,

    /// Random seed for damage rolls and spawn placement.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Horizontal view distance in tiles.
    #[serde(default = "default_view_range_x")]
    pub view_range_x: u16,

    /// Vertical view distance in tiles.
    #[serde(default = "default_view_range_y")]
    pub view_range_y: u16,

    /// Open-container positions per creature.
    #[serde(default = "default_max_open_containers")]
    pub max_open_containers: u8,

    /// Side length of the generated demonstration map.
    #[serde(default = "default_map_size")]
    pub map_size: u16,

    /// Floor of the generated demonstration map.
    #[serde(default = "default_floor")]
    pub floor: u8,

    /// Ground item type of the generated demonstration map.
    #[serde(default = "default_ground_type")]
    pub ground_type: ItemTypeId,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            name: default_world_name(),
            seed: default_seed(),
            view_range_x: default_view_range_x(),
            view_range_y: default_view_range_y(),
            max_open_containers: default_max_open_containers(),
            map_size: default_map_size(),
            floor: default_floor(),
            ground_type: default_ground_type(),
        }
    }
}

/// Fire-loop configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SchedulerConfig {
    /// Longest the run loop sleeps between checks when nothing is due.
    #[serde(default = "default_idle_wait_ms")]
    pub idle_wait_ms: u64,

    /// Maximum wall-clock seconds to run (0 = unlimited).
    #[serde(default)]
    pub max_run_seconds: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            idle_wait_ms: default_idle_wait_ms(),
            max_run_seconds: 0,
        }
    }
}

/// Combat timing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CombatConfig {
    /// Length of one combat round at speed 1.0, in milliseconds.
    #[serde(default = "default_round_time_ms")]
    pub round_time_ms: u64,

    /// Backoff multiplier for a strike whose target is out of reach.
    #[serde(default = "default_out_of_range_factor")]
    pub out_of_range_factor: u32,

    /// How many tiles a chasing creature stops short of its target.
    #[serde(default = "default_chase_distance")]
    pub chase_distance: u16,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            round_time_ms: default_round_time_ms(),
            out_of_range_factor: default_out_of_range_factor(),
            chase_distance: default_chase_distance(),
        }
    }
}

impl CombatConfig {
    /// One round divided by `speed`, rounded to whole milliseconds.
    ///
    /// Non-positive speeds yield a full round.
    pub fn round_for(&self, speed: Decimal) -> Duration {
        let round = Decimal::from(self.round_time_ms);
        let millis = if speed > Decimal::ZERO {
            round.checked_div(speed).unwrap_or(round)
        } else {
            round
        };
        Duration::from_millis(decimal_to_millis(millis))
    }

    /// Backoff for a strike that could not reach its target.
    pub fn retry_for(&self, speed: Decimal) -> Duration {
        self.round_for(speed).saturating_mul(self.out_of_range_factor)
    }
}

/// Walking cost multipliers.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MovementConfig {
    /// Multiplier for diagonal steps.
    #[serde(default = "default_diagonal_multiplier")]
    pub diagonal_multiplier: Decimal,

    /// Multiplier for steps that change floor.
    #[serde(default = "default_floor_change_multiplier")]
    pub floor_change_multiplier: Decimal,

    /// Cooldown after moving an item, in milliseconds.
    #[serde(default = "default_item_move_cost_ms")]
    pub item_move_cost_ms: u64,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            diagonal_multiplier: default_diagonal_multiplier(),
            floor_change_multiplier: default_floor_change_multiplier(),
            item_move_cost_ms: default_item_move_cost_ms(),
        }
    }
}

impl MovementConfig {
    /// Time to take one step at `speed` over ground of `ground_speed`.
    ///
    /// The base is `1000 * ground_speed / speed` milliseconds, scaled by
    /// the diagonal or floor-change multiplier.
    pub fn step_duration(&self, ground_speed: u16, speed: u16, diagonal: bool, floor_change: bool) -> Duration {
        let base = Decimal::from(1_000_u32)
            .checked_mul(Decimal::from(ground_speed))
            .and_then(|scaled| scaled.checked_div(Decimal::from(speed.max(1))))
            .unwrap_or(Decimal::ZERO);
        let multiplier = if floor_change {
            self.floor_change_multiplier
        } else if diagonal {
            self.diagonal_multiplier
        } else {
            Decimal::ONE
        };
        let millis = base.checked_mul(multiplier).unwrap_or(base);
        Duration::from_millis(decimal_to_millis(millis))
    }
}

/// Speech ranges.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SpeechConfig {
    /// Whisper reach in tiles.
    #[serde(default = "default_whisper_range")]
    pub whisper_range: u16,

    /// Horizontal yell reach in tiles.
    #[serde(default = "default_yell_range_x")]
    pub yell_range_x: u16,

    /// Vertical yell reach in tiles.
    #[serde(default = "default_yell_range_y")]
    pub yell_range_y: u16,

    /// Cooldown after speaking, in milliseconds.
    #[serde(default = "default_speech_cost_ms")]
    pub cost_ms: u64,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            whisper_range: default_whisper_range(),
            yell_range_x: default_yell_range_x(),
            yell_range_y: default_yell_range_y(),
            cost_ms: default_speech_cost_ms(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive (e.g. `info`, `ironhold_core=debug`).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// A place where monsters appear.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SpawnPoint {
    /// Name of the monster template.
    pub monster: String,

    /// Center of the spawn area.
    pub position: Position,

    /// Spawn area radius in tiles.
    #[serde(default = "default_spawn_radius")]
    pub radius: u16,

    /// How many monsters the spawn keeps alive.
    #[serde(default = "default_spawn_count")]
    pub count: u16,

    /// Delay between spawn checks, in milliseconds.
    #[serde(default = "default_respawn_ms")]
    pub respawn_ms: u64,
}

/// The slice of configuration operations consult while executing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Rules {
    /// Combat timing.
    pub combat: CombatConfig,
    /// Walking costs.
    pub movement: MovementConfig,
    /// Speech ranges.
    pub speech: SpeechConfig,
}

fn decimal_to_millis(value: Decimal) -> u64 {
    u64::try_from(value.round()).unwrap_or(u64::MAX)
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

fn default_world_name() -> String {
    String::from("Ironhold")
}

const fn default_seed() -> u64 {
    42
}

const fn default_view_range_x() -> u16 {
    8
}

const fn default_view_range_y() -> u16 {
    6
}

const fn default_max_open_containers() -> u8 {
    16
}

const fn default_map_size() -> u16 {
    16
}

const fn default_floor() -> u8 {
    7
}

const fn default_ground_type() -> ItemTypeId {
    ItemTypeId(102)
}

const fn default_idle_wait_ms() -> u64 {
    50
}

const fn default_round_time_ms() -> u64 {
    2_000
}

const fn default_out_of_range_factor() -> u32 {
    2
}

const fn default_chase_distance() -> u16 {
    1
}

fn default_diagonal_multiplier() -> Decimal {
    Decimal::new(3, 0)
}

fn default_floor_change_multiplier() -> Decimal {
    Decimal::new(2, 0)
}

const fn default_item_move_cost_ms() -> u64 {
    200
}

const fn default_whisper_range() -> u16 {
    1
}

const fn default_yell_range_x() -> u16 {
    18
}

const fn default_yell_range_y() -> u16 {
    14
}

const fn default_speech_cost_ms() -> u64 {
    1_000
}

fn default_log_level() -> String {
    String::from("info")
}

const fn default_spawn_radius() -> u16 {
    2
}

const fn default_spawn_count() -> u16 {
    1
}

const fn default_respawn_ms() -> u64 {
    60_000
}
