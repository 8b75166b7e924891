//! The demonstration world the engine runs.
//!
//! A square map of one ground type on a single floor, the configured
//! spawn points, and one player logged in at the center.

use std::time::Duration;

use ironhold_core::{EngineConfig, Simulation};
use ironhold_operations::{LogIn, SpawnMonsters};
use ironhold_types::Position;
use ironhold_world::{CreatureRegistry, CreatureTemplate, ItemCatalog, ItemType, World};
use tracing::{info, warn};

use crate::error::EngineError;

/// Name of the player logged in at startup.
pub const DEMO_PLAYER: &str = "Wanderer";

/// Build the map described by `config.world`.
///
/// If the configured ground type is not among `config.items`, a plain
/// immovable ground type is added under that id.
pub fn build_world(config: &EngineConfig) -> Result<World, EngineError> {
    let ground = config.world.ground_type;
    let mut types = config.items.clone();
    if !types.iter().any(|item_type| item_type.id == ground) {
        info!(ground = %ground, "Ground type not configured, using plain grass");
        types.push(ItemType {
            ground: true,
            movable: false,
            ..ItemType::simple(ground.0, "grass")
        });
    }
    let catalog = ItemCatalog::from_types(types)?;
    let mut world = World::new(catalog, CreatureRegistry::default(), config.world_settings());

    let size = config.world.map_size;
    let floor = config.world.floor;
    for x in 0..size {
        for y in 0..size {
            world.add_tile(Position::new(x, y, floor), ground)?;
        }
    }
    world.drain_events();
    info!(
        world_name = config.world.name,
        size,
        floor,
        item_types = world.catalog().len(),
        "Demonstration world built"
    );
    Ok(world)
}

/// The tile the demo player logs in on.
pub const fn center(config: &EngineConfig) -> Position {
    let half = config.world.map_size.saturating_div(2);
    Position::new(half, half, config.world.floor)
}

/// Queue the spawn points and the demo player's login. Returns how many
/// operations were queued.
pub fn seed_operations(config: &EngineConfig, sim: &mut Simulation) -> usize {
    let mut queued: usize = 0;
    for spawn in &config.spawns {
        let Some(template) = config.monster(&spawn.monster) else {
            warn!(monster = %spawn.monster, position = %spawn.position, "Spawn point names an unknown monster, skipped");
            continue;
        };
        sim.schedule(
            SpawnMonsters::new(spawn.clone(), template.clone()).into_operation(),
            Duration::ZERO,
        );
        queued = queued.saturating_add(1);
    }

    let login = LogIn::new(CreatureTemplate::named(DEMO_PLAYER), center(config));
    sim.schedule(login.into_operation(), Duration::ZERO);
    queued.saturating_add(1)
}
