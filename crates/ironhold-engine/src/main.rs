//! Engine binary for Ironhold.
//!
//! Wires the configuration, the demonstration world, and the wall-clock
//! run loop together and runs until the time limit or Ctrl-C.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `ironhold-config.yaml` (or `IRONHOLD_CONFIG`)
//! 2. Initialize structured logging (tracing)
//! 3. Build the demonstration world
//! 4. Queue spawn points and the demo player's login
//! 5. Create operator state and hook Ctrl-C to a stop request
//! 6. Run the simulation loop
//! 7. Log the result

mod demo;
mod error;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use ironhold_core::{
    EngineConfig, LoggingConfig, OperatorState, Services, Simulation, StraightLinePathFinder, TracingSink,
    log_run_end, run_simulation,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration, world construction, or the run loop
/// fails.
#[tokio::main]
async fn main() -> Result<(), EngineError> {
    // 1. Load configuration.
    let (config, loaded_from) = load_config()?;

    // 2. Initialize structured logging.
    init_tracing(&config.logging);
    info!("ironhold-engine starting");
    match loaded_from {
        Some(path) => info!(path = %path.display(), seed = config.world.seed, "Configuration loaded"),
        None => info!(seed = config.world.seed, "Config file not found, using defaults"),
    }

    // 3. Build the world.
    let world = demo::build_world(&config)?;
    let services = Services::new(
        Box::new(TracingSink),
        Box::new(StraightLinePathFinder::default()),
        config.world.seed,
        config.rules(),
    );
    let mut sim = Simulation::new(world, services);

    // 4. Queue the opening operations.
    let queued = demo::seed_operations(&config, &mut sim);
    info!(queued, spawns = config.spawns.len(), "Opening operations queued");

    // 5. Operator state.
    let operator = Arc::new(OperatorState::new(config.scheduler.max_run_seconds));
    {
        let operator = Arc::clone(&operator);
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("Ctrl-C received, stopping");
                    operator.request_stop();
                }
                Err(e) => warn!(error = %e, "failed to listen for Ctrl-C"),
            }
        });
    }

    // 6. Run.
    let idle_wait = Duration::from_millis(config.scheduler.idle_wait_ms);
    let summary = run_simulation(&mut sim, &operator, idle_wait).await?;

    // 7. Log results.
    log_run_end(&summary);
    info!(
        creatures = sim.world().creatures().len(),
        items = sim.world().items().len(),
        "ironhold-engine shutdown complete"
    );
    Ok(())
}

/// Load configuration from `IRONHOLD_CONFIG`, or `ironhold-config.yaml` in
/// the working directory. Returns the path it was read from, if any.
fn load_config() -> Result<(EngineConfig, Option<PathBuf>), EngineError> {
    let path = std::env::var_os("IRONHOLD_CONFIG").map_or_else(|| PathBuf::from("ironhold-config.yaml"), PathBuf::from);
    if path.exists() {
        let config = EngineConfig::from_file(&path)?;
        Ok((config, Some(path)))
    } else {
        Ok((EngineConfig::default(), None))
    }
}

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    if logging.json {
        tracing_subscriber::fmt().json().with_env_filter(filter).with_target(true).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).with_target(true).init();
    }
}
