//! Simulation loop runner with operator controls.
//!
//! [`Simulation`] bundles the world, the scheduler, and the services lent
//! to operations. [`Simulation::step_to`] drives simulated time
//! deterministically and is what tests use; [`run_simulation`] drives it
//! from the wall clock:
//!
//! - **Event-driven**: sleeps until the next operation is due, a
//!   submission arrives, or the operator stops the run
//! - **Bounded**: stops after `max_run_seconds` of wall time

use std::sync::Arc;
use std::time::Duration;

use ironhold_types::{GameTime, OperationId};
use ironhold_world::World;
use tokio::time::Instant;
use tracing::{info, warn};

use crate::clock::ClockError;
use crate::context::Services;
use crate::operation::Operation;
use crate::operator::{OperatorState, RunEndReason};
use crate::scheduler::{FireRecord, Scheduler, SchedulerHandle};

/// Errors that can occur during the simulation run.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// The clock refused to move.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: ClockError,
    },
}

/// Result of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Why the run ended.
    pub end_reason: RunEndReason,
    /// Operations fired during the run.
    pub operations_fired: u64,
    /// Simulation time when the run ended.
    pub final_time: GameTime,
}

/// World, scheduler, and services.
#[derive(Debug)]
pub struct Simulation {
    world: World,
    scheduler: Scheduler,
    services: Services,
}

impl Simulation {
    /// A simulation starting at time zero.
    pub fn new(world: World, services: Services) -> Self {
        Self {
            world,
            scheduler: Scheduler::new(),
            services,
        }
    }

    /// The world.
    pub const fn world(&self) -> &World {
        &self.world
    }

    /// The world, for setup outside the fire loop.
    pub const fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// The scheduler.
    pub const fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// The scheduler, mutably.
    pub const fn scheduler_mut(&mut self) -> &mut Scheduler {
        &mut self.scheduler
    }

    /// The services.
    pub const fn services(&self) -> &Services {
        &self.services
    }

    /// The services, mutably.
    pub const fn services_mut(&mut self) -> &mut Services {
        &mut self.services
    }

    /// A producer handle.
    pub fn handle(&self) -> SchedulerHandle {
        self.scheduler.handle()
    }

    /// The current simulation time.
    pub fn now(&self) -> GameTime {
        self.scheduler.now()
    }

    /// Queue an operation.
    pub fn schedule(&mut self, operation: Operation, delay: Duration) -> OperationId {
        self.scheduler.schedule(operation, delay)
    }

    /// Fire everything due now, without moving the clock.
    pub fn fire_now(&mut self) -> Vec<FireRecord> {
        self.scheduler.accept_submissions();
        self.scheduler.fire_due(&mut self.world, &mut self.services)
    }

    /// Advance simulated time to `target`, firing every operation at its
    /// own due time along the way.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::Clock`] if `target` is in the past.
    pub fn step_to(&mut self, target: GameTime) -> Result<Vec<FireRecord>, RunnerError> {
        let current = self.scheduler.now();
        if target < current {
            return Err(ClockError::Backwards {
                current,
                requested: target,
            }
            .into());
        }
        let mut fired = self.fire_now();
        while let Some(due) = self.scheduler.next_due() {
            if due > target {
                break;
            }
            self.scheduler.advance_to(due)?;
            fired.extend(self.fire_now());
        }
        self.scheduler.advance_to(target)?;
        Ok(fired)
    }

    /// Advance simulated time by `delta`.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::Clock`] only if the clock is corrupted.
    pub fn advance(&mut self, delta: Duration) -> Result<Vec<FireRecord>, RunnerError> {
        let target = self.now().saturating_add(delta);
        self.step_to(target)
    }
}

/// Drive `sim` from the wall clock until the operator stops it or the time
/// limit is reached.
///
/// Simulated time advances one millisecond per wall millisecond. The loop
/// sleeps until the next due operation, waking early for submissions and
/// stop requests, and never longer than `idle_wait`.
///
/// # Errors
///
/// Returns [`RunnerError`] if the clock refuses to advance.
pub async fn run_simulation(
    sim: &mut Simulation,
    operator: &Arc<OperatorState>,
    idle_wait: Duration,
) -> Result<RunSummary, RunnerError> {
    let mut operations_fired: u64 = 0;
    let anchor = (Instant::now(), sim.now());

    info!(
        max_run_seconds = operator.max_run_seconds(),
        idle_wait_ms = u64::try_from(idle_wait.as_millis()).unwrap_or(u64::MAX),
        start = %anchor.1,
        "Simulation starting"
    );

    loop {
        // --- Check stop request ---
        if operator.is_stop_requested() {
            info!("Operator stop requested");
            return finish(operator, RunEndReason::OperatorStop, operations_fired, sim.now()).await;
        }

        // --- Check time limit ---
        if operator.time_limit_reached() {
            info!(
                max_seconds = operator.max_run_seconds(),
                elapsed = operator.elapsed_seconds(),
                "Real-time limit reached"
            );
            return finish(operator, RunEndReason::TimeLimitReached, operations_fired, sim.now()).await;
        }

        // --- Fire everything due by now ---
        let target = anchor.1.saturating_add(anchor.0.elapsed()).max(sim.now());
        let fired = sim.step_to(target)?;
        operations_fired = operations_fired.saturating_add(u64::try_from(fired.len()).unwrap_or(u64::MAX));

        // --- Sleep until something happens ---
        let wait = sim
            .scheduler
            .next_due()
            .map_or(idle_wait, |due| target.saturating_duration_until(due).min(idle_wait));
        let wall_now = || anchor.1.saturating_add(anchor.0.elapsed());
        tokio::select! {
            () = tokio::time::sleep(wait) => {}
            () = operator.stopped() => {}
            arrived = sim.scheduler.wait_for_submission(wall_now) => arrived?,
        }
    }
}

async fn finish(
    operator: &OperatorState,
    reason: RunEndReason,
    operations_fired: u64,
    final_time: GameTime,
) -> Result<RunSummary, RunnerError> {
    operator.set_end_reason(reason.clone()).await;
    Ok(RunSummary {
        end_reason: reason,
        operations_fired,
        final_time,
    })
}

/// Log the end of a run.
pub fn log_run_end(summary: &RunSummary) {
    info!(
        reason = ?summary.end_reason,
        operations_fired = summary.operations_fired,
        final_time = %summary.final_time,
        "Simulation ended"
    );
    if summary.operations_fired == 0 {
        warn!("Simulation ended with no operations fired");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use ironhold_world::{CreatureRegistry, ItemCatalog, WorldSettings};

    use super::*;

    fn simulation() -> Simulation {
        let world = World::new(ItemCatalog::default(), CreatureRegistry::default(), WorldSettings::default());
        let (services, _) = Services::buffered(7);
        Simulation::new(world, services)
    }

    #[test]
    fn step_to_cannot_rewind() {
        let mut sim = simulation();
        sim.step_to(GameTime::from_millis(100)).unwrap();
        assert!(matches!(
            sim.step_to(GameTime::from_millis(50)),
            Err(RunnerError::Clock { .. })
        ));
    }

    #[tokio::test]
    async fn stop_ends_the_run() {
        let mut sim = simulation();
        let operator = Arc::new(OperatorState::new(0));
        operator.request_stop();
        let summary = run_simulation(&mut sim, &operator, Duration::from_millis(5)).await.unwrap();
        assert_eq!(summary.end_reason, RunEndReason::OperatorStop);
        assert_eq!(operator.end_reason().await, Some(RunEndReason::OperatorStop));
    }
}
