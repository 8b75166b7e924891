//! Simulation clock, operation scheduler, and run loop for Ironhold.
//!
//! Every change to the world happens inside an [`Operation`] fired by the
//! [`Scheduler`] at its due time. This crate owns the contract operations
//! implement, the contexts they execute against, per-creature cooldowns,
//! and the loop that advances simulated time.
//!
//! # Modules
//!
//! - [`clock`] -- Monotonic simulated millisecond clock.
//! - [`config`] -- Configuration loading from `ironhold-config.yaml` into
//!   strongly-typed structs, plus the gameplay [`Rules`].
//! - [`context`] -- [`OperationContext`], [`ElevatedOperationContext`], and
//!   the [`Services`] lent to each execution.
//! - [`cooldown`] -- Per-creature exhaustion ledgers.
//! - [`error`] -- [`OperationError`].
//! - [`notify`] -- [`NotificationSink`] and its buffered and tracing sinks.
//! - [`operation`] -- Operation headers, bodies, and execution results.
//! - [`operator`] -- Stop control and time limit for the run loop.
//! - [`path`] -- [`PathFinder`] trait and a straight-line finder.
//! - [`runner`] -- [`Simulation`] and the wall-clock run loop.
//! - [`scheduler`] -- The time-ordered queue and its fire loop.

pub mod clock;
pub mod config;
pub mod context;
pub mod cooldown;
pub mod error;
pub mod notify;
pub mod operation;
pub mod operator;
pub mod path;
pub mod runner;
pub mod scheduler;

pub use clock::{ClockError, GameClock};
pub use config::{
    CombatConfig, ConfigError, EngineConfig, LoggingConfig, MovementConfig, Rules, SchedulerConfig, SpawnPoint,
    SpeechConfig, WorldConfig,
};
pub use context::{ElevatedOperationContext, OperationContext, Services};
pub use cooldown::{CooldownBook, CooldownLedger, SharedCooldowns};
pub use error::OperationError;
pub use notify::{BufferedSink, NotificationSink, TracingSink};
pub use operation::{
    Effect, ElevatedOperation, ExecutionResult, Operation, OperationBody, OperationHeader, StandardOperation,
};
pub use operator::{OperatorState, RunEndReason};
pub use path::{PathFinder, PathResult, PathState, StraightLinePathFinder};
pub use runner::{RunSummary, RunnerError, Simulation, log_run_end, run_simulation};
pub use scheduler::{FireRecord, Scheduler, SchedulerError, SchedulerHandle};
