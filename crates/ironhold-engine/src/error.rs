//! Error types for the engine binary.
//!
//! [`EngineError`] wraps every failure mode of startup and the run loop so
//! `main` can propagate with `?`.

/// Top-level error for the engine binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: ironhold_core::config::ConfigError,
    },

    /// Building the world failed.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: ironhold_world::WorldError,
    },

    /// The simulation loop failed.
    #[error("runner error: {source}")]
    Runner {
        /// The underlying runner error.
        #[from]
        source: ironhold_core::RunnerError,
    },
}
