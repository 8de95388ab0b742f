use thiserror::Error;
use tokio::task::JoinError;

use telesim_config::ConfigError;
use telesim_core::events::EventError;
use telesim_core::SimulationError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Simulation error: {0}")]
    Simulation(#[from] SimulationError),

    #[error("Event bus error: {0}")]
    Event(#[from] EventError),

    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("Event processor task failed: {0}")]
    Join(#[from] JoinError),
}
