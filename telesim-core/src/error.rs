use thiserror::Error;

/// Outcome of a simulator control operation.
///
/// The first five variants are expected control-flow outcomes returned to the
/// caller as-is; they are not faults and are never retried.
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("sensor not found")]
    SensorNotFound,

    #[error("sensor is disabled")]
    SensorDisabled,

    #[error("sensor already active")]
    AlreadyActive,

    #[error("sensor not active")]
    NotActive,

    #[error("invalid action: {0}")]
    InvalidAction(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl SimulationError {
    /// True for the outcomes a caller is expected to handle (not faults).
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            SimulationError::SensorNotFound
                | SimulationError::SensorDisabled
                | SimulationError::AlreadyActive
                | SimulationError::NotActive
                | SimulationError::InvalidAction(_)
        )
    }
}

/// Failure reported by a storage collaborator (sensor lookup, reading sink).
#[derive(Clone, Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
}
