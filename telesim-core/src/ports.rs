//! Capabilities the simulation engine consumes.
//!
//! Implementations live outside the engine: the in-memory stores in
//! [`crate::memory`], the [`crate::events::EventBus`], or real database and
//! message-broker adapters.

use async_trait::async_trait;

use crate::domain::{Reading, ReadingId, SensorId, SensorSnapshot};
use crate::error::StoreError;
use crate::events::{EventError, SimulationEvent};

/// Read access to sensor definitions.
#[async_trait]
pub trait SensorLookup: Send + Sync {
    /// `Ok(None)` means the sensor does not exist; `Err` means the lookup
    /// itself failed.
    async fn find_by_id(&self, sensor_id: &SensorId) -> Result<Option<SensorSnapshot>, StoreError>;
}

/// Persists synthesized readings.
#[async_trait]
pub trait ReadingSink: Send + Sync {
    async fn save(&self, reading: Reading) -> Result<ReadingId, StoreError>;
}

/// Publishes simulation events.
#[async_trait]
pub trait EventEmitter: Send + Sync {
    async fn publish(&self, event: SimulationEvent) -> Result<(), EventError>;
}
