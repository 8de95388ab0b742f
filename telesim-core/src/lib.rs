//! # telesim-core
//!
//! Foundation layer for the telemetry simulator: the sensor domain model, the
//! error taxonomy shared by every crate, the collaborator capabilities the
//! simulation engine consumes, and the event bus it publishes onto.
//!
//! ### Key Submodules:
//! - `domain`: sensors, snapshots, readings and thresholds
//! - `events`: simulation events and the lock-free `EventBus`
//! - `ports`: `SensorLookup` / `ReadingSink` capabilities
//! - `memory`: in-memory collaborators for the runtime and tests
//!
//! ### Future:
//! - Postgres-backed `ReadingSink`
//! - NATS-backed `EventEmitter`

pub mod domain;
pub mod error;
pub mod events;
pub mod memory;
pub mod ports;

pub mod prelude {
    pub use crate::domain::*;
    pub use crate::error::*;
    pub use crate::events::*;
    pub use crate::ports::*;
}

pub use error::{SimulationError, StoreError};
