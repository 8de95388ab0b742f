//! Simulation engine configuration.

use serde::{Deserialize, Serialize};
use validator::{self, Validate};

#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct SimulatorConfig {
    /// Maximum number of undrained events held by the event bus.
    #[validate(range(min = 128, max = 1048576))]
    #[serde(default = "default_capacity")]
    pub event_bus_capacity: usize,

    /// How often the runtime drains the event bus when it is empty (milliseconds).
    #[validate(range(min = 1, max = 10_000))]
    #[serde(default = "default_drain_interval")]
    pub drain_interval_ms: u64,

    /// Readings the in-memory reading store keeps before evicting the oldest.
    #[validate(range(min = 1, max = 10_000_000))]
    #[serde(default = "default_reading_retention")]
    pub reading_retention: usize,
}

fn default_capacity() -> usize {
    4096
}

fn default_drain_interval() -> u64 {
    10
}

fn default_reading_retention() -> usize {
    10_000
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            event_bus_capacity: default_capacity(),
            drain_interval_ms: default_drain_interval(),
            reading_retention: default_reading_retention(),
        }
    }
}
