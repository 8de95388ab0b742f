// telesim-simulator/src/lib.rs

/*!
# Telesim Simulator

Continuous telemetry simulation for a fleet of virtual sensors. Each running
sensor owns one background task that ticks at the sensor's sampling rate,
synthesizes a reading, persists it and publishes an event.

## Key Components:
- **Value Synthesizer:** plausible random values per physical quantity.
- **Chaos:** the probabilistic fault roll applied on every tick.
- **Simulation Task:** the cancellable per-sensor tick loop.
- **Simulation Registry:** at most one task per sensor; start, stop and error injection.
*/

pub mod chaos;
pub mod registry;
pub mod synth;
mod task;

pub use registry::SimulationRegistry;
pub use task::{TaskContext, INJECTION_ERROR_TYPE};
