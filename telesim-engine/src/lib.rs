/*!
# Telesim Engine

Orchestration on top of the simulation registry: the controller that turns
operator actions into registry calls and control events, and the runtime that
wires configuration, collaborators and the event processor together so
different frontends (CLI, HTTP) share one implementation.
*/

pub mod controller;
mod error;
pub mod processor;
pub mod runtime;

pub use controller::{Action, SimulationController};
pub use error::EngineError;
pub use processor::{EventProcessor, LoggingEventProcessor};
pub use runtime::{RunSummary, SimulationRuntime};

pub mod prelude {
    pub use super::{Action, EngineError, SimulationController, SimulationRuntime};
}
