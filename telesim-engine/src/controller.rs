//! Simulation controller.
//!
//! Checks that a sensor exists before handing the action to the registry, and
//! announces every successful transition as a `simulator.*` event. Registry
//! errors reach the caller unchanged and produce no event.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use tracing::{debug, instrument, warn};

use telesim_core::domain::{SensorId, SensorSnapshot};
use telesim_core::events::SimulationEvent;
use telesim_core::ports::{EventEmitter, SensorLookup};
use telesim_core::SimulationError;
use telesim_simulator::SimulationRegistry;

/// Operator action on a sensor's simulation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Start,
    Stop,
    InjectError,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Start => "start",
            Action::Stop => "stop",
            Action::InjectError => "inject_error",
        }
    }
}

impl FromStr for Action {
    type Err = SimulationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "start" => Ok(Action::Start),
            "stop" => Ok(Action::Stop),
            "inject_error" => Ok(Action::InjectError),
            other => Err(SimulationError::InvalidAction(other.to_owned())),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub struct SimulationController {
    sensors: Arc<dyn SensorLookup>,
    registry: Arc<SimulationRegistry>,
    emitter: Arc<dyn EventEmitter>,
}

impl SimulationController {
    pub fn new(
        sensors: Arc<dyn SensorLookup>,
        registry: Arc<SimulationRegistry>,
        emitter: Arc<dyn EventEmitter>,
    ) -> Self {
        Self {
            sensors,
            registry,
            emitter,
        }
    }

    pub fn registry(&self) -> &Arc<SimulationRegistry> {
        &self.registry
    }

    /// Applies a wire-named action (`start`, `stop`, `inject_error`).
    ///
    /// The sensor is looked up first, so an unknown sensor reports
    /// `SensorNotFound` even when the action is also invalid.
    #[instrument(level = "debug", skip_all, fields(sensor_id = %sensor_id, action = %action))]
    pub async fn control_sensor(
        &self,
        sensor_id: &SensorId,
        action: &str,
    ) -> Result<(), SimulationError> {
        let result = async {
            let snapshot = self.lookup(sensor_id).await?;
            let action = action.parse::<Action>()?;
            self.dispatch(sensor_id, snapshot, action).await
        }
        .await;
        log_rejection(&result);
        result
    }

    /// Typed variant of [`Self::control_sensor`].
    #[instrument(level = "debug", skip_all, fields(sensor_id = %sensor_id, action = %action))]
    pub async fn control(&self, sensor_id: &SensorId, action: Action) -> Result<(), SimulationError> {
        let result = async {
            let snapshot = self.lookup(sensor_id).await?;
            self.dispatch(sensor_id, snapshot, action).await
        }
        .await;
        log_rejection(&result);
        result
    }

    async fn lookup(&self, sensor_id: &SensorId) -> Result<SensorSnapshot, SimulationError> {
        self.sensors
            .find_by_id(sensor_id)
            .await?
            .ok_or(SimulationError::SensorNotFound)
    }

    async fn dispatch(
        &self,
        sensor_id: &SensorId,
        snapshot: SensorSnapshot,
        action: Action,
    ) -> Result<(), SimulationError> {
        let event = match action {
            Action::Start => {
                self.registry.start(snapshot)?;
                SimulationEvent::started(sensor_id)
            }
            Action::Stop => {
                self.registry.stop(sensor_id)?;
                SimulationEvent::stopped(sensor_id)
            }
            Action::InjectError => {
                self.registry.inject_error(sensor_id)?;
                SimulationEvent::error_injected(sensor_id)
            }
        };

        // The registry transition is committed; publish failures are only logged.
        let topic = event.topic();
        if let Err(e) = self.emitter.publish(event).await {
            warn!(error = %e, topic, "control event not published");
        }
        Ok(())
    }
}

fn log_rejection(result: &Result<(), SimulationError>) {
    match result {
        Err(e) if e.is_precondition() => debug!(reason = %e, "control rejected"),
        Err(e) => warn!(error = %e, "control failed"),
        Ok(()) => {}
    }
}
