//! Simulation runtime - wires configuration, collaborators, registry and the
//! event processor into one runnable unit.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::signal;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};

use telesim_config::{SensorSeed, TelesimConfig};
use telesim_core::domain::{Sensor, SensorConfig, SensorType, Thresholds};
use telesim_core::events::EventBus;
use telesim_core::memory::{InMemoryReadingStore, InMemorySensorStore};
use telesim_core::SimulationError;
use telesim_simulator::{SimulationRegistry, TaskContext};
use telesim_telemetry::MetricsRecorder;

use crate::controller::{Action, SimulationController};
use crate::error::EngineError;
use crate::processor::{EventProcessor, LoggingEventProcessor};

/// What a finished run did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub sensors_started: usize,
    pub events_processed: usize,
    pub readings_persisted: usize,
}

pub struct SimulationRuntime {
    config: Arc<TelesimConfig>,
    sensors: Arc<InMemorySensorStore>,
    readings: Arc<InMemoryReadingStore>,
    /// Bus every task and the controller publish onto
    pub event_bus: Arc<EventBus>,
    pub metrics: Arc<MetricsRecorder>,
    controller: SimulationController,
    event_processor: Arc<dyn EventProcessor>,
}

impl SimulationRuntime {
    /// Loads configuration from `path`, or from the `config/` directory and
    /// environment when `None`, then builds the runtime.
    pub fn load(path: Option<&Path>) -> Result<Self, EngineError> {
        let config = match path {
            Some(path) => TelesimConfig::load_from_path(path)?,
            None => TelesimConfig::load()?,
        };
        Self::new(config)
    }

    /// Builds the runtime and seeds the sensor store from `config.fleet`.
    pub fn new(config: TelesimConfig) -> Result<Self, EngineError> {
        info!("Initializing simulation runtime");
        debug!("Simulator config: {:?}", config.simulator);

        let event_bus = Arc::new(EventBus::with_capacity(
            config.simulator.event_bus_capacity,
        )?);
        let metrics = Arc::new(MetricsRecorder::new()?);

        let sensors = Arc::new(InMemorySensorStore::new());
        for seed in &config.fleet {
            sensors.insert(sensor_from_seed(seed)?);
        }
        let readings = Arc::new(InMemoryReadingStore::with_retention(
            config.simulator.reading_retention,
        ));

        let registry = Arc::new(SimulationRegistry::new(TaskContext {
            sink: readings.clone(),
            emitter: event_bus.clone(),
            metrics: metrics.clone(),
        }));
        let controller = SimulationController::new(sensors.clone(), registry, event_bus.clone());
        let event_processor = Arc::new(LoggingEventProcessor::new(metrics.clone()));

        Ok(Self {
            config: Arc::new(config),
            sensors,
            readings,
            event_bus,
            metrics,
            controller,
            event_processor,
        })
    }

    /// Replaces the default logging processor.
    pub fn with_event_processor(mut self, processor: Arc<dyn EventProcessor>) -> Self {
        self.event_processor = processor;
        self
    }

    pub fn config(&self) -> &TelesimConfig {
        &self.config
    }

    pub fn controller(&self) -> &SimulationController {
        &self.controller
    }

    pub fn sensors(&self) -> &Arc<InMemorySensorStore> {
        &self.sensors
    }

    pub fn readings(&self) -> &Arc<InMemoryReadingStore> {
        &self.readings
    }

    /// Starts every enabled fleet sensor, returning how many started.
    pub async fn start_fleet(&self) -> Result<usize, EngineError> {
        let mut started = 0;
        for seed in self.config.enabled_sensors() {
            self.controller
                .control(&seed.id.as_str().into(), Action::Start)
                .await?;
            started += 1;
        }
        info!(started, "fleet started");
        Ok(started)
    }

    /// Stops every running sensor through the controller so each one is
    /// announced, returning how many were stopped.
    pub async fn stop_fleet(&self) -> usize {
        let mut stopped = 0;
        for sensor_id in self.controller.registry().active_sensors() {
            match self.controller.control(&sensor_id, Action::Stop).await {
                Ok(()) => stopped += 1,
                Err(e) => debug!(%sensor_id, reason = %e, "already stopped"),
            }
        }
        stopped + self.controller.registry().stop_all()
    }

    /// Runs the fleet until `duration` elapses or Ctrl-C arrives, then stops
    /// every sensor and drains the remaining events.
    #[instrument(skip(self))]
    pub async fn run(&self, duration: Option<Duration>) -> Result<RunSummary, EngineError> {
        let processor = self.spawn_event_processor();

        let sensors_started = match self.start_fleet().await {
            Ok(started) => started,
            Err(e) => {
                self.stop_fleet().await;
                self.event_bus.close();
                processor.await?;
                return Err(e);
            }
        };

        wait_for_shutdown(duration).await;
        info!("Shutting down simulation runtime");

        let stopped = self.stop_fleet().await;
        debug!(stopped, "fleet stopped");
        self.event_bus.close();
        let events_processed = processor.await?;

        Ok(RunSummary {
            sensors_started,
            events_processed,
            readings_persisted: self.readings.saved_total(),
        })
    }

    /// Drains the bus until it is closed and empty; resolves to the number of
    /// events processed.
    fn spawn_event_processor(&self) -> JoinHandle<usize> {
        let event_bus = self.event_bus.clone();
        let event_processor = self.event_processor.clone();
        let idle = Duration::from_millis(self.config.simulator.drain_interval_ms);

        tokio::spawn(async move {
            info!("Event processor started");
            let mut processed = 0usize;

            loop {
                match event_bus.try_pop() {
                    Some(event) => {
                        event_processor.process(&event).await;
                        processed += 1;
                    }
                    None if event_bus.is_closed() => break,
                    None => sleep(idle).await,
                }
            }

            for event in event_bus.drain() {
                event_processor.process(&event).await;
                processed += 1;
            }
            info!(processed, "Event processor finished");
            processed
        })
    }
}

async fn wait_for_shutdown(duration: Option<Duration>) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Ctrl-C handler unavailable: {e}");
            std::future::pending::<()>().await;
        }
    };

    match duration {
        Some(duration) => tokio::select! {
            _ = sleep(duration) => {}
            _ = ctrl_c => {}
        },
        None => ctrl_c.await,
    }
}

/// Turns a fleet entry into a validated domain sensor.
pub fn sensor_from_seed(seed: &SensorSeed) -> Result<Sensor, SimulationError> {
    let thresholds = Thresholds {
        min: seed.thresholds.min,
        max: seed.thresholds.max,
    };
    let config = SensorConfig::new(
        seed.id.as_str().into(),
        seed.sampling_rate_ms,
        thresholds,
        seed.error_rate,
        seed.enabled,
    )?;
    Sensor::new(
        seed.id.as_str().into(),
        seed.device_id.as_str().into(),
        seed.name.clone(),
        SensorType::from(seed.sensor_type.as_str()),
        config,
    )
}
