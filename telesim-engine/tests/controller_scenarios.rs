use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use telesim_core::domain::{
    Sensor, SensorConfig, SensorId, SensorSnapshot, SensorType, Thresholds,
};
use telesim_core::events::{EventBus, EventKind, SimulationEvent};
use telesim_core::memory::{InMemoryReadingStore, InMemorySensorStore};
use telesim_core::ports::SensorLookup;
use telesim_core::{SimulationError, StoreError};
use telesim_engine::{Action, SimulationController};
use telesim_simulator::{SimulationRegistry, TaskContext, INJECTION_ERROR_TYPE};
use telesim_telemetry::MetricsRecorder;

struct Harness {
    controller: SimulationController,
    sensors: Arc<InMemorySensorStore>,
    readings: Arc<InMemoryReadingStore>,
    bus: Arc<EventBus>,
}

impl Harness {
    fn new() -> Self {
        let sensors = Arc::new(InMemorySensorStore::new());
        let readings = Arc::new(InMemoryReadingStore::new());
        let bus = Arc::new(EventBus::with_capacity(1024).unwrap());
        let registry = Arc::new(SimulationRegistry::new(TaskContext {
            sink: readings.clone(),
            emitter: bus.clone(),
            metrics: Arc::new(MetricsRecorder::new().unwrap()),
        }));
        let controller = SimulationController::new(sensors.clone(), registry, bus.clone());
        Self {
            controller,
            sensors,
            readings,
            bus,
        }
    }

    fn add(&self, id: &str, sensor_type: SensorType, rate_ms: u64, enabled: bool) -> SensorId {
        let id = SensorId::from(id);
        let config =
            SensorConfig::new(id.clone(), rate_ms, Thresholds::default(), 0.0, enabled).unwrap();
        let sensor = Sensor::new(id.clone(), "dev-1".into(), "probe", sensor_type, config).unwrap();
        self.sensors.insert(sensor);
        id
    }

    fn events(&self) -> Vec<SimulationEvent> {
        self.bus.drain()
    }
}

fn kinds(events: &[SimulationEvent]) -> Vec<EventKind> {
    events.iter().map(|e| e.kind).collect()
}

#[tokio::test(start_paused = true)]
async fn unknown_sensor_is_not_found() {
    let h = Harness::new();

    let err = h
        .controller
        .control_sensor(&"missing".into(), "start")
        .await
        .unwrap_err();

    assert!(matches!(err, SimulationError::SensorNotFound));
    assert!(h.controller.registry().is_empty());
    assert!(h.events().is_empty());
}

#[tokio::test(start_paused = true)]
async fn unknown_sensor_wins_over_bad_action() {
    let h = Harness::new();
    let err = h
        .controller
        .control_sensor(&"missing".into(), "bogus_action")
        .await
        .unwrap_err();
    assert!(matches!(err, SimulationError::SensorNotFound));
}

#[tokio::test(start_paused = true)]
async fn bad_action_touches_nothing() {
    let h = Harness::new();
    let id = h.add("s1", SensorType::Temperature, 50, true);

    let err = h
        .controller
        .control_sensor(&id, "bogus_action")
        .await
        .unwrap_err();

    assert!(matches!(err, SimulationError::InvalidAction(ref a) if a == "bogus_action"));
    assert!(h.controller.registry().is_empty());
    assert!(h.events().is_empty());
}

#[tokio::test(start_paused = true)]
async fn each_transition_is_announced_with_sensor_payload() {
    let h = Harness::new();
    let id = h.add("s1", SensorType::Pressure, 60_000, true);

    h.controller.control_sensor(&id, "start").await.unwrap();
    h.controller.control_sensor(&id, "inject_error").await.unwrap();
    h.controller.control_sensor(&id, "stop").await.unwrap();

    let events = h.events();
    assert_eq!(
        kinds(&events),
        [EventKind::Started, EventKind::ErrorInjected, EventKind::Stopped]
    );
    let topics: Vec<_> = events.iter().map(|e| e.topic()).collect();
    assert_eq!(
        topics,
        ["simulator.started", "simulator.error_injected", "simulator.stopped"]
    );
    for event in &events {
        assert_eq!(event.payload_json(), json!({ "sensor_id": "s1" }));
    }
    assert!(h.controller.registry().is_empty());
}

#[tokio::test(start_paused = true)]
async fn second_start_is_rejected_without_event() {
    let h = Harness::new();
    let id = h.add("s1", SensorType::Humidity, 50, true);

    h.controller.control(&id, Action::Start).await.unwrap();
    let err = h.controller.control(&id, Action::Start).await.unwrap_err();

    assert!(matches!(err, SimulationError::AlreadyActive));
    assert_eq!(h.controller.registry().len(), 1);
    assert_eq!(kinds(&h.events()), [EventKind::Started]);
    h.controller.registry().stop_all();
}

#[tokio::test(start_paused = true)]
async fn disabled_sensor_cannot_start() {
    let h = Harness::new();
    let id = h.add("s1", SensorType::Generic, 50, false);

    let err = h.controller.control_sensor(&id, "start").await.unwrap_err();

    assert!(matches!(err, SimulationError::SensorDisabled));
    assert!(!h.controller.registry().is_active(&id));
    assert!(h.events().is_empty());
}

#[tokio::test(start_paused = true)]
async fn stop_and_inject_need_a_running_sensor() {
    let h = Harness::new();
    let id = h.add("s1", SensorType::Generic, 50, true);

    let stop = h.controller.control(&id, Action::Stop).await.unwrap_err();
    let inject = h.controller.control(&id, Action::InjectError).await.unwrap_err();

    assert!(matches!(stop, SimulationError::NotActive));
    assert!(matches!(inject, SimulationError::NotActive));
    assert!(h.events().is_empty());
}

struct FailingLookup;

#[async_trait]
impl SensorLookup for FailingLookup {
    async fn find_by_id(
        &self,
        _sensor_id: &SensorId,
    ) -> Result<Option<SensorSnapshot>, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }
}

#[tokio::test(start_paused = true)]
async fn lookup_failure_surfaces_as_store_error() {
    let h = Harness::new();
    let controller = SimulationController::new(
        Arc::new(FailingLookup),
        h.controller.registry().clone(),
        h.bus.clone(),
    );

    let err = controller.control_sensor(&"s1".into(), "start").await.unwrap_err();

    assert!(matches!(err, SimulationError::Store(StoreError::Unavailable(_))));
    assert!(!err.is_precondition());
    assert!(h.controller.registry().is_empty());
}

#[tokio::test(start_paused = true)]
async fn running_sensor_publishes_readings_until_stopped() {
    let h = Harness::new();
    let id = h.add("temp-1", SensorType::Temperature, 50, true);

    h.controller.control_sensor(&id, "start").await.unwrap();
    tokio::time::sleep(Duration::from_millis(225)).await;
    h.controller.control_sensor(&id, "stop").await.unwrap();

    let persisted = h.readings.find_by_sensor_id(&id, 100);
    assert_eq!(persisted.len(), 4);
    for reading in &persisted {
        assert_eq!(reading.unit, "°C");
        assert!((20.0..80.0).contains(&reading.value));
        assert_eq!(reading.device_id.as_str(), "dev-1");
    }

    let events = h.events();
    assert_eq!(events.first().map(|e| e.kind), Some(EventKind::Started));
    assert_eq!(events.last().map(|e| e.kind), Some(EventKind::Stopped));
    let published = events
        .iter()
        .filter(|e| e.kind == EventKind::ReadingPublished)
        .count();
    assert_eq!(published, 4);

    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(h.readings.len(), 4);
    assert!(h.events().is_empty());
}

#[tokio::test(start_paused = true)]
async fn injected_error_replaces_one_reading() {
    let h = Harness::new();
    let id = h.add("hum-1", SensorType::Humidity, 100, true);

    h.controller.control(&id, Action::Start).await.unwrap();
    h.controller.control(&id, Action::InjectError).await.unwrap();
    tokio::time::sleep(Duration::from_millis(250)).await;
    h.controller.control(&id, Action::Stop).await.unwrap();

    let events = h.events();
    assert_eq!(
        kinds(&events),
        [
            EventKind::Started,
            EventKind::ErrorInjected,
            EventKind::ReadingError,
            EventKind::ReadingPublished,
            EventKind::Stopped,
        ]
    );
    assert_eq!(
        events[2].payload_json(),
        json!({ "sensor_id": "hum-1", "type": INJECTION_ERROR_TYPE })
    );
    assert_eq!(h.readings.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn restart_after_stop_is_allowed() {
    let h = Harness::new();
    let id = h.add("s1", SensorType::Generic, 50, true);

    h.controller.control(&id, Action::Start).await.unwrap();
    h.controller.control(&id, Action::Stop).await.unwrap();
    h.controller.control(&id, Action::Start).await.unwrap();

    assert!(h.controller.registry().is_active(&id));
    assert_eq!(
        kinds(&h.events()),
        [EventKind::Started, EventKind::Stopped, EventKind::Started]
    );
    h.controller.registry().stop_all();
}
