//! Simulation registry.
//!
//! Single source of truth for which sensors are simulating. The map lock is
//! held only for the map operation itself, never across a tick or any I/O.

use std::collections::HashMap;

use parking_lot::RwLock;
use tracing::{debug, info, instrument};

use telesim_core::domain::{SensorId, SensorSnapshot};
use telesim_core::SimulationError;

use crate::task::{SimulationTask, TaskContext};

/// Owns every running simulation task, at most one per sensor.
///
/// Dropping the registry cancels all of its tasks.
pub struct SimulationRegistry {
    context: TaskContext,
    tasks: RwLock<HashMap<SensorId, SimulationTask>>,
}

impl SimulationRegistry {
    pub fn new(context: TaskContext) -> Self {
        Self {
            context,
            tasks: RwLock::new(HashMap::new()),
        }
    }

    /// Starts simulating `snapshot.sensor_id`.
    ///
    /// # Panics
    /// If called outside a Tokio runtime.
    #[instrument(level = "debug", skip_all, fields(sensor_id = %snapshot.sensor_id))]
    pub fn start(&self, snapshot: SensorSnapshot) -> Result<(), SimulationError> {
        let mut tasks = self.tasks.write();
        if tasks.contains_key(&snapshot.sensor_id) {
            debug!("start rejected, already active");
            return Err(SimulationError::AlreadyActive);
        }
        if !snapshot.enabled {
            debug!("start rejected, sensor disabled");
            return Err(SimulationError::SensorDisabled);
        }

        let sensor_id = snapshot.sensor_id.clone();
        let interval_ms = snapshot.sampling_interval_ms;
        tasks.insert(sensor_id, SimulationTask::spawn(snapshot, self.context.clone()));
        self.context.metrics.simulation_started();
        info!(interval_ms, "simulation started");
        Ok(())
    }

    /// Signals the sensor's task to stop and forgets it. Does not wait for the
    /// loop to exit; a tick already in progress still completes.
    #[instrument(level = "debug", skip_all, fields(sensor_id = %sensor_id))]
    pub fn stop(&self, sensor_id: &SensorId) -> Result<(), SimulationError> {
        let mut tasks = self.tasks.write();
        let task = tasks.remove(sensor_id).ok_or(SimulationError::NotActive)?;
        task.cancel();
        self.context.metrics.simulation_stopped();
        info!("simulation stopped");
        Ok(())
    }

    /// Makes the sensor's next tick emit a `reading_error` instead of a reading.
    #[instrument(level = "debug", skip_all, fields(sensor_id = %sensor_id))]
    pub fn inject_error(&self, sensor_id: &SensorId) -> Result<(), SimulationError> {
        let tasks = self.tasks.read();
        let task = tasks.get(sensor_id).ok_or(SimulationError::NotActive)?;
        task.request_error();
        info!("error injection armed");
        Ok(())
    }

    /// Stops every running task and returns how many there were.
    pub fn stop_all(&self) -> usize {
        let drained: Vec<_> = self.tasks.write().drain().collect();
        let stopped = drained.len();
        for (_, task) in drained {
            task.cancel();
            self.context.metrics.simulation_stopped();
        }
        if stopped > 0 {
            info!(stopped, "all simulations stopped");
        }
        stopped
    }

    pub fn is_active(&self, sensor_id: &SensorId) -> bool {
        self.tasks.read().contains_key(sensor_id)
    }

    /// Running sensors, sorted.
    pub fn active_sensors(&self) -> Vec<SensorId> {
        let mut ids: Vec<SensorId> = self.tasks.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.tasks.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use telesim_core::domain::{Reading, ReadingId, SensorType, Thresholds};
    use telesim_core::ports::ReadingSink;
    use telesim_core::StoreError;
    use telesim_core::events::{EventBus, EventKind, SimulationEvent};
    use telesim_core::memory::InMemoryReadingStore;
    use telesim_telemetry::metrics::{reason, MetricsRecorder};
    use tokio::time::sleep;

    struct Harness {
        registry: SimulationRegistry,
        store: Arc<InMemoryReadingStore>,
        bus: Arc<EventBus>,
        metrics: Arc<MetricsRecorder>,
    }

    impl Harness {
        fn new() -> Self {
            let store = Arc::new(InMemoryReadingStore::new());
            let bus = Arc::new(EventBus::with_capacity(1024).unwrap());
            let metrics = Arc::new(MetricsRecorder::new().unwrap());
            let registry = SimulationRegistry::new(TaskContext {
                sink: store.clone(),
                emitter: bus.clone(),
                metrics: metrics.clone(),
            });
            Self {
                registry,
                store,
                bus,
                metrics,
            }
        }

        fn events(&self) -> Vec<SimulationEvent> {
            self.bus.drain()
        }
    }

    fn count(events: &[SimulationEvent], kind: EventKind) -> usize {
        events.iter().filter(|e| e.kind == kind).count()
    }

    fn snapshot(id: &str, interval_ms: u64, error_probability: f64) -> SensorSnapshot {
        SensorSnapshot {
            sensor_id: id.into(),
            device_id: "d1".into(),
            sensor_type: SensorType::Temperature,
            sampling_interval_ms: interval_ms,
            error_probability,
            thresholds: Thresholds::default(),
            enabled: true,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn second_start_is_rejected() {
        let h = Harness::new();
        h.registry.start(snapshot("s1", 50, 0.0)).unwrap();
        assert!(matches!(
            h.registry.start(snapshot("s1", 50, 0.0)),
            Err(SimulationError::AlreadyActive)
        ));
        assert_eq!(h.registry.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn idle_sensor_operations_are_not_active() {
        let h = Harness::new();
        let id = SensorId::from("s1");
        assert!(matches!(h.registry.stop(&id), Err(SimulationError::NotActive)));
        assert!(matches!(
            h.registry.inject_error(&id),
            Err(SimulationError::NotActive)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn disabled_sensor_is_not_registered() {
        let h = Harness::new();
        let mut disabled = snapshot("s1", 50, 0.0);
        disabled.enabled = false;
        assert!(matches!(
            h.registry.start(disabled),
            Err(SimulationError::SensorDisabled)
        ));
        assert!(!h.registry.is_active(&"s1".into()));
        assert_eq!(h.metrics.active_simulations.get(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn already_active_is_checked_before_enabled() {
        let h = Harness::new();
        h.registry.start(snapshot("s1", 50, 0.0)).unwrap();
        let mut disabled = snapshot("s1", 50, 0.0);
        disabled.enabled = false;
        assert!(matches!(
            h.registry.start(disabled),
            Err(SimulationError::AlreadyActive)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn stop_succeeds_exactly_once() {
        let h = Harness::new();
        let id = SensorId::from("s1");
        h.registry.start(snapshot("s1", 50, 0.0)).unwrap();
        assert_eq!(h.metrics.active_simulations.get(), 1);

        h.registry.stop(&id).unwrap();
        assert!(matches!(h.registry.stop(&id), Err(SimulationError::NotActive)));
        assert!(!h.registry.is_active(&id));
        assert_eq!(h.metrics.active_simulations.get(), 0);

        // Idle again, so it may cycle back to running.
        h.registry.start(snapshot("s1", 50, 0.0)).unwrap();
        assert!(h.registry.is_active(&id));
    }

    #[tokio::test(start_paused = true)]
    async fn running_sensor_publishes_readings() {
        let h = Harness::new();
        h.registry.start(snapshot("s1", 50, 0.0)).unwrap();
        sleep(Duration::from_millis(200)).await;
        h.registry.stop(&"s1".into()).unwrap();

        let events = h.events();
        assert!(count(&events, EventKind::ReadingPublished) >= 3);
        assert_eq!(count(&events, EventKind::ReadingError), 0);
        assert_eq!(h.store.len(), count(&events, EventKind::ReadingPublished));
    }

    #[tokio::test(start_paused = true)]
    async fn first_tick_waits_one_interval() {
        let h = Harness::new();
        h.registry.start(snapshot("s1", 50, 0.0)).unwrap();
        sleep(Duration::from_millis(40)).await;
        assert!(h.store.is_empty());
        sleep(Duration::from_millis(20)).await;
        assert_eq!(h.store.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn injected_error_replaces_one_reading() {
        let h = Harness::new();
        let id = SensorId::from("s1");
        h.registry.start(snapshot("s1", 50, 0.0)).unwrap();
        h.registry.inject_error(&id).unwrap();

        sleep(Duration::from_millis(60)).await;
        let first_tick = h.events();
        assert_eq!(first_tick.len(), 1);
        assert_eq!(first_tick[0].kind, EventKind::ReadingError);
        assert_eq!(
            first_tick[0].payload_json(),
            serde_json::json!({ "sensor_id": "s1", "type": "injection" })
        );
        assert!(h.store.is_empty());

        sleep(Duration::from_millis(100)).await;
        let later = h.events();
        assert_eq!(count(&later, EventKind::ReadingError), 0);
        assert_eq!(count(&later, EventKind::ReadingPublished), 2);
        assert_eq!(h.metrics.reading_error_count(reason::INJECTION), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_injection_before_a_tick_collapses() {
        let h = Harness::new();
        let id = SensorId::from("s1");
        h.registry.start(snapshot("s1", 50, 0.0)).unwrap();
        h.registry.inject_error(&id).unwrap();
        h.registry.inject_error(&id).unwrap();

        sleep(Duration::from_millis(110)).await;
        let events = h.events();
        assert_eq!(count(&events, EventKind::ReadingError), 1);
        assert_eq!(count(&events, EventKind::ReadingPublished), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn persistence_failures_do_not_stop_the_loop() {
        let h = Harness::new();
        h.store.set_failing(true);
        h.registry.start(snapshot("s1", 50, 0.0)).unwrap();

        sleep(Duration::from_millis(160)).await;
        assert!(h.events().is_empty());
        assert_eq!(h.metrics.reading_error_count(reason::PERSISTENCE), 3);

        h.store.set_failing(false);
        sleep(Duration::from_millis(100)).await;
        assert_eq!(count(&h.events(), EventKind::ReadingPublished), 2);
        assert!(h.registry.is_active(&"s1".into()));
    }

    #[tokio::test(start_paused = true)]
    async fn certain_fault_produces_nothing() {
        let h = Harness::new();
        h.registry.start(snapshot("s1", 50, 1.0)).unwrap();
        sleep(Duration::from_millis(200)).await;
        assert!(h.events().is_empty());
        assert!(h.store.is_empty());
        assert!(h.metrics.reading_error_count(reason::SIMULATED_FAULT) >= 3);
    }

    #[tokio::test(start_paused = true)]
    async fn stopped_sensor_goes_quiet() {
        let h = Harness::new();
        h.registry.start(snapshot("s1", 50, 0.0)).unwrap();
        sleep(Duration::from_millis(120)).await;
        h.registry.stop(&"s1".into()).unwrap();
        let written = h.store.len();
        assert_eq!(written, 2);

        sleep(Duration::from_millis(500)).await;
        assert_eq!(h.store.len(), written);
    }

    /// Sink whose writes take `delay` to complete.
    struct SlowSink {
        inner: Arc<InMemoryReadingStore>,
        delay: Duration,
    }

    #[async_trait]
    impl ReadingSink for SlowSink {
        async fn save(&self, reading: Reading) -> Result<ReadingId, StoreError> {
            sleep(self.delay).await;
            self.inner.save(reading).await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn stop_lets_an_in_flight_tick_finish() {
        let store = Arc::new(InMemoryReadingStore::new());
        let bus = Arc::new(EventBus::with_capacity(1024).unwrap());
        let registry = SimulationRegistry::new(TaskContext {
            sink: Arc::new(SlowSink {
                inner: store.clone(),
                delay: Duration::from_millis(30),
            }),
            emitter: bus.clone(),
            metrics: Arc::new(MetricsRecorder::new().unwrap()),
        });
        registry.start(snapshot("s1", 50, 0.0)).unwrap();

        // The first tick fires at 50ms and is still saving at 60ms.
        sleep(Duration::from_millis(60)).await;
        assert!(store.is_empty());
        assert!(bus.is_empty());

        registry.stop(&"s1".into()).unwrap();
        assert!(!registry.is_active(&"s1".into()));

        sleep(Duration::from_millis(300)).await;
        assert_eq!(store.len(), 1);
        let kinds: Vec<_> = bus.drain().into_iter().map(|e| e.kind).collect();
        assert_eq!(kinds, [EventKind::ReadingPublished]);
    }

    #[tokio::test(start_paused = true)]
    async fn sensors_tick_independently() {
        let h = Harness::new();
        h.registry.start(snapshot("fast", 20, 0.0)).unwrap();
        h.registry.start(snapshot("slow", 100, 0.0)).unwrap();
        assert_eq!(
            h.registry.active_sensors(),
            vec![SensorId::from("fast"), SensorId::from("slow")]
        );

        sleep(Duration::from_millis(210)).await;
        assert_eq!(h.store.find_by_sensor_id(&"fast".into(), 100).len(), 10);
        assert_eq!(h.store.find_by_sensor_id(&"slow".into(), 100).len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_all_empties_the_registry() {
        let h = Harness::new();
        for id in ["a", "b", "c"] {
            h.registry.start(snapshot(id, 50, 0.0)).unwrap();
        }
        assert_eq!(h.registry.stop_all(), 3);
        assert!(h.registry.is_empty());
        assert_eq!(h.metrics.active_simulations.get(), 0);

        sleep(Duration::from_millis(200)).await;
        assert!(h.store.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_registry_ends_every_loop() {
        let h = Harness::new();
        h.registry.start(snapshot("s1", 50, 0.0)).unwrap();
        let Harness { registry, store, .. } = h;
        drop(registry);

        sleep(Duration::from_millis(200)).await;
        assert!(store.is_empty());
    }
}
