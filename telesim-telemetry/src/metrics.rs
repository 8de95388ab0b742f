//! ## telesim-telemetry::metrics
//! **Prometheus counters for the simulation engine**
//!
//! Readings are labelled by sensor type and device, as the reading store
//! dashboards expect. Swallowed tick outcomes are labelled by reason.

use prometheus::{IntCounterVec, IntGauge, Opts, Registry};

/// Label values for `telesim_reading_errors_total`.
pub mod reason {
    pub const PERSISTENCE: &str = "persistence";
    pub const SIMULATED_FAULT: &str = "simulated_fault";
    pub const INJECTION: &str = "injection";
}

#[derive(Debug, Clone)]
pub struct MetricsRecorder {
    pub registry: Registry,
    pub readings: IntCounterVec,
    pub reading_errors: IntCounterVec,
    pub events: IntCounterVec,
    pub threshold_breaches: IntCounterVec,
    pub active_simulations: IntGauge,
}

impl MetricsRecorder {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let readings = IntCounterVec::new(
            Opts::new("telesim_readings_total", "Total persisted sensor readings"),
            &["sensor_type", "device_id"],
        )?;
        let reading_errors = IntCounterVec::new(
            Opts::new(
                "telesim_reading_errors_total",
                "Ticks that produced no reading",
            ),
            &["reason"],
        )?;
        let events = IntCounterVec::new(
            Opts::new("telesim_events_total", "Simulation events drained by topic"),
            &["topic"],
        )?;
        let threshold_breaches = IntCounterVec::new(
            Opts::new(
                "telesim_threshold_breaches_total",
                "Persisted readings outside the sensor's thresholds",
            ),
            &["sensor_id", "bound"],
        )?;
        let active_simulations =
            IntGauge::new("telesim_active_simulations", "Currently running simulations")?;

        registry.register(Box::new(readings.clone()))?;
        registry.register(Box::new(reading_errors.clone()))?;
        registry.register(Box::new(events.clone()))?;
        registry.register(Box::new(threshold_breaches.clone()))?;
        registry.register(Box::new(active_simulations.clone()))?;

        Ok(Self {
            registry,
            readings,
            reading_errors,
            events,
            threshold_breaches,
            active_simulations,
        })
    }

    pub fn gather_metrics(&self) -> Result<String, prometheus::Error> {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let mut buffer = Vec::<u8>::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }

    pub fn record_reading(&self, sensor_type: &str, device_id: &str) {
        self.readings
            .with_label_values(&[sensor_type, device_id])
            .inc();
    }

    pub fn record_reading_error(&self, reason: &str) {
        self.reading_errors.with_label_values(&[reason]).inc();
    }

    pub fn record_event(&self, topic: &str) {
        self.events.with_label_values(&[topic]).inc();
    }

    pub fn record_breach(&self, sensor_id: &str, bound: &str) {
        self.threshold_breaches
            .with_label_values(&[sensor_id, bound])
            .inc();
    }

    pub fn simulation_started(&self) {
        self.active_simulations.inc();
    }

    pub fn simulation_stopped(&self) {
        self.active_simulations.dec();
    }

    pub fn reading_count(&self, sensor_type: &str, device_id: &str) -> u64 {
        self.readings
            .with_label_values(&[sensor_type, device_id])
            .get()
    }

    pub fn reading_error_count(&self, reason: &str) -> u64 {
        self.reading_errors.with_label_values(&[reason]).get()
    }

    pub fn breach_count(&self, sensor_id: &str, bound: &str) -> u64 {
        self.threshold_breaches
            .with_label_values(&[sensor_id, bound])
            .get()
    }
}
