//! Defines the EventProcessor trait for handling drained simulation events.

use std::sync::Arc;

use async_trait::async_trait;
use opentelemetry::KeyValue;
use tracing::instrument;

use telesim_core::events::SimulationEvent;
use telesim_telemetry::{EventLogger, MetricsRecorder};

/// Consumer side of the event bus.
#[async_trait]
pub trait EventProcessor: Send + Sync {
    async fn process(&self, event: &SimulationEvent);
}

/// Counts each event by topic and writes it to the structured log.
pub struct LoggingEventProcessor {
    metrics: Arc<MetricsRecorder>,
}

impl LoggingEventProcessor {
    pub fn new(metrics: Arc<MetricsRecorder>) -> Self {
        Self { metrics }
    }
}

#[async_trait]
impl EventProcessor for LoggingEventProcessor {
    #[instrument(skip_all, level = "trace")]
    async fn process(&self, event: &SimulationEvent) {
        self.metrics.record_event(event.topic());
        EventLogger::log_event(
            event.topic(),
            event.sensor_id.as_str(),
            vec![
                KeyValue::new("timestamp", event.timestamp.to_rfc3339()),
                KeyValue::new("payload", event.payload_json().to_string()),
            ],
        )
        .await;
    }
}
