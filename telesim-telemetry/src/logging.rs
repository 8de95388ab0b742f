//! ## telesim-telemetry::logging
//! **Structured logging with tracing and OpenTelemetry key/values**
//!
//! `RUST_LOG` takes precedence over the configured default level.

use opentelemetry::KeyValue;
use tracing::{info_span, Instrument};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Clone)]
pub struct EventLogger;

impl EventLogger {
    /// Installs the global subscriber. Later calls are no-ops.
    pub fn init(default_level: &str, json: bool) {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
        let builder = fmt()
            .with_env_filter(filter)
            .with_thread_names(true)
            .with_span_events(FmtSpan::NONE);

        let _ = if json {
            builder.json().try_init()
        } else {
            builder.try_init()
        };
    }

    /// Records one drained event. `sensor_id` is a span field so every record
    /// emitted while handling the event can be filtered by sensor.
    pub async fn log_event(event_type: &str, sensor_id: &str, attributes: Vec<KeyValue>) {
        let span = info_span!(
            "simulation_event",
            event_type,
            sensor_id,
            otel.kind = "INTERNAL"
        );

        async {
            let attributes: Vec<String> = attributes
                .iter()
                .map(|kv| format!("{}={}", kv.key, kv.value))
                .collect();
            tracing::info!(
                event_type,
                sensor_id,
                attributes = %attributes.join(" "),
                "Simulation event published"
            );
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    #[traced_test]
    #[test]
    fn test_logging() {
        tokio::runtime::Runtime::new()
            .unwrap()
            .block_on(EventLogger::log_event(
                "sensor.reading.published",
                "temp-1",
                vec![KeyValue::new("reading", 42)],
            ));
        assert!(logs_contain("Simulation event published"));
        assert!(logs_contain("sensor_id=\"temp-1\""));
        assert!(logs_contain("event_type=\"sensor.reading.published\""));
        assert!(logs_contain("reading=42"));
    }
}
