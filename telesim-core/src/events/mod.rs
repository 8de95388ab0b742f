//! ## telesim-core::events
//! **Simulation events and the bus they travel on**
//!
//! Every event carries a kind, the sensor it concerns, a UTC timestamp and a
//! typed payload. On the wire an event is `{type, timestamp, payload}` where
//! `type` is the topic name of its kind.

pub mod bus;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::domain::{ReadingId, SensorId};

pub use bus::EventBus;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum EventError {
    #[error("Event queue capacity exceeded")]
    QueueFull,
    #[error("Invalid capacity (must be non-zero)")]
    InvalidCapacity,
    #[error("Event bus closed")]
    Closed,
    #[error("Event transport failure: {0}")]
    Transport(String),
}

/// What happened to a simulated sensor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    Started,
    Stopped,
    ErrorInjected,
    ReadingPublished,
    ReadingError,
}

impl EventKind {
    /// Topic name used when the event leaves the process.
    pub fn topic(&self) -> &'static str {
        match self {
            EventKind::Started => "simulator.started",
            EventKind::Stopped => "simulator.stopped",
            EventKind::ErrorInjected => "simulator.error_injected",
            EventKind::ReadingPublished => "sensor.reading.published",
            EventKind::ReadingError => "sensor.reading.error",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EventPayload {
    Control {
        sensor_id: SensorId,
    },
    ReadingPublished {
        sensor_id: SensorId,
        reading: ReadingId,
    },
    ReadingError {
        sensor_id: SensorId,
        #[serde(rename = "type")]
        error_type: String,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct SimulationEvent {
    pub kind: EventKind,
    pub sensor_id: SensorId,
    pub timestamp: DateTime<Utc>,
    pub payload: EventPayload,
}

#[derive(Serialize)]
struct WireEvent<'a> {
    #[serde(rename = "type")]
    topic: &'static str,
    timestamp: &'a DateTime<Utc>,
    payload: &'a EventPayload,
}

impl SimulationEvent {
    fn now(kind: EventKind, sensor_id: SensorId, payload: EventPayload) -> Self {
        Self {
            kind,
            sensor_id,
            timestamp: Utc::now(),
            payload,
        }
    }

    fn control(kind: EventKind, sensor_id: &SensorId) -> Self {
        let payload = EventPayload::Control {
            sensor_id: sensor_id.clone(),
        };
        Self::now(kind, sensor_id.clone(), payload)
    }

    pub fn started(sensor_id: &SensorId) -> Self {
        Self::control(EventKind::Started, sensor_id)
    }

    pub fn stopped(sensor_id: &SensorId) -> Self {
        Self::control(EventKind::Stopped, sensor_id)
    }

    pub fn error_injected(sensor_id: &SensorId) -> Self {
        Self::control(EventKind::ErrorInjected, sensor_id)
    }

    pub fn reading_published(sensor_id: &SensorId, reading: ReadingId) -> Self {
        let payload = EventPayload::ReadingPublished {
            sensor_id: sensor_id.clone(),
            reading,
        };
        Self::now(EventKind::ReadingPublished, sensor_id.clone(), payload)
    }

    pub fn reading_error(sensor_id: &SensorId, error_type: impl Into<String>) -> Self {
        let payload = EventPayload::ReadingError {
            sensor_id: sensor_id.clone(),
            error_type: error_type.into(),
        };
        Self::now(EventKind::ReadingError, sensor_id.clone(), payload)
    }

    #[inline]
    pub fn topic(&self) -> &'static str {
        self.kind.topic()
    }

    pub fn payload_json(&self) -> serde_json::Value {
        serde_json::to_value(&self.payload).unwrap_or(serde_json::Value::Null)
    }

    /// Renders the event as `{type, timestamp, payload}`.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&WireEvent {
            topic: self.topic(),
            timestamp: &self.timestamp,
            payload: &self.payload,
        })
    }
}
