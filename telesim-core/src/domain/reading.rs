use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{DeviceId, SensorId, SensorType};

/// Identifier assigned to a reading by the sink that persisted it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReadingId(pub i64);

impl fmt::Display for ReadingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One timestamped sample attributed to a sensor and its device.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub sensor_id: SensorId,
    pub device_id: DeviceId,
    #[serde(rename = "type")]
    pub sensor_type: SensorType,
    pub value: f64,
    pub unit: String,
    pub timestamp: DateTime<Utc>,
}

impl Reading {
    pub fn new(
        sensor_id: SensorId,
        device_id: DeviceId,
        sensor_type: SensorType,
        value: f64,
        unit: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            sensor_id,
            device_id,
            sensor_type,
            value,
            unit: unit.into(),
            timestamp,
        }
    }
}
