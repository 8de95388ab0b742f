use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{DeviceId, SensorId, SensorType, Thresholds};
use crate::SimulationError;

/// Per-sensor simulation settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SensorConfig {
    pub sensor_id: SensorId,
    pub sampling_rate_ms: u64,
    #[serde(default)]
    pub thresholds: Thresholds,
    pub error_rate: f64,
    pub enabled: bool,
    pub updated_at: DateTime<Utc>,
}

impl SensorConfig {
    pub fn new(
        sensor_id: SensorId,
        sampling_rate_ms: u64,
        thresholds: Thresholds,
        error_rate: f64,
        enabled: bool,
    ) -> Result<Self, SimulationError> {
        if sensor_id.is_empty() {
            return Err(SimulationError::Validation("sensor id empty".into()));
        }
        validate_rates(sampling_rate_ms, error_rate)?;

        Ok(Self {
            sensor_id,
            sampling_rate_ms,
            thresholds,
            error_rate,
            enabled,
            updated_at: Utc::now(),
        })
    }
}

fn validate_rates(sampling_rate_ms: u64, error_rate: f64) -> Result<(), SimulationError> {
    if sampling_rate_ms == 0 {
        return Err(SimulationError::Validation(
            "sampling rate must be positive".into(),
        ));
    }
    if !(0.0..=1.0).contains(&error_rate) {
        return Err(SimulationError::Validation(
            "error rate must be between 0 and 1".into(),
        ));
    }
    Ok(())
}

/// A logical telemetry source attached to a device.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sensor {
    pub id: SensorId,
    pub device_id: DeviceId,
    pub name: String,
    #[serde(rename = "type")]
    pub sensor_type: SensorType,
    pub config: SensorConfig,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Sensor {
    /// Builds a sensor, binding `config` to the new sensor id.
    pub fn new(
        id: SensorId,
        device_id: DeviceId,
        name: impl Into<String>,
        sensor_type: SensorType,
        mut config: SensorConfig,
    ) -> Result<Self, SimulationError> {
        let name = name.into();
        if id.is_empty() {
            return Err(SimulationError::Validation("sensor id empty".into()));
        }
        if device_id.is_empty() {
            return Err(SimulationError::Validation("device id empty".into()));
        }
        if name.is_empty() {
            return Err(SimulationError::Validation("name empty".into()));
        }

        let now = Utc::now();
        config.sensor_id = id.clone();
        config.updated_at = now;

        Ok(Self {
            id,
            device_id,
            name,
            sensor_type,
            config,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn update_config(&mut self, mut config: SensorConfig) -> Result<(), SimulationError> {
        if config.sensor_id != self.id {
            return Err(SimulationError::Validation(
                "config sensor_id mismatch".into(),
            ));
        }
        validate_rates(config.sampling_rate_ms, config.error_rate)?;

        config.updated_at = Utc::now();
        self.updated_at = config.updated_at;
        self.config = config;
        Ok(())
    }

    /// Freezes the fields a simulation task needs.
    pub fn snapshot(&self) -> SensorSnapshot {
        SensorSnapshot {
            sensor_id: self.id.clone(),
            device_id: self.device_id.clone(),
            sensor_type: self.sensor_type,
            sampling_interval_ms: self.config.sampling_rate_ms,
            error_probability: self.config.error_rate,
            thresholds: self.config.thresholds,
            enabled: self.config.enabled,
        }
    }
}

/// Immutable view of a sensor taken when its simulation starts.
///
/// Config changes made afterwards are only picked up by a stop followed by a
/// new start.
#[derive(Clone, Debug, PartialEq)]
pub struct SensorSnapshot {
    pub sensor_id: SensorId,
    pub device_id: DeviceId,
    pub sensor_type: SensorType,
    pub sampling_interval_ms: u64,
    pub error_probability: f64,
    /// Alarm bounds checked against every persisted value.
    pub thresholds: Thresholds,
    pub enabled: bool,
}

impl SensorSnapshot {
    #[inline]
    pub fn sampling_interval(&self) -> Duration {
        Duration::from_millis(self.sampling_interval_ms)
    }
}
