//! Sensor fleet definition.
//!
//! Each entry seeds one sensor in the runtime's sensor store.

use serde::{Deserialize, Serialize};
use validator::{self, Validate};

#[derive(Debug, Serialize, Deserialize, Validate, Clone, PartialEq)]
pub struct SensorSeed {
    #[validate(length(min = 1))]
    pub id: String,

    #[validate(length(min = 1))]
    pub device_id: String,

    #[validate(length(min = 1))]
    pub name: String,

    /// `temperature`, `humidity`, `pressure`; anything else is simulated as generic.
    #[serde(default = "default_sensor_type")]
    pub sensor_type: String,

    /// Tick interval (milliseconds).
    #[validate(range(min = 1, max = 3_600_000))]
    #[serde(default = "default_sampling_rate")]
    pub sampling_rate_ms: u64,

    /// Probability that a tick silently produces nothing.
    #[validate(range(min = 0.0, max = 1.0))]
    #[serde(default)]
    pub error_rate: f64,

    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default)]
    pub thresholds: ThresholdSeed,
}

#[derive(Default, Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct ThresholdSeed {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

fn default_sensor_type() -> String {
    "generic".into()
}

fn default_sampling_rate() -> u64 {
    1000
}

fn default_true() -> bool {
    true
}

pub(crate) fn demo_fleet() -> Vec<SensorSeed> {
    [
        ("temp-1", "temperature"),
        ("hum-1", "humidity"),
        ("press-1", "pressure"),
    ]
    .into_iter()
    .map(|(id, kind)| SensorSeed {
        id: id.into(),
        device_id: "demo-device".into(),
        name: format!("demo {kind}"),
        sensor_type: kind.into(),
        sampling_rate_ms: default_sampling_rate(),
        error_rate: 0.0,
        enabled: true,
        thresholds: ThresholdSeed::default(),
    })
    .collect()
}
