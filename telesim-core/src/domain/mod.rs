//! Sensor domain model.
//!
//! Identifiers are string newtypes so a `SensorId` can never be passed where a
//! `DeviceId` is expected.

mod reading;
mod sensor;
mod thresholds;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use reading::{Reading, ReadingId};
pub use sensor::{Sensor, SensorConfig, SensorSnapshot};
pub use thresholds::{Breach, Thresholds};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            #[inline]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(
    /// Identifier of a logical telemetry source.
    SensorId
);

string_id!(
    /// Identifier of the device a sensor is mounted on.
    DeviceId
);

/// Physical quantity a sensor measures.
///
/// Unrecognised names parse as [`SensorType::Generic`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SensorType {
    Temperature,
    Humidity,
    Pressure,
    #[default]
    Generic,
}

impl SensorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SensorType::Temperature => "temperature",
            SensorType::Humidity => "humidity",
            SensorType::Pressure => "pressure",
            SensorType::Generic => "generic",
        }
    }
}

impl From<&str> for SensorType {
    fn from(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "temperature" => SensorType::Temperature,
            "humidity" => SensorType::Humidity,
            "pressure" => SensorType::Pressure,
            _ => SensorType::Generic,
        }
    }
}

impl From<String> for SensorType {
    fn from(name: String) -> Self {
        SensorType::from(name.as_str())
    }
}

impl From<SensorType> for String {
    fn from(kind: SensorType) -> Self {
        kind.as_str().to_owned()
    }
}

impl fmt::Display for SensorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
