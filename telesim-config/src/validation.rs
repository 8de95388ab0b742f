//! Custom validation functions for configuration.

use std::collections::HashSet;

use validator::ValidationError;

use crate::fleet::SensorSeed;

/// Validate that no two fleet entries share a sensor id.
pub fn validate_unique_ids(fleet: &[SensorSeed]) -> Result<(), ValidationError> {
    let mut seen = HashSet::with_capacity(fleet.len());
    if fleet.iter().all(|seed| seen.insert(seed.id.as_str())) {
        Ok(())
    } else {
        Err(ValidationError::new("duplicate_sensor_id"))
    }
}

/// Validate a plain log level name.
pub fn validate_log_level(level: &str) -> Result<(), ValidationError> {
    let valid = ["trace", "debug", "info", "warn", "error", "off"]
        .contains(&level.to_lowercase().as_str());
    if valid {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_log_level"))
    }
}
