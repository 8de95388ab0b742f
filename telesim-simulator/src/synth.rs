//! Value synthesizer.
//!
//! Draws from the thread-local RNG, so concurrent tasks never contend.

use rand::Rng;
use telesim_core::domain::SensorType;

/// Produces a uniformly distributed value and its unit for a sensor type.
pub fn generate(sensor_type: SensorType) -> (f64, &'static str) {
    let mut rng = rand::rng();
    match sensor_type {
        SensorType::Temperature => (rng.random_range(20.0..80.0), "°C"),
        SensorType::Humidity => (rng.random_range(0.0..100.0), "%"),
        SensorType::Pressure => (rng.random_range(900.0..1100.0), "hPa"),
        SensorType::Generic => (rng.random_range(0.0..100.0), ""),
    }
}
