//! # Telesim Configuration System
//!
//! Layered configuration for the sensor telemetry simulator.
//!
//! ## Features
//! - **Layering**: defaults, YAML files and `TELESIM_*` environment variables
//! - **Validation**: every section is checked with `validator` before use
//! - **Fleet definition**: the sensors a run should simulate

#![warn(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

mod error;
mod fleet;
mod simulator;
mod telemetry;
mod validation;

pub use error::ConfigError;
pub use fleet::{SensorSeed, ThresholdSeed};
pub use simulator::SimulatorConfig;
pub use telemetry::TelemetryConfig;

/// Top‑level configuration container.
#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct TelesimConfig {
    /// Engine parameters (event bus, drain cadence).
    #[validate(nested)]
    #[serde(default)]
    pub simulator: SimulatorConfig,

    /// Logging configuration.
    #[validate(nested)]
    #[serde(default)]
    pub telemetry: TelemetryConfig,

    /// Sensors known to the run.
    #[validate(nested)]
    #[validate(custom(function = validation::validate_unique_ids))]
    #[serde(default)]
    pub fleet: Vec<SensorSeed>,
}

impl Default for TelesimConfig {
    fn default() -> Self {
        Self {
            simulator: SimulatorConfig::default(),
            telemetry: TelemetryConfig::default(),
            fleet: fleet::demo_fleet(),
        }
    }
}

impl TelesimConfig {
    /// Load configuration from default files and environment.
    ///
    /// Hierarchy:
    /// 1. Default values (including a three-sensor demo fleet)
    /// 2. `config/telesim.yaml`, if present
    /// 3. `config/<TELESIM_ENV>.yaml`, if present (`TELESIM_ENV` defaults to `development`)
    /// 4. `TELESIM_*` environment variables, `__` separating nested keys
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(TelesimConfig::default()));

        if Path::new("config/telesim.yaml").exists() {
            figment = figment.merge(Yaml::file("config/telesim.yaml"));
        }

        let env = std::env::var("TELESIM_ENV").unwrap_or_else(|_| "development".into());
        let env_file = format!("config/{}.yaml", env);
        if Path::new(&env_file).exists() {
            figment = figment.merge(Yaml::file(env_file));
        }

        Self::extract(figment)
    }

    /// Load configuration from a specific file layered over the defaults.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(PathBuf::from(path)));
        }

        let figment = Figment::from(Serialized::defaults(TelesimConfig::default()))
            .merge(Yaml::file(path));
        Self::extract(figment)
    }

    fn extract(figment: Figment) -> Result<Self, ConfigError> {
        figment
            .merge(Env::prefixed("TELESIM_").split("__"))
            .extract()
            .map_err(ConfigError::from)
            .and_then(|config: Self| {
                config.validate()?;
                Ok(config)
            })
    }

    /// Fleet entries that should start simulating immediately.
    pub fn enabled_sensors(&self) -> impl Iterator<Item = &SensorSeed> {
        self.fleet.iter().filter(|seed| seed.enabled)
    }
}
