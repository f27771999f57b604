//! config.rs — sensor.toml parsing
//!
//! The file is optional on disk; the copy shipped next to Cargo.toml is
//! embedded as the fallback.

use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};

use crate::SensorError;

pub const DEFAULT_CONFIG: &str = include_str!("../sensor.toml");

#[derive(Debug, Clone, Deserialize)]
pub struct SensorConfig {
    pub measurement: MeasurementConfig,
    pub transmission: TransmissionConfig,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct MeasurementConfig {
    pub min: f32,
    pub max: f32,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct TransmissionConfig {
    #[serde(default)]
    pub interval_ms: u64,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            measurement: MeasurementConfig { min: 10.0, max: 50.0 },
            transmission: TransmissionConfig { interval_ms: 0 },
        }
    }
}

impl SensorConfig {
    pub fn parse(text: &str) -> Result<Self, SensorError> {
        let cfg: Self = toml::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read `path`, falling back to the embedded defaults when it is missing.
    pub fn load(path: &Path) -> Result<Self, SensorError> {
        match std::fs::read_to_string(path) {
            Ok(text) => {
                info!("Loaded sensor config from {}", path.display());
                Self::parse(&text)
            }
            Err(e) => {
                warn!("{}: {e}, using built-in defaults", path.display());
                Self::parse(DEFAULT_CONFIG)
            }
        }
    }

    pub fn validate(&self) -> Result<(), SensorError> {
        let MeasurementConfig { min, max } = self.measurement;
        // gen_range needs the width itself to be finite
        if !(min.is_finite() && max.is_finite() && min < max && (max - min).is_finite()) {
            return Err(SensorError::InvalidRange { min, max });
        }
        Ok(())
    }
}
