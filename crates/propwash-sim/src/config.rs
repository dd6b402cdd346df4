//! Startup configuration.
//!
//! Everything the engine needs is read once from a JSON document and
//! validated before the first tick. Errors name the failing field.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use propwash_coeff::CoefficientTable;
use propwash_core::constants::*;
use propwash_core::enums::InterpolationMode;
use propwash_core::types::{EnvironmentParameters, PropellerGeometry, PropellerState};
use propwash_core::{PropwashError, Result};
use propwash_water::{build_model, WaterModelConfig, WaterPropertyModel};

use crate::control::SimInputs;
use crate::engine::{EngineSettings, HydrodynamicsEngine};
use crate::logger::FrameLogger;
use crate::scenario::ScenarioSettings;

/// Numerical guards and optional input smoothing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NumericsConfig {
    pub advance_epsilon: f64,
    pub sigma_epsilon: f64,
    /// First-order lag on RPM and advance velocity (s). Off when absent.
    #[serde(default)]
    pub smoothing_time_constant_s: Option<f64>,
}

impl Default for NumericsConfig {
    fn default() -> Self {
        Self {
            advance_epsilon: ADVANCE_EPSILON,
            sigma_epsilon: SIGMA_EPSILON,
            smoothing_time_constant_s: None,
        }
    }
}

/// KT/KQ curves stored in their own file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurveFile {
    pub kt: Vec<[f64; 2]>,
    pub kq: Vec<[f64; 2]>,
}

/// Complete startup configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    pub environment: EnvironmentParameters,
    pub geometry: PropellerGeometry,
    /// Inline KT samples as `[J, KT]` pairs.
    #[serde(default)]
    pub kt_curve: Vec<[f64; 2]>,
    /// Inline KQ samples as `[J, KQ]` pairs.
    #[serde(default)]
    pub kq_curve: Vec<[f64; 2]>,
    /// Curve file used when the inline curves are empty.
    #[serde(default)]
    pub curve_path: Option<PathBuf>,
    pub cavitation_sigma_threshold: f64,
    #[serde(default)]
    pub water_model: WaterModelConfig,
    #[serde(default)]
    pub interpolation: InterpolationMode,
    #[serde(default)]
    pub engine: NumericsConfig,
    #[serde(default = "default_tick_rate")]
    pub tick_rate_hz: u32,
    #[serde(default)]
    pub scenario: ScenarioSettings,
}

fn default_tick_rate() -> u32 {
    TICK_RATE
}

impl Default for SimConfig {
    /// A 4 m, four-bladed fixed-pitch propeller in surface seawater.
    fn default() -> Self {
        Self {
            environment: EnvironmentParameters::default(),
            geometry: PropellerGeometry::default(),
            kt_curve: REFERENCE_KT.to_vec(),
            kq_curve: REFERENCE_KQ.to_vec(),
            curve_path: None,
            cavitation_sigma_threshold: CAVITATION_SIGMA_THRESHOLD,
            water_model: WaterModelConfig::default(),
            interpolation: InterpolationMode::Linear,
            engine: NumericsConfig::default(),
            tick_rate_hz: TICK_RATE,
            scenario: ScenarioSettings::default(),
        }
    }
}

/// Open-water KT for a four-bladed propeller, AE/A0 0.70, P/D 1.0.
pub const REFERENCE_KT: [[f64; 2]; 12] = [
    [0.0, 0.445],
    [0.1, 0.417],
    [0.2, 0.385],
    [0.3, 0.349],
    [0.4, 0.310],
    [0.5, 0.268],
    [0.6, 0.223],
    [0.7, 0.175],
    [0.8, 0.124],
    [0.9, 0.070],
    [1.0, 0.013],
    [1.1, -0.046],
];

/// Open-water KQ matching [`REFERENCE_KT`].
pub const REFERENCE_KQ: [[f64; 2]; 12] = [
    [0.0, 0.0600],
    [0.1, 0.0570],
    [0.2, 0.0535],
    [0.3, 0.0495],
    [0.4, 0.0450],
    [0.5, 0.0400],
    [0.6, 0.0346],
    [0.7, 0.0288],
    [0.8, 0.0225],
    [0.9, 0.0158],
    [1.0, 0.0087],
    [1.1, 0.0012],
];

impl SimConfig {
    /// Read and validate a JSON configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            PropwashError::unavailable(format!("config file {}", path.display()), e.to_string())
        })?;
        let config = Self::from_json_str(&text)?;
        log::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Parse and validate a JSON configuration document.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(text).map_err(|e| PropwashError::invalid("config", e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| PropwashError::Export(e.to_string()))
    }

    /// Check every field that can be checked without loading external data.
    pub fn validate(&self) -> Result<()> {
        self.environment.validate()?;
        self.geometry.validate()?;
        if self.tick_rate_hz == 0 {
            return Err(PropwashError::invalid("tick_rate_hz", "must be > 0"));
        }
        if self.kt_curve.is_empty() != self.kq_curve.is_empty() {
            return Err(PropwashError::invalid(
                "kt_curve/kq_curve",
                "both curves must be given inline, or neither",
            ));
        }
        self.settings().validate()
    }

    pub fn settings(&self) -> EngineSettings {
        EngineSettings {
            cavitation_sigma_threshold: self.cavitation_sigma_threshold,
            advance_epsilon: self.engine.advance_epsilon,
            sigma_epsilon: self.engine.sigma_epsilon,
            smoothing_time_constant_s: self.engine.smoothing_time_constant_s,
        }
    }

    /// Seconds per tick at the configured rate.
    pub fn dt(&self) -> f64 {
        1.0 / self.tick_rate_hz as f64
    }

    /// Load the coefficient table from inline curves or the curve file.
    pub fn coefficient_table(&self) -> Result<CoefficientTable> {
        if !self.kt_curve.is_empty() {
            return CoefficientTable::load(&self.kt_curve, &self.kq_curve, self.interpolation);
        }
        let path = self.curve_path.as_ref().ok_or_else(|| {
            PropwashError::unavailable("coefficient table", "no inline curves and no curve_path")
        })?;
        let text = std::fs::read_to_string(path).map_err(|e| {
            PropwashError::unavailable(format!("curve file {}", path.display()), e.to_string())
        })?;
        let curves: CurveFile = serde_json::from_str(&text)
            .map_err(|e| PropwashError::invalid("curve_path", e.to_string()))?;
        CoefficientTable::load(&curves.kt, &curves.kq, self.interpolation)
    }

    pub fn water_model(&self) -> Result<Arc<dyn WaterPropertyModel>> {
        build_model(&self.water_model)
    }

    /// Initial inputs for the tick loop.
    pub fn initial_inputs(&self) -> Result<SimInputs> {
        self.environment.validate()?;
        let propeller = PropellerState::new(self.geometry)?;
        Ok(SimInputs::new(self.environment, propeller))
    }

    /// Build an engine with its collaborators injected.
    pub fn build_engine(&self, logger: Box<dyn FrameLogger>) -> Result<HydrodynamicsEngine> {
        self.build_engine_with(|| Ok(logger))
    }

    /// Like [`SimConfig::build_engine`], but the logger is only created once
    /// the table and water model have loaded. Output files are not touched
    /// by a configuration that fails.
    pub fn build_engine_with<F>(&self, make_logger: F) -> Result<HydrodynamicsEngine>
    where
        F: FnOnce() -> Result<Box<dyn FrameLogger>>,
    {
        self.validate()?;
        let settings = self.settings();
        let table = Arc::new(self.coefficient_table()?);
        let water = self.water_model()?;
        HydrodynamicsEngine::new(settings, table, water, make_logger()?)
    }
}
