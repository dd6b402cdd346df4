//! The property-model contract and strategy selection.

use std::fmt::Debug;
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use propwash_core::constants::*;
use propwash_core::enums::DensityViscosityStrategy;
use propwash_core::Result;

use crate::constant::ConstantWater;
use crate::grid::{self, GridAxes, PropertyGrid};
use crate::seawater::SeawaterFormula;

/// A property value and whether its inputs lay inside the model's domain.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PropertyEstimate {
    pub value: f64,
    /// False when at least one input was clamped.
    pub in_domain: bool,
}

impl PropertyEstimate {
    pub fn exact(value: f64) -> Self {
        Self {
            value,
            in_domain: true,
        }
    }
}

/// Density, viscosity and vapor pressure evaluated together.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WaterProperties {
    pub density: PropertyEstimate,
    pub viscosity: PropertyEstimate,
    pub vapor_pressure: PropertyEstimate,
}

/// Pure water-property capability. Implementations carry no mutable state
/// and are shared across threads read-only.
pub trait WaterPropertyModel: Debug + Send + Sync {
    /// Short name for diagnostics.
    fn name(&self) -> &'static str;

    /// Density (kg/m³) at temperature (°C), salinity (PSU), absolute pressure (Pa).
    fn density(&self, temperature_c: f64, salinity_psu: f64, pressure_pa: f64) -> PropertyEstimate;

    /// Dynamic viscosity (Pa·s).
    fn viscosity(&self, temperature_c: f64, salinity_psu: f64, pressure_pa: f64)
        -> PropertyEstimate;

    /// Saturation vapor pressure (Pa).
    fn vapor_pressure(&self, temperature_c: f64) -> PropertyEstimate;

    fn properties(&self, temperature_c: f64, salinity_psu: f64, pressure_pa: f64) -> WaterProperties {
        WaterProperties {
            density: self.density(temperature_c, salinity_psu, pressure_pa),
            viscosity: self.viscosity(temperature_c, salinity_psu, pressure_pa),
            vapor_pressure: self.vapor_pressure(temperature_c),
        }
    }
}

/// Clamp `value` into `range`. The flag is false for NaN or clamped input.
pub(crate) fn clamp_to(value: f64, range: (f64, f64)) -> (f64, bool) {
    let (lo, hi) = range;
    let in_domain = value >= lo && value <= hi;
    (value.clamp(lo, hi), in_domain)
}

/// Fixed values used by the `Constant` strategy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConstantProperties {
    pub density_kg_m3: f64,
    pub viscosity_pa_s: f64,
    pub vapor_pressure_pa: f64,
}

impl Default for ConstantProperties {
    fn default() -> Self {
        Self {
            density_kg_m3: SEAWATER_DENSITY,
            viscosity_pa_s: SEAWATER_VISCOSITY,
            vapor_pressure_pa: SEAWATER_VAPOR_PRESSURE,
        }
    }
}

/// Strategy selection and its parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WaterModelConfig {
    pub strategy: DensityViscosityStrategy,
    #[serde(default)]
    pub constant: ConstantProperties,
    /// Precomputed grid file; when absent the grid is tabulated from the formula.
    #[serde(default)]
    pub grid_path: Option<PathBuf>,
    /// Axes used when tabulating a grid at startup.
    #[serde(default)]
    pub grid_axes: Option<GridAxes>,
}

/// Build the configured model.
///
/// A missing grid file is an upstream failure; a malformed constant or grid
/// is a configuration failure.
pub fn build_model(config: &WaterModelConfig) -> Result<Arc<dyn WaterPropertyModel>> {
    let model: Arc<dyn WaterPropertyModel> = match config.strategy {
        DensityViscosityStrategy::Constant => Arc::new(ConstantWater::new(config.constant)?),
        DensityViscosityStrategy::Formula => Arc::new(SeawaterFormula),
        DensityViscosityStrategy::GridLookup => {
            let grid = match &config.grid_path {
                Some(path) => grid::load_grid(path)?,
                None => {
                    let axes = config.grid_axes.unwrap_or_default();
                    PropertyGrid::tabulate(&SeawaterFormula, axes)?
                }
            };
            Arc::new(grid)
        }
    };
    log::info!("Water property model: {}", model.name());
    Ok(model)
}
