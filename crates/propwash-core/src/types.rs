//! Simulation inputs: ambient water, propeller geometry, and time.

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::{PropwashError, Result};

/// Simulation time tracking.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SimTime {
    /// Current step number (increments by 1 each tick).
    pub step: u64,
    /// Elapsed simulation time in seconds.
    pub elapsed_secs: f64,
}

impl SimTime {
    /// Advance by one tick of `dt` seconds. Non-finite or negative `dt`
    /// still counts the step but leaves the clock where it is.
    pub fn advance(&mut self, dt: f64) {
        self.step += 1;
        if dt.is_finite() && dt > 0.0 {
            self.elapsed_secs += dt;
        }
    }
}

/// Ambient water state and advance velocity (SI units).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentParameters {
    /// Absolute static pressure at the shaft line (Pa).
    pub pressure_pa: f64,
    pub temperature_c: f64,
    pub salinity_psu: f64,
    /// Replaces the modelled density when set (kg/m³).
    #[serde(default)]
    pub density_override_kg_m3: Option<f64>,
    /// Replaces the modelled dynamic viscosity when set (Pa·s).
    #[serde(default)]
    pub viscosity_override_pa_s: Option<f64>,
    /// Advance velocity; negative for reverse flow (m/s).
    pub flow_velocity_m_s: f64,
}

impl Default for EnvironmentParameters {
    fn default() -> Self {
        Self {
            pressure_pa: ATMOSPHERIC_PRESSURE_PA,
            temperature_c: 15.0,
            salinity_psu: 35.0,
            density_override_kg_m3: None,
            viscosity_override_pa_s: None,
            flow_velocity_m_s: 0.0,
        }
    }
}

impl EnvironmentParameters {
    /// Reject values that cannot be recovered at run time.
    ///
    /// Temperature and salinity outside the model domain are accepted here;
    /// the property model clamps them per tick.
    pub fn validate(&self) -> Result<()> {
        if !(self.pressure_pa.is_finite() && self.pressure_pa > 0.0) {
            return Err(PropwashError::invalid(
                "environment.pressure_pa",
                format!("must be finite and > 0, got {}", self.pressure_pa),
            ));
        }
        if !self.temperature_c.is_finite() {
            return Err(PropwashError::invalid(
                "environment.temperature_c",
                "must be finite",
            ));
        }
        let (s_min, s_max) = SALINITY_INPUT_RANGE_PSU;
        if !(self.salinity_psu >= s_min && self.salinity_psu <= s_max) {
            return Err(PropwashError::invalid(
                "environment.salinity_psu",
                format!("must lie in [{s_min}, {s_max}], got {}", self.salinity_psu),
            ));
        }
        if !self.flow_velocity_m_s.is_finite() {
            return Err(PropwashError::invalid(
                "environment.flow_velocity_m_s",
                "must be finite",
            ));
        }
        if let Some(rho) = self.density_override_kg_m3 {
            let (lo, hi) = DENSITY_OVERRIDE_RANGE_KG_M3;
            if !(rho >= lo && rho <= hi) {
                return Err(PropwashError::invalid(
                    "environment.density_override_kg_m3",
                    format!("must lie in [{lo}, {hi}], got {rho}"),
                ));
            }
        }
        if let Some(mu) = self.viscosity_override_pa_s {
            let (lo, hi) = VISCOSITY_OVERRIDE_RANGE_PA_S;
            if !(mu >= lo && mu <= hi) {
                return Err(PropwashError::invalid(
                    "environment.viscosity_override_pa_s",
                    format!("must lie in [{lo}, {hi}], got {mu}"),
                ));
            }
        }
        Ok(())
    }
}

/// Propeller geometry and shaft speed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PropellerGeometry {
    pub diameter_m: f64,
    pub pitch_m: f64,
    pub blade_count: u32,
    /// Expanded blade area ratio AE/A0.
    pub area_ratio: f64,
    /// Shaft speed; negative denotes reverse rotation.
    pub rpm: f64,
}

impl Default for PropellerGeometry {
    fn default() -> Self {
        Self {
            diameter_m: 4.0,
            pitch_m: 4.0,
            blade_count: 4,
            area_ratio: 0.70,
            rpm: 0.0,
        }
    }
}

impl PropellerGeometry {
    /// Check every geometric field, naming the first one that fails.
    pub fn validate(&self) -> Result<()> {
        if !(self.diameter_m.is_finite() && self.diameter_m > 0.0) {
            return Err(PropwashError::invalid(
                "geometry.diameter_m",
                format!("must be finite and > 0, got {}", self.diameter_m),
            ));
        }
        if !(self.pitch_m.is_finite() && self.pitch_m > 0.0) {
            return Err(PropwashError::invalid(
                "geometry.pitch_m",
                format!("must be finite and > 0, got {}", self.pitch_m),
            ));
        }
        if self.blade_count < MIN_BLADE_COUNT {
            return Err(PropwashError::invalid(
                "geometry.blade_count",
                format!("must be >= {MIN_BLADE_COUNT}, got {}", self.blade_count),
            ));
        }
        if !(self.area_ratio > 0.0 && self.area_ratio <= MAX_AREA_RATIO) {
            return Err(PropwashError::invalid(
                "geometry.area_ratio",
                format!("must lie in (0, {MAX_AREA_RATIO}], got {}", self.area_ratio),
            ));
        }
        if !self.rpm.is_finite() {
            return Err(PropwashError::invalid("geometry.rpm", "must be finite"));
        }
        Ok(())
    }

    /// Blade chord at 0.7R estimated from area ratio and blade count (m).
    pub fn chord_07r(&self) -> f64 {
        CHORD_COEFFICIENT_07R * self.area_ratio * self.diameter_m / self.blade_count as f64
    }
}

/// A propeller whose geometry has passed validation.
///
/// Shaft speed can be changed freely between ticks; replacing the geometry
/// goes through validation again so the engine never sees a malformed blade.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PropellerState {
    geometry: PropellerGeometry,
}

impl PropellerState {
    pub fn new(geometry: PropellerGeometry) -> Result<Self> {
        geometry.validate()?;
        Ok(Self { geometry })
    }

    pub fn geometry(&self) -> &PropellerGeometry {
        &self.geometry
    }

    pub fn rpm(&self) -> f64 {
        self.geometry.rpm
    }

    /// Set shaft speed. Non-finite values are passed through and handled
    /// by the engine's anomaly substitution.
    pub fn set_rpm(&mut self, rpm: f64) {
        self.geometry.rpm = rpm;
    }

    /// Replace the geometry, keeping the old one if the new one is invalid.
    pub fn set_geometry(&mut self, geometry: PropellerGeometry) -> Result<()> {
        geometry.validate()?;
        self.geometry = geometry;
        Ok(())
    }

    /// Rotations per second (sign preserved).
    pub fn revs_per_sec(&self) -> f64 {
        self.geometry.rpm / 60.0
    }
}
