//! Frame result: the hydrodynamic response produced each tick.

use serde::{Deserialize, Serialize};

use crate::types::SimTime;

/// Non-fatal conditions raised while producing a frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameFlags {
    /// A property-model input was clamped to the model's validity domain.
    pub out_of_domain: bool,
    /// The computed frame was not finite; the values are a substitute.
    pub numerical_anomaly: bool,
}

impl FrameFlags {
    pub fn any(&self) -> bool {
        self.out_of_domain || self.numerical_anomaly
    }
}

/// Hydrodynamic response for one tick (SI units).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameResult {
    pub step: u64,
    pub time_s: f64,
    /// Advance ratio.
    pub j: f64,
    pub kt: f64,
    pub kq: f64,
    pub thrust_n: f64,
    pub torque_nm: f64,
    pub shaft_power_w: f64,
    /// Blade tip speed magnitude.
    pub vtip_m_s: f64,
    /// Cavitation number based on tip speed.
    pub sigma: f64,
    pub cavitation_risk: bool,
    pub density_kg_m3: f64,
    pub viscosity_pa_s: f64,
    pub vapor_pressure_pa: f64,
    /// Open-water efficiency J·KT/(2π·KQ).
    pub efficiency: f64,
    /// Blade-section Reynolds number at 0.7R.
    pub reynolds: f64,
    pub flags: FrameFlags,
}

impl FrameResult {
    /// Zero-load frame used when no valid frame exists to substitute.
    pub fn quiescent(time: SimTime) -> Self {
        Self {
            step: time.step,
            time_s: time.elapsed_secs,
            ..Default::default()
        }
    }

    /// True when every numeric field is finite.
    pub fn is_finite(&self) -> bool {
        [
            self.j,
            self.kt,
            self.kq,
            self.thrust_n,
            self.torque_nm,
            self.shaft_power_w,
            self.vtip_m_s,
            self.sigma,
            self.density_kg_m3,
            self.viscosity_pa_s,
            self.vapor_pressure_pa,
            self.efficiency,
            self.reynolds,
        ]
        .iter()
        .all(|v| v.is_finite())
    }

    /// Bitwise comparison of the physical fields, ignoring step and time.
    pub fn same_physics(&self, other: &FrameResult) -> bool {
        let a = [
            self.j,
            self.kt,
            self.kq,
            self.thrust_n,
            self.torque_nm,
            self.shaft_power_w,
            self.vtip_m_s,
            self.sigma,
            self.density_kg_m3,
            self.viscosity_pa_s,
            self.vapor_pressure_pa,
            self.efficiency,
            self.reynolds,
        ];
        let b = [
            other.j,
            other.kt,
            other.kq,
            other.thrust_n,
            other.torque_nm,
            other.shaft_power_w,
            other.vtip_m_s,
            other.sigma,
            other.density_kg_m3,
            other.viscosity_pa_s,
            other.vapor_pressure_pa,
            other.efficiency,
            other.reynolds,
        ];
        a.iter().zip(b.iter()).all(|(x, y)| x.to_bits() == y.to_bits())
            && self.cavitation_risk == other.cavitation_risk
            && self.flags == other.flags
    }

    /// Re-stamp a frame with a new step and time.
    pub fn restamped(mut self, time: SimTime) -> Self {
        self.step = time.step;
        self.time_s = time.elapsed_secs;
        self
    }
}
