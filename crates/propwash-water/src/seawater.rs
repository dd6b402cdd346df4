//! Seawater formula strategy.
//!
//! Density follows the UNESCO 1981 equation of state (EOS-80): the
//! one-atmosphere polynomial plus the secant bulk modulus for pressure.
//! Viscosity uses the Vogel correlation for pure water with a quadratic
//! salinity correction. Vapor pressure uses the Buck (1996) fit over water.

use propwash_core::constants::*;

use crate::model::{clamp_to, PropertyEstimate, WaterPropertyModel};

#[derive(Debug, Clone, Copy, Default)]
pub struct SeawaterFormula;

impl SeawaterFormula {
    /// Density (kg/m³) for in-domain inputs; `p_bar` is sea pressure.
    pub fn density_raw(t: f64, s: f64, p_bar: f64) -> f64 {
        let rho0 = density_one_atmosphere(t, s);
        if p_bar <= 0.0 {
            return rho0;
        }
        let k = secant_bulk_modulus(t, s, p_bar);
        rho0 / (1.0 - p_bar / k)
    }

    /// Dynamic viscosity (Pa·s) for in-domain inputs.
    pub fn viscosity_raw(t: f64, s: f64) -> f64 {
        let kelvin = t + 273.15;
        let pure = 2.414e-5 * 10f64.powf(247.8 / (kelvin - 140.0));
        // Salinity in kg/kg.
        let sk = s / 1000.0;
        let a = 1.541 + 1.998e-2 * t - 9.52e-5 * t * t;
        let b = 7.974 - 7.561e-2 * t + 4.724e-4 * t * t;
        pure * (1.0 + a * sk + b * sk * sk)
    }

    /// Saturation vapor pressure over pure water (Pa).
    pub fn vapor_pressure_raw(t: f64) -> f64 {
        611.21 * ((18.678 - t / 234.5) * (t / (257.14 + t))).exp()
    }
}

/// Pure water (SMOW) plus salinity terms at one standard atmosphere.
fn density_one_atmosphere(t: f64, s: f64) -> f64 {
    let t2 = t * t;
    let t3 = t2 * t;
    let t4 = t3 * t;
    let t5 = t4 * t;

    let rho_w = 999.842594 + 6.793952e-2 * t - 9.095290e-3 * t2 + 1.001685e-4 * t3
        - 1.120083e-6 * t4
        + 6.536332e-9 * t5;

    let a = 8.24493e-1 - 4.0899e-3 * t + 7.6438e-5 * t2 - 8.2467e-7 * t3 + 5.3875e-9 * t4;
    let b = -5.72466e-3 + 1.0227e-4 * t - 1.6546e-6 * t2;
    let c = 4.8314e-4;

    rho_w + a * s + b * s * s.sqrt() + c * s * s
}

/// Secant bulk modulus K(S, t, p) in bar.
fn secant_bulk_modulus(t: f64, s: f64, p: f64) -> f64 {
    let t2 = t * t;
    let t3 = t2 * t;
    let t4 = t3 * t;
    let s15 = s * s.sqrt();

    let kw = 19652.21 + 148.4206 * t - 2.327105 * t2 + 1.360477e-2 * t3 - 5.155288e-5 * t4;
    let aw = 3.239908 + 1.43713e-3 * t + 1.16092e-4 * t2 - 5.77905e-7 * t3;
    let bw = 8.50935e-5 - 6.12293e-6 * t + 5.2787e-8 * t2;

    let k0 = kw
        + (54.6746 - 0.603459 * t + 1.09987e-2 * t2 - 6.1670e-5 * t3) * s
        + (7.944e-2 + 1.6483e-2 * t - 5.3009e-4 * t2) * s15;
    let a = aw + (2.2838e-3 - 1.0981e-5 * t - 1.6078e-6 * t2) * s + 1.91075e-4 * s15;
    let b = bw + (-9.9348e-7 + 2.0816e-8 * t + 9.1697e-10 * t2) * s;

    k0 + a * p + b * p * p
}

/// Sea pressure in bar from absolute pressure; sub-atmospheric maps to 0.
fn sea_pressure_bar(pressure_pa: f64) -> f64 {
    (pressure_pa - ATMOSPHERIC_PRESSURE_PA).max(0.0) / 1.0e5
}

impl WaterPropertyModel for SeawaterFormula {
    fn name(&self) -> &'static str {
        "seawater-formula"
    }

    fn density(&self, temperature_c: f64, salinity_psu: f64, pressure_pa: f64) -> PropertyEstimate {
        let (t, t_ok) = clamp_to(temperature_c, WATER_TEMPERATURE_RANGE_C);
        let (s, s_ok) = clamp_to(salinity_psu, WATER_SALINITY_RANGE_PSU);
        let (p, p_ok) = clamp_to(pressure_pa, WATER_PRESSURE_RANGE_PA);
        PropertyEstimate {
            value: Self::density_raw(t, s, sea_pressure_bar(p)),
            in_domain: t_ok && s_ok && p_ok,
        }
    }

    fn viscosity(
        &self,
        temperature_c: f64,
        salinity_psu: f64,
        pressure_pa: f64,
    ) -> PropertyEstimate {
        let (t, t_ok) = clamp_to(temperature_c, WATER_TEMPERATURE_RANGE_C);
        let (s, s_ok) = clamp_to(salinity_psu, WATER_SALINITY_RANGE_PSU);
        // Pressure has no modelled effect on viscosity inside the domain.
        let (_, p_ok) = clamp_to(pressure_pa, WATER_PRESSURE_RANGE_PA);
        PropertyEstimate {
            value: Self::viscosity_raw(t, s),
            in_domain: t_ok && s_ok && p_ok,
        }
    }

    fn vapor_pressure(&self, temperature_c: f64) -> PropertyEstimate {
        let (t, t_ok) = clamp_to(temperature_c, WATER_TEMPERATURE_RANGE_C);
        PropertyEstimate {
            value: Self::vapor_pressure_raw(t),
            in_domain: t_ok,
        }
    }
}
