//! Hydrodynamics engine: turns propeller and water state into loads.
//!
//! `HydrodynamicsEngine` owns the coefficient table, the water property model
//! and a frame logger. It is headless and deterministic: the same inputs
//! always produce bit-identical frames.

use std::f64::consts::PI;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use propwash_coeff::CoefficientTable;
use propwash_core::constants::*;
use propwash_core::state::{FrameFlags, FrameResult};
use propwash_core::types::{EnvironmentParameters, PropellerGeometry, PropellerState, SimTime};
use propwash_core::{PropwashError, Result};
use propwash_water::{WaterProperties, WaterPropertyModel};

use crate::logger::FrameLogger;

/// Numerical settings fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngineSettings {
    pub cavitation_sigma_threshold: f64,
    /// Floor on |n·D| when forming the advance ratio.
    pub advance_epsilon: f64,
    /// Added to the tip dynamic pressure when forming sigma.
    pub sigma_epsilon: f64,
    pub smoothing_time_constant_s: Option<f64>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            cavitation_sigma_threshold: CAVITATION_SIGMA_THRESHOLD,
            advance_epsilon: ADVANCE_EPSILON,
            sigma_epsilon: SIGMA_EPSILON,
            smoothing_time_constant_s: None,
        }
    }
}

impl EngineSettings {
    pub fn validate(&self) -> Result<()> {
        if !self.cavitation_sigma_threshold.is_finite() {
            return Err(PropwashError::invalid(
                "cavitation_sigma_threshold",
                "must be finite",
            ));
        }
        if !(self.advance_epsilon.is_finite() && self.advance_epsilon > 0.0) {
            return Err(PropwashError::invalid(
                "engine.advance_epsilon",
                format!("must be finite and > 0, got {}", self.advance_epsilon),
            ));
        }
        if !(self.sigma_epsilon.is_finite() && self.sigma_epsilon > 0.0) {
            return Err(PropwashError::invalid(
                "engine.sigma_epsilon",
                format!("must be finite and > 0, got {}", self.sigma_epsilon),
            ));
        }
        if let Some(tau) = self.smoothing_time_constant_s {
            if !(tau.is_finite() && tau >= 0.0) {
                return Err(PropwashError::invalid(
                    "engine.smoothing_time_constant_s",
                    format!("must be finite and >= 0, got {tau}"),
                ));
            }
        }
        Ok(())
    }
}

/// Water properties after overrides, as used by one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedWater {
    pub density: f64,
    pub viscosity: f64,
    pub vapor_pressure: f64,
    /// A modelled (not overridden) property had its inputs clamped.
    pub out_of_domain: bool,
}

impl ResolvedWater {
    /// Apply the environment's overrides to modelled properties.
    pub fn resolve(props: &WaterProperties, env: &EnvironmentParameters) -> Self {
        let mut out_of_domain = !props.vapor_pressure.in_domain;
        let density = match env.density_override_kg_m3 {
            Some(rho) => rho,
            None => {
                out_of_domain |= !props.density.in_domain;
                props.density.value
            }
        };
        let viscosity = match env.viscosity_override_pa_s {
            Some(mu) => mu,
            None => {
                out_of_domain |= !props.viscosity.in_domain;
                props.viscosity.value
            }
        };
        Self {
            density,
            viscosity,
            vapor_pressure: props.vapor_pressure.value,
            out_of_domain,
        }
    }
}

/// Advance ratio with the `n·D` floor applied to its magnitude.
///
/// `-0.0` counts as forward rotation.
pub fn advance_ratio(velocity: f64, n: f64, diameter: f64, epsilon: f64) -> f64 {
    let nd = n * diameter;
    let denom = if nd >= 0.0 {
        nd.max(epsilon)
    } else {
        nd.min(-epsilon)
    };
    velocity / denom
}

/// Evaluate one frame from resolved inputs. Step, time and flags are left at
/// their defaults for the caller to fill in.
pub fn evaluate_frame(
    settings: &EngineSettings,
    table: &CoefficientTable,
    geometry: &PropellerGeometry,
    velocity: f64,
    pressure_pa: f64,
    water: &ResolvedWater,
) -> FrameResult {
    let d = geometry.diameter_m;
    let n = geometry.rpm / 60.0;
    let rho = water.density;

    let j = advance_ratio(velocity, n, d, settings.advance_epsilon);
    let c = table.eval(j);

    let n2 = n * n;
    let d4 = d.powi(4);
    let thrust = c.kt * rho * n2 * d4;
    let torque = c.kq * rho * n2 * d4 * d;
    let power = 2.0 * PI * n * torque;

    let vtip = PI * d * n.abs();
    let sigma = (pressure_pa - water.vapor_pressure)
        / (0.5 * rho * vtip * vtip + settings.sigma_epsilon);

    // Diagnostics only. A non-finite value here must not veto the loads.
    let efficiency = if n > 0.0 && j > 0.0 && c.kq > 1e-9 {
        finite_or_zero(j * c.kt / (2.0 * PI * c.kq))
    } else {
        0.0
    };

    let section_speed = (velocity * velocity + (0.7 * PI * n * d).powi(2)).sqrt();
    let reynolds = finite_or_zero(geometry.chord_07r() * section_speed * rho / water.viscosity);

    FrameResult {
        j,
        kt: c.kt,
        kq: c.kq,
        thrust_n: thrust,
        torque_nm: torque,
        shaft_power_w: power,
        vtip_m_s: vtip,
        sigma,
        cavitation_risk: sigma < settings.cavitation_sigma_threshold,
        density_kg_m3: rho,
        viscosity_pa_s: water.viscosity,
        vapor_pressure_pa: water.vapor_pressure,
        efficiency,
        reynolds,
        ..Default::default()
    }
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// First-order lag on shaft speed and advance velocity.
#[derive(Debug, Clone, Copy)]
struct InputFilter {
    tau: f64,
    state: Option<(f64, f64)>,
}

impl InputFilter {
    fn new(tau: f64) -> Self {
        Self { tau, state: None }
    }

    /// Returns the smoothed (rpm, velocity). Non-finite samples pass through
    /// without touching the filter state.
    fn apply(&mut self, rpm: f64, velocity: f64, dt: f64) -> (f64, f64) {
        if !(rpm.is_finite() && velocity.is_finite()) {
            return (rpm, velocity);
        }
        let (x_rpm, x_vel) = match self.state {
            None => (rpm, velocity),
            Some((x_rpm, x_vel)) => {
                let alpha = if dt.is_finite() && dt > 0.0 {
                    dt / (self.tau + dt)
                } else {
                    0.0
                };
                (
                    x_rpm + (rpm - x_rpm) * alpha,
                    x_vel + (velocity - x_vel) * alpha,
                )
            }
        };
        self.state = Some((x_rpm, x_vel));
        (x_rpm, x_vel)
    }
}

type PropertyKey = (u64, u64, u64);

/// The hydrodynamics engine.
pub struct HydrodynamicsEngine {
    settings: EngineSettings,
    table: Arc<CoefficientTable>,
    water: Arc<dyn WaterPropertyModel>,
    logger: Box<dyn FrameLogger>,
    time: SimTime,
    last_valid: Option<FrameResult>,
    property_memo: Option<(PropertyKey, WaterProperties)>,
    filter: Option<InputFilter>,
    out_of_domain: bool,
    anomaly_streak: bool,
    anomaly_count: u64,
    logger_failures: u64,
}

impl HydrodynamicsEngine {
    pub fn new(
        settings: EngineSettings,
        table: Arc<CoefficientTable>,
        water: Arc<dyn WaterPropertyModel>,
        logger: Box<dyn FrameLogger>,
    ) -> Result<Self> {
        settings.validate()?;
        log::info!(
            "Hydrodynamics engine ready: water model {}, {:?} interpolation, sigma threshold {}",
            water.name(),
            table.mode(),
            settings.cavitation_sigma_threshold
        );
        Ok(Self {
            settings,
            table,
            water,
            logger,
            time: SimTime::default(),
            last_valid: None,
            property_memo: None,
            filter: settings.smoothing_time_constant_s.map(InputFilter::new),
            out_of_domain: false,
            anomaly_streak: false,
            anomaly_count: 0,
            logger_failures: 0,
        })
    }

    /// Advance one tick and return the frame. Never fails: out-of-domain
    /// inputs are clamped and non-finite results are replaced.
    pub fn tick(
        &mut self,
        env: &EnvironmentParameters,
        propeller: &PropellerState,
        dt: f64,
    ) -> FrameResult {
        self.time.advance(dt);

        let mut geometry = *propeller.geometry();
        let mut velocity = env.flow_velocity_m_s;
        if let Some(filter) = self.filter.as_mut() {
            let (rpm, v) = filter.apply(geometry.rpm, velocity, dt);
            geometry.rpm = rpm;
            velocity = v;
        }

        let props = self.properties(env);
        let water = ResolvedWater::resolve(&props, env);
        self.note_domain(water.out_of_domain, env);

        let frame = evaluate_frame(
            &self.settings,
            &self.table,
            &geometry,
            velocity,
            env.pressure_pa,
            &water,
        );
        let flags = FrameFlags {
            out_of_domain: water.out_of_domain,
            numerical_anomaly: false,
        };
        let frame = FrameResult { flags, ..frame }.restamped(self.time);
        let frame = self.screen(frame);

        if let Err(e) = self.logger.record(&frame) {
            self.logger_failures += 1;
            if self.logger_failures == 1 {
                log::warn!("Frame logger failed at step {}: {e}", frame.step);
            } else {
                log::debug!("Frame logger failed at step {}: {e}", frame.step);
            }
        }
        frame
    }

    /// Modelled properties, reusing the previous lookup when the ambient
    /// triple is bit-identical.
    fn properties(&mut self, env: &EnvironmentParameters) -> WaterProperties {
        let key = (
            env.temperature_c.to_bits(),
            env.salinity_psu.to_bits(),
            env.pressure_pa.to_bits(),
        );
        if let Some((memo_key, props)) = self.property_memo {
            if memo_key == key {
                return props;
            }
        }
        let props = self
            .water
            .properties(env.temperature_c, env.salinity_psu, env.pressure_pa);
        self.property_memo = Some((key, props));
        props
    }

    fn note_domain(&mut self, out_of_domain: bool, env: &EnvironmentParameters) {
        if out_of_domain && !self.out_of_domain {
            log::warn!(
                "Water properties clamped to model domain (T={} °C, S={} PSU, P={} Pa)",
                env.temperature_c,
                env.salinity_psu,
                env.pressure_pa
            );
        } else if !out_of_domain && self.out_of_domain {
            log::info!("Water properties back inside model domain");
        }
        self.out_of_domain = out_of_domain;
    }

    /// Replace a non-finite frame with the last valid one.
    fn screen(&mut self, frame: FrameResult) -> FrameResult {
        if frame.is_finite() {
            self.anomaly_streak = false;
            self.last_valid = Some(frame);
            return frame;
        }
        self.anomaly_count += 1;
        if !self.anomaly_streak {
            log::warn!(
                "Non-finite frame at step {}; substituting last valid frame",
                frame.step
            );
        }
        self.anomaly_streak = true;
        let base = match self.last_valid {
            Some(valid) => valid.restamped(self.time),
            None => FrameResult::quiescent(self.time),
        };
        FrameResult {
            flags: FrameFlags {
                out_of_domain: frame.flags.out_of_domain,
                numerical_anomaly: true,
            },
            ..base
        }
    }

    /// Flush the frame logger.
    pub fn flush_logger(&mut self) -> Result<()> {
        self.logger.flush()
    }

    pub fn time(&self) -> SimTime {
        self.time
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Most recent finite frame.
    pub fn last_valid(&self) -> Option<&FrameResult> {
        self.last_valid.as_ref()
    }

    /// Frames replaced because they were not finite.
    pub fn anomaly_count(&self) -> u64 {
        self.anomaly_count
    }

    pub fn logger_failures(&self) -> u64 {
        self.logger_failures
    }
}
