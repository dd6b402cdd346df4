//! Scripted operating scenarios.
//!
//! Each scenario is a pair of piecewise-linear profiles (shaft speed and
//! advance velocity over time) with an optional seeded inflow disturbance
//! on top. Scenarios drive the engine through the same per-tick contract as
//! any other caller.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

use propwash_core::enums::ScenarioId;
use propwash_core::state::FrameResult;
use propwash_core::{PropwashError, Result};

use crate::control::SimInputs;
use crate::engine::HydrodynamicsEngine;

/// Tunable scenario parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScenarioSettings {
    /// Steady ahead shaft speed.
    pub cruise_rpm: f64,
    /// Ship speed reached at cruise.
    pub cruise_speed_m_s: f64,
    #[serde(default)]
    pub disturbance: Option<DisturbanceSettings>,
}

impl Default for ScenarioSettings {
    fn default() -> Self {
        Self {
            cruise_rpm: 120.0,
            cruise_speed_m_s: 4.8,
            disturbance: None,
        }
    }
}

impl ScenarioSettings {
    /// Enable the inflow disturbance with the given seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        let base = self.disturbance.unwrap_or_default();
        self.disturbance = Some(DisturbanceSettings { seed, ..base });
        self
    }
}

/// Inflow disturbance parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisturbanceSettings {
    /// Standard deviation of the velocity perturbation (m/s).
    pub intensity_m_s: f64,
    pub correlation_time_s: f64,
    pub seed: u64,
}

impl Default for DisturbanceSettings {
    fn default() -> Self {
        Self {
            intensity_m_s: 0.15,
            correlation_time_s: 2.0,
            seed: 42,
        }
    }
}

/// Linear ramp from `from` to `to` over `[start_s, end_s]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RampSegment {
    pub start_s: f64,
    pub end_s: f64,
    pub from: f64,
    pub to: f64,
}

impl RampSegment {
    pub fn new(start_s: f64, end_s: f64, from: f64, to: f64) -> Self {
        Self {
            start_s,
            end_s,
            from,
            to,
        }
    }

    fn value_at(&self, t: f64) -> f64 {
        if t >= self.end_s || self.end_s <= self.start_s {
            return self.to;
        }
        let frac = ((t - self.start_s) / (self.end_s - self.start_s)).clamp(0.0, 1.0);
        self.from + (self.to - self.from) * frac
    }
}

/// Time-ordered ramps. Before the first ramp the profile holds its `from`
/// value; between and after ramps it holds the last `to`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Profile {
    pub segments: Vec<RampSegment>,
}

impl Profile {
    pub fn constant(value: f64) -> Self {
        Self {
            segments: vec![RampSegment::new(0.0, 0.0, value, value)],
        }
    }

    pub fn value_at(&self, t: f64) -> f64 {
        let Some(first) = self.segments.first() else {
            return 0.0;
        };
        let idx = self.segments.partition_point(|s| s.start_s <= t);
        if idx == 0 {
            return first.from;
        }
        self.segments[idx - 1].value_at(t)
    }
}

/// Gauss-Markov perturbation of the advance velocity.
#[derive(Debug, Clone)]
pub struct InflowDisturbance {
    rng: ChaCha8Rng,
    settings: DisturbanceSettings,
    value: f64,
}

impl InflowDisturbance {
    pub fn new(settings: DisturbanceSettings) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(settings.seed),
            settings,
            value: 0.0,
        }
    }

    /// Advance the process by `dt` and return the perturbation (m/s).
    pub fn sample(&mut self, dt: f64) -> f64 {
        let tau = self.settings.correlation_time_s;
        if !(dt > 0.0 && tau > 0.0) {
            return self.value;
        }
        let decay = (-dt / tau).exp();
        let drive = self.settings.intensity_m_s * (1.0 - decay * decay).sqrt();
        let noise: f64 = self.rng.sample(StandardNormal);
        self.value = self.value * decay + drive * noise;
        self.value
    }
}

/// Shaft speed and advance velocity commanded for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OperatingPoint {
    pub rpm: f64,
    pub velocity_m_s: f64,
}

/// A scripted manoeuvre.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub id: ScenarioId,
    pub rpm: Profile,
    pub velocity: Profile,
    disturbance: Option<InflowDisturbance>,
}

impl Scenario {
    /// Build the profiles for `id`.
    pub fn build(id: ScenarioId, settings: &ScenarioSettings) -> Self {
        let (rpm, velocity) = match id {
            ScenarioId::BollardPull => build_bollard_pull(settings),
            ScenarioId::Acceleration => build_acceleration(settings),
            ScenarioId::CrashStop => build_crash_stop(settings),
        };
        Self {
            id,
            rpm,
            velocity,
            disturbance: settings.disturbance.map(InflowDisturbance::new),
        }
    }

    /// Commanded inputs at `time_s`. Advances the disturbance by `dt`.
    pub fn operating_point(&mut self, time_s: f64, dt: f64) -> OperatingPoint {
        let mut velocity_m_s = self.velocity.value_at(time_s);
        if let Some(disturbance) = self.disturbance.as_mut() {
            velocity_m_s += disturbance.sample(dt);
        }
        OperatingPoint {
            rpm: self.rpm.value_at(time_s),
            velocity_m_s,
        }
    }
}

/// Bollard pull: spin up to cruise RPM against a held ship.
fn build_bollard_pull(s: &ScenarioSettings) -> (Profile, Profile) {
    let rpm = Profile {
        segments: vec![RampSegment::new(0.0, 10.0, 0.0, s.cruise_rpm)],
    };
    (rpm, Profile::constant(0.0))
}

/// Acceleration from rest: shaft spins up in 5 s, the ship lags over a minute.
fn build_acceleration(s: &ScenarioSettings) -> (Profile, Profile) {
    let rpm = Profile {
        segments: vec![RampSegment::new(0.0, 5.0, 0.0, s.cruise_rpm)],
    };
    let velocity = Profile {
        segments: vec![RampSegment::new(0.0, 60.0, 0.0, s.cruise_speed_m_s)],
    };
    (rpm, velocity)
}

/// Crash stop from cruise: shaft stops, reverses to 80 % astern while the
/// ship coasts down.
fn build_crash_stop(s: &ScenarioSettings) -> (Profile, Profile) {
    let rpm = Profile {
        segments: vec![
            RampSegment::new(5.0, 8.0, s.cruise_rpm, 0.0),
            RampSegment::new(8.0, 15.0, 0.0, -0.8 * s.cruise_rpm),
        ],
    };
    let velocity = Profile {
        segments: vec![RampSegment::new(5.0, 60.0, s.cruise_speed_m_s, 0.0)],
    };
    (rpm, velocity)
}

/// Aggregates over a scenario run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScenarioSummary {
    pub steps: u64,
    pub max_thrust_n: f64,
    pub min_thrust_n: f64,
    pub max_torque_nm: f64,
    pub max_shaft_power_w: f64,
    pub min_sigma: f64,
    pub cavitating_steps: u64,
    pub anomaly_steps: u64,
    pub out_of_domain_steps: u64,
    pub final_frame: Option<FrameResult>,
}

impl Default for ScenarioSummary {
    fn default() -> Self {
        Self {
            steps: 0,
            max_thrust_n: f64::NEG_INFINITY,
            min_thrust_n: f64::INFINITY,
            max_torque_nm: f64::NEG_INFINITY,
            max_shaft_power_w: f64::NEG_INFINITY,
            min_sigma: f64::INFINITY,
            cavitating_steps: 0,
            anomaly_steps: 0,
            out_of_domain_steps: 0,
            final_frame: None,
        }
    }
}

impl ScenarioSummary {
    fn record(&mut self, frame: &FrameResult) {
        self.steps += 1;
        self.max_thrust_n = self.max_thrust_n.max(frame.thrust_n);
        self.min_thrust_n = self.min_thrust_n.min(frame.thrust_n);
        self.max_torque_nm = self.max_torque_nm.max(frame.torque_nm);
        self.max_shaft_power_w = self.max_shaft_power_w.max(frame.shaft_power_w);
        self.min_sigma = self.min_sigma.min(frame.sigma);
        self.cavitating_steps += frame.cavitation_risk as u64;
        self.anomaly_steps += frame.flags.numerical_anomaly as u64;
        self.out_of_domain_steps += frame.flags.out_of_domain as u64;
        self.final_frame = Some(*frame);
    }
}

/// Drive `engine` through `steps` ticks of `scenario`.
pub fn run_scenario(
    engine: &mut HydrodynamicsEngine,
    inputs: &mut SimInputs,
    scenario: &mut Scenario,
    steps: u64,
    dt: f64,
) -> ScenarioSummary {
    let mut summary = ScenarioSummary::default();
    for i in 0..steps {
        let point = scenario.operating_point(i as f64 * dt, dt);
        inputs.propeller.set_rpm(point.rpm);
        inputs.environment.flow_velocity_m_s = point.velocity_m_s;
        let frame = engine.tick(&inputs.environment, &inputs.propeller, dt);
        summary.record(&frame);
    }
    log::debug!(
        "Scenario {:?}: {} steps, peak thrust {:.0} N, min sigma {:.3}, {} cavitating",
        scenario.id,
        summary.steps,
        summary.max_thrust_n,
        summary.min_sigma,
        summary.cavitating_steps
    );
    summary
}

/// One tick at each of `points` evenly spaced shaft speeds.
pub fn rpm_sweep(
    engine: &mut HydrodynamicsEngine,
    inputs: &SimInputs,
    rpm_min: f64,
    rpm_max: f64,
    points: usize,
    dt: f64,
) -> Result<Vec<FrameResult>> {
    if !(rpm_min.is_finite() && rpm_max.is_finite()) {
        return Err(PropwashError::invalid("sweep", "RPM bounds must be finite"));
    }
    if points == 0 {
        return Err(PropwashError::invalid("sweep", "points must be > 0"));
    }
    let mut inputs = *inputs;
    let frames = (0..points)
        .map(|i| {
            let rpm = if points == 1 {
                rpm_min
            } else {
                rpm_min + (rpm_max - rpm_min) * i as f64 / (points - 1) as f64
            };
            inputs.propeller.set_rpm(rpm);
            engine.tick(&inputs.environment, &inputs.propeller, dt)
        })
        .collect();
    Ok(frames)
}
