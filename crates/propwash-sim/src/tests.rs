//! Tests for the hydrodynamics engine, scenarios and export.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use propwash_coeff::CoefficientTable;
use propwash_core::constants::*;
use propwash_core::enums::{DensityViscosityStrategy, InterpolationMode, ScenarioId};
use propwash_core::state::FrameResult;
use propwash_core::types::{EnvironmentParameters, PropellerGeometry, PropellerState};
use propwash_core::{PropwashError, Result};
use propwash_water::model::ConstantProperties;
use propwash_water::{
    ConstantWater, GridAxes, PropertyEstimate, SeawaterFormula, WaterPropertyModel,
};

use crate::config::SimConfig;
use crate::engine::{EngineSettings, HydrodynamicsEngine};
use crate::logger::{CsvLogger, FrameLogger, MemoryLogger, NullLogger};
use crate::scenario::{rpm_sweep, run_scenario, Scenario, ScenarioSettings};

/// Flat KT = 0.3, KQ = 0.05 over the whole J range.
fn flat_table() -> Arc<CoefficientTable> {
    Arc::new(
        CoefficientTable::load(
            &[[0.0, 0.3], [1.0, 0.3]],
            &[[0.0, 0.05], [1.0, 0.05]],
            InterpolationMode::Linear,
        )
        .unwrap(),
    )
}

fn constant_water(density: f64, vapor_pressure: f64) -> Arc<dyn WaterPropertyModel> {
    Arc::new(
        ConstantWater::new(ConstantProperties {
            density_kg_m3: density,
            viscosity_pa_s: SEAWATER_VISCOSITY,
            vapor_pressure_pa: vapor_pressure,
        })
        .unwrap(),
    )
}

fn flat_engine(settings: EngineSettings) -> HydrodynamicsEngine {
    HydrodynamicsEngine::new(
        settings,
        flat_table(),
        constant_water(1025.0, 2339.0),
        Box::new(NullLogger),
    )
    .unwrap()
}

fn propeller(diameter_m: f64, rpm: f64) -> PropellerState {
    PropellerState::new(PropellerGeometry {
        diameter_m,
        pitch_m: diameter_m,
        rpm,
        ..Default::default()
    })
    .unwrap()
}

fn still_water() -> EnvironmentParameters {
    EnvironmentParameters::default()
}

fn rel_close(a: f64, b: f64, tol: f64) -> bool {
    ((a - b) / b).abs() < tol
}

// ---- Core physics ----

#[test]
fn test_zero_rpm_is_quiet_and_finite() {
    let config = SimConfig::default();
    let mut engine = config.build_engine(Box::new(NullLogger)).unwrap();
    let inputs = config.initial_inputs().unwrap();
    assert_eq!(inputs.propeller.rpm(), 0.0);

    let frame = engine.tick(&inputs.environment, &inputs.propeller, DT);
    assert_eq!(frame.thrust_n, 0.0);
    assert_eq!(frame.torque_nm, 0.0);
    assert_eq!(frame.shaft_power_w, 0.0);
    assert!(frame.sigma.is_finite());
    assert!(frame.j.is_finite());
    assert_eq!(frame.efficiency, 0.0);
    assert!(!frame.flags.any());
}

#[test]
fn test_reference_thrust() {
    // D = 4 m, n = 2 rev/s, rho = 1025, KT = 0.3
    let mut engine = flat_engine(EngineSettings::default());
    let frame = engine.tick(&still_water(), &propeller(4.0, 120.0), DT);
    let expected = 0.3 * 1025.0 * 4.0 * 256.0;
    assert!(
        rel_close(frame.thrust_n, expected, 1e-12),
        "thrust {} != {expected}",
        frame.thrust_n
    );
    assert!(rel_close(frame.thrust_n, 314_880.0, 1e-12));
    assert_eq!(frame.j, 0.0);
}

#[test]
fn test_thrust_scales_with_d4() {
    let mut engine = flat_engine(EngineSettings::default());
    let small = engine.tick(&still_water(), &propeller(2.0, 120.0), DT);
    let large = engine.tick(&still_water(), &propeller(4.0, 120.0), DT);
    assert!(rel_close(large.thrust_n / small.thrust_n, 16.0, 1e-12));
    assert!(rel_close(large.torque_nm / small.torque_nm, 32.0, 1e-12));
}

#[test]
fn test_power_scales_with_d5_n3() {
    let mut engine = flat_engine(EngineSettings::default());
    let base = engine.tick(&still_water(), &propeller(2.0, 60.0), DT);
    let scaled = engine.tick(&still_water(), &propeller(4.0, 120.0), DT);
    // (2)^5 · (2)^3
    assert!(rel_close(scaled.shaft_power_w / base.shaft_power_w, 256.0, 1e-12));
    let expected = 2.0 * std::f64::consts::PI * 1.0 * base.torque_nm;
    assert!(rel_close(base.shaft_power_w, expected, 1e-12));
}

#[test]
fn test_sigma_reference_and_threshold() {
    // Vtip = π·D·n = 10 m/s with D = 2 m.
    let rpm = 60.0 * 10.0 / (std::f64::consts::PI * 2.0);
    let env = still_water();

    let mut lenient = flat_engine(EngineSettings {
        cavitation_sigma_threshold: 1.5,
        ..Default::default()
    });
    let frame = lenient.tick(&env, &propeller(2.0, rpm), DT);
    assert!((frame.vtip_m_s - 10.0).abs() < 1e-9);
    assert!(
        (frame.sigma - 1.9314).abs() < 1e-3,
        "sigma = {}",
        frame.sigma
    );
    assert!(!frame.cavitation_risk);

    let mut strict = flat_engine(EngineSettings {
        cavitation_sigma_threshold: 2.0,
        ..Default::default()
    });
    let frame = strict.tick(&env, &propeller(2.0, rpm), DT);
    assert!(frame.cavitation_risk);
}

#[test]
fn test_reverse_rotation_keeps_sign() {
    let mut engine = flat_engine(EngineSettings::default());
    let env = EnvironmentParameters {
        flow_velocity_m_s: 2.0,
        ..Default::default()
    };
    let frame = engine.tick(&env, &propeller(4.0, -60.0), DT);
    assert_eq!(frame.j, -0.5);
    assert!(frame.thrust_n > 0.0);
    assert!(frame.shaft_power_w < 0.0);
    assert_eq!(frame.efficiency, 0.0);
    assert!((frame.vtip_m_s - 4.0 * std::f64::consts::PI).abs() < 1e-12);
}

#[test]
fn test_efficiency_and_reynolds() {
    let config = SimConfig::default();
    let mut engine = config.build_engine(Box::new(NullLogger)).unwrap();
    let env = EnvironmentParameters {
        flow_velocity_m_s: 4.0,
        ..Default::default()
    };
    // n = 2 rev/s, D = 4 m, J = 0.5
    let frame = engine.tick(&env, &propeller(4.0, 120.0), DT);
    assert!((frame.j - 0.5).abs() < 1e-12);
    let eta = 0.5 * 0.268 / (2.0 * std::f64::consts::PI * 0.0400);
    assert!(rel_close(frame.efficiency, eta, 1e-9), "eta = {}", frame.efficiency);
    assert!(frame.reynolds > 1e7 && frame.reynolds < 1e8, "Rn = {}", frame.reynolds);
}

#[test]
fn test_consecutive_ticks_bit_identical() {
    let config = SimConfig {
        interpolation: InterpolationMode::Spline,
        ..Default::default()
    };
    let mut engine = config.build_engine(Box::new(NullLogger)).unwrap();
    let env = EnvironmentParameters {
        flow_velocity_m_s: 3.3,
        temperature_c: 12.5,
        ..Default::default()
    };
    let prop = propeller(4.0, 97.0);
    let a = engine.tick(&env, &prop, DT);
    let b = engine.tick(&env, &prop, DT);
    assert!(a.same_physics(&b));
    assert_eq!(b.step, a.step + 1);
}

// ---- Water properties ----

#[test]
fn test_cold_water_clamped_and_flagged() {
    let config = SimConfig::default();
    let mut engine = config.build_engine(Box::new(NullLogger)).unwrap();
    let env = EnvironmentParameters {
        temperature_c: -50.0,
        ..Default::default()
    };
    let frame = engine.tick(&env, &propeller(4.0, 100.0), DT);
    assert!(frame.flags.out_of_domain);
    assert!(!frame.flags.numerical_anomaly);
    assert!(frame.density_kg_m3.is_finite());
    assert!(frame.is_finite());

    let back = engine.tick(&still_water(), &propeller(4.0, 100.0), DT);
    assert!(!back.flags.out_of_domain);
}

#[test]
fn test_overrides_replace_model() {
    let config = SimConfig::default();
    let mut engine = config.build_engine(Box::new(NullLogger)).unwrap();
    let prop = propeller(4.0, 120.0);
    let modelled = engine.tick(&still_water(), &prop, DT);

    let env = EnvironmentParameters {
        density_override_kg_m3: Some(1000.0),
        viscosity_override_pa_s: Some(1.0e-3),
        ..Default::default()
    };
    let overridden = engine.tick(&env, &prop, DT);
    assert_eq!(overridden.density_kg_m3, 1000.0);
    assert_eq!(overridden.viscosity_pa_s, 1.0e-3);
    assert!(rel_close(
        overridden.thrust_n / modelled.thrust_n,
        1000.0 / modelled.density_kg_m3,
        1e-12
    ));
}

#[test]
fn test_override_hides_domain_flag_for_overridden_property_only() {
    let config = SimConfig::default();
    let mut engine = config.build_engine(Box::new(NullLogger)).unwrap();
    let env = EnvironmentParameters {
        temperature_c: 60.0,
        density_override_kg_m3: Some(1000.0),
        viscosity_override_pa_s: Some(1.0e-3),
        ..Default::default()
    };
    // Vapor pressure is still modelled and still clamped.
    let frame = engine.tick(&env, &propeller(4.0, 100.0), DT);
    assert!(frame.flags.out_of_domain);
}

#[derive(Debug)]
struct CountingWater {
    calls: Arc<AtomicUsize>,
}

impl WaterPropertyModel for CountingWater {
    fn name(&self) -> &'static str {
        "counting"
    }

    fn density(&self, t: f64, s: f64, p: f64) -> PropertyEstimate {
        self.calls.fetch_add(1, Ordering::SeqCst);
        SeawaterFormula.density(t, s, p)
    }

    fn viscosity(&self, t: f64, s: f64, p: f64) -> PropertyEstimate {
        SeawaterFormula.viscosity(t, s, p)
    }

    fn vapor_pressure(&self, t: f64) -> PropertyEstimate {
        SeawaterFormula.vapor_pressure(t)
    }
}

#[test]
fn test_properties_memoized_on_ambient_triple() {
    let calls = Arc::new(AtomicUsize::new(0));
    let water = Arc::new(CountingWater {
        calls: Arc::clone(&calls),
    });
    let mut engine = HydrodynamicsEngine::new(
        EngineSettings::default(),
        flat_table(),
        water,
        Box::new(NullLogger),
    )
    .unwrap();
    let prop = propeller(4.0, 100.0);
    let mut env = still_water();
    for _ in 0..5 {
        engine.tick(&env, &prop, DT);
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    env.flow_velocity_m_s = 2.0;
    engine.tick(&env, &prop, DT);
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    env.temperature_c = 10.0;
    engine.tick(&env, &prop, DT);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_grid_lookup_engine_matches_formula() {
    let mut grid_config = SimConfig::default();
    grid_config.water_model.strategy = DensityViscosityStrategy::GridLookup;
    grid_config.water_model.grid_axes = Some(GridAxes::coarse());
    let mut grid = grid_config.build_engine(Box::new(NullLogger)).unwrap();
    let mut formula = SimConfig::default()
        .build_engine(Box::new(NullLogger))
        .unwrap();

    let env = EnvironmentParameters {
        temperature_c: 17.3,
        salinity_psu: 33.1,
        ..Default::default()
    };
    let prop = propeller(4.0, 110.0);
    let g = grid.tick(&env, &prop, DT);
    let f = formula.tick(&env, &prop, DT);
    assert!((g.density_kg_m3 - f.density_kg_m3).abs() < 0.5);
    assert!(rel_close(g.viscosity_pa_s, f.viscosity_pa_s, 0.02));
    assert!(rel_close(g.thrust_n, f.thrust_n, 1e-3));
}

// ---- Anomalies ----

#[test]
fn test_reynolds_overflow_keeps_loads() {
    // Built directly, so the override bounds in validate() are bypassed.
    let env = EnvironmentParameters {
        viscosity_override_pa_s: Some(1e-320),
        ..Default::default()
    };
    let mut engine = flat_engine(EngineSettings::default());
    let frame = engine.tick(&env, &propeller(4.0, 120.0), DT);
    assert!(!frame.flags.numerical_anomaly);
    assert!(rel_close(frame.thrust_n, 314_880.0, 1e-12));
    assert_eq!(frame.reynolds, 0.0);
    assert!(frame.sigma.is_finite());
    assert_eq!(engine.anomaly_count(), 0);
}

#[test]
fn test_nan_rpm_substitutes_last_valid() {
    let mut engine = flat_engine(EngineSettings::default());
    let env = still_water();
    let mut prop = propeller(4.0, 120.0);
    let good = engine.tick(&env, &prop, DT);
    assert!(!good.flags.numerical_anomaly);

    prop.set_rpm(f64::NAN);
    let bad = engine.tick(&env, &prop, DT);
    assert!(bad.flags.numerical_anomaly);
    assert!(bad.is_finite());
    assert_eq!(bad.thrust_n, good.thrust_n);
    assert_eq!(bad.step, good.step + 1);
    assert_eq!(engine.anomaly_count(), 1);

    prop.set_rpm(120.0);
    let recovered = engine.tick(&env, &prop, DT);
    assert!(!recovered.flags.numerical_anomaly);
    assert!(recovered.same_physics(&good));
}

#[test]
fn test_nan_before_any_valid_frame_is_quiescent() {
    let mut engine = flat_engine(EngineSettings::default());
    let mut prop = propeller(4.0, 120.0);
    prop.set_rpm(f64::INFINITY);
    let frame = engine.tick(&still_water(), &prop, DT);
    assert!(frame.flags.numerical_anomaly);
    assert_eq!(frame.thrust_n, 0.0);
    assert_eq!(frame.step, 1);
    assert!(engine.last_valid().is_none());
}

#[test]
fn test_nan_temperature_flagged() {
    let mut engine = SimConfig::default()
        .build_engine(Box::new(NullLogger))
        .unwrap();
    let prop = propeller(4.0, 120.0);
    engine.tick(&still_water(), &prop, DT);
    let env = EnvironmentParameters {
        temperature_c: f64::NAN,
        ..Default::default()
    };
    let frame = engine.tick(&env, &prop, DT);
    assert!(frame.flags.numerical_anomaly);
    assert!(frame.flags.out_of_domain);
    assert!(frame.is_finite());
}

// ---- Smoothing ----

#[test]
fn test_smoothing_lags_step_input() {
    let mut smooth = flat_engine(EngineSettings {
        smoothing_time_constant_s: Some(1.0),
        ..Default::default()
    });
    let mut raw = flat_engine(EngineSettings::default());
    let env = still_water();

    smooth.tick(&env, &propeller(4.0, 0.0), DT);
    let lagged = smooth.tick(&env, &propeller(4.0, 120.0), DT);
    let direct = raw.tick(&env, &propeller(4.0, 120.0), DT);
    assert!(lagged.thrust_n > 0.0);
    assert!(lagged.thrust_n < 0.01 * direct.thrust_n);

    let mut last = lagged;
    for _ in 0..600 {
        last = smooth.tick(&env, &propeller(4.0, 120.0), DT);
    }
    assert!(rel_close(last.thrust_n, direct.thrust_n, 1e-3));
}

// ---- Logging ----

#[test]
fn test_memory_logger_receives_every_frame() {
    let memory = MemoryLogger::new();
    let mut engine = HydrodynamicsEngine::new(
        EngineSettings::default(),
        flat_table(),
        constant_water(1025.0, 2339.0),
        Box::new(memory.clone()),
    )
    .unwrap();
    let returned: Vec<FrameResult> = (0..10)
        .map(|_| engine.tick(&still_water(), &propeller(4.0, 90.0), DT))
        .collect();
    assert_eq!(memory.frames(), returned);
}

struct FailingLogger;

impl FrameLogger for FailingLogger {
    fn record(&mut self, _frame: &FrameResult) -> Result<()> {
        Err(PropwashError::Export("disk full".into()))
    }
}

#[test]
fn test_logger_failure_does_not_stop_ticks() {
    let mut engine = HydrodynamicsEngine::new(
        EngineSettings::default(),
        flat_table(),
        constant_water(1025.0, 2339.0),
        Box::new(FailingLogger),
    )
    .unwrap();
    for step in 1..=3 {
        let frame = engine.tick(&still_water(), &propeller(4.0, 90.0), DT);
        assert_eq!(frame.step, step);
    }
    assert_eq!(engine.logger_failures(), 3);
}

#[test]
fn test_csv_export_through_engine() {
    let path = std::env::temp_dir().join(format!("propwash_frames_{}.csv", std::process::id()));
    let logger = CsvLogger::create(&path).unwrap();
    let mut engine = flat_engine_with_logger(Box::new(logger));
    for _ in 0..3 {
        engine.tick(&still_water(), &propeller(4.0, 120.0), DT);
    }
    engine.flush_logger().unwrap();
    drop(engine);

    let text = std::fs::read_to_string(&path).unwrap();
    let _ = std::fs::remove_file(&path);
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 4);
    assert_eq!(
        lines[0],
        "step,J,KT,KQ,Thrust_N,Torque_Nm,ShaftPower_W,Sigma,CavitationRisk"
    );
    assert!(lines[3].starts_with("3,"));
    let thrust: f64 = lines[1].split(',').nth(4).unwrap().parse().unwrap();
    assert!(rel_close(thrust, 314_880.0, 1e-12));
}

fn flat_engine_with_logger(logger: Box<dyn FrameLogger>) -> HydrodynamicsEngine {
    HydrodynamicsEngine::new(
        EngineSettings::default(),
        flat_table(),
        constant_water(1025.0, 2339.0),
        logger,
    )
    .unwrap()
}

// ---- Scenarios ----

fn scenario_frames(seed: u64, id: ScenarioId, steps: u64) -> Vec<FrameResult> {
    let config = SimConfig::default();
    let memory = MemoryLogger::new();
    let mut engine = config.build_engine(Box::new(memory.clone())).unwrap();
    let mut inputs = config.initial_inputs().unwrap();
    let settings = ScenarioSettings::default().with_seed(seed);
    let mut scenario = Scenario::build(id, &settings);
    run_scenario(&mut engine, &mut inputs, &mut scenario, steps, config.dt());
    memory.frames()
}

#[test]
fn test_same_seed_same_frames() {
    let a = scenario_frames(99, ScenarioId::Acceleration, 600);
    let b = scenario_frames(99, ScenarioId::Acceleration, 600);
    assert_eq!(a.len(), 600);
    for (fa, fb) in a.iter().zip(b.iter()) {
        assert!(fa.same_physics(fb), "diverged at step {}", fa.step);
    }
}

#[test]
fn test_different_seed_diverges() {
    let a = scenario_frames(1, ScenarioId::Acceleration, 300);
    let b = scenario_frames(2, ScenarioId::Acceleration, 300);
    assert!(a.iter().zip(b.iter()).any(|(fa, fb)| !fa.same_physics(fb)));
}

#[test]
fn test_bollard_pull_summary() {
    let config = SimConfig::default();
    let mut engine = config.build_engine(Box::new(NullLogger)).unwrap();
    let mut inputs = config.initial_inputs().unwrap();
    let mut scenario = Scenario::build(ScenarioId::BollardPull, &config.scenario);
    let steps = 15 * config.tick_rate_hz as u64;
    let summary = run_scenario(&mut engine, &mut inputs, &mut scenario, steps, config.dt());

    assert_eq!(summary.steps, steps);
    assert_eq!(summary.anomaly_steps, 0);
    let last = summary.final_frame.unwrap();
    assert_eq!(last.j, 0.0);
    assert_eq!(last.kt, 0.445);
    assert_eq!(summary.max_thrust_n, last.thrust_n);
    assert!(summary.min_sigma.is_finite());
}

#[test]
fn test_crash_stop_reverses_thrust() {
    let config = SimConfig::default();
    let mut engine = config.build_engine(Box::new(NullLogger)).unwrap();
    let mut inputs = config.initial_inputs().unwrap();
    let mut scenario = Scenario::build(ScenarioId::CrashStop, &config.scenario);
    let steps = 20 * config.tick_rate_hz as u64;
    let summary = run_scenario(&mut engine, &mut inputs, &mut scenario, steps, config.dt());
    assert!(summary.max_thrust_n > 0.0);
    assert_eq!(summary.anomaly_steps, 0);
    let last = summary.final_frame.unwrap();
    assert!(last.j < 0.0);
    assert!(last.shaft_power_w < 0.0);
}

#[test]
fn test_rpm_sweep_monotone_in_still_water() {
    let config = SimConfig::default();
    let mut engine = config.build_engine(Box::new(NullLogger)).unwrap();
    let inputs = config.initial_inputs().unwrap();
    let frames = rpm_sweep(&mut engine, &inputs, 0.0, 200.0, 5, config.dt()).unwrap();
    assert_eq!(frames.len(), 5);
    assert_eq!(frames[0].thrust_n, 0.0);
    for pair in frames.windows(2) {
        assert!(pair[1].thrust_n > pair[0].thrust_n);
        assert!(pair[1].sigma < pair[0].sigma);
    }
    assert!(rpm_sweep(&mut engine, &inputs, 0.0, 100.0, 0, config.dt()).is_err());
}
