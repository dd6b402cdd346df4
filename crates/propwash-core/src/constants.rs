//! Simulation constants and physical reference values.

/// Default scheduler tick rate (Hz).
pub const TICK_RATE: u32 = 60;

/// Seconds per tick at the default tick rate.
pub const DT: f64 = 1.0 / TICK_RATE as f64;

// --- Numerical guards ---

/// Floor on |n·D| (m/s) when forming the advance ratio.
pub const ADVANCE_EPSILON: f64 = 0.01;

/// Floor added to the tip dynamic pressure (Pa) when forming sigma.
pub const SIGMA_EPSILON: f64 = 0.01;

// --- Reference conditions ---

/// Standard atmospheric pressure (Pa).
pub const ATMOSPHERIC_PRESSURE_PA: f64 = 101_325.0;

/// Reference seawater density (kg/m³).
pub const SEAWATER_DENSITY: f64 = 1025.0;

/// Reference seawater dynamic viscosity at 15 °C, 35 PSU (Pa·s).
pub const SEAWATER_VISCOSITY: f64 = 1.22e-3;

/// Reference vapor pressure of water at 15 °C (Pa).
pub const SEAWATER_VAPOR_PRESSURE: f64 = 1705.0;

/// Accepted density override (kg/m³), fresh water down to heavy brine.
pub const DENSITY_OVERRIDE_RANGE_KG_M3: (f64, f64) = (500.0, 2_000.0);

/// Accepted dynamic viscosity override (Pa·s).
pub const VISCOSITY_OVERRIDE_RANGE_PA_S: (f64, f64) = (1.0e-5, 1.0);

/// Default cavitation number below which cavitation is flagged.
pub const CAVITATION_SIGMA_THRESHOLD: f64 = 1.5;

// --- Seawater model validity domain ---

/// Temperature domain (°C) of the water property models.
pub const WATER_TEMPERATURE_RANGE_C: (f64, f64) = (-2.0, 40.0);

/// Practical salinity domain (PSU) of the seawater equation of state.
pub const WATER_SALINITY_RANGE_PSU: (f64, f64) = (0.0, 42.0);

/// Absolute pressure domain (Pa): 1 kPa up to 1000 bar of sea pressure.
pub const WATER_PRESSURE_RANGE_PA: (f64, f64) = (1_000.0, 1.0e8 + ATMOSPHERIC_PRESSURE_PA);

// --- Geometry limits ---

/// Minimum blade count for a valid propeller.
pub const MIN_BLADE_COUNT: u32 = 2;

/// Maximum expanded area ratio accepted.
pub const MAX_AREA_RATIO: f64 = 1.2;

/// Accepted salinity range for environment input (PSU).
pub const SALINITY_INPUT_RANGE_PSU: (f64, f64) = (0.0, 50.0);

/// Chord coefficient at 0.7R: c0.7 = K · (AE/A0) · D / Z.
pub const CHORD_COEFFICIENT_07R: f64 = 2.073;
