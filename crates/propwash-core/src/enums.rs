//! Enumeration types used throughout the simulation.

use serde::{Deserialize, Serialize};

/// How density and viscosity are obtained when no override is set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DensityViscosityStrategy {
    /// Fixed values supplied in configuration.
    Constant,
    /// Seawater equation of state evaluated every time inputs change.
    #[default]
    Formula,
    /// Precomputed (T, S, P) grid with trilinear interpolation.
    GridLookup,
}

/// Interpolation used between coefficient curve samples.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum InterpolationMode {
    /// Piecewise-linear between bracketing samples.
    #[default]
    Linear,
    /// Monotone cubic Hermite through the samples.
    Spline,
}

/// Scripted operating profiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScenarioId {
    /// Ship held stationary while the shaft spins up.
    BollardPull,
    /// Shaft and ship speed ramp up together to cruise.
    Acceleration,
    /// Cruise, then the shaft is reversed while the ship still makes way.
    CrashStop,
}

impl ScenarioId {
    /// Parse the command-line spelling of a scenario.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "bollard" | "bollard-pull" => Some(Self::BollardPull),
            "acceleration" | "accel" => Some(Self::Acceleration),
            "crash-stop" | "crashstop" => Some(Self::CrashStop),
            _ => None,
        }
    }
}
