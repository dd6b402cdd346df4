//! Water property models for PROPWASH.
//!
//! Density, dynamic viscosity and vapor pressure from temperature,
//! salinity and pressure, behind one swappable trait.

pub use propwash_core as core;

pub mod constant;
pub mod grid;
pub mod model;
pub mod seawater;

// Re-export key types for convenience.
pub use constant::ConstantWater;
pub use grid::{GridAxes, GridAxis, PropertyGrid};
pub use model::{build_model, PropertyEstimate, WaterModelConfig, WaterProperties, WaterPropertyModel};
pub use seawater::SeawaterFormula;
