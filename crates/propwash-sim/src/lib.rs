//! Propeller hydrodynamics simulation.
//!
//! Owns the per-tick engine, its configuration, frame export, scripted
//! scenarios and a fixed-rate runner thread.

pub mod config;
pub mod control;
pub mod engine;
pub mod logger;
pub mod runner;
pub mod scenario;

pub use config::SimConfig;
pub use control::SimInputs;
pub use engine::HydrodynamicsEngine;
pub use propwash_core as core;

#[cfg(test)]
mod tests;
