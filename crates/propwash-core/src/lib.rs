//! Core types and definitions for the PROPWASH propeller simulation.
//!
//! This crate defines the vocabulary shared across all other crates:
//! environment and geometry inputs, control commands, the per-tick frame
//! record, the error taxonomy, and constants. It has no dependency on any
//! runtime framework.

pub mod commands;
pub mod constants;
pub mod enums;
pub mod error;
pub mod state;
pub mod types;

pub use error::{PropwashError, Result};
