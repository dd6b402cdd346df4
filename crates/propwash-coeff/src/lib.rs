//! Open-water coefficient curves for PROPWASH.
//!
//! KT(J) and KQ(J) tables loaded once, validated, and evaluated with
//! flat extrapolation outside the sampled range.

pub use propwash_core as core;

pub mod curve;
pub mod interp;
pub mod table;

pub use curve::{CoefficientCurve, CurveSample};
pub use table::{CoefficientTable, Coefficients};
