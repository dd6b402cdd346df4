//! CoefficientTable: paired KT/KQ curves evaluated at an advance ratio.

use serde::{Deserialize, Serialize};

use propwash_core::enums::InterpolationMode;
use propwash_core::Result;

use crate::curve::CoefficientCurve;
use crate::interp::Interpolant;

/// Thrust and torque coefficients at one advance ratio.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coefficients {
    pub kt: f64,
    pub kq: f64,
}

/// Immutable open-water table. Safe to share across threads.
#[derive(Debug, Clone)]
pub struct CoefficientTable {
    kt: Interpolant,
    kq: Interpolant,
}

impl CoefficientTable {
    /// Validate and load both curves. The interpolation mode is fixed here.
    pub fn load(
        kt_pairs: &[[f64; 2]],
        kq_pairs: &[[f64; 2]],
        mode: InterpolationMode,
    ) -> Result<Self> {
        let kt = CoefficientCurve::from_pairs("kt_curve", kt_pairs)?;
        let kq = CoefficientCurve::from_pairs("kq_curve", kq_pairs)?;
        Ok(Self::from_curves(kt, kq, mode))
    }

    pub fn from_curves(kt: CoefficientCurve, kq: CoefficientCurve, mode: InterpolationMode) -> Self {
        Self {
            kt: Interpolant::new(kt, mode),
            kq: Interpolant::new(kq, mode),
        }
    }

    /// KT and KQ at advance ratio `j`, flat beyond either end.
    pub fn eval(&self, j: f64) -> Coefficients {
        Coefficients {
            kt: self.kt.eval(j),
            kq: self.kq.eval(j),
        }
    }

    pub fn mode(&self) -> InterpolationMode {
        self.kt.mode()
    }

    pub fn kt_curve(&self) -> &CoefficientCurve {
        self.kt.curve()
    }

    pub fn kq_curve(&self) -> &CoefficientCurve {
        self.kq.curve()
    }

    /// Overlapping J range of the two curves.
    pub fn j_range(&self) -> (f64, f64) {
        let (kt_lo, kt_hi) = self.kt.curve().j_range();
        let (kq_lo, kq_hi) = self.kq.curve().j_range();
        (kt_lo.max(kq_lo), kt_hi.min(kq_hi))
    }
}
