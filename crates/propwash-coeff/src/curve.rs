//! CoefficientCurve: validated (J, value) samples.

use serde::{Deserialize, Serialize};

use propwash_core::{PropwashError, Result};

/// One sample of an open-water curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurveSample {
    pub j: f64,
    pub value: f64,
}

/// Ordered samples with strictly increasing J. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoefficientCurve {
    samples: Vec<CurveSample>,
}

impl CoefficientCurve {
    /// Build a curve from `[J, value]` pairs. `name` identifies the curve in
    /// the diagnostic when validation fails.
    pub fn from_pairs(name: &str, pairs: &[[f64; 2]]) -> Result<Self> {
        let samples = pairs
            .iter()
            .map(|&[j, value]| CurveSample { j, value })
            .collect();
        Self::new(name, samples)
    }

    pub fn new(name: &str, samples: Vec<CurveSample>) -> Result<Self> {
        if samples.is_empty() {
            return Err(PropwashError::invalid(name, "curve has no samples"));
        }
        for (i, s) in samples.iter().enumerate() {
            if !(s.j.is_finite() && s.value.is_finite()) {
                return Err(PropwashError::invalid(
                    name,
                    format!("sample {i} is not finite: ({}, {})", s.j, s.value),
                ));
            }
        }
        if let Some(i) = samples.windows(2).position(|w| w[1].j <= w[0].j) {
            return Err(PropwashError::invalid(
                name,
                format!(
                    "J must be strictly increasing: sample {} has J={} after J={}",
                    i + 1,
                    samples[i + 1].j,
                    samples[i].j
                ),
            ));
        }
        Ok(Self { samples })
    }

    pub fn samples(&self) -> &[CurveSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Lowest and highest sampled J.
    pub fn j_range(&self) -> (f64, f64) {
        let first = self.samples[0].j;
        let last = self.samples[self.samples.len() - 1].j;
        (first, last)
    }

    /// Index of the segment containing `j`, for `j` strictly inside the range.
    pub(crate) fn segment(&self, j: f64) -> usize {
        // First sample with J > j, minus one. O(log n).
        let upper = self.samples.partition_point(|s| s.j <= j);
        upper.saturating_sub(1).min(self.samples.len() - 2)
    }
}
