//! Interpolants over a CoefficientCurve.

use propwash_core::enums::InterpolationMode;

use crate::curve::CoefficientCurve;

/// A curve prepared for evaluation in one interpolation mode.
#[derive(Debug, Clone)]
pub enum Interpolant {
    Linear(CoefficientCurve),
    /// Monotone cubic Hermite with precomputed node slopes.
    Spline {
        curve: CoefficientCurve,
        slopes: Vec<f64>,
    },
}

impl Interpolant {
    pub fn new(curve: CoefficientCurve, mode: InterpolationMode) -> Self {
        match mode {
            InterpolationMode::Linear => Self::Linear(curve),
            InterpolationMode::Spline => {
                let slopes = monotone_slopes(&curve);
                Self::Spline { curve, slopes }
            }
        }
    }

    pub fn curve(&self) -> &CoefficientCurve {
        match self {
            Self::Linear(curve) => curve,
            Self::Spline { curve, .. } => curve,
        }
    }

    pub fn mode(&self) -> InterpolationMode {
        match self {
            Self::Linear(_) => InterpolationMode::Linear,
            Self::Spline { .. } => InterpolationMode::Spline,
        }
    }

    /// Value at `j`, held flat beyond the first and last sample.
    pub fn eval(&self, j: f64) -> f64 {
        if j.is_nan() {
            return f64::NAN;
        }
        let samples = self.curve().samples();
        let first = samples[0];
        let last = samples[samples.len() - 1];
        if j <= first.j {
            return first.value;
        }
        if j >= last.j {
            return last.value;
        }

        let i = self.curve().segment(j);
        let (a, b) = (samples[i], samples[i + 1]);
        let h = b.j - a.j;
        let t = (j - a.j) / h;

        match self {
            Self::Linear(_) => a.value + (b.value - a.value) * t,
            Self::Spline { slopes, .. } => {
                let t2 = t * t;
                let t3 = t2 * t;
                let h00 = 2.0 * t3 - 3.0 * t2 + 1.0;
                let h10 = t3 - 2.0 * t2 + t;
                let h01 = -2.0 * t3 + 3.0 * t2;
                let h11 = t3 - t2;
                h00 * a.value + h10 * h * slopes[i] + h01 * b.value + h11 * h * slopes[i + 1]
            }
        }
    }
}

/// Fritsch–Carlson node slopes: zero at local extrema, weighted harmonic
/// mean of neighbouring secants elsewhere, shape-preserving at the ends.
fn monotone_slopes(curve: &CoefficientCurve) -> Vec<f64> {
    let s = curve.samples();
    let n = s.len();
    match n {
        1 => return vec![0.0],
        2 => {
            let d = (s[1].value - s[0].value) / (s[1].j - s[0].j);
            return vec![d, d];
        }
        _ => {}
    }

    let h: Vec<f64> = s.windows(2).map(|w| w[1].j - w[0].j).collect();
    let d: Vec<f64> = s
        .windows(2)
        .zip(&h)
        .map(|(w, h)| (w[1].value - w[0].value) / h)
        .collect();

    let mut m = vec![0.0; n];
    for k in 1..n - 1 {
        if d[k - 1] * d[k] > 0.0 {
            let w1 = 2.0 * h[k] + h[k - 1];
            let w2 = h[k] + 2.0 * h[k - 1];
            m[k] = (w1 + w2) / (w1 / d[k - 1] + w2 / d[k]);
        }
    }
    m[0] = end_slope(h[0], h[1], d[0], d[1]);
    m[n - 1] = end_slope(h[n - 2], h[n - 3], d[n - 2], d[n - 3]);
    m
}

/// One-sided three-point end slope, limited to keep the end monotone.
fn end_slope(h0: f64, h1: f64, d0: f64, d1: f64) -> f64 {
    let m = ((2.0 * h0 + h1) * d0 - h0 * d1) / (h0 + h1);
    if m.signum() != d0.signum() || d0 == 0.0 {
        0.0
    } else if d0.signum() != d1.signum() && m.abs() > (3.0 * d0).abs() {
        3.0 * d0
    } else {
        m
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn curve(pairs: &[[f64; 2]]) -> CoefficientCurve {
        CoefficientCurve::from_pairs("test", pairs).unwrap()
    }

    #[test]
    fn test_linear_midpoint() {
        let interp = Interpolant::new(curve(&[[0.0, 1.0], [1.0, 3.0]]), InterpolationMode::Linear);
        assert!((interp.eval(0.5) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_spline_reproduces_straight_line() {
        let pts = [[0.0, 0.0], [0.5, 1.0], [1.0, 2.0], [2.0, 4.0]];
        let interp = Interpolant::new(curve(&pts), InterpolationMode::Spline);
        for x in [0.1, 0.3, 0.75, 1.4, 1.9] {
            assert!((interp.eval(x) - 2.0 * x).abs() < 1e-9, "at {x}");
        }
    }

    #[test]
    fn test_spline_no_overshoot_at_step() {
        // A step in the data must not ring above or below the plateaus.
        let pts = [[0.0, 0.0], [1.0, 0.0], [2.0, 1.0], [3.0, 1.0]];
        let interp = Interpolant::new(curve(&pts), InterpolationMode::Spline);
        for i in 0..=300 {
            let v = interp.eval(i as f64 / 100.0);
            assert!((-1e-12..=1.0 + 1e-12).contains(&v), "overshoot {v}");
        }
    }

    #[test]
    fn test_single_sample_is_constant() {
        let c = curve(&[[0.4, 0.2]]);
        for mode in [InterpolationMode::Linear, InterpolationMode::Spline] {
            let interp = Interpolant::new(c.clone(), mode);
            assert_eq!(interp.eval(-3.0), 0.2);
            assert_eq!(interp.eval(0.4), 0.2);
            assert_eq!(interp.eval(9.0), 0.2);
        }
    }

    #[test]
    fn test_nan_passes_through() {
        let interp = Interpolant::new(curve(&[[0.0, 1.0], [1.0, 2.0]]), InterpolationMode::Linear);
        assert!(interp.eval(f64::NAN).is_nan());
    }
}
