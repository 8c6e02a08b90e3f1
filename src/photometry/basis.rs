//! # Phase-function basis
//!
//! Basis functions of the IAU photometric systems:
//!
//! * [`phi1`], [`phi2`], [`phi3`] – the three spline-tabulated functions of the **HG1G2**
//!   system (Muinonen et al. 2010),
//! * [`hg_basis`] – the two closed-form functions of the legacy **HG** system
//!   (Bowell et al. 1989), each a blend of a short-tail and a long-tail term.
//!
//! ## Piecewise evaluation
//!
//! * Below 7.5°, `phi1` and `phi2` use their linear opposition-regime forms
//!   `1 − 6α/π` and `1 − 9α/(5π)` instead of the spline.
//! * Above 30°, `phi3` is exactly zero.
//!
//! The switch is applied element by element on the phase-angle vector.
//!
//! ## Shared state
//!
//! The three splines are built once, on first use, from the constant tables below and then
//! shared read-only for the lifetime of the process ([`std::sync::LazyLock`]).
//!
//! All phase angles are in **radians**.

use std::f64::consts::PI;
use std::sync::LazyLock;

use crate::constants::{Radian, RADEG};
use crate::photometry::spline::ClampedCubicSpline;

/// Knot phase angles (degrees) of `phi1` and `phi2`.
const ALPHA_12_DEG: [f64; 6] = [7.5, 30., 60., 90., 120., 150.];

const PHI_1_SAMPLES: [f64; 6] = [
    7.5e-1,
    3.3486016e-1,
    1.3410560e-1,
    5.1104756e-2,
    2.1465687e-2,
    3.6396989e-3,
];
const PHI_1_DERIVS: [f64; 2] = [-1.9098593, -9.1328612e-2];

const PHI_2_SAMPLES: [f64; 6] = [
    9.25e-1,
    6.2884169e-1,
    3.1755495e-1,
    1.2716367e-1,
    2.2373903e-2,
    1.6505689e-4,
];
const PHI_2_DERIVS: [f64; 2] = [-5.7295780e-1, -8.6573138e-8];

/// Knot phase angles (degrees) of `phi3`.
const ALPHA_3_DEG: [f64; 9] = [0.0, 0.3, 1., 2., 4., 8., 12., 20., 30.];

const PHI_3_SAMPLES: [f64; 9] = [
    1.,
    8.3381185e-1,
    5.7735424e-1,
    4.2144772e-1,
    2.3174230e-1,
    1.0348178e-1,
    6.1733473e-2,
    1.6107006e-2,
    0.,
];
const PHI_3_DERIVS: [f64; 2] = [-1.0630097, 0.];

/// Below this phase angle `phi1`/`phi2` use their linear forms.
pub const LINEAR_REGIME_LIMIT: Radian = 7.5 * RADEG;

/// Above this phase angle `phi3` vanishes.
pub const PHI3_SUPPORT_LIMIT: Radian = PI / 6.0;

// HG short-tail / long-tail coefficients
const HG_A: [f64; 2] = [3.332, 1.862];
const HG_B: [f64; 2] = [0.631, 1.218];
const HG_C: [f64; 2] = [0.986, 0.238];

fn build_spline(knots_deg: &[f64], samples: &[f64], derivs: [f64; 2]) -> ClampedCubicSpline {
    let knots: Vec<f64> = knots_deg.iter().map(|d| d * RADEG).collect();
    ClampedCubicSpline::new(&knots, samples, derivs[0], derivs[1])
        .unwrap_or_else(|| panic!("constant phase-function table is malformed"))
}

static PHI_1_SPLINE: LazyLock<ClampedCubicSpline> =
    LazyLock::new(|| build_spline(&ALPHA_12_DEG, &PHI_1_SAMPLES, PHI_1_DERIVS));

static PHI_2_SPLINE: LazyLock<ClampedCubicSpline> =
    LazyLock::new(|| build_spline(&ALPHA_12_DEG, &PHI_2_SAMPLES, PHI_2_DERIVS));

static PHI_3_SPLINE: LazyLock<ClampedCubicSpline> =
    LazyLock::new(|| build_spline(&ALPHA_3_DEG, &PHI_3_SAMPLES, PHI_3_DERIVS));

/// `phi1` at a single phase angle.
#[inline]
pub fn phi1_scalar(phase: Radian) -> f64 {
    if phase < LINEAR_REGIME_LIMIT {
        1.0 - 6.0 * phase / PI
    } else {
        PHI_1_SPLINE.eval(phase)
    }
}

/// `phi2` at a single phase angle.
#[inline]
pub fn phi2_scalar(phase: Radian) -> f64 {
    if phase < LINEAR_REGIME_LIMIT {
        1.0 - 9.0 * phase / (5.0 * PI)
    } else {
        PHI_2_SPLINE.eval(phase)
    }
}

/// `phi3` at a single phase angle.
#[inline]
pub fn phi3_scalar(phase: Radian) -> f64 {
    if phase > PHI3_SUPPORT_LIMIT {
        0.0
    } else {
        PHI_3_SPLINE.eval(phase)
    }
}

/// First HG1G2 basis function, evaluated element-wise.
pub fn phi1(phase: &[Radian]) -> Vec<f64> {
    phase.iter().map(|&a| phi1_scalar(a)).collect()
}

/// Second HG1G2 basis function, evaluated element-wise.
pub fn phi2(phase: &[Radian]) -> Vec<f64> {
    phase.iter().map(|&a| phi2_scalar(a)).collect()
}

/// Third HG1G2 basis function, evaluated element-wise.
pub fn phi3(phase: &[Radian]) -> Vec<f64> {
    phase.iter().map(|&a| phi3_scalar(a)).collect()
}

/// The two blended basis functions `(Φ₁, Φ₂)` of the HG system at one phase angle.
///
/// Each `Φ_k = W·Φ_k^S + (1 − W)·Φ_k^L` with
///
/// ```text
/// W     = exp(−90.56·tan²(α/2))
/// Φ_k^S = 1 − C_k·sin α / (0.119 + 1.341·sin α − 0.754·sin²α)
/// Φ_k^L = exp(−A_k·tan(α/2)^B_k)
/// ```
pub fn hg_basis(phase: Radian) -> (f64, f64) {
    let sin_a = phase.sin();
    let tan_ah = (phase / 2.0).tan();

    let w = (-90.56 * tan_ah * tan_ah).exp();
    let scale_sina = sin_a / (0.119 + 1.341 * sin_a - 0.754 * sin_a * sin_a);

    let phi_1_s = 1.0 - HG_C[0] * scale_sina;
    let phi_2_s = 1.0 - HG_C[1] * scale_sina;

    let phi_1_l = (-HG_A[0] * tan_ah.powf(HG_B[0])).exp();
    let phi_2_l = (-HG_A[1] * tan_ah.powf(HG_B[1])).exp();

    (
        w * phi_1_s + (1.0 - w) * phi_1_l,
        w * phi_2_s + (1.0 - w) * phi_2_l,
    )
}

#[cfg(test)]
mod basis_test {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_spline_knot_values() {
        for (deg, expected) in ALPHA_12_DEG.iter().zip(PHI_1_SAMPLES.iter()) {
            assert_relative_eq!(PHI_1_SPLINE.eval(deg * RADEG), *expected, epsilon = 1e-12);
        }
        for (deg, expected) in ALPHA_12_DEG.iter().zip(PHI_2_SAMPLES.iter()) {
            assert_relative_eq!(PHI_2_SPLINE.eval(deg * RADEG), *expected, epsilon = 1e-12);
        }
        for (deg, expected) in ALPHA_3_DEG.iter().zip(PHI_3_SAMPLES.iter()) {
            assert_relative_eq!(PHI_3_SPLINE.eval(deg * RADEG), *expected, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_linear_regime_is_continuous_at_switch() {
        // 1 − 6·7.5°/180° = 0.75, the first phi1 sample
        assert_relative_eq!(phi1_scalar(LINEAR_REGIME_LIMIT), 0.75, epsilon = 1e-12);
        assert_relative_eq!(
            phi1_scalar(LINEAR_REGIME_LIMIT - 1e-12),
            0.75,
            epsilon = 1e-9
        );
        assert_relative_eq!(phi2_scalar(LINEAR_REGIME_LIMIT), 0.925, epsilon = 1e-12);
        assert_relative_eq!(
            phi2_scalar(LINEAR_REGIME_LIMIT - 1e-12),
            0.925,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_zero_phase() {
        assert_eq!(phi1_scalar(0.0), 1.0);
        assert_eq!(phi2_scalar(0.0), 1.0);
        assert_relative_eq!(phi3_scalar(0.0), 1.0, epsilon = 1e-12);
        let (p1, p2) = hg_basis(0.0);
        assert_relative_eq!(p1, 1.0, epsilon = 1e-12);
        assert_relative_eq!(p2, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_vector_shape_and_monotonic_decrease() {
        let phase: Vec<f64> = (0..=120).map(|d| d as f64 * RADEG).collect();
        let p1 = phi1(&phase);
        let p2 = phi2(&phase);
        let p3 = phi3(&phase);
        assert_eq!(p1.len(), phase.len());
        assert_eq!(p2.len(), phase.len());
        assert_eq!(p3.len(), phase.len());
        for w in p1.windows(2) {
            assert!(w[1] < w[0]);
        }
        for w in p2.windows(2) {
            assert!(w[1] < w[0]);
        }
    }

    #[test]
    fn test_hg_basis_decreases() {
        let (a5, b5) = hg_basis(5.0 * RADEG);
        let (a40, b40) = hg_basis(40.0 * RADEG);
        assert!(a40 < a5 && a5 < 1.0);
        assert!(b40 < b5 && b5 < 1.0);
    }
}
