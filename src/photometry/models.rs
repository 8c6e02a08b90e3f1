//! # Photometric phase-curve models
//!
//! Each [`PhaseModel`] maps a vector of phase angles (radians) and a parameter vector to
//! predicted reduced magnitudes:
//!
//! | Model | Parameters | Definition |
//! |---|---|---|
//! | [`PhaseModel::HG`] | `[H, G]` | `H − 2.5·log10((1−G)·Φ₁ + G·Φ₂)` with the blended HG basis |
//! | [`PhaseModel::HG1G2`] | `[H, G1, G2]` | `H − 2.5·log10(G1·φ1 + G2·φ2 + (1−G1−G2)·φ3)` |
//! | [`PhaseModel::HG12`] | `[H, G12]` | HG1G2 with `(G1, G2)` from [`hg12_to_g1g2`] |
//! | [`PhaseModel::HG12Star`] | `[H, G12]` | HG1G2 with `(G1, G2)` from [`hg12_star_to_g1g2`] |
//!
//! The first parameter is always the absolute magnitude `H`; the others are slope parameters.
//!
//! See also
//! ------------
//! * [`crate::photometry::basis`] – basis functions and their piecewise regimes.
//! * [`crate::photometry::fit::fit_phase_curve`] – least-squares fitting of these models.

use std::fmt;

use crate::constants::{Magnitude, Radian};
use crate::photometry::basis::{hg_basis, phi1_scalar, phi2_scalar, phi3_scalar};

/// Named IAU phase-function system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PhaseModel {
    /// Legacy two-parameter H, G system.
    HG,
    /// Three-parameter H, G1, G2 system.
    HG1G2,
    /// Two-parameter H, G12 system with the piecewise (G1, G2) calibration.
    #[default]
    HG12,
    /// Two-parameter H, G12 system with the single linear (G1, G2) mapping.
    HG12Star,
}

/// Map `G12` to `(G1, G2)` for the HG12 system.
///
/// Two empirical linear calibrations, selected by `G12 ≥ 0.2`.
#[inline]
pub fn hg12_to_g1g2(g12: f64) -> (f64, f64) {
    if g12 >= 0.2 {
        (0.9529 * g12 + 0.02162, -0.6125 * g12 + 0.5572)
    } else {
        (0.7527 * g12 + 0.06164, -0.9612 * g12 + 0.6270)
    }
}

/// Map `G12` to `(G1, G2)` for the HG12* system.
#[inline]
pub fn hg12_star_to_g1g2(g12: f64) -> (f64, f64) {
    (0.84293649 * g12, 0.53513350 - 0.53513350 * g12)
}

#[inline]
fn hg1g2_scalar(phase: Radian, h: f64, g1: f64, g2: f64) -> Magnitude {
    let flux =
        g1 * phi1_scalar(phase) + g2 * phi2_scalar(phase) + (1.0 - g1 - g2) * phi3_scalar(phase);
    h - 2.5 * flux.log10()
}

#[inline]
fn hg_scalar(phase: Radian, h: f64, g: f64) -> Magnitude {
    let (phi_1, phi_2) = hg_basis(phase);
    h - 2.5 * ((1.0 - g) * phi_1 + g * phi_2).log10()
}

impl PhaseModel {
    /// Number of free parameters, `H` included.
    pub fn n_params(self) -> usize {
        match self {
            PhaseModel::HG1G2 => 3,
            PhaseModel::HG | PhaseModel::HG12 | PhaseModel::HG12Star => 2,
        }
    }

    /// Short name used in logs and displays.
    pub fn name(self) -> &'static str {
        match self {
            PhaseModel::HG => "HG",
            PhaseModel::HG1G2 => "HG1G2",
            PhaseModel::HG12 => "HG12",
            PhaseModel::HG12Star => "HG12*",
        }
    }

    /// Predicted magnitude at one phase angle.
    ///
    /// Arguments
    /// -----------------
    /// * `phase`: phase angle in radians.
    /// * `params`: parameter vector, `H` first; must hold at least [`Self::n_params`] entries.
    ///
    /// Return
    /// ----------
    /// * The predicted magnitude. Parameter combinations giving a non-positive reduced flux
    ///   return `NaN`.
    pub fn predict(self, phase: Radian, params: &[f64]) -> Magnitude {
        match self {
            PhaseModel::HG => hg_scalar(phase, params[0], params[1]),
            PhaseModel::HG1G2 => hg1g2_scalar(phase, params[0], params[1], params[2]),
            PhaseModel::HG12 => {
                let (g1, g2) = hg12_to_g1g2(params[1]);
                hg1g2_scalar(phase, params[0], g1, g2)
            }
            PhaseModel::HG12Star => {
                let (g1, g2) = hg12_star_to_g1g2(params[1]);
                hg1g2_scalar(phase, params[0], g1, g2)
            }
        }
    }

    /// Predicted magnitudes for a vector of phase angles (radians).
    pub fn evaluate(self, phase: &[Radian], params: &[f64]) -> Vec<Magnitude> {
        let mut out = Vec::with_capacity(phase.len());
        self.evaluate_into(phase, params, &mut out);
        out
    }

    /// Same as [`Self::evaluate`], reusing the output buffer.
    pub fn evaluate_into(self, phase: &[Radian], params: &[f64], out: &mut Vec<Magnitude>) {
        out.clear();
        out.extend(phase.iter().map(|&a| self.predict(a, params)));
    }
}

impl fmt::Display for PhaseModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod models_test {
    use super::*;
    use crate::constants::RADEG;
    use approx::assert_relative_eq;

    #[test]
    fn test_h_at_zero_phase() {
        for model in [PhaseModel::HG, PhaseModel::HG12, PhaseModel::HG12Star] {
            assert_relative_eq!(model.predict(0.0, &[15.3, 0.4]), 15.3, epsilon = 1e-10);
        }
        assert_relative_eq!(
            PhaseModel::HG1G2.predict(0.0, &[15.3, 0.3, 0.2]),
            15.3,
            epsilon = 1e-10
        );
    }

    #[test]
    fn test_hg12_branches() {
        let (g1, g2) = hg12_to_g1g2(0.1);
        assert_relative_eq!(g1, 0.13691, epsilon = 1e-12);
        assert_relative_eq!(g2, 0.53088, epsilon = 1e-12);

        let (g1, g2) = hg12_to_g1g2(0.25);
        assert_relative_eq!(g1, 0.259845, epsilon = 1e-12);
        assert_relative_eq!(g2, 0.404075, epsilon = 1e-12);

        // threshold belongs to the upper branch
        let (g1, _) = hg12_to_g1g2(0.2);
        assert_relative_eq!(g1, 0.9529 * 0.2 + 0.02162, epsilon = 1e-15);
    }

    #[test]
    fn test_hg12_star_mapping() {
        let (g1, g2) = hg12_star_to_g1g2(0.0);
        assert_eq!(g1, 0.0);
        assert_relative_eq!(g2, 0.53513350, epsilon = 1e-15);
        let (g1, g2) = hg12_star_to_g1g2(1.0);
        assert_relative_eq!(g1, 0.84293649, epsilon = 1e-15);
        assert_eq!(g2, 0.0);
    }

    #[test]
    fn test_models_dim_with_phase() {
        let phase: Vec<f64> = [1.0, 5.0, 10.0, 20.0, 40.0]
            .iter()
            .map(|d| d * RADEG)
            .collect();
        for model in [PhaseModel::HG, PhaseModel::HG12, PhaseModel::HG12Star] {
            let mags = model.evaluate(&phase, &[10.0, 0.3]);
            assert_eq!(mags.len(), phase.len());
            for w in mags.windows(2) {
                assert!(w[1] > w[0], "{model}: {mags:?}");
            }
        }
    }

    #[test]
    fn test_non_physical_flux_is_nan() {
        // G1 = G2 = 0 and phase > 30° leaves zero reduced flux
        let mag = PhaseModel::HG1G2.predict(45.0 * RADEG, &[10.0, 0.0, 0.0]);
        assert!(mag.is_infinite() || mag.is_nan());
        let mag = PhaseModel::HG1G2.predict(45.0 * RADEG, &[10.0, -1.0, 0.0]);
        assert!(mag.is_nan());
    }
}
