use std::f64::consts::PI;

use approx::assert_relative_eq;
use ssphot::photometry::basis::{phi1, phi2, phi3, LINEAR_REGIME_LIMIT, PHI3_SUPPORT_LIMIT};
use ssphot::photometry::models::{hg12_star_to_g1g2, hg12_to_g1g2, PhaseModel};

fn deg_grid(lo: f64, hi: f64, n: usize) -> Vec<f64> {
    (0..n)
        .map(|k| (lo + (hi - lo) * k as f64 / n as f64).to_radians())
        .collect()
}

#[test]
fn phi1_phi2_are_linear_below_switch_angle() {
    let phase = deg_grid(0.0, 7.5, 75);
    assert!(phase.iter().all(|&a| a < LINEAR_REGIME_LIMIT));

    for (a, v) in phase.iter().zip(phi1(&phase)) {
        assert_relative_eq!(v, 1.0 - 6.0 / PI * a, epsilon = 1e-14);
    }
    for (a, v) in phase.iter().zip(phi2(&phase)) {
        assert_relative_eq!(v, 1.0 - 9.0 / (5.0 * PI) * a, epsilon = 1e-14);
    }
}

#[test]
fn phi3_vanishes_above_thirty_degrees() {
    let phase = deg_grid(30.001, 150.0, 200);
    assert!(phase.iter().all(|&a| a > PHI3_SUPPORT_LIMIT));
    assert!(phi3(&phase).iter().all(|&v| v == 0.0));
}

#[test]
fn basis_keeps_input_shape() {
    let phase = deg_grid(0.0, 120.0, 37);
    assert_eq!(phi1(&phase).len(), 37);
    assert_eq!(phi2(&phase).len(), 37);
    assert_eq!(phi3(&phase).len(), 37);
    assert!(phi1(&[]).is_empty());
}

#[test]
fn hg12_delegates_to_hg1g2_on_both_branches() {
    let phase = deg_grid(0.5, 100.0, 60);
    for g12 in [0.05, 0.1, 0.199, 0.2, 0.25, 0.6] {
        let (g1, g2) = hg12_to_g1g2(g12);
        let via_hg12 = PhaseModel::HG12.evaluate(&phase, &[15.0, g12]);
        let via_hg1g2 = PhaseModel::HG1G2.evaluate(&phase, &[15.0, g1, g2]);
        for (a, b) in via_hg12.iter().zip(&via_hg1g2) {
            assert_relative_eq!(a, b, epsilon = 1e-12);
        }
    }

    let (g1, g2) = hg12_star_to_g1g2(0.3);
    let via_star = PhaseModel::HG12Star.evaluate(&phase, &[15.0, 0.3]);
    let via_hg1g2 = PhaseModel::HG1G2.evaluate(&phase, &[15.0, g1, g2]);
    for (a, b) in via_star.iter().zip(&via_hg1g2) {
        assert_relative_eq!(a, b, epsilon = 1e-12);
    }
}

#[test]
fn hg12_branch_threshold() {
    // the two calibrations meet at 0.2 only approximately: the threshold selects the upper one
    let (g1_up, g2_up) = hg12_to_g1g2(0.2);
    assert_relative_eq!(g1_up, 0.9529 * 0.2 + 0.02162, epsilon = 1e-12);
    assert_relative_eq!(g2_up, -0.6125 * 0.2 + 0.5572, epsilon = 1e-12);

    let (g1_lo, g2_lo) = hg12_to_g1g2(0.199_999);
    assert_relative_eq!(g1_lo, 0.7527 * 0.199_999 + 0.06164, epsilon = 1e-12);
    assert_relative_eq!(g2_lo, -0.9612 * 0.199_999 + 0.6270, epsilon = 1e-12);
}

#[test]
fn models_are_h_at_zero_phase() {
    for (model, params) in [
        (PhaseModel::HG, vec![11.0, 0.15]),
        (PhaseModel::HG1G2, vec![11.0, 0.3, 0.4]),
        (PhaseModel::HG12, vec![11.0, 0.5]),
        (PhaseModel::HG12Star, vec![11.0, 0.5]),
    ] {
        assert_relative_eq!(model.predict(0.0, &params), 11.0, epsilon = 1e-12);
        // objects get fainter away from opposition
        assert!(model.predict(20f64.to_radians(), &params) > 11.0, "{model}");
    }
}
