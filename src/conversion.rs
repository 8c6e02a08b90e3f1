use crate::constants::{Magnitude, NanoJansky, AB_ZERO_POINT_NJY, MAG_ERR_FACTOR};

/// Convert a flux density in nanojansky to an AB magnitude.
///
/// Arguments
/// ---------
/// * `flux`: flux density in nJy
///
/// Return
/// ----------
/// * The AB magnitude `31.4 − 2.5·log10(flux)`. Non-positive fluxes give `NaN` (or `+∞` for zero);
///   such rows are discarded later by the phase-curve fitter.
#[inline]
pub fn njy_to_mag(flux: NanoJansky) -> Magnitude {
    AB_ZERO_POINT_NJY - 2.5 * flux.log10()
}

/// Propagate a flux error in nanojansky to a magnitude error.
///
/// First-order propagation `σ_m = 1.085736·σ_f / f`, valid only while `σ_f / f ≪ 1`.
///
/// Arguments
/// ---------
/// * `flux`: flux density in nJy
/// * `flux_err`: 1-σ flux uncertainty in nJy
#[inline]
pub fn njy_err_to_mag_err(flux: NanoJansky, flux_err: NanoJansky) -> Magnitude {
    MAG_ERR_FACTOR * (flux_err / flux)
}

#[cfg(test)]
mod conversion_test {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_njy_to_mag() {
        // 3631 Jy is the AB zero point
        assert_relative_eq!(njy_to_mag(3631e9), 0.0, epsilon = 1e-3);
        assert_relative_eq!(njy_to_mag(1.0), 31.4, epsilon = 1e-12);
        assert_relative_eq!(njy_to_mag(100.0), 26.4, epsilon = 1e-12);
        assert!(njy_to_mag(-5.0).is_nan());
    }

    #[test]
    fn test_njy_err_to_mag_err() {
        assert_relative_eq!(njy_err_to_mag_err(1000.0, 10.0), 0.01085736, epsilon = 1e-12);
        assert_relative_eq!(njy_err_to_mag_err(-1000.0, 10.0), -0.01085736, epsilon = 1e-12);
    }
}
