#![allow(dead_code)]

use std::sync::Arc;

use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};

use ssphot::band::Band;
use ssphot::constants::{AB_ZERO_POINT_NJY, MAG_ERR_FACTOR};
use ssphot::observations::{DetectionRow, SourceRow};
use ssphot::photometry::models::PhaseModel;

/// Flux density (nJy) of an AB magnitude.
pub fn mag_to_njy(mag: f64) -> f64 {
    10f64.powf((AB_ZERO_POINT_NJY - mag) / 2.5)
}

/// Synthetic input tables for one object observed in one band along an HG12 curve.
pub struct SyntheticObject {
    pub ss_object_id: u64,
    pub designation: &'static str,
    pub band: Band,
    pub h: f64,
    pub g12: f64,
    pub mag_err: f64,
}

impl SyntheticObject {
    /// Append one source/detection pair per phase angle. `first_dia` is the first diaSourceId
    /// used; ids are consecutive. Magnitudes are perturbed with `N(0, mag_err)` when `rng` is
    /// given.
    pub fn push_rows(
        &self,
        phases_deg: &[f64],
        first_dia: u64,
        mut rng: Option<&mut StdRng>,
        sources: &mut Vec<SourceRow>,
        detections: &mut Vec<DetectionRow>,
    ) {
        let noise = Normal::new(0.0, self.mag_err).unwrap();
        let designation: Arc<str> = Arc::from(self.designation);
        for (k, &phase) in phases_deg.iter().enumerate() {
            let dia = first_dia + k as u64;
            let mut mag = PhaseModel::HG12.predict(phase.to_radians(), &[self.h, self.g12]);
            if let Some(rng) = rng.as_deref_mut() {
                mag += noise.sample(rng);
            }
            let flux = mag_to_njy(mag);

            sources.push(SourceRow {
                ss_object_id: self.ss_object_id,
                dia_source_id: dia,
                designation: Arc::clone(&designation),
                phase_angle: phase,
                topocentric_dist: 1.5,
                heliocentric_dist: 2.4,
            });
            detections.push(DetectionRow {
                dia_source_id: dia,
                midpoint_mjd_tai: 60_500.0 + 3.0 * k as f64,
                ra: 120.0,
                dec: 15.0,
                extendedness: 0.05,
                band: self.band,
                psf_flux: flux,
                psf_flux_err: self.mag_err * flux / MAG_ERR_FACTOR,
            });
        }
    }
}

/// Evenly spaced phase angles in `[lo, hi]` (degrees).
pub fn phase_grid(lo: f64, hi: f64, n: usize) -> Vec<f64> {
    (0..n)
        .map(|k| lo + (hi - lo) * k as f64 / (n - 1) as f64)
        .collect()
}
