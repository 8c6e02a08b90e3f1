//! # Solar-system observations
//!
//! Input rows of the aggregation pipeline and their join.
//!
//! * [`SourceRow`] – one SSSource row: the association of a detection with a solar-system
//!   object, plus the observing geometry (phase angle, distances).
//! * [`DetectionRow`] – one DiaSource row: epoch, band, PSF flux and morphology of a detection.
//! * [`Observation`] – the joined row, with the PSF flux already converted to an AB magnitude.
//!
//! ## Join contract
//!
//! [`join_sources`] is an inner join on `diaSourceId` that **must not change the row count**:
//! every source row has to find exactly one detection. A missing detection or a duplicated
//! detection key is an integrity error and aborts the batch; rows are never dropped silently.
//!
//! Observations are immutable once built.

use std::sync::Arc;

use crate::band::Band;
use crate::constants::{
    AstronomicalUnit, Degree, DiaSourceId, FastHashMap, Magnitude, NanoJansky, SsObjectId, MJD,
};
use crate::conversion::{njy_err_to_mag_err, njy_to_mag};
use crate::ssp_errors::SspError;

/// One SSSource row.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceRow {
    pub ss_object_id: SsObjectId,
    pub dia_source_id: DiaSourceId,
    /// Unpacked primary provisional designation of the object (e.g. `"2015 AB"`).
    pub designation: Arc<str>,
    /// Sun–object–observer angle in degrees.
    pub phase_angle: Degree,
    pub topocentric_dist: AstronomicalUnit,
    pub heliocentric_dist: AstronomicalUnit,
}

/// One DiaSource row, restricted to the columns used by the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionRow {
    pub dia_source_id: DiaSourceId,
    /// Exposure mid-point, MJD (TAI).
    pub midpoint_mjd_tai: MJD,
    pub ra: Degree,
    pub dec: Degree,
    pub extendedness: f64,
    pub band: Band,
    pub psf_flux: NanoJansky,
    pub psf_flux_err: NanoJansky,
}

/// A source row joined with its detection.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub ss_object_id: SsObjectId,
    pub dia_source_id: DiaSourceId,
    pub designation: Arc<str>,
    pub band: Band,
    /// MJD (TAI)
    pub epoch: MJD,
    pub ra: Degree,
    pub dec: Degree,
    pub phase_angle: Degree,
    pub mag: Magnitude,
    pub mag_err: Magnitude,
    pub extendedness: f64,
    pub topocentric_dist: AstronomicalUnit,
    pub heliocentric_dist: AstronomicalUnit,
}

impl Observation {
    /// Join one source row with its detection, deriving the AB magnitude and its error.
    pub fn from_rows(source: &SourceRow, detection: &DetectionRow) -> Self {
        Observation {
            ss_object_id: source.ss_object_id,
            dia_source_id: source.dia_source_id,
            designation: Arc::clone(&source.designation),
            band: detection.band,
            epoch: detection.midpoint_mjd_tai,
            ra: detection.ra,
            dec: detection.dec,
            phase_angle: source.phase_angle,
            mag: njy_to_mag(detection.psf_flux),
            mag_err: njy_err_to_mag_err(detection.psf_flux, detection.psf_flux_err),
            extendedness: detection.extendedness,
            topocentric_dist: source.topocentric_dist,
            heliocentric_dist: source.heliocentric_dist,
        }
    }
}

/// Inner join of SSSource rows with DiaSource rows on `diaSourceId`.
///
/// Arguments
/// -----------------
/// * `sources`: SSSource rows; output order follows this slice.
/// * `detections`: DiaSource rows; extra detections without a source are ignored.
///
/// Return
/// ----------
/// * One [`Observation`] per source row.
/// * [`SspError::DuplicateDetection`] if a `diaSourceId` appears twice in `detections`.
/// * [`SspError::JoinRowCountMismatch`] if any source row has no detection; the error carries
///   both row counts and the first unmatched id.
pub fn join_sources(
    sources: &[SourceRow],
    detections: &[DetectionRow],
) -> Result<Vec<Observation>, SspError> {
    let mut index: FastHashMap<DiaSourceId, &DetectionRow> =
        FastHashMap::with_capacity_and_hasher(detections.len(), Default::default());
    for det in detections {
        if index.insert(det.dia_source_id, det).is_some() {
            return Err(SspError::DuplicateDetection(det.dia_source_id));
        }
    }

    let joined: Vec<Observation> = sources
        .iter()
        .filter_map(|src| {
            index
                .get(&src.dia_source_id)
                .map(|det| Observation::from_rows(src, det))
        })
        .collect();

    if joined.len() != sources.len() {
        let first_missing = sources
            .iter()
            .find(|src| !index.contains_key(&src.dia_source_id))
            .map(|src| src.dia_source_id)
            .unwrap_or_default();
        return Err(SspError::JoinRowCountMismatch {
            sources: sources.len(),
            joined: joined.len(),
            first_missing,
        });
    }

    Ok(joined)
}

#[cfg(test)]
pub(crate) mod observations_test {
    use super::*;
    use approx::assert_relative_eq;

    pub(crate) fn source(obj: u64, dia: u64, phase: f64) -> SourceRow {
        SourceRow {
            ss_object_id: obj,
            dia_source_id: dia,
            designation: Arc::from(format!("2024 A{obj}")),
            phase_angle: phase,
            topocentric_dist: 1.2,
            heliocentric_dist: 2.1,
        }
    }

    pub(crate) fn detection(dia: u64, band: Band, flux: f64) -> DetectionRow {
        DetectionRow {
            dia_source_id: dia,
            midpoint_mjd_tai: 60000.0 + dia as f64,
            ra: 10.0,
            dec: -5.0,
            extendedness: 0.1,
            band,
            psf_flux: flux,
            psf_flux_err: flux / 100.0,
        }
    }

    #[test]
    fn test_join_derives_magnitudes() {
        let sources = vec![source(1, 10, 5.0), source(2, 11, 7.0)];
        let detections = vec![
            detection(11, Band::R, 1000.0),
            detection(10, Band::G, 100.0),
            detection(99, Band::Y, 1.0),
        ];
        let obs = join_sources(&sources, &detections).unwrap();
        assert_eq!(obs.len(), 2);
        assert_eq!(obs[0].dia_source_id, 10);
        assert_eq!(obs[0].band, Band::G);
        assert_relative_eq!(obs[0].mag, 26.4, epsilon = 1e-12);
        assert_relative_eq!(obs[0].mag_err, 0.01085736, epsilon = 1e-12);
        assert_eq!(obs[1].epoch, 60011.0);
        assert_relative_eq!(obs[1].mag, 23.9, epsilon = 1e-12);
    }

    #[test]
    fn test_join_missing_detection() {
        let sources = vec![source(1, 10, 5.0), source(1, 12, 6.0), source(1, 13, 6.0)];
        let detections = vec![detection(10, Band::R, 1000.0)];
        assert_eq!(
            join_sources(&sources, &detections),
            Err(SspError::JoinRowCountMismatch {
                sources: 3,
                joined: 1,
                first_missing: 12
            })
        );
    }

    #[test]
    fn test_join_duplicate_detection() {
        let sources = vec![source(1, 10, 5.0)];
        let detections = vec![detection(10, Band::R, 1000.0), detection(10, Band::G, 10.0)];
        let err = join_sources(&sources, &detections).unwrap_err();
        assert_eq!(err, SspError::DuplicateDetection(10));
        assert!(err.is_integrity_error());
    }
}
