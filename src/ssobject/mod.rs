//! # Per-object summary records
//!
//! Reduction of one object's observations to a fixed-layout [`ObjectSummaryRecord`]:
//!
//! * one [`BandSummary`] per filter `u g r i z y`, always present, even for bands without data,
//! * band-agnostic fields (first observation, arc, extendedness statistics, observation count),
//! * a `flags` bitmask with one bit per band whose phase-curve fit was attempted and failed,
//! * dynamical fields ([`DynamicalSummary`]), attached afterwards from the orbit catalog.
//!
//! ## Per-band policy
//!
//! | observations in band | outcome | `nObsUsed` | flag bit |
//! |---|---|---|---|
//! | 0 | [`BandStatus::Empty`], fit fields at sentinels | `-1` | no |
//! | 1 (below `min_obs_for_fit`) | [`BandStatus::Insufficient`], phase-angle range only | `0` | no |
//! | ≥ `min_obs_for_fit`, fewer usable rows than model parameters | [`BandStatus::Insufficient`], phase-angle range only | `0` | no |
//! | ≥ `min_obs_for_fit` | fit; [`BandStatus::Fitted`] or [`BandStatus::Failed`] | rows used | if slope is `NaN` |
//!
//! A row is usable when its magnitude, error and phase angle are finite and the error is
//! positive. Non-positive fluxes convert to `NaN` magnitudes and are not usable.
//!
//! Sentinels are `NaN` for every float fit field and `-1` for `Chi2`.
//!
//! ## Assembly
//!
//! [`aggregate_object`] returns an [`ObjectRecordBuilder`]; dynamics are attached with
//! [`ObjectRecordBuilder::dynamics`] and [`ObjectRecordBuilder::build`] produces the immutable
//! record. Each call only reads its own observation group, so objects can be aggregated in any
//! order or in parallel.

use std::sync::Arc;

use itertools::{Itertools, MinMaxResult};
use log::debug;
use smallvec::SmallVec;

use crate::band::Band;
use crate::constants::{
    Degree, Magnitude, SsObjectId, CHI2_NOT_COMPUTED, MJD, NOBS_USED_NOT_COMPUTED,
};
use crate::dynamics::DynamicalSummary;
use crate::observations::Observation;
use crate::photometry::fit::fit_phase_curve;
use crate::ssp_errors::SspError;
use params::AggregationParams;

pub mod params;
pub mod pipeline;
#[cfg(feature = "progress")]
pub(crate) mod progress_bar;

/// What happened to one band of one object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BandStatus {
    /// No observation in this band.
    #[default]
    Empty,
    /// Too few observations to constrain the model; not a failure.
    Insufficient,
    Fitted,
    /// Fit attempted, slope parameter came out `NaN`.
    Failed,
}

/// Photometric fields of one band.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandSummary {
    pub n_obs: u32,
    pub phase_angle_min: Degree,
    pub phase_angle_max: Degree,
    pub h: Magnitude,
    pub h_err: f64,
    /// First slope parameter of the fitted model (`G12` for the default model).
    pub g12: f64,
    pub g12_err: f64,
    pub h_g12_cov: f64,
    /// `χ²/dof × n_dof_reported`, or `-1` when no fit was attempted.
    pub chi2: f64,
    pub n_obs_used: i32,
    pub status: BandStatus,
}

impl Default for BandSummary {
    fn default() -> Self {
        BandSummary {
            n_obs: 0,
            phase_angle_min: f64::NAN,
            phase_angle_max: f64::NAN,
            h: f64::NAN,
            h_err: f64::NAN,
            g12: f64::NAN,
            g12_err: f64::NAN,
            h_g12_cov: f64::NAN,
            chi2: CHI2_NOT_COMPUTED,
            n_obs_used: NOBS_USED_NOT_COMPUTED,
            status: BandStatus::Empty,
        }
    }
}

impl BandSummary {
    #[inline]
    pub fn fit_failed(&self) -> bool {
        self.status == BandStatus::Failed
    }
}

/// Min and max of the non-`NaN` values, `(NaN, NaN)` when there are none.
fn nan_minmax(values: impl Iterator<Item = f64>) -> (f64, f64) {
    match values.filter(|v| !v.is_nan()).minmax_by(|a, b| a.total_cmp(b)) {
        MinMaxResult::NoElements => (f64::NAN, f64::NAN),
        MinMaxResult::OneElement(v) => (v, v),
        MinMaxResult::MinMax(lo, hi) => (lo, hi),
    }
}

/// Median of the non-`NaN` values, `NaN` when there are none.
fn nan_median(values: impl Iterator<Item = f64>) -> f64 {
    let mut v: Vec<f64> = values.filter(|v| !v.is_nan()).collect();
    if v.is_empty() {
        return f64::NAN;
    }
    v.sort_unstable_by(f64::total_cmp);
    let mid = v.len() / 2;
    if v.len() % 2 == 0 {
        0.5 * (v[mid - 1] + v[mid])
    } else {
        v[mid]
    }
}

/// Summarize one object's observations in one band.
///
/// Arguments
/// -----------------
/// * `band_obs`: observations of a single object, all in the same band.
/// * `params`: aggregation settings (model, fitter controls, thresholds).
pub fn aggregate_band(band_obs: &[&Observation], params: &AggregationParams) -> BandSummary {
    let mut summary = BandSummary {
        n_obs: band_obs.len() as u32,
        ..BandSummary::default()
    };
    if band_obs.is_empty() {
        return summary;
    }

    (summary.phase_angle_min, summary.phase_angle_max) =
        nan_minmax(band_obs.iter().map(|o| o.phase_angle));

    if band_obs.len() < params.min_obs_for_fit {
        summary.n_obs_used = 0;
        summary.status = BandStatus::Insufficient;
        return summary;
    }

    let mag: Vec<Magnitude> = band_obs.iter().map(|o| o.mag).collect();
    let mag_err: Vec<f64> = band_obs.iter().map(|o| o.mag_err).collect();
    let phase: Vec<Degree> = band_obs.iter().map(|o| o.phase_angle).collect();

    let fit = fit_phase_curve(&mag, &mag_err, &phase, params.model, None, &params.fit);

    // negative fluxes give NaN magnitudes, which the fitter drops
    if fit.n_obs_used < params.model.n_params() {
        debug!(
            "{} of {} rows usable, band left unfitted",
            fit.n_obs_used,
            band_obs.len()
        );
        summary.n_obs_used = 0;
        summary.status = BandStatus::Insufficient;
        return summary;
    }

    summary.h = fit.h();
    summary.h_err = fit.h_err();
    summary.g12 = fit.slope();
    summary.g12_err = fit.slope_err();
    summary.h_g12_cov = fit.h_slope_cov();
    summary.chi2 = fit.chi2(params.n_dof_reported);
    summary.n_obs_used = fit.n_obs_used as i32;
    summary.status = if summary.g12.is_nan() {
        BandStatus::Failed
    } else {
        BandStatus::Fitted
    };
    summary
}

/// Fixed-layout summary of one solar-system object.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectSummaryRecord {
    pub ss_object_id: SsObjectId,
    /// Unpacked primary provisional designation.
    pub designation: Arc<str>,
    pub first_observation_date: MJD,
    pub discovery_submission_date: MJD,
    /// Time between the first and last observation, in days.
    pub arc: f64,
    pub n_obs: u32,
    /// Indexed by [`Band::index`].
    pub bands: [BandSummary; Band::COUNT],
    pub extendedness_min: f64,
    pub extendedness_max: f64,
    pub extendedness_median: f64,
    /// One [`Band::flag`] bit per band whose fit failed.
    pub flags: u64,
    pub dynamics: DynamicalSummary,
}

impl ObjectSummaryRecord {
    #[inline]
    pub fn band(&self, band: Band) -> &BandSummary {
        &self.bands[band.index()]
    }
}

/// Photometric part of an [`ObjectSummaryRecord`], waiting for its dynamical fields.
#[derive(Debug, Clone)]
pub struct ObjectRecordBuilder {
    record: ObjectSummaryRecord,
}

impl ObjectRecordBuilder {
    pub fn ss_object_id(&self) -> SsObjectId {
        self.record.ss_object_id
    }

    pub fn designation(&self) -> &str {
        &self.record.designation
    }

    pub fn dynamics(mut self, dynamics: DynamicalSummary) -> Self {
        self.record.dynamics = dynamics;
        self
    }

    /// Finish the record; dynamical fields stay `NaN` unless set.
    pub fn build(self) -> ObjectSummaryRecord {
        self.record
    }
}

/// Aggregate all observations of one object.
///
/// Arguments
/// -----------------
/// * `group`: every observation of the object, in any order and any band.
/// * `params`: aggregation settings.
///
/// Return
/// ----------
/// * An [`ObjectRecordBuilder`] with every photometric and band-agnostic field set.
/// * [`SspError::EmptyObjectGroup`] when `group` is empty.
/// * [`SspError::MixedObjectGroup`] when `group` holds more than one `ssObjectId`.
pub fn aggregate_object(
    group: &[Observation],
    params: &AggregationParams,
) -> Result<ObjectRecordBuilder, SspError> {
    let first = group.first().ok_or(SspError::EmptyObjectGroup)?;
    let ss_object_id = first.ss_object_id;
    if let Some(other) = group.iter().find(|o| o.ss_object_id != ss_object_id) {
        return Err(SspError::MixedObjectGroup {
            expected: ss_object_id,
            found: other.ss_object_id,
        });
    }

    let mut per_band: [SmallVec<[&Observation; 16]>; Band::COUNT] = Default::default();
    for obs in group {
        per_band[obs.band.index()].push(obs);
    }

    let mut bands = [BandSummary::default(); Band::COUNT];
    let mut flags = 0u64;
    for band in Band::ALL {
        let summary = aggregate_band(&per_band[band.index()], params);
        if summary.fit_failed() {
            debug!(
                "ssObjectId {ss_object_id}: {} fit failed in band {band} ({} observations)",
                params.model, summary.n_obs
            );
            flags |= band.flag();
        }
        bands[band.index()] = summary;
    }

    let (first_epoch, last_epoch) = nan_minmax(group.iter().map(|o| o.epoch));
    let (extendedness_min, extendedness_max) = nan_minmax(group.iter().map(|o| o.extendedness));

    Ok(ObjectRecordBuilder {
        record: ObjectSummaryRecord {
            ss_object_id,
            designation: Arc::clone(&first.designation),
            first_observation_date: first_epoch,
            discovery_submission_date: first_epoch + params.discovery_delay_days(),
            arc: last_epoch - first_epoch,
            n_obs: group.len() as u32,
            bands,
            extendedness_min,
            extendedness_max,
            extendedness_median: nan_median(group.iter().map(|o| o.extendedness)),
            flags,
            dynamics: DynamicalSummary::default(),
        },
    })
}
