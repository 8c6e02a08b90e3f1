//! # SSObject pipeline
//!
//! End-to-end construction of the [`ObjectSummaryRecord`] table from raw tables:
//!
//! 1. inner join of SSSource rows with DiaSource rows ([`join_sources`]), deriving AB magnitudes;
//!    any row-count change aborts the batch,
//! 2. stable sort by `ssObjectId` and partition into one contiguous group per object
//!    ([`group_by_object`]),
//! 3. preallocation of exactly one output slot per distinct object,
//! 4. per-object aggregation ([`aggregate_object`]),
//! 5. dynamical enrichment from the orbit catalog (Tisserand parameter, Earth MOID). Objects
//!    whose designation is not in the catalog keep `NaN` dynamical fields.
//!
//! Records come out in ascending `ssObjectId`, so two runs on the same tables produce identical
//! outputs.
//!
//! ## Features
//!
//! * `parallel` – objects are aggregated with `rayon`; the output order is unchanged.
//! * `progress` – an `indicatif` progress bar is drawn over the object loop.
//!
//! ## Example
//!
//! ```rust
//! use ssphot::dynamics::OrbitCatalog;
//! use ssphot::ssobject::params::AggregationParams;
//! use ssphot::ssobject::pipeline::SsObjectPipeline;
//!
//! let pipeline = SsObjectPipeline::new(AggregationParams::default());
//! let records = pipeline.compute(&[], &[], &OrbitCatalog::new()).unwrap();
//! assert!(records.is_empty());
//! ```

use log::{info, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::dynamics::keplerian_element::KeplerianElements;
use crate::dynamics::moid::{earth_orbit_j2000, GridMoidSolver, MoidSolver};
use crate::dynamics::{DynamicalSummary, OrbitCatalog};
use crate::observations::{join_sources, DetectionRow, Observation, SourceRow};
use crate::ssp_errors::SspError;

use super::params::AggregationParams;
use super::{aggregate_object, ObjectSummaryRecord};

#[cfg(feature = "progress")]
use super::progress_bar::object_progress_bar;
#[cfg(all(feature = "progress", not(feature = "parallel")))]
use super::progress_bar::{fmt_dur, IterTimer};

/// Sort observations by `ssObjectId` and split them into one slice per object.
///
/// The sort is stable: rows of one object keep their input order. Groups come out in
/// ascending `ssObjectId`.
pub fn group_by_object(observations: &mut [Observation]) -> Vec<&[Observation]> {
    observations.sort_by_key(|o| o.ss_object_id);
    observations
        .chunk_by(|a, b| a.ss_object_id == b.ss_object_id)
        .collect()
}

/// Object summary pipeline, generic over the MOID solver.
#[derive(Debug, Clone)]
pub struct SsObjectPipeline<S: MoidSolver = GridMoidSolver> {
    params: AggregationParams,
    solver: S,
    reference_orbit: KeplerianElements,
}

impl SsObjectPipeline<GridMoidSolver> {
    /// Pipeline with the default grid MOID solver against Earth's J2000 orbit.
    pub fn new(params: AggregationParams) -> Self {
        Self::with_solver(params, GridMoidSolver::default())
    }
}

impl<S: MoidSolver> SsObjectPipeline<S> {
    pub fn with_solver(params: AggregationParams, solver: S) -> Self {
        SsObjectPipeline {
            params,
            solver,
            reference_orbit: earth_orbit_j2000(),
        }
    }

    /// Replace the reference orbit of the MOID computation.
    pub fn reference_orbit(mut self, orbit: KeplerianElements) -> Self {
        self.reference_orbit = orbit;
        self
    }

    pub fn params(&self) -> &AggregationParams {
        &self.params
    }

    /// Build one summary record per distinct `ssObjectId`.
    ///
    /// Arguments
    /// -----------------
    /// * `sources`: SSSource rows.
    /// * `detections`: DiaSource rows referenced by `sources`.
    /// * `catalog`: orbit catalog used for the dynamical fields.
    ///
    /// Return
    /// ----------
    /// * The records, sorted by ascending `ssObjectId`.
    /// * An integrity error from the join; nothing is produced in that case.
    pub fn compute(
        &self,
        sources: &[SourceRow],
        detections: &[DetectionRow],
        catalog: &OrbitCatalog,
    ) -> Result<Vec<ObjectSummaryRecord>, SspError> {
        let mut observations = join_sources(sources, detections)?;
        info!(
            "Joined {} SSSource rows with {} DiaSource rows",
            sources.len(),
            detections.len()
        );

        let groups = group_by_object(&mut observations);
        info!(
            "Aggregating {} objects with the {} model",
            groups.len(),
            self.params.model
        );

        let results = self.aggregate_groups(&groups, catalog)?;

        let mut records = Vec::with_capacity(results.len());
        let mut unmatched = 0usize;
        for (record, matched) in results {
            if !matched {
                unmatched += 1;
            }
            records.push(record);
        }

        if unmatched > 0 {
            warn!(
                "{unmatched} of {} objects have no orbit in the catalog; dynamical fields left unset",
                records.len()
            );
        }
        info!(
            "Built {} SSObject records ({} with orbits)",
            records.len(),
            records.len() - unmatched
        );
        Ok(records)
    }

    /// Aggregate one object and attach its dynamics; the flag tells whether an orbit was found.
    fn process_group(
        &self,
        group: &[Observation],
        catalog: &OrbitCatalog,
    ) -> Result<(ObjectSummaryRecord, bool), SspError> {
        let builder = aggregate_object(group, &self.params)?;
        match catalog.get(builder.designation()) {
            Some(orbit) => {
                let dynamics = DynamicalSummary::compute(orbit, &self.solver, &self.reference_orbit);
                Ok((builder.dynamics(dynamics).build(), true))
            }
            None => Ok((builder.build(), false)),
        }
    }

    #[cfg(feature = "parallel")]
    fn aggregate_groups(
        &self,
        groups: &[&[Observation]],
        catalog: &OrbitCatalog,
    ) -> Result<Vec<(ObjectSummaryRecord, bool)>, SspError> {
        #[cfg(feature = "progress")]
        let pb = object_progress_bar(groups.len());

        let results = groups
            .par_iter()
            .map(|group| {
                let res = self.process_group(group, catalog);
                #[cfg(feature = "progress")]
                pb.inc(1);
                res
            })
            .collect();

        #[cfg(feature = "progress")]
        pb.finish_and_clear();
        results
    }

    #[cfg(not(feature = "parallel"))]
    fn aggregate_groups(
        &self,
        groups: &[&[Observation]],
        catalog: &OrbitCatalog,
    ) -> Result<Vec<(ObjectSummaryRecord, bool)>, SspError> {
        #[cfg(feature = "progress")]
        let pb = object_progress_bar(groups.len());
        #[cfg(feature = "progress")]
        let mut timer = IterTimer::new(0.2);

        let mut results = Vec::with_capacity(groups.len());
        for group in groups {
            results.push(self.process_group(group, catalog)?);

            #[cfg(feature = "progress")]
            {
                let last = timer.tick();
                pb.set_message(format!(
                    "last: {}, avg: {}",
                    fmt_dur(last),
                    fmt_dur(timer.avg())
                ));
                pb.inc(1);
            }
        }

        #[cfg(feature = "progress")]
        pb.finish_and_clear();
        Ok(results)
    }
}

/// Run the pipeline with default settings.
pub fn compute_ssobject(
    sources: &[SourceRow],
    detections: &[DetectionRow],
    catalog: &OrbitCatalog,
) -> Result<Vec<ObjectSummaryRecord>, SspError> {
    SsObjectPipeline::new(AggregationParams::default()).compute(sources, detections, catalog)
}
