//! Aggregation settings.
//!
//! [`AggregationParams`] gathers every knob of the per-object aggregation: the phase model
//! fitted in each band, the fitter controls, the minimum number of observations that triggers a
//! fit, the χ² multiplier written to the record and the discovery-date offset.
//!
//! ```rust
//! use hifitime::Duration;
//! use ssphot::photometry::models::PhaseModel;
//! use ssphot::ssobject::params::AggregationParams;
//!
//! let params = AggregationParams::builder()
//!     .model(PhaseModel::HG12Star)
//!     .discovery_delay(Duration::from_days(3.0))
//!     .build()
//!     .unwrap();
//! assert_eq!(params.min_obs_for_fit, 2);
//! ```

use hifitime::Duration;

use crate::constants::SECONDS_PER_DAY;
use crate::photometry::fit::FitParams;
use crate::photometry::models::PhaseModel;
use crate::ssp_errors::SspError;

/// Settings of the per-object aggregation.
///
/// Defaults
/// -----------------
/// * `model`: [`PhaseModel::HG12`]
/// * `fit`: [`FitParams::default`]
/// * `discovery_delay`: 7 days after the first observation
/// * `min_obs_for_fit`: 2
/// * `n_dof_reported`: 2 (the written `Chi2` is `χ²/dof × n_dof_reported`)
#[derive(Debug, Clone, PartialEq)]
pub struct AggregationParams {
    pub model: PhaseModel,
    pub fit: FitParams,
    /// Placeholder offset until the real submission date can be looked up.
    pub discovery_delay: Duration,
    pub min_obs_for_fit: usize,
    pub n_dof_reported: usize,
}

impl Default for AggregationParams {
    fn default() -> Self {
        AggregationParams {
            model: PhaseModel::HG12,
            fit: FitParams::default(),
            discovery_delay: Duration::from_days(7.0),
            min_obs_for_fit: 2,
            n_dof_reported: 2,
        }
    }
}

impl AggregationParams {
    pub fn builder() -> AggregationParamsBuilder {
        AggregationParamsBuilder::new()
    }

    /// Discovery delay expressed in days, the unit of MJD epochs.
    #[inline]
    pub fn discovery_delay_days(&self) -> f64 {
        self.discovery_delay.to_seconds() / SECONDS_PER_DAY
    }
}

/// Builder for [`AggregationParams`], with validation.
#[derive(Debug, Clone, Default)]
pub struct AggregationParamsBuilder {
    params: AggregationParams,
}

impl AggregationParamsBuilder {
    pub fn new() -> Self {
        Self {
            params: AggregationParams::default(),
        }
    }

    pub fn model(mut self, v: PhaseModel) -> Self {
        self.params.model = v;
        self
    }
    pub fn fit(mut self, v: FitParams) -> Self {
        self.params.fit = v;
        self
    }
    pub fn discovery_delay(mut self, v: Duration) -> Self {
        self.params.discovery_delay = v;
        self
    }
    pub fn min_obs_for_fit(mut self, v: usize) -> Self {
        self.params.min_obs_for_fit = v;
        self
    }
    pub fn n_dof_reported(mut self, v: usize) -> Self {
        self.params.n_dof_reported = v;
        self
    }

    /// Finalize the builder.
    ///
    /// Validation rules
    /// -----------------
    /// * `min_obs_for_fit ≥ 2`
    /// * `n_dof_reported ≥ 1`
    /// * `discovery_delay ≥ 0`
    pub fn build(self) -> Result<AggregationParams, SspError> {
        let p = &self.params;
        if p.min_obs_for_fit < 2 {
            return Err(SspError::InvalidAggregationParams(
                "min_obs_for_fit must be >= 2".into(),
            ));
        }
        if p.n_dof_reported == 0 {
            return Err(SspError::InvalidAggregationParams(
                "n_dof_reported must be >= 1".into(),
            ));
        }
        if p.discovery_delay < Duration::ZERO {
            return Err(SspError::InvalidAggregationParams(
                "discovery_delay must be non-negative".into(),
            ));
        }
        Ok(self.params)
    }
}
