//! # Phase-curve fitting
//!
//! Weighted nonlinear least squares of a [`PhaseModel`] against one object's observations in
//! one band, by a **Levenberg–Marquardt** iteration with a forward-difference Jacobian.
//!
//! ## Problem
//!
//! Minimize `Σ rᵢ²` with `rᵢ = (mᵢ − f(αᵢ; p)) / σᵢ`, where `m` are the observed magnitudes,
//! `σ` their 1-σ uncertainties and `α` the phase angles.
//!
//! ## Outputs
//!
//! * the parameter vector at convergence (`H` first),
//! * the covariance `(JᵀJ)⁻¹·s²` with `s² = Σrᵢ²/(N − p)` the residual variance
//!   (left unscaled when `N = p`),
//! * `χ²/dof = s²`,
//! * the number of observations actually used (rows with non-finite values or non-positive
//!   errors are dropped),
//! * a success indicator.
//!
//! ## Failure policy
//!
//! The fitter never returns an error. When the iteration does not converge, when the normal
//! matrix is singular at the solution, or when fewer usable points than parameters remain, the
//! result carries `success = false` and **`NaN` in every slope parameter** (and its
//! uncertainty). `H` keeps its best estimate once the iteration has started; when it never
//! starts (too few usable points, or a non-finite starting point) `H` is `NaN` as well.
//! Callers encode a failure on enough usable points as a per-band failure flag and treat
//! fewer usable points than parameters as insufficient data.
//!
//! ## Configuration
//!
//! Iteration controls live in [`FitParams`], built with [`FitParams::builder`].
//!
//! ```rust
//! use ssphot::photometry::fit::{fit_phase_curve, FitParams};
//! use ssphot::photometry::models::PhaseModel;
//!
//! let mag = [17.52, 17.80, 18.01, 18.33];
//! let err = [0.02, 0.03, 0.02, 0.04];
//! let phase_deg = [3.1, 8.7, 14.2, 21.9];
//!
//! let fit = fit_phase_curve(&mag, &err, &phase_deg, PhaseModel::HG12, None, &FitParams::default());
//! if fit.success {
//!     println!("H = {:.3} ± {:.3}, G12 = {:.3}", fit.h(), fit.h_err(), fit.slope());
//! }
//! ```

use std::cmp::Ordering::{Greater, Less};
use std::fmt;

use nalgebra::{DMatrix, DVector};
use smallvec::{smallvec, SmallVec};

use crate::constants::{Degree, Magnitude};
use crate::photometry::models::PhaseModel;
use crate::ssp_errors::SspError;

/// Parameter vector storage, inline for every supported model.
pub type ParamVec = SmallVec<[f64; 3]>;

/// Smallest accepted ratio between the extreme singular values of `JᵀJ`.
const RCOND_LIMIT: f64 = 1e-12;

/// Iteration controls of the Levenberg–Marquardt fitter.
///
/// Defaults
/// -----------------
/// * `max_iterations`: 200
/// * `initial_lambda`: 1e-3
/// * `lambda_up`: 10
/// * `lambda_down`: 0.1
/// * `ftol`: 1.49012e-8 (relative χ² reduction)
/// * `xtol`: 1.49012e-8 (relative step size)
/// * `jacobian_step`: √ε (relative forward-difference step)
/// * `initial_slope`: 0.1 (seed of every slope parameter)
#[derive(Debug, Clone, PartialEq)]
pub struct FitParams {
    pub max_iterations: usize,
    pub initial_lambda: f64,
    pub lambda_up: f64,
    pub lambda_down: f64,
    pub ftol: f64,
    pub xtol: f64,
    pub jacobian_step: f64,
    pub initial_slope: f64,
}

impl Default for FitParams {
    fn default() -> Self {
        FitParams {
            max_iterations: 200,
            initial_lambda: 1e-3,
            lambda_up: 10.0,
            lambda_down: 0.1,
            ftol: 1.49012e-8,
            xtol: 1.49012e-8,
            jacobian_step: f64::EPSILON.sqrt(),
            initial_slope: 0.1,
        }
    }
}

impl FitParams {
    pub fn builder() -> FitParamsBuilder {
        FitParamsBuilder::new()
    }
}

/// Builder for [`FitParams`], with validation.
#[derive(Debug, Clone, Default)]
pub struct FitParamsBuilder {
    params: FitParams,
}

impl FitParamsBuilder {
    pub fn new() -> Self {
        Self {
            params: FitParams::default(),
        }
    }

    pub fn max_iterations(mut self, v: usize) -> Self {
        self.params.max_iterations = v;
        self
    }
    pub fn initial_lambda(mut self, v: f64) -> Self {
        self.params.initial_lambda = v;
        self
    }
    pub fn lambda_up(mut self, v: f64) -> Self {
        self.params.lambda_up = v;
        self
    }
    pub fn lambda_down(mut self, v: f64) -> Self {
        self.params.lambda_down = v;
        self
    }
    pub fn ftol(mut self, v: f64) -> Self {
        self.params.ftol = v;
        self
    }
    pub fn xtol(mut self, v: f64) -> Self {
        self.params.xtol = v;
        self
    }
    pub fn jacobian_step(mut self, v: f64) -> Self {
        self.params.jacobian_step = v;
        self
    }
    pub fn initial_slope(mut self, v: f64) -> Self {
        self.params.initial_slope = v;
        self
    }

    /// Return true iff x > 0.0 and comparable (i.e., not NaN).
    #[inline]
    fn gt0(x: f64) -> bool {
        x.partial_cmp(&0.0) == Some(Greater)
    }

    /// Finalize the builder.
    ///
    /// Validation rules
    /// -----------------
    /// * `max_iterations ≥ 1`
    /// * `initial_lambda > 0`, `lambda_up > 1`, `0 < lambda_down < 1`
    /// * `ftol > 0`, `xtol > 0`, `jacobian_step > 0`
    /// * `initial_slope` finite
    pub fn build(self) -> Result<FitParams, SspError> {
        let p = &self.params;
        if p.max_iterations == 0 {
            return Err(SspError::InvalidFitParams(
                "max_iterations must be >= 1".into(),
            ));
        }
        if !Self::gt0(p.initial_lambda) {
            return Err(SspError::InvalidFitParams(
                "initial_lambda must be > 0".into(),
            ));
        }
        if p.lambda_up.partial_cmp(&1.0) != Some(Greater) {
            return Err(SspError::InvalidFitParams("lambda_up must be > 1".into()));
        }
        if !Self::gt0(p.lambda_down) || p.lambda_down.partial_cmp(&1.0) != Some(Less) {
            return Err(SspError::InvalidFitParams(
                "lambda_down must be in (0, 1)".into(),
            ));
        }
        if !Self::gt0(p.ftol) || !Self::gt0(p.xtol) {
            return Err(SspError::InvalidFitParams(
                "ftol and xtol must be > 0".into(),
            ));
        }
        if !Self::gt0(p.jacobian_step) {
            return Err(SspError::InvalidFitParams(
                "jacobian_step must be > 0".into(),
            ));
        }
        if !p.initial_slope.is_finite() {
            return Err(SspError::InvalidFitParams(
                "initial_slope must be finite".into(),
            ));
        }
        Ok(self.params)
    }
}

/// Result of one phase-curve fit.
#[derive(Debug, Clone)]
pub struct PhaseCurveFit {
    pub model: PhaseModel,
    /// Fitted parameters, `H` first. Slopes are `NaN` when `success` is false.
    pub params: ParamVec,
    /// 1-σ uncertainties, `sqrt(diag(covariance))`.
    pub param_errors: ParamVec,
    /// Parameter covariance matrix (`n_params × n_params`).
    pub covariance: DMatrix<f64>,
    /// Reduced χ² (`NaN` when there are no degrees of freedom).
    pub chi2_dof: f64,
    /// Number of observations entering the fit.
    pub n_obs_used: usize,
    pub iterations: usize,
    pub success: bool,
}

impl PhaseCurveFit {
    /// Absolute magnitude.
    #[inline]
    pub fn h(&self) -> Magnitude {
        self.params[0]
    }

    #[inline]
    pub fn h_err(&self) -> f64 {
        self.param_errors[0]
    }

    /// First slope parameter (G, G1 or G12 depending on the model).
    #[inline]
    pub fn slope(&self) -> f64 {
        self.params[1]
    }

    #[inline]
    pub fn slope_err(&self) -> f64 {
        self.param_errors[1]
    }

    /// Covariance between `H` and the first slope parameter.
    #[inline]
    pub fn h_slope_cov(&self) -> f64 {
        self.covariance[(0, 1)]
    }

    /// Total χ², i.e. `χ²/dof × n_dof`.
    #[inline]
    pub fn chi2(&self, n_dof: usize) -> f64 {
        self.chi2_dof * n_dof as f64
    }

    fn failed(model: PhaseModel, h: f64, n_obs_used: usize, iterations: usize) -> Self {
        let p = model.n_params();
        let mut params: ParamVec = smallvec![f64::NAN; p];
        params[0] = h;
        PhaseCurveFit {
            model,
            params,
            param_errors: smallvec![f64::NAN; p],
            covariance: DMatrix::from_element(p, p, f64::NAN),
            chi2_dof: f64::NAN,
            n_obs_used,
            iterations,
            success: false,
        }
    }
}

impl fmt::Display for PhaseCurveFit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} fit [{}] H = {:.4} ± {:.4}",
            self.model,
            if self.success { "ok" } else { "failed" },
            self.h(),
            self.h_err()
        )?;
        for (k, (p, e)) in self
            .params
            .iter()
            .zip(self.param_errors.iter())
            .enumerate()
            .skip(1)
        {
            write!(f, ", p{k} = {p:.4} ± {e:.4}")?;
        }
        write!(
            f,
            ", χ²/dof = {:.3}, nObs = {}",
            self.chi2_dof, self.n_obs_used
        )
    }
}

/// Usable rows of one band, phase angles already in radians.
struct FitData {
    mag: Vec<f64>,
    err: Vec<f64>,
    phase: Vec<f64>,
}

impl FitData {
    fn new(mag: &[Magnitude], mag_err: &[f64], phase_deg: &[Degree]) -> Self {
        let n = mag.len().min(mag_err.len()).min(phase_deg.len());
        let mut data = FitData {
            mag: Vec::with_capacity(n),
            err: Vec::with_capacity(n),
            phase: Vec::with_capacity(n),
        };
        for i in 0..n {
            let (m, s, a) = (mag[i], mag_err[i], phase_deg[i]);
            if m.is_finite() && s.is_finite() && s > 0.0 && a.is_finite() {
                data.mag.push(m);
                data.err.push(s);
                data.phase.push(a.to_radians());
            }
        }
        data
    }

    fn len(&self) -> usize {
        self.mag.len()
    }

    /// Weighted residuals `(m − f)/σ`, reusing `pred` as scratch.
    fn residuals(&self, model: PhaseModel, params: &[f64], pred: &mut Vec<f64>) -> DVector<f64> {
        model.evaluate_into(&self.phase, params, pred);
        DVector::from_iterator(
            self.len(),
            self.mag
                .iter()
                .zip(self.err.iter())
                .zip(pred.iter())
                .map(|((m, s), f)| (m - f) / s),
        )
    }

    /// Forward-difference Jacobian of the weighted residuals.
    fn jacobian(
        &self,
        model: PhaseModel,
        params: &DVector<f64>,
        residuals: &DVector<f64>,
        rel_step: f64,
        pred: &mut Vec<f64>,
    ) -> DMatrix<f64> {
        let n_par = params.len();
        let mut jac = DMatrix::<f64>::zeros(self.len(), n_par);
        let mut shifted = params.clone();
        for j in 0..n_par {
            let h = if params[j] == 0.0 {
                rel_step
            } else {
                rel_step * params[j].abs()
            };
            shifted[j] = params[j] + h;
            let r_shift = self.residuals(model, shifted.as_slice(), pred);
            jac.set_column(j, &((r_shift - residuals) / h));
            shifted[j] = params[j];
        }
        jac
    }
}

/// Solve the symmetric positive system `a·x = b`, Cholesky first, LU as fallback.
fn solve_normal(a: DMatrix<f64>, b: &DVector<f64>) -> Option<DVector<f64>> {
    match a.clone().cholesky() {
        Some(chol) => Some(chol.solve(b)),
        None => a.lu().solve(b),
    }
}

/// Inverse of the normal matrix `JᵀJ`, `None` when it is numerically singular.
fn invert_normal(a: DMatrix<f64>) -> Option<DMatrix<f64>> {
    let sv = a.clone().singular_values();
    if !(sv.min() > RCOND_LIMIT * sv.max()) {
        return None;
    }
    let inv = match a.clone().cholesky() {
        Some(chol) => chol.inverse(),
        None => a.try_inverse()?,
    };
    inv.iter().all(|v| v.is_finite()).then_some(inv)
}

/// Fit a phase-curve model to one object's observations in one band.
///
/// Arguments
/// -----------------
/// * `mag`: observed magnitudes.
/// * `mag_err`: 1-σ magnitude uncertainties, used as weights.
/// * `phase_deg`: phase angles in **degrees** (converted to radians internally).
/// * `model`: phase-function system to fit.
/// * `initial`: optional starting point (`H` first, `model.n_params()` entries). When `None`,
///   `H` is seeded with the first usable magnitude and every slope with
///   [`FitParams::initial_slope`].
/// * `params`: iteration controls.
///
/// Return
/// ----------
/// * A [`PhaseCurveFit`]; see the module documentation for the failure encoding.
pub fn fit_phase_curve(
    mag: &[Magnitude],
    mag_err: &[f64],
    phase_deg: &[Degree],
    model: PhaseModel,
    initial: Option<&[f64]>,
    params: &FitParams,
) -> PhaseCurveFit {
    let data = FitData::new(mag, mag_err, phase_deg);
    let n_obs = data.len();
    let n_par = model.n_params();

    let mut p: DVector<f64> = match initial {
        Some(init) if init.len() >= n_par => DVector::from_column_slice(&init[..n_par]),
        _ => {
            let h0 = data.mag.first().copied().unwrap_or(f64::NAN);
            let mut v = DVector::from_element(n_par, params.initial_slope);
            v[0] = h0;
            v
        }
    };

    // no iteration ran, so no H estimate either
    if n_obs < n_par || !p.iter().all(|v| v.is_finite()) {
        return PhaseCurveFit::failed(model, f64::NAN, n_obs, 0);
    }

    let mut pred = Vec::with_capacity(n_obs);
    let mut r = data.residuals(model, p.as_slice(), &mut pred);
    let mut chi2 = r.norm_squared();
    if !chi2.is_finite() {
        return PhaseCurveFit::failed(model, f64::NAN, n_obs, 0);
    }

    let mut lambda = params.initial_lambda;
    let mut converged = chi2 == 0.0;
    let mut iterations = 0;

    'outer: while !converged && iterations < params.max_iterations {
        iterations += 1;

        let jac = data.jacobian(model, &p, &r, params.jacobian_step, &mut pred);
        let jtj = jac.transpose() * &jac;
        let neg_grad = -(jac.transpose() * &r);

        loop {
            let mut damped = jtj.clone();
            for k in 0..n_par {
                let d = jtj[(k, k)];
                damped[(k, k)] += lambda * if d > 0.0 { d } else { 1.0 };
            }

            let Some(delta) = solve_normal(damped, &neg_grad) else {
                lambda *= params.lambda_up;
                if lambda > 1e16 {
                    break 'outer;
                }
                continue;
            };

            let small_step = delta.norm() <= params.xtol * (p.norm() + params.xtol);
            let trial = &p + &delta;
            let r_trial = data.residuals(model, trial.as_slice(), &mut pred);
            let chi2_trial = r_trial.norm_squared();

            if chi2_trial.is_finite() && chi2_trial < chi2 {
                let reduction = (chi2 - chi2_trial) / chi2;
                p = trial;
                r = r_trial;
                chi2 = chi2_trial;
                lambda = (lambda * params.lambda_down).max(f64::MIN_POSITIVE);
                if reduction <= params.ftol || small_step || chi2 == 0.0 {
                    converged = true;
                }
                break;
            }

            if small_step {
                // no productive step left at this resolution: stationary point
                converged = true;
                break;
            }

            lambda *= params.lambda_up;
            if lambda > 1e16 {
                break 'outer;
            }
        }
    }

    if !converged || !p.iter().all(|v| v.is_finite()) {
        return PhaseCurveFit::failed(model, p[0], n_obs, iterations);
    }

    let jac = data.jacobian(model, &p, &r, params.jacobian_step, &mut pred);
    let Some(jtj_inv) = invert_normal(jac.transpose() * &jac) else {
        return PhaseCurveFit::failed(model, p[0], n_obs, iterations);
    };

    let dof = n_obs - n_par;
    let (covariance, chi2_dof) = if dof > 0 {
        let s2 = chi2 / dof as f64;
        (jtj_inv * s2, s2)
    } else {
        (jtj_inv, f64::NAN)
    };

    let param_errors: ParamVec = (0..n_par).map(|k| covariance[(k, k)].sqrt()).collect();

    PhaseCurveFit {
        model,
        params: p.iter().copied().collect(),
        param_errors,
        covariance,
        chi2_dof,
        n_obs_used: n_obs,
        iterations,
        success: true,
    }
}
