//! # Asteroid photometry
//!
//! IAU phase-function systems and their least-squares fitting.
//!
//! Modules
//! -----------------
//! * [`spline`](crate::photometry::spline) – clamped cubic spline used to tabulate the HG1G2 basis.
//! * [`basis`](crate::photometry::basis) – `phi1`, `phi2`, `phi3` and the blended HG basis.
//! * [`models`](crate::photometry::models) – the four [`PhaseModel`](crate::photometry::models::PhaseModel)s.
//! * [`fit`](crate::photometry::fit) – Levenberg–Marquardt fitter returning a
//!   [`PhaseCurveFit`](crate::photometry::fit::PhaseCurveFit).
//!
//! Units
//! -----------------
//! Phase angles are **radians** inside the models and **degrees** at the fitter boundary, where
//! they are converted once.

pub mod basis;
pub mod fit;
pub mod models;
pub mod spline;
