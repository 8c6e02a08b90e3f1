//! # ssphot
//!
//! Absolute magnitudes and phase-curve slopes of solar-system objects from sparse survey
//! photometry, aggregated into one fixed-layout summary record per object.
//!
//! * [`photometry`] – IAU phase functions (HG, HG1G2, HG12, HG12*) and their fitting.
//! * [`observations`] – input rows and their integrity-checked join.
//! * [`ssobject`] – per-band and per-object aggregation, and the end-to-end pipeline.
//! * [`dynamics`] – Tisserand parameter and Earth MOID of catalog orbits.
//! * [`io`] – Parquet readers and writer.
//!
//! ## Features
//!
//! * `parallel` – aggregate objects on the `rayon` thread pool.
//! * `progress` – draw an `indicatif` progress bar over the object loop.

pub mod band;
pub mod constants;
pub mod conversion;
pub mod dynamics;
pub mod io;
pub mod observations;
pub mod photometry;
pub mod ssobject;
pub mod ssp_errors;
