//! # Constants and type definitions for ssphot
//!
//! This module centralizes the **physical constants**, **conversion factors**, and **common type
//! aliases** used throughout the crate.
//!
//! ## Overview
//!
//! - Astronomical constants (AU, Gaussian gravitational constant, Jupiter's semi-major axis)
//! - Unit conversions (degrees ↔ radians, days ↔ seconds)
//! - Photometric constants (AB zero point for nanojansky fluxes)
//! - Core type aliases used across the crate
//! - Sentinel values written into summary records for "not computed" fields

use ahash::RandomState;
use std::collections::HashMap;

// -------------------------------------------------------------------------------------------------
// Physical constants and unit conversions
// -------------------------------------------------------------------------------------------------

/// 2π, useful for trigonometric conversions
pub const DPI: f64 = 2. * std::f64::consts::PI;

/// Number of seconds in a Julian day
pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// Astronomical Unit in kilometers (IAU 2012)
pub const AU: f64 = 149_597_870.7;

/// Degrees → radians
pub const RADEG: f64 = std::f64::consts::PI / 180.0;

/// Gaussian gravitational constant k
pub const GAUSS_GRAV: f64 = 0.01720209895;

/// k², the heliocentric gravitational parameter in AU³/day²
pub const GAUSS_GRAV_SQUARED: f64 = GAUSS_GRAV * GAUSS_GRAV;

/// AU/day → km/s
pub const AU_PER_DAY_TO_KM_S: f64 = AU / SECONDS_PER_DAY;

/// Semi-major axis of Jupiter in AU, reference body for the Tisserand parameter
pub const JUPITER_SEMI_MAJOR_AXIS: f64 = 5.2026;

// -------------------------------------------------------------------------------------------------
// Photometry
// -------------------------------------------------------------------------------------------------

/// AB magnitude of a 1 nJy source: `m = 31.4 − 2.5·log10(f[nJy])`
pub const AB_ZERO_POINT_NJY: f64 = 31.4;

/// `2.5 / ln(10)`, first-order propagation factor from relative flux error to magnitude error
pub const MAG_ERR_FACTOR: f64 = 1.085736;

/// Value written into `Chi2` when no fit was attempted
pub const CHI2_NOT_COMPUTED: f64 = -1.0;

/// Value written into `nObsUsed` when the band has no observation at all
pub const NOBS_USED_NOT_COMPUTED: i32 = -1;

// -------------------------------------------------------------------------------------------------
// Type aliases
// -------------------------------------------------------------------------------------------------

/// Angle in degrees
pub type Degree = f64;
/// Angle in radians
pub type Radian = f64;
/// Magnitude (AB system)
pub type Magnitude = f64;
/// Flux density in nanojansky
pub type NanoJansky = f64;
/// Distance in astronomical units
pub type AstronomicalUnit = f64;
/// Modified Julian Date (days)
pub type MJD = f64;

/// Identifier of a solar system object in the SSSource/SSObject tables
pub type SsObjectId = u64;
/// Identifier of a difference-image detection
pub type DiaSourceId = u64;

/// Hash map using `ahash`, the hasher used for every lookup table in the crate.
pub type FastHashMap<K, V> = HashMap<K, V, RandomState>;
