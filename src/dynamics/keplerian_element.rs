//! # Keplerian orbital elements
//!
//! Conic orbital elements in the **perihelion-distance** form used by MPC orbit catalogs:
//!
//! 1. **q** – Perihelion distance (AU)
//! 2. **e** – Eccentricity (unitless, any conic)
//! 3. **i** – Inclination (radians)
//! 4. **Ω** – Longitude of ascending node (radians)
//! 5. **ω** – Argument of perihelion (radians)
//!
//! Using `q` instead of the semi-major axis keeps parabolic (`e = 1`) and hyperbolic orbits
//! representable. The heliocentric position and velocity at a given true anomaly ν follow from
//!
//! ```text
//! p = q·(1 + e),   r = p / (1 + e·cos ν)
//! r⃗ = R · r·(cos ν, sin ν, 0)
//! v⃗ = R · √(μ/p)·(−sin ν, e + cos ν, 0)
//! ```
//!
//! with `R = R_z(Ω)·R_x(i)·R_z(ω)` the perifocal → ecliptic rotation.
//!
//! ## Units
//!
//! - Lengths: **AU**
//! - Angles: **radians**
//! - Velocities: **AU/day** (heliocentric gravitational parameter `k²`)

use std::f64::consts::PI;

use nalgebra::{Rotation3, Vector3};

use crate::constants::{AstronomicalUnit, Radian, GAUSS_GRAV_SQUARED};

/// Keplerian orbital elements (osculating, two-body), perihelion form.
#[derive(Debug, PartialEq, Clone)]
pub struct KeplerianElements {
    pub perihelion_distance: AstronomicalUnit,
    pub eccentricity: f64,
    pub inclination: Radian,
    pub ascending_node_longitude: Radian,
    pub periapsis_argument: Radian,
}

impl KeplerianElements {
    /// Build the elements from a semi-major axis (elliptic orbits only).
    pub fn from_semi_major_axis(
        semi_major_axis: AstronomicalUnit,
        eccentricity: f64,
        inclination: Radian,
        ascending_node_longitude: Radian,
        periapsis_argument: Radian,
    ) -> Self {
        Self {
            perihelion_distance: semi_major_axis * (1.0 - eccentricity),
            eccentricity,
            inclination,
            ascending_node_longitude,
            periapsis_argument,
        }
    }

    /// Semi-major axis `q / (1 − e)`; negative for hyperbolic orbits, infinite for parabolic ones.
    #[inline]
    pub fn semi_major_axis(&self) -> AstronomicalUnit {
        self.perihelion_distance / (1.0 - self.eccentricity)
    }

    /// Semi-latus rectum `p = q·(1 + e)`.
    #[inline]
    pub fn semi_latus_rectum(&self) -> AstronomicalUnit {
        self.perihelion_distance * (1.0 + self.eccentricity)
    }

    #[inline]
    pub fn is_bound(&self) -> bool {
        self.eccentricity < 1.0
    }

    /// True when every element is finite and the conic is non-degenerate.
    pub fn is_valid(&self) -> bool {
        [
            self.perihelion_distance,
            self.eccentricity,
            self.inclination,
            self.ascending_node_longitude,
            self.periapsis_argument,
        ]
        .iter()
        .all(|v| v.is_finite())
            && self.perihelion_distance > 0.0
            && self.eccentricity >= 0.0
    }

    /// Admissible true-anomaly interval.
    ///
    /// `[−π, π]` for closed orbits; for open orbits the asymptote `acos(−1/e)` is excluded,
    /// the interval being shrunk by a factor `0.999` to stay at finite distance.
    pub fn true_anomaly_range(&self) -> (Radian, Radian) {
        if self.is_bound() {
            (-PI, PI)
        } else {
            let nu_max = 0.999 * (-1.0 / self.eccentricity).acos();
            (-nu_max, nu_max)
        }
    }

    /// Rotation from the perifocal frame to the ecliptic frame.
    pub fn orientation(&self) -> Rotation3<f64> {
        Rotation3::from_axis_angle(&Vector3::z_axis(), self.ascending_node_longitude)
            * Rotation3::from_axis_angle(&Vector3::x_axis(), self.inclination)
            * Rotation3::from_axis_angle(&Vector3::z_axis(), self.periapsis_argument)
    }

    /// Heliocentric position at true anomaly `nu`, in the perifocal frame.
    #[inline]
    pub fn perifocal_position(&self, nu: Radian) -> Vector3<f64> {
        let r = self.semi_latus_rectum() / (1.0 + self.eccentricity * nu.cos());
        Vector3::new(r * nu.cos(), r * nu.sin(), 0.0)
    }

    /// Heliocentric velocity at true anomaly `nu`, in the perifocal frame (AU/day).
    #[inline]
    pub fn perifocal_velocity(&self, nu: Radian) -> Vector3<f64> {
        let scale = (GAUSS_GRAV_SQUARED / self.semi_latus_rectum()).sqrt();
        Vector3::new(-scale * nu.sin(), scale * (self.eccentricity + nu.cos()), 0.0)
    }

    /// Heliocentric ecliptic position at true anomaly `nu`.
    #[cfg(test)]
    pub(crate) fn position(&self, nu: Radian) -> Vector3<f64> {
        self.orientation() * self.perifocal_position(nu)
    }

    /// Heliocentric ecliptic velocity at true anomaly `nu` (AU/day).
    #[cfg(test)]
    pub(crate) fn velocity(&self, nu: Radian) -> Vector3<f64> {
        self.orientation() * self.perifocal_velocity(nu)
    }
}
