//! # Dynamical quantities
//!
//! Orbit-derived fields of the object summary:
//!
//! * the Tisserand parameter with respect to Jupiter ([`tisserand_jupiter`]),
//! * the Earth MOID and related geometry ([`moid`]).
//!
//! Orbits come from an MPC-style catalog ([`OrbitCatalog`]) keyed by the unpacked primary
//! provisional designation. An object absent from the catalog keeps every dynamical field at
//! `NaN`; this is not an error.

use std::sync::Arc;

use crate::constants::{AstronomicalUnit, Degree, FastHashMap, Radian, JUPITER_SEMI_MAJOR_AXIS};
use keplerian_element::KeplerianElements;
use moid::{MoidResult, MoidSolver};

pub mod keplerian_element;
pub mod moid;

/// Tisserand parameter with respect to Jupiter.
///
/// ```text
/// T_J = a_J/a + 2·cos(i)·√((a/a_J)·(1 − e²))
/// ```
///
/// Arguments
/// -----------------
/// * `a`: semi-major axis (AU)
/// * `e`: eccentricity
/// * `i`: inclination (radians)
#[inline]
pub fn tisserand_jupiter(a: AstronomicalUnit, e: f64, i: Radian) -> f64 {
    let a_j = JUPITER_SEMI_MAJOR_AXIS;
    a_j / a + 2.0 * i.cos() * ((a / a_j) * (1.0 - e * e)).sqrt()
}

/// One row of an MPC orbit catalog. Angles are in degrees, as in the catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct MpcOrbit {
    pub designation: Arc<str>,
    /// Perihelion distance (AU)
    pub q: AstronomicalUnit,
    pub e: f64,
    pub i: Degree,
    pub node: Degree,
    pub argperi: Degree,
}

impl MpcOrbit {
    /// Semi-major axis `q / (1 − e)`.
    #[inline]
    pub fn semi_major_axis(&self) -> AstronomicalUnit {
        self.q / (1.0 - self.e)
    }

    pub fn to_elements(&self) -> KeplerianElements {
        KeplerianElements {
            perihelion_distance: self.q,
            eccentricity: self.e,
            inclination: self.i.to_radians(),
            ascending_node_longitude: self.node.to_radians(),
            periapsis_argument: self.argperi.to_radians(),
        }
    }

    pub fn tisserand_jupiter(&self) -> f64 {
        tisserand_jupiter(self.semi_major_axis(), self.e, self.i.to_radians())
    }
}

/// Orbit catalog indexed by designation.
///
/// When a designation appears more than once, the last row wins.
#[derive(Debug, Clone, Default)]
pub struct OrbitCatalog {
    orbits: FastHashMap<Arc<str>, MpcOrbit>,
}

impl OrbitCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, orbit: MpcOrbit) {
        self.orbits.insert(Arc::clone(&orbit.designation), orbit);
    }

    pub fn get(&self, designation: &str) -> Option<&MpcOrbit> {
        self.orbits.get(designation)
    }

    pub fn len(&self) -> usize {
        self.orbits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orbits.is_empty()
    }
}

impl FromIterator<MpcOrbit> for OrbitCatalog {
    fn from_iter<T: IntoIterator<Item = MpcOrbit>>(iter: T) -> Self {
        let mut catalog = OrbitCatalog::new();
        for orbit in iter {
            catalog.insert(orbit);
        }
        catalog
    }
}

/// Dynamical fields of one summary record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DynamicalSummary {
    pub tisserand_j: f64,
    pub moid_earth: MoidResult,
}

impl Default for DynamicalSummary {
    fn default() -> Self {
        DynamicalSummary {
            tisserand_j: f64::NAN,
            moid_earth: MoidResult::default(),
        }
    }
}

impl DynamicalSummary {
    /// Tisserand parameter and Earth MOID of one catalog orbit.
    pub fn compute<S: MoidSolver + ?Sized>(
        orbit: &MpcOrbit,
        solver: &S,
        reference: &KeplerianElements,
    ) -> Self {
        DynamicalSummary {
            tisserand_j: orbit.tisserand_jupiter(),
            moid_earth: solver.compute(reference, &orbit.to_elements()),
        }
    }
}

#[cfg(test)]
mod dynamics_test {
    use super::moid::{earth_orbit_j2000, GridMoidSolver};
    use super::*;
    use approx::assert_relative_eq;

    fn ceres() -> MpcOrbit {
        MpcOrbit {
            designation: Arc::from("A899 OF"),
            q: 2.5570,
            e: 0.0785,
            i: 10.588,
            node: 80.25,
            argperi: 73.30,
        }
    }

    #[test]
    fn test_tisserand_of_jupiter_is_three() {
        // a body on Jupiter's own circular, coplanar orbit
        assert_relative_eq!(
            tisserand_jupiter(JUPITER_SEMI_MAJOR_AXIS, 0.0, 0.0),
            3.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_main_belt_tisserand() {
        let t = ceres().tisserand_jupiter();
        // main-belt asteroids have T_J > 3
        assert!(t > 3.0 && t < 3.5, "T_J = {t}");
        assert_relative_eq!(ceres().semi_major_axis(), 2.7748, epsilon = 1e-3);
    }

    #[test]
    fn test_catalog_lookup() {
        let catalog: OrbitCatalog = vec![ceres()].into_iter().collect();
        assert_eq!(catalog.len(), 1);
        assert!(catalog.get("A899 OF").is_some());
        assert!(catalog.get("2024 XX").is_none());
    }

    #[test]
    fn test_dynamical_summary() {
        let dynamics =
            DynamicalSummary::compute(&ceres(), &GridMoidSolver::default(), &earth_orbit_j2000());
        assert!(dynamics.tisserand_j > 3.0);
        // Ceres never comes closer than ~1.5 AU to Earth's orbit
        assert!(dynamics.moid_earth.moid > 1.4 && dynamics.moid_earth.moid < 1.7);
        assert!(dynamics.moid_earth.delta_v > 0.0);

        let missing = DynamicalSummary::default();
        assert!(missing.tisserand_j.is_nan());
        assert!(missing.moid_earth.moid.is_nan());
    }
}
