//! # Minimum Orbit Intersection Distance
//!
//! The [`MoidSolver`] trait is the contract of an orbit-intersection solver: given a reference
//! orbit (Earth) and a target orbit, return the minimum separation between the two curves, the
//! relative speed of the two bodies placed at the closest points, the ecliptic longitude of the
//! closest point on the target orbit, and the true anomalies of both closest points.
//!
//! Solvers must be deterministic and hold no mutable state, so one instance can be shared by
//! every worker of a parallel aggregation.
//!
//! [`GridMoidSolver`] is the bundled implementation: a coarse scan over both true anomalies,
//! followed by nested grid refinements around the best local minima.

use nalgebra::{Rotation3, Vector3};

use crate::constants::{AstronomicalUnit, Degree, Radian, AU_PER_DAY_TO_KM_S, DPI, RADEG};
use crate::dynamics::keplerian_element::KeplerianElements;

/// Output of a MOID computation. Every field is `NaN` when not computed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoidResult {
    /// Minimum distance between the two orbits (AU).
    pub moid: AstronomicalUnit,
    /// Relative speed of the two bodies at the closest points (km/s).
    pub delta_v: f64,
    /// Ecliptic longitude of the closest point of the target orbit (degrees, `[0, 360)`).
    pub ecliptic_longitude: Degree,
    /// True anomaly of the closest point on the reference orbit (degrees, `[0, 360)`).
    pub true_anomaly_reference: Degree,
    /// True anomaly of the closest point on the target orbit (degrees, `[0, 360)`).
    pub true_anomaly_object: Degree,
}

impl Default for MoidResult {
    fn default() -> Self {
        MoidResult {
            moid: f64::NAN,
            delta_v: f64::NAN,
            ecliptic_longitude: f64::NAN,
            true_anomaly_reference: f64::NAN,
            true_anomaly_object: f64::NAN,
        }
    }
}

/// Orbit-intersection solver contract.
///
/// Implementations are shared across worker threads and must not keep per-call state.
pub trait MoidSolver: Send + Sync {
    /// Compute the MOID between `reference` and `target`. Invalid inputs yield
    /// [`MoidResult::default`].
    fn compute(&self, reference: &KeplerianElements, target: &KeplerianElements) -> MoidResult;
}

/// Two-level grid search MOID solver.
///
/// * `coarse_steps` – samples per orbit in the initial scan (default 360).
/// * `candidates` – number of coarse local minima refined (default 4).
/// * `refine_levels` – nested refinements of a 11 × 11 grid, each dividing the step by 5
///   (default 8, i.e. a final step below 1e-7 rad).
#[derive(Debug, Clone)]
pub struct GridMoidSolver {
    pub coarse_steps: usize,
    pub candidates: usize,
    pub refine_levels: usize,
    half_width: usize,
}

impl Default for GridMoidSolver {
    fn default() -> Self {
        GridMoidSolver {
            coarse_steps: 360,
            candidates: 4,
            refine_levels: 8,
            half_width: 5,
        }
    }
}

/// Sampled orbit, with its orientation matrix computed once.
struct OrbitSampler<'a> {
    elements: &'a KeplerianElements,
    rotation: Rotation3<f64>,
    lo: Radian,
    hi: Radian,
}

impl<'a> OrbitSampler<'a> {
    fn new(elements: &'a KeplerianElements) -> Self {
        let (lo, hi) = elements.true_anomaly_range();
        Self {
            elements,
            rotation: elements.orientation(),
            lo,
            hi,
        }
    }

    #[inline]
    fn position(&self, nu: Radian) -> Vector3<f64> {
        self.rotation * self.elements.perifocal_position(nu)
    }

    #[inline]
    fn velocity(&self, nu: Radian) -> Vector3<f64> {
        self.rotation * self.elements.perifocal_velocity(nu)
    }

    /// Keep `nu` inside the admissible interval of open orbits.
    #[inline]
    fn clamp(&self, nu: Radian) -> Radian {
        if self.elements.is_bound() {
            nu
        } else {
            nu.clamp(self.lo, self.hi)
        }
    }

    fn step(&self, n: usize) -> Radian {
        (self.hi - self.lo) / n as f64
    }

    fn samples(&self, n: usize) -> Vec<(Radian, Vector3<f64>)> {
        let step = self.step(n);
        (0..n)
            .map(|k| {
                let nu = self.lo + (k as f64 + 0.5) * step;
                (nu, self.position(nu))
            })
            .collect()
    }
}

#[inline]
fn to_unit_degrees(angle: Radian) -> Degree {
    angle.rem_euclid(DPI) / RADEG
}

impl GridMoidSolver {
    pub fn new(coarse_steps: usize, candidates: usize, refine_levels: usize) -> Self {
        Self {
            coarse_steps: coarse_steps.max(8),
            candidates: candidates.max(1),
            refine_levels,
            half_width: 5,
        }
    }

    /// Local minima of the coarse distance profile along the target orbit.
    fn coarse_candidates(
        &self,
        reference: &OrbitSampler,
        target: &OrbitSampler,
    ) -> Vec<(f64, Radian, Radian)> {
        let ref_pts = reference.samples(self.coarse_steps);
        let tgt_pts = target.samples(self.coarse_steps);

        let profile: Vec<(f64, Radian, Radian)> = tgt_pts
            .iter()
            .map(|(nu_t, p_t)| {
                ref_pts
                    .iter()
                    .map(|(nu_r, p_r)| ((p_t - p_r).norm_squared(), *nu_r, *nu_t))
                    .fold((f64::INFINITY, 0.0, 0.0), |best, c| {
                        if c.0 < best.0 {
                            c
                        } else {
                            best
                        }
                    })
            })
            .collect();

        let n = profile.len();
        let closed = target.elements.is_bound();
        let mut minima: Vec<(f64, Radian, Radian)> = (0..n)
            .filter(|&k| {
                let prev = if k > 0 {
                    Some(profile[k - 1].0)
                } else if closed {
                    Some(profile[n - 1].0)
                } else {
                    None
                };
                let next = if k + 1 < n {
                    Some(profile[k + 1].0)
                } else if closed {
                    Some(profile[0].0)
                } else {
                    None
                };
                prev.map_or(true, |d| profile[k].0 <= d) && next.map_or(true, |d| profile[k].0 <= d)
            })
            .map(|k| profile[k])
            .collect();

        minima.sort_by(|a, b| a.0.total_cmp(&b.0));
        minima.truncate(self.candidates);
        minima
    }

    /// Nested grid refinement around one candidate pair of anomalies.
    fn refine(
        &self,
        reference: &OrbitSampler,
        target: &OrbitSampler,
        start: (f64, Radian, Radian),
    ) -> (f64, Radian, Radian) {
        let (mut best_d2, mut best_r, mut best_t) = start;
        let mut step_r = reference.step(self.coarse_steps);
        let mut step_t = target.step(self.coarse_steps);
        let hw = self.half_width as i64;

        for _ in 0..self.refine_levels {
            let (center_r, center_t) = (best_r, best_t);
            for i in -hw..=hw {
                let nu_r = reference.clamp(center_r + i as f64 * step_r);
                let p_r = reference.position(nu_r);
                for j in -hw..=hw {
                    let nu_t = target.clamp(center_t + j as f64 * step_t);
                    let d2 = (target.position(nu_t) - p_r).norm_squared();
                    if d2 < best_d2 {
                        best_d2 = d2;
                        best_r = nu_r;
                        best_t = nu_t;
                    }
                }
            }
            step_r *= 2.0 / (2 * hw) as f64;
            step_t *= 2.0 / (2 * hw) as f64;
        }

        (best_d2, best_r, best_t)
    }
}

impl MoidSolver for GridMoidSolver {
    fn compute(&self, reference: &KeplerianElements, target: &KeplerianElements) -> MoidResult {
        if !reference.is_valid() || !target.is_valid() {
            return MoidResult::default();
        }

        let ref_orbit = OrbitSampler::new(reference);
        let tgt_orbit = OrbitSampler::new(target);

        let best = self
            .coarse_candidates(&ref_orbit, &tgt_orbit)
            .into_iter()
            .map(|c| self.refine(&ref_orbit, &tgt_orbit, c))
            .min_by(|a, b| a.0.total_cmp(&b.0));

        let Some((d2, nu_r, nu_t)) = best else {
            return MoidResult::default();
        };

        let p_t = tgt_orbit.position(nu_t);
        let delta_v = (tgt_orbit.velocity(nu_t) - ref_orbit.velocity(nu_r)).norm();

        MoidResult {
            moid: d2.sqrt(),
            delta_v: delta_v * AU_PER_DAY_TO_KM_S,
            ecliptic_longitude: to_unit_degrees(p_t.y.atan2(p_t.x)),
            true_anomaly_reference: to_unit_degrees(nu_r),
            true_anomaly_object: to_unit_degrees(nu_t),
        }
    }
}

/// Earth's heliocentric orbit, J2000 mean ecliptic elements.
///
/// `a = 1.00000261 AU`, `e = 0.01671123`, longitude of perihelion `ϖ = 102.93768193°`. The
/// inclination is taken as zero, so the node is placed at `Ω = 0` and `ω = ϖ`.
pub fn earth_orbit_j2000() -> KeplerianElements {
    KeplerianElements::from_semi_major_axis(1.00000261, 0.01671123, 0.0, 0.0, 102.93768193 * RADEG)
}

#[cfg(test)]
mod moid_test {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    /// Separation of two angles in degrees, wrap-around aware.
    fn angle_dist(a: Degree, b: Degree) -> f64 {
        ((a - b + 180.0).rem_euclid(360.0) - 180.0).abs()
    }

    fn circular(a: f64, inc_deg: f64, node_deg: f64) -> KeplerianElements {
        KeplerianElements::from_semi_major_axis(a, 0.0, inc_deg * RADEG, node_deg * RADEG, 0.0)
    }

    #[test]
    fn test_coplanar_circles() {
        let solver = GridMoidSolver::default();
        let res = solver.compute(&circular(1.0, 0.0, 0.0), &circular(1.5, 0.0, 0.0));
        assert_relative_eq!(res.moid, 0.5, epsilon = 1e-9);

        // both bodies move along +φ at the closest points
        let v1 = 29.7847;
        let v2 = v1 / 1.5f64.sqrt();
        assert_relative_eq!(res.delta_v, v1 - v2, epsilon = 1e-3);
    }

    #[test]
    fn test_crossing_orbits() {
        // same radius, different planes: the orbits intersect on the node line
        let solver = GridMoidSolver::default();
        let res = solver.compute(&circular(1.0, 0.0, 0.0), &circular(1.0, 30.0, 40.0));
        assert!(res.moid < 1e-6, "moid = {}", res.moid);
        // closest points sit at the ascending or descending node
        let lon = res.ecliptic_longitude;
        assert!(
            (lon - 40.0).abs() < 1e-3 || (lon - 220.0).abs() < 1e-3,
            "longitude = {lon}"
        );
    }

    #[test]
    fn test_eccentric_inside_earth() {
        // aphelion at 0.8 AU, aligned with Earth's perihelion direction
        let earth = earth_orbit_j2000();
        let target = KeplerianElements {
            perihelion_distance: 0.6,
            eccentricity: 1.0 / 7.0,
            inclination: 0.0,
            ascending_node_longitude: 0.0,
            periapsis_argument: earth.periapsis_argument + PI,
        };
        let res = GridMoidSolver::default().compute(&earth, &target);
        let earth_q = earth.perihelion_distance;
        assert_relative_eq!(res.moid, earth_q - 0.8, epsilon = 1e-6);
        assert!(angle_dist(res.true_anomaly_reference, 0.0) < 1e-3);
        assert!(angle_dist(res.true_anomaly_object, 180.0) < 1e-3);
    }

    #[test]
    fn test_hyperbolic_target() {
        let target = KeplerianElements {
            perihelion_distance: 2.0,
            eccentricity: 1.2,
            inclination: 0.0,
            ascending_node_longitude: 0.0,
            periapsis_argument: 0.0,
        };
        let res = GridMoidSolver::default().compute(&circular(1.0, 0.0, 0.0), &target);
        assert_relative_eq!(res.moid, 1.0, epsilon = 1e-8);
        assert!(angle_dist(res.true_anomaly_object, 0.0) < 1e-3);
    }

    #[test]
    fn test_invalid_elements() {
        let bad = KeplerianElements {
            perihelion_distance: f64::NAN,
            eccentricity: 0.1,
            inclination: 0.0,
            ascending_node_longitude: 0.0,
            periapsis_argument: 0.0,
        };
        let res = GridMoidSolver::default().compute(&earth_orbit_j2000(), &bad);
        assert!(res.moid.is_nan());
        assert!(res.delta_v.is_nan());
    }
}
