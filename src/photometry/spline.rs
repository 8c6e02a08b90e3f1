//! Clamped cubic spline interpolation.
//!
//! The phase-function basis of the HG1G2 system is tabulated at a handful of phase angles
//! together with the first derivative at both ends of the table. The interpolant is the unique
//! C² piecewise cubic matching the samples and those two end slopes ("clamped" boundary
//! conditions, as opposed to natural or not-a-knot splines).
//!
//! The second derivatives `M_i` at the knots are obtained from the tridiagonal system
//!
//! ```text
//! 2h₀M₀ + h₀M₁                             = 6((y₁−y₀)/h₀ − y'₀)
//! h_{i−1}M_{i−1} + 2(h_{i−1}+h_i)M_i + h_iM_{i+1} = 6((y_{i+1}−y_i)/h_i − (y_i−y_{i−1})/h_{i−1})
//! h_{n−2}M_{n−2} + 2h_{n−2}M_{n−1}           = 6(y'_{n−1} − (y_{n−1}−y_{n−2})/h_{n−2})
//! ```
//!
//! solved once at construction with an LU decomposition.
//!
//! Outside the knot range the spline is extended with the polynomial of the nearest segment,
//! the same extrapolation rule as the classical scientific-Python spline.

use nalgebra::{DMatrix, DVector};

#[derive(Debug, Clone)]
pub struct ClampedCubicSpline {
    knots: Vec<f64>,
    values: Vec<f64>,
    second_derivs: Vec<f64>,
}

impl ClampedCubicSpline {
    /// Build the spline through `(knots[i], values[i])` with prescribed first derivatives
    /// `start_deriv` at `knots[0]` and `end_deriv` at the last knot.
    ///
    /// Arguments
    /// -----------------
    /// * `knots`: strictly increasing abscissae (at least two).
    /// * `values`: ordinates, same length as `knots`.
    /// * `start_deriv`, `end_deriv`: clamped boundary slopes.
    ///
    /// Return
    /// ----------
    /// * `None` if the table is malformed or the tridiagonal system is singular.
    pub fn new(knots: &[f64], values: &[f64], start_deriv: f64, end_deriv: f64) -> Option<Self> {
        let n = knots.len();
        if n < 2 || values.len() != n || knots.windows(2).any(|w| w[1] <= w[0]) {
            return None;
        }

        let h: Vec<f64> = knots.windows(2).map(|w| w[1] - w[0]).collect();
        let slope: Vec<f64> = (0..n - 1).map(|i| (values[i + 1] - values[i]) / h[i]).collect();

        let mut a = DMatrix::<f64>::zeros(n, n);
        let mut rhs = DVector::<f64>::zeros(n);

        a[(0, 0)] = 2.0 * h[0];
        a[(0, 1)] = h[0];
        rhs[0] = 6.0 * (slope[0] - start_deriv);

        for i in 1..n - 1 {
            a[(i, i - 1)] = h[i - 1];
            a[(i, i)] = 2.0 * (h[i - 1] + h[i]);
            a[(i, i + 1)] = h[i];
            rhs[i] = 6.0 * (slope[i] - slope[i - 1]);
        }

        a[(n - 1, n - 2)] = h[n - 2];
        a[(n - 1, n - 1)] = 2.0 * h[n - 2];
        rhs[n - 1] = 6.0 * (end_deriv - slope[n - 2]);

        let m = a.lu().solve(&rhs)?;

        Some(Self {
            knots: knots.to_vec(),
            values: values.to_vec(),
            second_derivs: m.iter().copied().collect(),
        })
    }

    /// Index of the segment `[x_i, x_{i+1}]` used to evaluate at `x`, clamped to the end segments.
    #[inline]
    fn segment(&self, x: f64) -> usize {
        let last = self.knots.len() - 2;
        // first knot strictly greater than x, minus one
        let upper = self.knots.partition_point(|&k| k <= x);
        upper.saturating_sub(1).min(last)
    }

    /// Evaluate the spline at a single abscissa.
    pub fn eval(&self, x: f64) -> f64 {
        if x.is_nan() {
            return f64::NAN;
        }
        let i = self.segment(x);
        let (x0, x1) = (self.knots[i], self.knots[i + 1]);
        let (y0, y1) = (self.values[i], self.values[i + 1]);
        let (m0, m1) = (self.second_derivs[i], self.second_derivs[i + 1]);
        let h = x1 - x0;

        let left = x1 - x;
        let right = x - x0;

        m0 * left.powi(3) / (6.0 * h)
            + m1 * right.powi(3) / (6.0 * h)
            + (y0 / h - m0 * h / 6.0) * left
            + (y1 / h - m1 * h / 6.0) * right
    }

    /// First derivative of the spline at `x`.
    #[cfg(test)]
    fn derivative(&self, x: f64) -> f64 {
        let i = self.segment(x);
        let (x0, x1) = (self.knots[i], self.knots[i + 1]);
        let (y0, y1) = (self.values[i], self.values[i + 1]);
        let (m0, m1) = (self.second_derivs[i], self.second_derivs[i + 1]);
        let h = x1 - x0;

        -m0 * (x1 - x).powi(2) / (2.0 * h) + m1 * (x - x0).powi(2) / (2.0 * h) + (y1 - y0) / h
            - (m1 - m0) * h / 6.0
    }
}

#[cfg(test)]
mod spline_test {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_interpolates_knots() {
        let x = [0.0, 1.0, 2.5, 4.0];
        let y = [1.0, -2.0, 0.5, 3.0];
        let spline = ClampedCubicSpline::new(&x, &y, 0.3, -1.2).unwrap();
        for (&xi, &yi) in x.iter().zip(y.iter()) {
            assert_relative_eq!(spline.eval(xi), yi, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_clamped_end_slopes() {
        let x = [0.0, 1.0, 2.5, 4.0];
        let y = [1.0, -2.0, 0.5, 3.0];
        let spline = ClampedCubicSpline::new(&x, &y, 0.3, -1.2).unwrap();
        assert_relative_eq!(spline.derivative(0.0), 0.3, epsilon = 1e-10);
        assert_relative_eq!(spline.derivative(4.0), -1.2, epsilon = 1e-10);
    }

    #[test]
    fn test_reproduces_cubic() {
        // A clamped spline is exact on a cubic when given its true end slopes.
        let f = |x: f64| 2.0 * x.powi(3) - x.powi(2) + 0.5 * x - 4.0;
        let df = |x: f64| 6.0 * x.powi(2) - 2.0 * x + 0.5;
        let x = [-1.0, 0.0, 0.7, 2.0, 3.0];
        let y: Vec<f64> = x.iter().map(|&v| f(v)).collect();
        let spline = ClampedCubicSpline::new(&x, &y, df(-1.0), df(3.0)).unwrap();

        for t in [-0.5, 0.2, 1.3, 2.9, 3.5, -1.4] {
            assert_relative_eq!(spline.eval(t), f(t), epsilon = 1e-9);
        }
    }

    #[test]
    fn test_rejects_malformed_tables() {
        assert!(ClampedCubicSpline::new(&[0.0], &[1.0], 0.0, 0.0).is_none());
        assert!(ClampedCubicSpline::new(&[0.0, 1.0], &[1.0], 0.0, 0.0).is_none());
        assert!(ClampedCubicSpline::new(&[0.0, 0.0, 1.0], &[1.0, 2.0, 3.0], 0.0, 0.0).is_none());
    }

    #[test]
    fn test_nan_input() {
        let spline = ClampedCubicSpline::new(&[0.0, 1.0], &[0.0, 1.0], 1.0, 1.0).unwrap();
        assert!(spline.eval(f64::NAN).is_nan());
        assert!(spline.derivative(f64::NAN).is_nan());
    }
}
