// https://github.com/AtsushiSakai/PythonRobotics/tree/master/PathPlanning/CubicSpline
// https://github.com/onlytailei/CppRobotics/blob/master/include/cubic_spline.h
// Cubic spline planner
//
// Author: Atsushi Sakai(@Atsushi_twi)
//         TAI Lei
//         Ryohei Sasaki(@rsasaki0109)

extern crate nalgebra as na;

use itertools::Itertools;

use crate::common::{CurveFitter, NavError, NavResult};
use crate::path_planning::smoothing::ReferenceTrajectory;

/// Natural cubic spline y(x) over strictly increasing knots
#[derive(Debug, Clone)]
struct Spline {
    a: Vec<f64>,
    b: Vec<f64>,
    c: Vec<f64>,
    d: Vec<f64>,
    x: Vec<f64>,
}

impl Spline {
    fn new(x: &[f64], y: &[f64]) -> NavResult<Spline> {
        let h: Vec<f64> = x.windows(2).map(|w| w[1] - w[0]).collect();
        if h.iter().any(|&hi| hi <= 0.0 || !hi.is_finite()) {
            return Err(NavError::Numerical("spline knots must be strictly increasing".to_string()));
        }
        let a = y.to_vec();
        let a_mat = Spline::calc_a(&h);
        let b_vec = Spline::calc_b(&h, &a);

        let c_na = a_mat
            .lu()
            .solve(&b_vec)
            .ok_or_else(|| NavError::Numerical("singular spline system".to_string()))?;
        let c: Vec<f64> = c_na.iter().copied().collect();

        let mut b = Vec::with_capacity(h.len());
        let mut d = Vec::with_capacity(h.len());
        for i in 0..h.len() {
            d.push((c[i + 1] - c[i]) / (3.0 * h[i]));
            b.push((a[i + 1] - a[i]) / h[i] - h[i] * (c[i + 1] + 2.0 * c[i]) / 3.0);
        }

        Ok(Spline { a, b, c, d, x: x.to_vec() })
    }

    fn calc(&self, t: f64) -> f64 {
        let (i, dx) = self.locate(t);
        self.a[i] + self.b[i] * dx + self.c[i] * dx.powi(2) + self.d[i] * dx.powi(3)
    }

    fn calcd(&self, t: f64) -> f64 {
        let (i, dx) = self.locate(t);
        self.b[i] + 2.0 * self.c[i] * dx + 3.0 * self.d[i] * dx.powi(2)
    }

    fn calcdd(&self, t: f64) -> f64 {
        let (i, dx) = self.locate(t);
        2.0 * self.c[i] + 6.0 * self.d[i] * dx
    }

    /// Segment index and offset for `t`, clamped to the knot range
    fn locate(&self, t: f64) -> (usize, f64) {
        let last = self.x.len() - 1;
        let t = t.clamp(self.x[0], self.x[last]);
        let i = self
            .x
            .partition_point(|&xi| xi <= t)
            .saturating_sub(1)
            .min(last - 1);
        (i, t - self.x[i])
    }

    fn calc_a(h: &[f64]) -> na::DMatrix<f64> {
        let nx = h.len() + 1;
        let mut a = na::DMatrix::zeros(nx, nx);
        a[(0, 0)] = 1.0;
        for i in 0..nx - 1 {
            if i != nx - 2 {
                a[(i + 1, i + 1)] = 2.0 * (h[i] + h[i + 1]);
            }
            a[(i + 1, i)] = h[i];
            a[(i, i + 1)] = h[i];
        }
        a[(0, 1)] = 0.0;
        a[(nx - 1, nx - 2)] = 0.0;
        a[(nx - 1, nx - 1)] = 1.0;
        a
    }

    fn calc_b(h: &[f64], a: &[f64]) -> na::DVector<f64> {
        let nx = h.len() + 1;
        let mut b = na::DVector::zeros(nx);
        for i in 0..nx - 2 {
            b[i + 1] = 3.0 * (a[i + 2] - a[i + 1]) / h[i + 1] - 3.0 * (a[i + 1] - a[i]) / h[i];
        }
        b
    }
}

/// 2D spline parameterized by cumulative chord length
#[derive(Debug, Clone)]
pub struct Spline2D {
    pub s: Vec<f64>,
    sx: Spline,
    sy: Spline,
}

impl Spline2D {
    pub fn new(x: &[f64], y: &[f64]) -> NavResult<Spline2D> {
        if x.len() != y.len() {
            return Err(NavError::InvalidParameter(format!(
                "x and y differ in length ({} vs {})",
                x.len(),
                y.len()
            )));
        }
        if x.len() < 2 {
            return Err(NavError::InsufficientWaypoints(x.len()));
        }
        let s = Spline2D::calc_s(x, y);
        let sx = Spline::new(&s, x)?;
        let sy = Spline::new(&s, y)?;
        Ok(Spline2D { s, sx, sy })
    }

    fn calc_s(x: &[f64], y: &[f64]) -> Vec<f64> {
        std::iter::once(0.0)
            .chain(
                x.iter()
                    .zip(y.iter())
                    .tuple_windows()
                    .scan(0.0, |acc, ((x0, y0), (x1, y1))| {
                        *acc += ((x1 - x0).powi(2) + (y1 - y0).powi(2)).sqrt();
                        Some(*acc)
                    }),
            )
            .collect()
    }

    pub fn length(&self) -> f64 {
        self.s[self.s.len() - 1]
    }

    pub fn calc_position(&self, is: f64) -> (f64, f64) {
        (self.sx.calc(is), self.sy.calc(is))
    }

    pub fn calc_curvature(&self, is: f64) -> f64 {
        let dx = self.sx.calcd(is);
        let ddx = self.sx.calcdd(is);
        let dy = self.sy.calcd(is);
        let ddy = self.sy.calcdd(is);
        let denom = (dx.powi(2) + dy.powi(2)).powf(1.5);
        if denom < 1e-12 {
            0.0
        } else {
            (ddy * dx - ddx * dy) / denom
        }
    }

    pub fn calc_yaw(&self, is: f64) -> f64 {
        let dx = self.sx.calcd(is);
        let dy = self.sy.calcd(is);
        dy.atan2(dx)
    }
}

/// Sample the spline through (x, y) every `ds` along its length. The end of
/// the curve is always included as the final sample.
pub fn calc_spline_course(x: &[f64], y: &[f64], ds: f64) -> NavResult<ReferenceTrajectory> {
    if !(ds > 0.0) {
        return Err(NavError::InvalidParameter(format!("course step must be positive, got {}", ds)));
    }
    let sp = Spline2D::new(x, y)?;
    let s_end = sp.length();

    let mut samples: Vec<f64> = (0..)
        .map(|i| i as f64 * ds)
        .take_while(|&is| is < s_end)
        .collect();
    if samples.last().map_or(true, |&last| s_end - last > 1e-9) {
        samples.push(s_end);
    }

    let n = samples.len();
    let mut rx = Vec::with_capacity(n);
    let mut ry = Vec::with_capacity(n);
    let mut ryaw = Vec::with_capacity(n);
    let mut rk = Vec::with_capacity(n);
    for &is in &samples {
        let (ix, iy) = sp.calc_position(is);
        rx.push(ix);
        ry.push(iy);
        ryaw.push(sp.calc_yaw(is));
        rk.push(sp.calc_curvature(is));
    }
    ReferenceTrajectory::new(rx, ry, ryaw, rk, samples)
}

/// [`CurveFitter`] backed by the natural cubic spline above
#[derive(Debug, Clone, Copy, Default)]
pub struct CubicSplineFitter;

impl CurveFitter for CubicSplineFitter {
    fn fit(&self, x: &[f64], y: &[f64], ds: f64) -> NavResult<ReferenceTrajectory> {
        let course = calc_spline_course(x, y, ds)?;
        log::debug!("Cubic spline course generated with {} points", course.len());
        Ok(course)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spline_interpolates_knots() {
        let x = [0.0, 1.0, 2.0, 3.0];
        let y = [0.0, 1.0, 0.0, 1.0];
        let sp = Spline::new(&x, &y).unwrap();
        for (xi, yi) in x.iter().zip(y.iter()) {
            assert!((sp.calc(*xi) - yi).abs() < 1e-9);
        }
        // natural boundary conditions
        assert!(sp.calcdd(0.0).abs() < 1e-9);
        assert!(sp.calcdd(3.0).abs() < 1e-9);
    }

    #[test]
    fn test_straight_course() {
        let course = calc_spline_course(&[0.0, 5.0], &[0.0, 0.0], 0.05).unwrap();
        assert_eq!(course.len(), 101);
        assert!((course.cx()[0]).abs() < 1e-12);
        assert!((course.cx()[100] - 5.0).abs() < 1e-9);
        assert!(course.cy().iter().all(|y| y.abs() < 1e-12));
        assert!(course.cyaw().iter().all(|yaw| yaw.abs() < 1e-12));
        assert!(course.curvature().iter().all(|k| k.abs() < 1e-12));
    }

    #[test]
    fn test_curved_course_heading_and_curvature() {
        // quarter turn to the left
        let x = [0.0, 1.0, 2.0, 2.5];
        let y = [0.0, 0.2, 1.0, 2.0];
        let course = calc_spline_course(&x, &y, 0.05).unwrap();
        assert!(course.len() > 40);
        let yaw = course.cyaw();
        assert!(yaw[yaw.len() - 1] > yaw[0]);
        let positive = course.curvature().iter().filter(|&&k| k > 0.0).count();
        assert!(positive > course.len() / 2);
        for w in course.arc_length().windows(2) {
            assert!(w[1] >= w[0]);
        }
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(matches!(
            calc_spline_course(&[0.0], &[0.0], 0.05),
            Err(NavError::InsufficientWaypoints(1))
        ));
        assert!(calc_spline_course(&[0.0, 1.0], &[0.0], 0.05).is_err());
        assert!(calc_spline_course(&[0.0, 1.0], &[0.0, 0.0], 0.0).is_err());
        // repeated point gives a zero-length segment
        assert!(calc_spline_course(&[0.0, 0.0, 1.0], &[0.0, 0.0, 0.0], 0.05).is_err());
    }

    #[test]
    fn test_short_course_has_two_samples() {
        let course = CubicSplineFitter.fit(&[0.0, 0.01], &[0.0, 0.0], 0.05).unwrap();
        assert_eq!(course.len(), 2);
        assert!((course.arc_length()[1] - 0.01).abs() < 1e-12);
    }
}
