//! Reference trajectory and the adapter that produces it from a raw path

use serde::{Deserialize, Serialize};

use crate::common::{CurveFitter, NavError, NavResult, Point2D};
use crate::path_planning::plan_request::RawPath;

/// Consecutive waypoints closer than this are treated as duplicates
const DUPLICATE_DISTANCE: f64 = 1e-6;

/// Arc-length sampled course: position, heading, curvature and arc length
/// per sample. All arrays share one length of at least 2.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceTrajectory {
    cx: Vec<f64>,
    cy: Vec<f64>,
    cyaw: Vec<f64>,
    ck: Vec<f64>,
    s: Vec<f64>,
}

impl ReferenceTrajectory {
    pub fn new(cx: Vec<f64>, cy: Vec<f64>, cyaw: Vec<f64>, ck: Vec<f64>, s: Vec<f64>) -> NavResult<Self> {
        let n = cx.len();
        if [cy.len(), cyaw.len(), ck.len(), s.len()].iter().any(|&len| len != n) {
            return Err(NavError::InvalidParameter(
                "reference trajectory arrays differ in length".to_string(),
            ));
        }
        if n < 2 {
            return Err(NavError::InsufficientWaypoints(n));
        }
        if s.windows(2).any(|w| w[1] < w[0]) {
            return Err(NavError::InvalidParameter(
                "arc length must be non-decreasing".to_string(),
            ));
        }
        Ok(ReferenceTrajectory { cx, cy, cyaw, ck, s })
    }

    pub fn len(&self) -> usize {
        self.cx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cx.is_empty()
    }

    pub fn last_index(&self) -> usize {
        self.cx.len() - 1
    }

    pub fn cx(&self) -> &[f64] {
        &self.cx
    }

    pub fn cy(&self) -> &[f64] {
        &self.cy
    }

    pub fn cyaw(&self) -> &[f64] {
        &self.cyaw
    }

    pub fn curvature(&self) -> &[f64] {
        &self.ck
    }

    pub fn arc_length(&self) -> &[f64] {
        &self.s
    }

    pub fn point(&self, i: usize) -> Point2D {
        Point2D::new(self.cx[i], self.cy[i])
    }

    pub fn start(&self) -> Point2D {
        self.point(0)
    }

    pub fn final_yaw(&self) -> f64 {
        self.cyaw[self.last_index()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SmoothingConfig {
    /// Course sampling step [m]
    pub ds: f64,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self { ds: 0.05 }
    }
}

/// Hands raw waypoints to a [`CurveFitter`]
pub struct TrajectorySmoother<F> {
    fitter: F,
    config: SmoothingConfig,
}

impl<F: CurveFitter> TrajectorySmoother<F> {
    pub fn new(fitter: F, config: SmoothingConfig) -> Self {
        TrajectorySmoother { fitter, config }
    }

    pub fn smooth(&self, path: &RawPath) -> NavResult<ReferenceTrajectory> {
        let mut xs: Vec<f64> = Vec::with_capacity(path.len());
        let mut ys: Vec<f64> = Vec::with_capacity(path.len());
        for wp in &path.waypoints {
            let duplicate = match (xs.last(), ys.last()) {
                (Some(&px), Some(&py)) => (wp.x - px).hypot(wp.y - py) < DUPLICATE_DISTANCE,
                _ => false,
            };
            if !duplicate {
                xs.push(wp.x);
                ys.push(wp.y);
            }
        }
        if xs.len() < 2 {
            return Err(NavError::InsufficientWaypoints(xs.len()));
        }

        let course = self.fitter.fit(&xs, &ys, self.config.ds)?;

        let first = Point2D::new(xs[0], ys[0]);
        let offset = course.start().distance(&first);
        if offset > self.config.ds {
            return Err(NavError::Numerical(format!(
                "fitted course starts {:.3} m away from the first waypoint",
                offset
            )));
        }
        log::info!(
            "Reference trajectory: {} samples over {:.2} m",
            course.len(),
            course.arc_length()[course.last_index()]
        );
        Ok(course)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Pose2D;
    use crate::path_planning::cubic_spline_planner::CubicSplineFitter;

    fn raw(points: &[(f64, f64)]) -> RawPath {
        RawPath {
            waypoints: points.iter().map(|&(x, y)| Pose2D::new(x, y, 0.0)).collect(),
            approximate: None,
        }
    }

    #[test]
    fn test_trajectory_validation() {
        assert!(ReferenceTrajectory::new(vec![0.0], vec![0.0], vec![0.0], vec![0.0], vec![0.0]).is_err());
        assert!(ReferenceTrajectory::new(
            vec![0.0, 1.0],
            vec![0.0],
            vec![0.0, 0.0],
            vec![0.0, 0.0],
            vec![0.0, 1.0]
        )
        .is_err());
        assert!(ReferenceTrajectory::new(
            vec![0.0, 1.0],
            vec![0.0, 0.0],
            vec![0.0, 0.0],
            vec![0.0, 0.0],
            vec![1.0, 0.0]
        )
        .is_err());
    }

    #[test]
    fn test_smooth_starts_at_first_waypoint() {
        let smoother = TrajectorySmoother::new(CubicSplineFitter, SmoothingConfig::default());
        let course = smoother.smooth(&raw(&[(0.5, 0.2), (1.5, 0.4), (2.5, 0.3)])).unwrap();
        assert!(course.start().distance(&Point2D::new(0.5, 0.2)) < 1e-9);
        assert_eq!(course.cx().len(), course.curvature().len());
        assert!(!course.is_empty());
    }

    #[test]
    fn test_duplicates_are_dropped() {
        let smoother = TrajectorySmoother::new(CubicSplineFitter, SmoothingConfig::default());
        let course = smoother.smooth(&raw(&[(0.0, 0.0), (0.0, 0.0), (1.0, 0.0), (1.0, 0.0)])).unwrap();
        assert!((course.arc_length()[course.last_index()] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_too_few_waypoints() {
        let smoother = TrajectorySmoother::new(CubicSplineFitter, SmoothingConfig::default());
        assert!(matches!(
            smoother.smooth(&raw(&[(1.0, 1.0), (1.0, 1.0)])),
            Err(NavError::InsufficientWaypoints(1))
        ));
        assert!(matches!(smoother.smooth(&raw(&[])), Err(NavError::InsufficientWaypoints(0))));
    }
}
