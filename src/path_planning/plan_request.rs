//! Planning request formation and the call into the motion planner
//!
//! The coordinator owns everything around the planner: it checks the request,
//! bounds the search by a timeout, densifies the returned waypoints and
//! reports approximate solutions.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::common::{MotionPlanner, NavError, NavResult, Pose2D, StateValidity};
use crate::path_tracking::normalize_angle;

/// Axis-aligned square workspace centred on the origin
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorkspaceBounds {
    pub half_width: f64,
}

impl WorkspaceBounds {
    pub fn new(half_width: f64) -> Self {
        WorkspaceBounds { half_width }
    }

    pub fn low(&self) -> f64 {
        -self.half_width
    }

    pub fn high(&self) -> f64 {
        self.half_width
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x.abs() <= self.half_width && y.abs() <= self.half_width
    }
}

/// Start, goal and bounds handed to the planner
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlanningRequest {
    pub start: Pose2D,
    pub goal: Pose2D,
    pub bounds: WorkspaceBounds,
    /// A state within this distance of the goal counts as reaching it
    pub goal_tolerance: f64,
}

/// What a planner hands back
#[derive(Debug, Clone, PartialEq)]
pub struct PlannerSolution {
    pub waypoints: Vec<Pose2D>,
    /// Distance between the last waypoint and the goal
    pub distance_to_goal: f64,
}

/// Raw waypoint sequence from start towards the goal
#[derive(Debug, Clone, PartialEq)]
pub struct RawPath {
    pub waypoints: Vec<Pose2D>,
    /// Residual distance to the goal when the solution is only approximate
    pub approximate: Option<f64>,
}

impl RawPath {
    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    pub fn is_approximate(&self) -> bool {
        self.approximate.is_some()
    }
}

/// Planning parameters
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PlanningConfig {
    pub goal: Pose2D,
    /// Half-width of the square workspace [m]
    pub bound_limit: f64,
    pub goal_tolerance: f64,
    pub timeout_secs: f64,
    /// Maximum spacing of the densified path [m]
    pub interpolation_step: f64,
}

impl Default for PlanningConfig {
    fn default() -> Self {
        Self {
            goal: Pose2D::new(3.5, 0.3, 0.0),
            bound_limit: 8.0,
            goal_tolerance: 0.1,
            timeout_secs: 1.0,
            interpolation_step: 0.05,
        }
    }
}

impl PlanningConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs_f64(self.timeout_secs.max(0.0))
    }
}

/// Forms requests and drives a [`MotionPlanner`]
pub struct PlanRequestCoordinator<P> {
    planner: P,
    config: PlanningConfig,
}

impl<P: MotionPlanner> PlanRequestCoordinator<P> {
    pub fn new(planner: P, config: PlanningConfig) -> Self {
        PlanRequestCoordinator { planner, config }
    }

    pub fn config(&self) -> &PlanningConfig {
        &self.config
    }

    /// Request from `start` to the configured goal
    pub fn request_from(&self, start: Pose2D) -> PlanningRequest {
        PlanningRequest {
            start,
            goal: self.config.goal,
            bounds: WorkspaceBounds::new(self.config.bound_limit),
            goal_tolerance: self.config.goal_tolerance,
        }
    }

    /// Solve the request. No solution within the timeout is an error; an
    /// approximate solution is returned with a warning.
    pub fn plan(&self, request: &PlanningRequest, validity: &dyn StateValidity) -> NavResult<RawPath> {
        for (name, pose) in [("start", &request.start), ("goal", &request.goal)] {
            if !request.bounds.contains(pose.x, pose.y) {
                return Err(NavError::PlanningFailed(format!(
                    "{} ({:.3}, {:.3}) is outside the workspace",
                    name, pose.x, pose.y
                )));
            }
            if !validity.is_valid(pose.x, pose.y) {
                return Err(NavError::PlanningFailed(format!(
                    "{} ({:.3}, {:.3}) is in collision",
                    name, pose.x, pose.y
                )));
            }
        }

        let timeout = self.config.timeout();
        let started = Instant::now();
        let solution = self
            .planner
            .solve(request, validity, timeout)
            .ok_or_else(|| {
                NavError::PlanningFailed(format!(
                    "no solution within {:.2} s",
                    timeout.as_secs_f64()
                ))
            })?;
        log::info!(
            "Planner returned {} waypoints in {:.3} s",
            solution.waypoints.len(),
            started.elapsed().as_secs_f64()
        );

        if solution.waypoints.is_empty() {
            return Err(NavError::PlanningFailed("planner returned an empty path".to_string()));
        }

        let approximate = if solution.distance_to_goal > request.goal_tolerance {
            log::warn!(
                "Solution is approximate. Distance to actual goal is {:.4}",
                solution.distance_to_goal
            );
            Some(solution.distance_to_goal)
        } else {
            None
        };

        Ok(RawPath {
            waypoints: interpolate(&solution.waypoints, self.config.interpolation_step),
            approximate,
        })
    }
}

/// Insert states so that no segment is longer than `step`. Endpoints are kept;
/// headings of inserted states are blended along the shorter arc.
pub fn interpolate(waypoints: &[Pose2D], step: f64) -> Vec<Pose2D> {
    let mut out = Vec::with_capacity(waypoints.len());
    if let Some(first) = waypoints.first() {
        out.push(*first);
    }
    for pair in waypoints.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let d = a.position().distance(&b.position());
        let n = if step > 0.0 { (d / step).ceil().max(1.0) as usize } else { 1 };
        let dyaw = normalize_angle(b.yaw - a.yaw);
        for k in 1..n {
            let t = k as f64 / n as f64;
            out.push(Pose2D::new(
                a.x + t * (b.x - a.x),
                a.y + t * (b.y - a.y),
                normalize_angle(a.yaw + t * dyaw),
            ));
        }
        out.push(b);
    }
    out
}
