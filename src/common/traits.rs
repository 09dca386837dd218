//! Common traits defining the seams to external collaborators

use std::time::Duration;

use crate::common::error::NavResult;
use crate::common::types::ControlCommand;
use crate::path_planning::{PlannerSolution, PlanningRequest, ReferenceTrajectory};

/// State-validity predicate consumed by sampling-based planners
///
/// Implementations must be pure: the planner calls them many times per attempt,
/// possibly from another thread.
pub trait StateValidity: Send + Sync {
    /// Returns false when (x, y) is in collision
    fn is_valid(&self, x: f64, y: f64) -> bool;
}

impl<F> StateValidity for F
where
    F: Fn(f64, f64) -> bool + Send + Sync,
{
    fn is_valid(&self, x: f64, y: f64) -> bool {
        self(x, y)
    }
}

/// Trait for sampling-based motion planners
pub trait MotionPlanner {
    /// Search for a path, giving up after `timeout`.
    ///
    /// Returns `None` when neither an exact nor an approximate solution exists.
    fn solve(
        &self,
        request: &PlanningRequest,
        validity: &dyn StateValidity,
        timeout: Duration,
    ) -> Option<PlannerSolution>;
}

/// Trait for curve fitting of waypoints into an arc-length sampled course
pub trait CurveFitter {
    /// Fit the waypoints and sample the curve every `ds` along its length
    fn fit(&self, x: &[f64], y: &[f64], ds: f64) -> NavResult<ReferenceTrajectory>;
}

/// A velocity-command channel to one drive board
pub trait DriveOutput: Send + Sync {
    /// Publish a command. Must not block the control loop.
    fn send(&self, command: ControlCommand);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_is_state_validity() {
        let right_half_plane = |x: f64, _y: f64| x > 0.0;
        let validity: &dyn StateValidity = &right_half_plane;
        assert!(validity.is_valid(1.0, 0.0));
        assert!(!validity.is_valid(-1.0, 0.0));
    }
}
