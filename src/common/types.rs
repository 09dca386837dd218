//! Common types used throughout pibot_nav

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// 2D point representation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point2D) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

impl From<Point2<f64>> for Point2D {
    fn from(p: Point2<f64>) -> Self {
        Self { x: p.x, y: p.y }
    }
}

/// 2D pose (position + orientation), yaw in radians
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize, Serialize)]
pub struct Pose2D {
    pub x: f64,
    pub y: f64,
    pub yaw: f64,
}

impl Pose2D {
    pub fn new(x: f64, y: f64, yaw: f64) -> Self {
        Self { x, y, yaw }
    }

    pub fn origin() -> Self {
        Self { x: 0.0, y: 0.0, yaw: 0.0 }
    }

    pub fn position(&self) -> Point2D {
        Point2D::new(self.x, self.y)
    }
}

/// One record of a pose snapshot or of the pose-tracking feed
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackedPose {
    pub id: i64,
    pub pose: Pose2D,
}

impl TrackedPose {
    pub fn new(id: i64, pose: Pose2D) -> Self {
        Self { id, pose }
    }
}

/// Kinematic state of the controlled robot
///
/// `w` holds the last commanded (clamped) steering angle.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RobotState {
    pub x: f64,
    pub y: f64,
    pub yaw: f64,
    pub v: f64,
    pub w: f64,
}

impl RobotState {
    pub fn new(x: f64, y: f64, yaw: f64, v: f64, w: f64) -> Self {
        Self { x, y, yaw, v, w }
    }

    pub fn pose(&self) -> Pose2D {
        Pose2D::new(self.x, self.y, self.yaw)
    }

    /// Velocity command for the drive outputs. The drives expect the
    /// steering sign flipped.
    pub fn command(&self) -> ControlCommand {
        ControlCommand::new(self.v, -self.w)
    }
}

/// Velocity command sent to a drive output
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ControlCommand {
    pub linear: f64,
    pub angular: f64,
}

impl ControlCommand {
    pub fn new(linear: f64, angular: f64) -> Self {
        Self { linear, angular }
    }

    pub fn zero() -> Self {
        Self { linear: 0.0, angular: 0.0 }
    }

    pub fn is_zero(&self) -> bool {
        self.linear == 0.0 && self.angular == 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point2d_distance() {
        let p1 = Point2D::new(0.0, 0.0);
        let p2 = Point2D::new(3.0, 4.0);
        assert!((p1.distance(&p2) - 5.0).abs() < 1e-10);
    }

    #[test]
    fn test_robot_state_command_negates_steering() {
        let state = RobotState::new(0.0, 0.0, 0.0, 0.2, 0.3);
        let cmd = state.command();
        assert_eq!(cmd.linear, 0.2);
        assert_eq!(cmd.angular, -0.3);
    }

    #[test]
    fn test_zero_command() {
        assert!(ControlCommand::zero().is_zero());
        assert!(!ControlCommand::new(0.0, -0.5).is_zero());
    }
}
