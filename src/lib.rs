//! pibot_nav - obstacle-aware planning and path tracking for a small wheeled robot
//!
//! A snapshot of tracked robot poses becomes a set of rectangular obstacles, a
//! sampling planner finds a path around them, a cubic spline smooths it and a
//! Stanley controller tracks it at a fixed rate under a proximity interlock.

// Core modules
pub mod common;
pub mod config;
pub mod io;
pub mod utils;

// Algorithm modules
pub mod mapping;
pub mod path_planning;
pub mod path_tracking;
pub mod control;

// Re-export common types for convenience
pub use common::{ControlCommand, Point2D, Pose2D, RobotState, TrackedPose};
pub use common::{CurveFitter, DriveOutput, MotionPlanner, StateValidity};
pub use common::{NavError, NavResult};
pub use config::NavConfig;
