// Path Planning module: request formation, planner backend and smoothing

pub mod plan_request;
pub mod rrt;
pub mod cubic_spline_planner;
pub mod smoothing;

pub use plan_request::*;
pub use rrt::*;
pub use cubic_spline_planner::*;
pub use smoothing::*;
