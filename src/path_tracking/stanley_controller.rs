//
// Path tracking with Stanley steering control.
//
// author: Atsushi Sakai (@Atsushi_twi)
//         Ryohei Sasaki (@rsasaki0109)
// Ref:
//     - [Stanley: The robot that won the DARPA grand challenge](http://isl.ecst.csuchico.edu/DOCS/darpa2005/DARPA%202005%20Stanley.pdf)
//    - [Autonomous Automobile Path Tracking](https://www.ri.cmu.edu/pub_files/2009/2/Automatic_Steering_Methods_for_Autonomous_Automobile_Path_Tracking.pdf)

use std::f64::consts::PI;

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::common::RobotState;
use crate::path_planning::ReferenceTrajectory;

/// Normalize an angle into (-pi, pi]. Non-finite input maps to 0.
pub fn normalize_angle(angle: f64) -> f64 {
    if !angle.is_finite() {
        return 0.0;
    }
    // bounds the loops below to a single pass for large inputs
    let mut angle = if angle.abs() > 4.0 * PI {
        angle.rem_euclid(2.0 * PI)
    } else {
        angle
    };
    while angle > PI {
        angle -= 2.0 * PI;
    }
    while angle <= -PI {
        angle += 2.0 * PI;
    }
    angle
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct StanleyConfig {
    /// Cross-track control gain
    pub k: f64,
    /// Below this speed the cross-track term is dropped
    pub min_speed: f64,
}

impl Default for StanleyConfig {
    fn default() -> Self {
        Self { k: 0.08, min_speed: 1e-3 }
    }
}

/// Stateless Stanley steering law. The tracking index is threaded through by
/// the caller.
#[derive(Debug, Clone, Copy)]
pub struct StanleyController {
    pub k: f64,
    pub wheelbase: f64,
    pub min_speed: f64,
}

impl StanleyController {
    pub fn new(config: &StanleyConfig, wheelbase: f64) -> Self {
        StanleyController {
            k: config.k,
            wheelbase,
            min_speed: config.min_speed,
        }
    }

    /// Steering command and tracking index for this tick. The index never
    /// moves behind `last_target_idx`.
    pub fn control(&self, state: &RobotState, course: &ReferenceTrajectory, last_target_idx: usize) -> (f64, usize) {
        let (mut current_target_idx, error_front_axle) = self.calc_target_index(state, course);
        if last_target_idx >= current_target_idx {
            current_target_idx = last_target_idx.min(course.last_index());
        }
        let theta_e = normalize_angle(course.cyaw()[current_target_idx] - state.yaw);
        let theta_d = if state.v.abs() < self.min_speed {
            0.0
        } else {
            (self.k * error_front_axle).atan2(state.v)
        };
        let delta = theta_e + theta_d;
        log::trace!(
            "stanley: idx={} efa={:.4} theta_e={:.4} theta_d={:.4}",
            current_target_idx,
            error_front_axle,
            theta_e,
            theta_d
        );
        (delta, current_target_idx)
    }

    /// Nearest course sample to the front axle and the signed distance to it.
    /// The distance is negative when the sample lies to the right of the
    /// vehicle's heading.
    pub fn calc_target_index(&self, state: &RobotState, course: &ReferenceTrajectory) -> (usize, f64) {
        let fx = state.x + self.wheelbase * state.yaw.cos();
        let fy = state.y + self.wheelbase * state.yaw.sin();

        let (ind, mind) = course
            .cx()
            .iter()
            .zip(course.cy())
            .map(|(cx, cy)| (fx - cx).hypot(fy - cy))
            .enumerate()
            .min_by_key(|&(_, d)| OrderedFloat(d))
            .unwrap_or((0, 0.0));

        let tyaw = normalize_angle((fy - course.cy()[ind]).atan2(fx - course.cx()[ind]) - state.yaw);
        if tyaw > 0.0 {
            (ind, -mind)
        } else {
            (ind, mind)
        }
    }
}
