//! Vehicle state bookkeeping for the tracking loop
//!
//! Speed is integrated from the commanded acceleration, the steering command is
//! clamped to the mechanical limit and the pose comes from localization when a
//! fix is available.

use serde::{Deserialize, Serialize};

use crate::common::{NavError, NavResult, Pose2D, RobotState};
use crate::path_tracking::stanley_controller::normalize_angle;

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct VehicleConfig {
    /// Distance from rear axle to front axle [m]
    pub wheelbase: f64,
    /// Steering limit [deg]
    pub max_steer_deg: f64,
    /// Control period [s]
    pub dt: f64,
    /// Proportional speed gain
    pub speed_gain: f64,
    /// Cruise speed [m/s]
    pub target_speed: f64,
}

impl Default for VehicleConfig {
    fn default() -> Self {
        Self {
            wheelbase: 0.1,
            max_steer_deg: 30.0,
            dt: 0.1,
            speed_gain: 1.0,
            target_speed: 0.2,
        }
    }
}

impl VehicleConfig {
    pub fn max_steer(&self) -> f64 {
        self.max_steer_deg.to_radians()
    }

    pub fn validate(&self) -> NavResult<()> {
        if !(self.wheelbase > 0.0) {
            return Err(NavError::InvalidParameter(format!("wheelbase must be positive, got {}", self.wheelbase)));
        }
        if !(self.dt > 0.0) {
            return Err(NavError::InvalidParameter(format!("dt must be positive, got {}", self.dt)));
        }
        if !(self.max_steer_deg > 0.0 && self.max_steer_deg < 90.0) {
            return Err(NavError::InvalidParameter(format!(
                "max_steer_deg must lie in (0, 90), got {}",
                self.max_steer_deg
            )));
        }
        Ok(())
    }
}

/// Where the pose for the next state comes from
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LocalizationMode {
    /// Overwrite the pose with an external fix
    Localized(Pose2D),
    /// Keep the previous pose
    ModelOnly,
}

#[derive(Debug, Clone, Copy)]
pub struct VehicleStateModel {
    max_steer: f64,
    dt: f64,
    speed_gain: f64,
}

impl VehicleStateModel {
    pub fn new(config: &VehicleConfig) -> Self {
        VehicleStateModel {
            max_steer: config.max_steer(),
            dt: config.dt,
            speed_gain: config.speed_gain,
        }
    }

    pub fn max_steer(&self) -> f64 {
        self.max_steer
    }

    /// Steering limited to the wheel stop. NaN steers straight.
    pub fn clamp_steer(&self, delta: f64) -> f64 {
        if delta.is_nan() {
            return 0.0;
        }
        delta.clamp(-self.max_steer, self.max_steer)
    }

    /// P-controller on speed
    pub fn pid_accel(&self, target: f64, current: f64) -> f64 {
        self.speed_gain * (target - current)
    }

    /// Next state: speed integrates `acceleration`, the angular component
    /// holds the clamped steering command.
    pub fn advance(&self, state: RobotState, acceleration: f64, delta: f64, mode: LocalizationMode) -> RobotState {
        let pose = match mode {
            LocalizationMode::Localized(pose) => pose,
            LocalizationMode::ModelOnly => state.pose(),
        };
        RobotState {
            x: pose.x,
            y: pose.y,
            yaw: pose.yaw,
            v: state.v + acceleration * self.dt,
            w: self.clamp_steer(delta),
        }
    }
}

/// Kinematic bicycle step with rear-axle reference. At standstill the
/// steering input turns the body in place.
pub fn bicycle_step(pose: Pose2D, v: f64, steer: f64, wheelbase: f64, dt: f64) -> Pose2D {
    if v.abs() < 1e-6 {
        return Pose2D::new(pose.x, pose.y, normalize_angle(pose.yaw + steer * dt));
    }
    Pose2D::new(
        pose.x + v * pose.yaw.cos() * dt,
        pose.y + v * pose.yaw.sin() * dt,
        normalize_angle(pose.yaw + v / wheelbase * steer.tan() * dt),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vehicle_config_default() {
        let config = VehicleConfig::default();
        assert_eq!(config.wheelbase, 0.1);
        assert!((config.max_steer() - 30f64.to_radians()).abs() < 1e-12);
        assert!(config.validate().is_ok());
        let bad = VehicleConfig { dt: 0.0, ..config };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_steer_is_always_clamped() {
        let model = VehicleStateModel::new(&VehicleConfig::default());
        let state = RobotState::new(0.0, 0.0, 0.0, 0.1, 0.0);
        let mut delta = -10.0;
        while delta <= 10.0 {
            let next = model.advance(state, 0.0, delta, LocalizationMode::ModelOnly);
            assert!(next.w.abs() <= model.max_steer() + 1e-12);
            delta += 0.01;
        }
        let next = model.advance(state, 0.0, 0.1, LocalizationMode::ModelOnly);
        assert!((next.w - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_non_finite_steer_stays_in_range() {
        let model = VehicleStateModel::new(&VehicleConfig::default());
        let state = RobotState::new(0.0, 0.0, 0.0, 0.1, 0.0);
        let next = model.advance(state, 0.0, f64::NAN, LocalizationMode::ModelOnly);
        assert_eq!(next.w, 0.0);
        assert_eq!(model.clamp_steer(f64::INFINITY), model.max_steer());
        assert_eq!(model.clamp_steer(f64::NEG_INFINITY), -model.max_steer());
    }

    #[test]
    fn test_advance_localization_modes() {
        let model = VehicleStateModel::new(&VehicleConfig::default());
        let state = RobotState::new(1.0, 2.0, 0.3, 0.1, 0.0);
        let accel = model.pid_accel(0.2, state.v);
        assert!((accel - 0.1).abs() < 1e-12);

        let kept = model.advance(state, accel, 0.0, LocalizationMode::ModelOnly);
        assert_eq!(kept.pose(), state.pose());
        assert!((kept.v - 0.11).abs() < 1e-12);

        let fix = Pose2D::new(1.5, 2.5, -0.2);
        let localized = model.advance(state, accel, 0.0, LocalizationMode::Localized(fix));
        assert_eq!(localized.pose(), fix);
        assert!((localized.v - 0.11).abs() < 1e-12);
    }

    #[test]
    fn test_bicycle_step() {
        let moved = bicycle_step(Pose2D::new(0.0, 0.0, 0.0), 0.2, 0.0, 0.1, 0.1);
        assert!((moved.x - 0.02).abs() < 1e-12);
        assert!(moved.y.abs() < 1e-12);

        let left = bicycle_step(Pose2D::new(0.0, 0.0, 0.0), 0.2, 0.3, 0.1, 0.1);
        assert!(left.yaw > 0.0);

        let pivot = bicycle_step(Pose2D::new(1.0, 1.0, 0.0), 0.0, -0.5, 0.1, 0.1);
        assert_eq!((pivot.x, pivot.y), (1.0, 1.0));
        assert!((pivot.yaw + 0.05).abs() < 1e-12);
    }
}
