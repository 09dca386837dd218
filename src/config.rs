//! Configuration for pibot_nav
//!
//! Every section falls back to its defaults, so a config file only needs the
//! values it changes.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::common::{NavError, NavResult};
use crate::control::{LoopConfig, SafetyConfig};
use crate::mapping::{FootprintConfig, SnapshotPolicy};
use crate::path_planning::{PlanningConfig, RRTConfig, SmoothingConfig, WorkspaceBounds};
use crate::path_tracking::{StanleyConfig, VehicleConfig};

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct NavConfig {
    pub vehicle: VehicleConfig,
    pub stanley: StanleyConfig,
    pub footprint: FootprintConfig,
    pub snapshot: SnapshotPolicy,
    pub planning: PlanningConfig,
    pub rrt: RRTConfig,
    pub smoothing: SmoothingConfig,
    pub safety: SafetyConfig,
    pub control: LoopConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter (trace, debug, info, warn, error); RUST_LOG overrides it
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl NavConfig {
    /// Load and validate a TOML configuration file
    pub fn from_file<P: AsRef<Path>>(path: P) -> NavResult<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> NavResult<Self> {
        let config: NavConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> NavResult<()> {
        self.vehicle.validate()?;
        positive("stanley.k", self.stanley.k)?;
        positive("footprint.length", self.footprint.length)?;
        positive("footprint.width", self.footprint.width)?;
        non_negative("footprint.dilation_length", self.footprint.dilation_length)?;
        non_negative("footprint.dilation_width", self.footprint.dilation_width)?;
        positive("planning.bound_limit", self.planning.bound_limit)?;
        positive("planning.goal_tolerance", self.planning.goal_tolerance)?;
        positive("planning.timeout_secs", self.planning.timeout_secs)?;
        positive("planning.interpolation_step", self.planning.interpolation_step)?;
        positive("rrt.expand_dis", self.rrt.expand_dis)?;
        positive("rrt.path_resolution", self.rrt.path_resolution)?;
        positive("smoothing.ds", self.smoothing.ds)?;
        non_negative("safety.danger_distance", self.safety.danger_distance)?;
        positive("control.align_tolerance_deg", self.control.align_tolerance_deg)?;
        non_negative("control.initial_pose_timeout_secs", self.control.initial_pose_timeout_secs)?;

        let goal = self.planning.goal;
        if !WorkspaceBounds::new(self.planning.bound_limit).contains(goal.x, goal.y) {
            return Err(NavError::InvalidParameter(format!(
                "goal ({}, {}) lies outside the workspace of half-width {}",
                goal.x, goal.y, self.planning.bound_limit
            )));
        }
        Ok(())
    }
}

fn positive(name: &str, value: f64) -> NavResult<()> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(NavError::InvalidParameter(format!("{} must be positive, got {}", name, value)))
    }
}

fn non_negative(name: &str, value: f64) -> NavResult<()> {
    if value >= 0.0 {
        Ok(())
    } else {
        Err(NavError::InvalidParameter(format!("{} must not be negative, got {}", name, value)))
    }
}
