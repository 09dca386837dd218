//! Proximity interlock

use serde::{Deserialize, Serialize};

use crate::control::feeds::SnapshotReader;

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SafetyConfig {
    /// Readings strictly between zero and this value halt the robot
    pub danger_distance: f64,
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self { danger_distance: 20.0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InterlockStatus {
    Clear,
    Halt { reading: f64 },
}

/// Vetoes motion when the proximity sensor reports something close. A zero or
/// missing reading means nothing in range.
#[derive(Clone)]
pub struct SafetyInterlock {
    danger_distance: f64,
    proximity: SnapshotReader<f64>,
}

impl SafetyInterlock {
    pub fn new(config: &SafetyConfig, proximity: SnapshotReader<f64>) -> Self {
        SafetyInterlock {
            danger_distance: config.danger_distance,
            proximity,
        }
    }

    pub fn check(&self) -> InterlockStatus {
        let reading = self.proximity.latest().unwrap_or(0.0);
        if reading > 0.0 && reading < self.danger_distance {
            log::warn!("Proximity reading {:.2} inside danger band", reading);
            InterlockStatus::Halt { reading }
        } else {
            InterlockStatus::Clear
        }
    }
}
