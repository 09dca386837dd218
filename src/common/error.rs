//! Error types for pibot_nav

use thiserror::Error;

/// Main error type for the navigation pipeline
#[derive(Debug, Error)]
pub enum NavError {
    /// A pose snapshot line could not be parsed
    #[error("Malformed pose record on line {line}: {reason}")]
    MalformedPose { line: usize, reason: String },

    /// The pose snapshot contained no records
    #[error("Pose snapshot is empty")]
    EmptySnapshot,

    /// The snapshot policy referenced an entry that does not exist
    #[error("Snapshot policy error: {0}")]
    SnapshotPolicy(String),

    /// The planner found no solution
    #[error("Planning failed: {0}")]
    PlanningFailed(String),

    /// Too few distinct waypoints to fit a curve
    #[error("Need at least 2 distinct waypoints, got {0}")]
    InsufficientWaypoints(usize),

    /// Numerical computation failed (matrix inversion, etc.)
    #[error("Numerical error: {0}")]
    Numerical(String),

    /// No pose arrived on the tracking feed in time
    #[error("No initial pose received within {0:.1} s")]
    InitialPoseTimeout(f64),

    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Plot rendering failed
    #[error("Plot error: {0}")]
    Plot(String),

    /// Configuration file could not be parsed
    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for navigation operations
pub type NavResult<T> = Result<T, NavError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = NavError::PlanningFailed("no solution within 1.0 s".to_string());
        assert_eq!(format!("{}", err), "Planning failed: no solution within 1.0 s");

        let err = NavError::MalformedPose { line: 3, reason: "expected 4 fields".to_string() };
        assert_eq!(format!("{}", err), "Malformed pose record on line 3: expected 4 fields");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: NavError = io_err.into();
        assert!(matches!(err, NavError::Io(_)));
    }
}
