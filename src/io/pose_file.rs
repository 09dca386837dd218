//! Pose snapshot ingestion
//!
//! One record per line: `id x y theta_deg`, separated by whitespace. Blank
//! lines are skipped. Headings are converted to radians here so the rest of
//! the crate never sees degrees.

use std::fs;
use std::path::Path;

use itertools::Itertools;

use crate::common::{NavError, NavResult, Pose2D, TrackedPose};

/// Parse a full snapshot. Any malformed line, or no records at all, is an error.
pub fn parse_pose_snapshot(contents: &str) -> NavResult<Vec<TrackedPose>> {
    let mut poses = Vec::new();
    for (i, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        poses.push(parse_record(line, i + 1)?);
    }
    if poses.is_empty() {
        return Err(NavError::EmptySnapshot);
    }
    Ok(poses)
}

/// Read and parse a snapshot file
pub fn read_pose_snapshot<P: AsRef<Path>>(path: P) -> NavResult<Vec<TrackedPose>> {
    let contents = fs::read_to_string(path.as_ref())?;
    let poses = parse_pose_snapshot(&contents)?;
    log::info!("Read {} poses from {}", poses.len(), path.as_ref().display());
    Ok(poses)
}

fn parse_record(line: &str, line_no: usize) -> NavResult<TrackedPose> {
    let malformed = |reason: String| NavError::MalformedPose { line: line_no, reason };

    let (id, x, y, theta) = line
        .split_whitespace()
        .collect_tuple()
        .ok_or_else(|| malformed(format!("expected 4 fields in {:?}", line)))?;

    let id: i64 = id
        .parse()
        .map_err(|e| malformed(format!("bad id {:?}: {}", id, e)))?;
    let mut values = [0.0; 3];
    for (slot, field) in values.iter_mut().zip([x, y, theta]) {
        let v: f64 = field
            .parse()
            .map_err(|e| malformed(format!("bad number {:?}: {}", field, e)))?;
        if !v.is_finite() {
            return Err(malformed(format!("non-finite value {:?}", field)));
        }
        *slot = v;
    }

    Ok(TrackedPose::new(
        id,
        Pose2D::new(values[0], values[1], values[2].to_radians()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_parse_snapshot() {
        let text = "3 1.0 2.0 90\n\n4 -0.5 0.25 -180\n";
        let poses = parse_pose_snapshot(text).unwrap();
        assert_eq!(poses.len(), 2);
        assert_eq!(poses[0].id, 3);
        assert!((poses[0].pose.yaw - PI / 2.0).abs() < 1e-12);
        assert!((poses[1].pose.x + 0.5).abs() < 1e-12);
        assert!((poses[1].pose.yaw + PI).abs() < 1e-12);
    }

    #[test]
    fn test_tabs_and_trailing_spaces() {
        let poses = parse_pose_snapshot("1\t0.0\t0.0\t0.0   \n").unwrap();
        assert_eq!(poses.len(), 1);
    }

    #[test]
    fn test_empty_snapshot_is_error() {
        assert!(matches!(parse_pose_snapshot(""), Err(NavError::EmptySnapshot)));
        assert!(matches!(parse_pose_snapshot("\n  \n"), Err(NavError::EmptySnapshot)));
    }

    #[test]
    fn test_malformed_lines() {
        let err = parse_pose_snapshot("1 0.0 0.0 0.0\n2 0.0 0.0\n").unwrap_err();
        assert!(matches!(err, NavError::MalformedPose { line: 2, .. }));

        assert!(parse_pose_snapshot("1 0.0 0.0 0.0 5\n").is_err());
        assert!(parse_pose_snapshot("a 0.0 0.0 0.0\n").is_err());
        assert!(parse_pose_snapshot("1 x 0.0 0.0\n").is_err());
        assert!(parse_pose_snapshot("1 0.0 NaN 0.0\n").is_err());
    }

    #[test]
    fn test_read_missing_file() {
        let err = read_pose_snapshot("/nonexistent/pose.txt").unwrap_err();
        assert!(matches!(err, NavError::Io(_)));
    }
}
