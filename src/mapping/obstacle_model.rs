//! Obstacle model built from a snapshot of tracked robot poses
//!
//! Every tracked robot that is neither the controlled robot nor the heading
//! reference becomes a static rectangular obstacle: the robot footprint,
//! inflated by a dilation margin, placed at the robot's pose.

use nalgebra::{Isometry2, Point2, Vector2};
use serde::{Deserialize, Serialize};

use crate::common::{NavError, NavResult, Point2D, Pose2D, TrackedPose};
use crate::mapping::collision::strictly_inside;

/// Robot footprint and the dilation applied around it [m]
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct FootprintConfig {
    pub length: f64,
    pub width: f64,
    /// Added to each side along the length axis
    pub dilation_length: f64,
    /// Added to each side along the width axis
    pub dilation_width: f64,
}

impl Default for FootprintConfig {
    fn default() -> Self {
        let length = 0.25;
        let width = 0.20;
        Self {
            length,
            width,
            dilation_length: length / 2.0,
            dilation_width: width / 2.0,
        }
    }
}

impl FootprintConfig {
    /// Corners of the dilated footprint in the robot frame, counter-clockwise
    /// starting front-left.
    pub fn corner_offsets(&self) -> [Point2D; 4] {
        let hx = self.length / 2.0 + self.dilation_length;
        let hy = self.width / 2.0 + self.dilation_width;
        [
            Point2D::new(hx, hy),
            Point2D::new(-hx, hy),
            Point2D::new(-hx, -hy),
            Point2D::new(hx, -hy),
        ]
    }
}

/// World-frame quadrilateral occupied by another robot
#[derive(Debug, Clone, PartialEq)]
pub struct Obstacle {
    vertices: [Point2D; 4],
}

impl Obstacle {
    /// Place the dilated footprint at `pose` (rotate by yaw, then translate)
    pub fn from_pose(pose: &Pose2D, footprint: &FootprintConfig) -> Self {
        let iso = Isometry2::new(Vector2::new(pose.x, pose.y), pose.yaw);
        let vertices = footprint
            .corner_offsets()
            .map(|c| Point2D::from(iso * Point2::new(c.x, c.y)));
        Obstacle { vertices }
    }

    pub fn vertices(&self) -> &[Point2D; 4] {
        &self.vertices
    }

    pub fn centroid(&self) -> Point2D {
        let (sx, sy) = self
            .vertices
            .iter()
            .fold((0.0, 0.0), |(sx, sy), v| (sx + v.x, sy + v.y));
        Point2D::new(sx / 4.0, sy / 4.0)
    }

    /// True when (x, y) lies strictly inside; edge points are outside
    pub fn contains(&self, x: f64, y: f64) -> bool {
        strictly_inside(&self.vertices, x, y)
    }
}

/// Selects one entry of a pose snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntrySelector {
    /// Zero-based position in the snapshot
    Index(usize),
    /// One-based position counted from the end (`FromEnd(1)` is the last entry)
    FromEnd(usize),
    /// First entry carrying this id
    Id(i64),
}

impl EntrySelector {
    pub fn resolve(&self, snapshot: &[TrackedPose]) -> Option<usize> {
        match *self {
            EntrySelector::Index(i) => (i < snapshot.len()).then_some(i),
            EntrySelector::FromEnd(n) => {
                (n >= 1 && n <= snapshot.len()).then(|| snapshot.len() - n)
            }
            EntrySelector::Id(id) => snapshot.iter().position(|p| p.id == id),
        }
    }
}

/// Decides which snapshot entries are the controlled robot, the heading
/// reference, and obstacles. The default reproduces the tracking setup where
/// the second-to-last record is the robot itself and the last one marks the
/// desired final heading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct SnapshotPolicy {
    pub controlled: Option<EntrySelector>,
    pub heading_reference: Option<EntrySelector>,
}

impl Default for SnapshotPolicy {
    fn default() -> Self {
        Self {
            controlled: Some(EntrySelector::FromEnd(2)),
            heading_reference: Some(EntrySelector::FromEnd(1)),
        }
    }
}

/// A snapshot split according to a [`SnapshotPolicy`]
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotPartition {
    pub controlled: Option<TrackedPose>,
    pub heading_reference: Option<TrackedPose>,
    pub obstacles: Vec<TrackedPose>,
}

impl SnapshotPolicy {
    pub fn partition(&self, snapshot: &[TrackedPose]) -> NavResult<SnapshotPartition> {
        let resolve = |selector: Option<EntrySelector>, role: &str| -> NavResult<Option<usize>> {
            match selector {
                None => Ok(None),
                Some(sel) => sel.resolve(snapshot).map(Some).ok_or_else(|| {
                    NavError::SnapshotPolicy(format!(
                        "{} entry {:?} not found in snapshot of {} records",
                        role,
                        sel,
                        snapshot.len()
                    ))
                }),
            }
        };

        let controlled = resolve(self.controlled, "controlled")?;
        let reference = resolve(self.heading_reference, "heading reference")?;
        if controlled.is_some() && controlled == reference {
            return Err(NavError::SnapshotPolicy(
                "controlled robot and heading reference select the same entry".to_string(),
            ));
        }

        let obstacles = snapshot
            .iter()
            .enumerate()
            .filter(|(i, _)| Some(*i) != controlled && Some(*i) != reference)
            .map(|(_, p)| *p)
            .collect();

        Ok(SnapshotPartition {
            controlled: controlled.map(|i| snapshot[i]),
            heading_reference: reference.map(|i| snapshot[i]),
            obstacles,
        })
    }
}

/// Converts tracked poses into world-frame obstacles
#[derive(Debug, Clone)]
pub struct ObstacleModelBuilder {
    footprint: FootprintConfig,
}

impl ObstacleModelBuilder {
    pub fn new(footprint: FootprintConfig) -> Self {
        ObstacleModelBuilder { footprint }
    }

    pub fn build(&self, poses: &[TrackedPose]) -> Vec<Obstacle> {
        let obstacles: Vec<Obstacle> = poses
            .iter()
            .map(|tracked| {
                let obstacle = Obstacle::from_pose(&tracked.pose, &self.footprint);
                log::debug!(
                    "obstacle from robot {} at ({:.3}, {:.3}): {:?}",
                    tracked.id,
                    tracked.pose.x,
                    tracked.pose.y,
                    obstacle.vertices()
                );
                obstacle
            })
            .collect();
        log::info!("Built {} obstacles from tracked poses", obstacles.len());
        obstacles
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn snapshot() -> Vec<TrackedPose> {
        vec![
            TrackedPose::new(1, Pose2D::new(1.0, 0.0, 0.0)),
            TrackedPose::new(2, Pose2D::new(2.0, 1.0, PI / 2.0)),
            TrackedPose::new(7, Pose2D::new(0.0, 0.0, 0.0)),
            TrackedPose::new(9, Pose2D::new(4.0, 0.0, PI)),
        ]
    }

    #[test]
    fn test_footprint_default_dilates_by_half() {
        let fp = FootprintConfig::default();
        let corners = fp.corner_offsets();
        assert!((corners[0].x - 0.25).abs() < 1e-12);
        assert!((corners[0].y - 0.20).abs() < 1e-12);
        assert!((corners[2].x + 0.25).abs() < 1e-12);
        assert!((corners[2].y + 0.20).abs() < 1e-12);
    }

    #[test]
    fn test_obstacle_axis_aligned_centroid() {
        let obstacle = Obstacle::from_pose(&Pose2D::new(1.0, 0.0, 0.0), &FootprintConfig::default());
        let c = obstacle.centroid();
        assert!((c.x - 1.0).abs() < 1e-12);
        assert!(c.y.abs() < 1e-12);

        // every edge is parallel to an axis
        let v = obstacle.vertices();
        for i in 0..4 {
            let a = v[i];
            let b = v[(i + 1) % 4];
            assert!((a.x - b.x).abs() < 1e-12 || (a.y - b.y).abs() < 1e-12);
        }
    }

    #[test]
    fn test_obstacle_rotation() {
        let fp = FootprintConfig::default();
        let obstacle = Obstacle::from_pose(&Pose2D::new(0.0, 0.0, PI / 2.0), &fp);
        // the front-left corner (0.25, 0.2) rotates to (-0.2, 0.25)
        let v0 = obstacle.vertices()[0];
        assert!((v0.x + 0.2).abs() < 1e-12);
        assert!((v0.y - 0.25).abs() < 1e-12);
        assert!(obstacle.contains(0.0, 0.24));
        assert!(!obstacle.contains(0.24, 0.0));
    }

    #[test]
    fn test_default_policy_excludes_last_two() {
        let part = SnapshotPolicy::default().partition(&snapshot()).unwrap();
        assert_eq!(part.controlled.unwrap().id, 7);
        assert_eq!(part.heading_reference.unwrap().id, 9);
        let ids: Vec<i64> = part.obstacles.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_policy_by_id_without_reference() {
        let policy = SnapshotPolicy {
            controlled: Some(EntrySelector::Id(1)),
            heading_reference: None,
        };
        let part = policy.partition(&snapshot()).unwrap();
        assert!(part.heading_reference.is_none());
        let ids: Vec<i64> = part.obstacles.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![2, 7, 9]);
    }

    #[test]
    fn test_policy_missing_entry_is_error() {
        let policy = SnapshotPolicy {
            controlled: Some(EntrySelector::Id(42)),
            heading_reference: None,
        };
        assert!(matches!(policy.partition(&snapshot()), Err(NavError::SnapshotPolicy(_))));

        let policy = SnapshotPolicy {
            controlled: Some(EntrySelector::FromEnd(1)),
            heading_reference: Some(EntrySelector::Index(3)),
        };
        assert!(policy.partition(&snapshot()).is_err());
    }

    #[test]
    fn test_builder_preserves_order() {
        let builder = ObstacleModelBuilder::new(FootprintConfig::default());
        let obstacles = builder.build(&snapshot()[..2]);
        assert_eq!(obstacles.len(), 2);
        assert!((obstacles[1].centroid().x - 2.0).abs() < 1e-12);
        assert!((obstacles[1].centroid().y - 1.0).abs() < 1e-12);
    }
}
