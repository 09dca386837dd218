//! Latest-value sensor feeds
//!
//! A feed is a single-writer cell holding the most recent stamped value.
//! Readers copy the whole value out under the lock, can filter by age, and can
//! block until the first value arrives.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::common::Pose2D;

/// A value together with the time it was published
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stamped<T> {
    pub value: T,
    pub at: Instant,
}

impl<T> Stamped<T> {
    pub fn age(&self) -> Duration {
        self.at.elapsed()
    }
}

struct Shared<T> {
    slot: Mutex<Option<Stamped<T>>>,
    updated: Condvar,
}

/// Publishing half of a feed. Not `Clone`: there is exactly one writer.
pub struct SnapshotWriter<T> {
    shared: Arc<Shared<T>>,
}

/// Reading half of a feed
pub struct SnapshotReader<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for SnapshotReader<T> {
    fn clone(&self) -> Self {
        SnapshotReader {
            shared: Arc::clone(&self.shared),
        }
    }
}

/// Create an empty feed
pub fn snapshot_cell<T: Copy>() -> (SnapshotWriter<T>, SnapshotReader<T>) {
    let shared = Arc::new(Shared {
        slot: Mutex::new(None),
        updated: Condvar::new(),
    });
    (
        SnapshotWriter {
            shared: Arc::clone(&shared),
        },
        SnapshotReader { shared },
    )
}

impl<T: Copy> SnapshotWriter<T> {
    /// Replace the current value and wake blocked readers
    pub fn publish(&self, value: T) {
        *self.shared.slot.lock() = Some(Stamped {
            value,
            at: Instant::now(),
        });
        self.shared.updated.notify_all();
    }

    pub fn reader(&self) -> SnapshotReader<T> {
        SnapshotReader {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T: Copy> SnapshotReader<T> {
    pub fn latest_stamped(&self) -> Option<Stamped<T>> {
        *self.shared.slot.lock()
    }

    pub fn latest(&self) -> Option<T> {
        self.latest_stamped().map(|s| s.value)
    }

    /// Latest value, unless it is older than `max_age`
    pub fn latest_fresh(&self, max_age: Duration) -> Option<T> {
        self.latest_stamped()
            .filter(|s| s.age() <= max_age)
            .map(|s| s.value)
    }

    /// Block until a value is present or `timeout` elapses
    pub fn wait_for(&self, timeout: Duration) -> Option<T> {
        let deadline = Instant::now() + timeout;
        let mut slot = self.shared.slot.lock();
        while slot.is_none() {
            if self.shared.updated.wait_until(&mut slot, deadline).timed_out() {
                break;
            }
        }
        (*slot).map(|s| s.value)
    }
}

/// One record of the external pose-tracking feed. Headings arrive in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoseRecord {
    pub id: i64,
    pub x: f64,
    pub y: f64,
    pub theta_deg: f64,
}

impl PoseRecord {
    /// Pose in radians, or `None` when any field is not finite
    pub fn to_pose(&self) -> Option<Pose2D> {
        [self.x, self.y, self.theta_deg]
            .iter()
            .all(|v| v.is_finite())
            .then(|| Pose2D::new(self.x, self.y, self.theta_deg.to_radians()))
    }
}

/// Publish the first record of a tracking message as the robot pose. Empty
/// messages and non-finite records leave the feed untouched.
pub fn publish_tracked(writer: &SnapshotWriter<Pose2D>, records: &[PoseRecord]) -> bool {
    let Some(record) = records.first() else {
        return false;
    };
    match record.to_pose() {
        Some(pose) => {
            writer.publish(pose);
            true
        }
        None => {
            log::warn!("Dropping non-finite pose for id {}: {:?}", record.id, record);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_empty_cell() {
        let (_writer, reader) = snapshot_cell::<f64>();
        assert!(reader.latest().is_none());
        assert!(reader.wait_for(Duration::from_millis(20)).is_none());
    }

    #[test]
    fn test_publish_overwrites() {
        let (writer, reader) = snapshot_cell::<f64>();
        writer.publish(1.0);
        writer.publish(2.0);
        assert_eq!(reader.latest(), Some(2.0));
        assert_eq!(reader.clone().latest(), Some(2.0));
        assert_eq!(writer.reader().latest(), Some(2.0));
    }

    #[test]
    fn test_latest_fresh_filters_by_age() {
        let (writer, reader) = snapshot_cell::<f64>();
        writer.publish(5.0);
        assert_eq!(reader.latest_fresh(Duration::from_secs(10)), Some(5.0));
        thread::sleep(Duration::from_millis(30));
        assert_eq!(reader.latest_fresh(Duration::from_millis(5)), None);
        assert_eq!(reader.latest(), Some(5.0));
    }

    #[test]
    fn test_wait_for_wakes_on_publish() {
        let (writer, reader) = snapshot_cell::<Pose2D>();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            writer.publish(Pose2D::new(1.0, 2.0, 0.5));
        });
        let pose = reader.wait_for(Duration::from_secs(5));
        assert_eq!(pose, Some(Pose2D::new(1.0, 2.0, 0.5)));
        handle.join().unwrap();
    }

    #[test]
    fn test_publish_tracked_takes_first_record() {
        let (writer, reader) = snapshot_cell::<Pose2D>();
        assert!(!publish_tracked(&writer, &[]));
        assert!(reader.latest().is_none());

        let records = [
            PoseRecord { id: 4, x: 1.0, y: -1.0, theta_deg: 90.0 },
            PoseRecord { id: 7, x: 9.0, y: 9.0, theta_deg: 0.0 },
        ];
        assert!(publish_tracked(&writer, &records));
        let pose = reader.latest().unwrap();
        assert_eq!((pose.x, pose.y), (1.0, -1.0));
        assert!((pose.yaw - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
    }

    #[test]
    fn test_publish_tracked_rejects_non_finite() {
        let (writer, reader) = snapshot_cell::<Pose2D>();
        writer.publish(Pose2D::new(1.0, 1.0, 0.0));
        for bad in [
            PoseRecord { id: 4, x: f64::NAN, y: 0.0, theta_deg: 0.0 },
            PoseRecord { id: 4, x: 0.0, y: f64::NEG_INFINITY, theta_deg: 0.0 },
            PoseRecord { id: 4, x: 0.0, y: 0.0, theta_deg: f64::INFINITY },
        ] {
            assert!(bad.to_pose().is_none());
            assert!(!publish_tracked(&writer, &[bad]));
        }
        assert_eq!(reader.latest(), Some(Pose2D::new(1.0, 1.0, 0.0)));
    }
}
