//! Simulated drive base
//!
//! Integrates every command it receives with the kinematic bicycle model and
//! publishes the resulting pose on the tracking feed, standing in for the
//! drive boards and the overhead camera.

use parking_lot::Mutex;

use crate::common::{ControlCommand, DriveOutput, Pose2D};
use crate::control::feeds::SnapshotWriter;
use crate::path_tracking::{bicycle_step, VehicleConfig};

pub struct SimulatedRobot {
    pose: Mutex<Pose2D>,
    wheelbase: f64,
    dt: f64,
    feed: SnapshotWriter<Pose2D>,
}

impl SimulatedRobot {
    /// Place the robot at `initial` and publish that pose
    pub fn new(initial: Pose2D, vehicle: &VehicleConfig, feed: SnapshotWriter<Pose2D>) -> Self {
        feed.publish(initial);
        SimulatedRobot {
            pose: Mutex::new(initial),
            wheelbase: vehicle.wheelbase,
            dt: vehicle.dt,
            feed,
        }
    }

    pub fn pose(&self) -> Pose2D {
        *self.pose.lock()
    }
}

impl DriveOutput for SimulatedRobot {
    fn send(&self, command: ControlCommand) {
        let mut pose = self.pose.lock();
        // commands carry the negated steering angle
        *pose = bicycle_step(*pose, command.linear, -command.angular, self.wheelbase, self.dt);
        self.feed.publish(*pose);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::feeds::snapshot_cell;

    #[test]
    fn test_simulated_robot_publishes_pose() {
        let (writer, reader) = snapshot_cell();
        let robot = SimulatedRobot::new(Pose2D::new(1.0, 0.0, 0.0), &VehicleConfig::default(), writer);
        assert_eq!(reader.latest(), Some(Pose2D::new(1.0, 0.0, 0.0)));

        robot.send(ControlCommand::new(0.2, 0.0));
        let pose = reader.latest().unwrap();
        assert!((pose.x - 1.02).abs() < 1e-12);
        assert_eq!(pose, robot.pose());

        robot.send(ControlCommand::zero());
        assert_eq!(reader.latest(), Some(pose));
    }

    #[test]
    fn test_negative_angular_turns_left() {
        let (writer, _reader) = snapshot_cell();
        let robot = SimulatedRobot::new(Pose2D::origin(), &VehicleConfig::default(), writer);
        robot.send(ControlCommand::new(0.2, -0.3));
        assert!(robot.pose().yaw > 0.0);

        let (writer, _reader) = snapshot_cell();
        let robot = SimulatedRobot::new(Pose2D::origin(), &VehicleConfig::default(), writer);
        robot.send(ControlCommand::new(0.0, -0.5));
        assert!((robot.pose().yaw - 0.05).abs() < 1e-12);
    }
}
