//! Command outputs to the front and back drive boards

use std::sync::Arc;

use parking_lot::Mutex;

use crate::common::{ControlCommand, DriveOutput};

/// Both drive boards. Every command goes to both.
#[derive(Clone)]
pub struct DualDrive {
    front: Arc<dyn DriveOutput>,
    back: Arc<dyn DriveOutput>,
}

impl DualDrive {
    pub fn new(front: Arc<dyn DriveOutput>, back: Arc<dyn DriveOutput>) -> Self {
        DualDrive { front, back }
    }

    pub fn dispatch(&self, command: ControlCommand) {
        self.front.send(command);
        self.back.send(command);
    }

    pub fn stop(&self) {
        self.dispatch(ControlCommand::zero());
    }
}

/// Sends the zero command when dropped
pub struct StopGuard {
    drive: DualDrive,
}

impl StopGuard {
    pub fn new(drive: DualDrive) -> Self {
        StopGuard { drive }
    }
}

impl Drop for StopGuard {
    fn drop(&mut self) {
        log::debug!("Stop guard released, zeroing drive outputs");
        self.drive.stop();
    }
}

/// Keeps every command it receives
#[derive(Debug, Default)]
pub struct RecordingDrive {
    commands: Mutex<Vec<ControlCommand>>,
}

impl RecordingDrive {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> Vec<ControlCommand> {
        self.commands.lock().clone()
    }

    pub fn last(&self) -> Option<ControlCommand> {
        self.commands.lock().last().copied()
    }
}

impl DriveOutput for RecordingDrive {
    fn send(&self, command: ControlCommand) {
        self.commands.lock().push(command);
    }
}

/// Writes commands to the log
#[derive(Debug, Clone)]
pub struct LogDrive {
    name: String,
}

impl LogDrive {
    pub fn new(name: &str) -> Self {
        LogDrive { name: name.to_string() }
    }
}

impl DriveOutput for LogDrive {
    fn send(&self, command: ControlCommand) {
        log::trace!(
            "{}: linear={:.3} angular={:.3}",
            self.name,
            command.linear,
            command.angular
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dual_drive_mirrors_commands() {
        let front = Arc::new(RecordingDrive::new());
        let back = Arc::new(RecordingDrive::new());
        let drive = DualDrive::new(front.clone(), back.clone());
        drive.dispatch(ControlCommand::new(0.2, -0.1));
        drive.stop();
        assert_eq!(front.commands(), back.commands());
        assert_eq!(front.commands().len(), 2);
        assert!(front.last().unwrap().is_zero());
    }

    #[test]
    fn test_stop_guard_zeroes_on_drop() {
        let front = Arc::new(RecordingDrive::new());
        let back = Arc::new(LogDrive::new("back"));
        let drive = DualDrive::new(front.clone(), back);
        {
            let _guard = StopGuard::new(drive.clone());
            drive.dispatch(ControlCommand::new(0.2, 0.3));
        }
        assert_eq!(front.last(), Some(ControlCommand::zero()));
    }
}
