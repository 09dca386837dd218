//! Episode state machine
//!
//! One episode waits for the first tracked pose, plans once against the
//! obstacle snapshot, tracks the smoothed course at a fixed rate, turns in place
//! to the final heading and stops. Every exit path leaves both drive outputs at
//! zero.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::common::{ControlCommand, CurveFitter, MotionPlanner, NavError, NavResult, Pose2D, RobotState, TrackedPose};
use crate::config::NavConfig;
use crate::control::drive::{DualDrive, StopGuard};
use crate::control::feeds::SnapshotReader;
use crate::control::safety::{InterlockStatus, SafetyInterlock};
use crate::mapping::{CollisionChecker, Obstacle, ObstacleModelBuilder, SnapshotPolicy};
use crate::path_planning::{PlanRequestCoordinator, ReferenceTrajectory, TrajectorySmoother};
use crate::path_tracking::{
    normalize_angle, LocalizationMode, StanleyController, VehicleConfig, VehicleStateModel,
};

/// Longest single condvar wait while blocked on the first pose, so a shutdown
/// request is noticed promptly
const POSE_WAIT_SLICE: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoopConfig {
    /// Tick rate [Hz]; zero or negative runs ticks back to back
    pub tick_rate_hz: f64,
    pub initial_pose_timeout_secs: f64,
    /// Poses older than this fall back to the model-only update
    pub pose_stale_after_secs: f64,
    pub align_tolerance_deg: f64,
    /// Angular command used while turning in place
    pub align_angular: f64,
    pub align_timeout_secs: Option<f64>,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: 10.0,
            initial_pose_timeout_secs: 30.0,
            pose_stale_after_secs: 0.5,
            align_tolerance_deg: 5.0,
            align_angular: -0.5,
            align_timeout_secs: None,
        }
    }
}

impl LoopConfig {
    pub fn initial_pose_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.initial_pose_timeout_secs.max(0.0))
    }

    pub fn pose_stale_after(&self) -> Duration {
        Duration::from_secs_f64(self.pose_stale_after_secs.max(0.0))
    }

    pub fn align_timeout(&self) -> Option<Duration> {
        self.align_timeout_secs.map(|secs| Duration::from_secs_f64(secs.max(0.0)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopPhase {
    AwaitingInitialPose,
    Planning,
    Tracking,
    HeadingAlignment,
    Stopped,
}

impl LoopPhase {
    pub fn name(&self) -> &'static str {
        match self {
            LoopPhase::AwaitingInitialPose => "AwaitingInitialPose",
            LoopPhase::Planning => "Planning",
            LoopPhase::Tracking => "Tracking",
            LoopPhase::HeadingAlignment => "HeadingAlignment",
            LoopPhase::Stopped => "Stopped",
        }
    }
}

/// Why an episode that did not fail ended
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StopReason {
    Completed,
    ProximityHalt { reading: f64 },
    Shutdown,
    AlignmentTimeout { heading_error: f64 },
}

/// What happened during one episode
#[derive(Debug, Clone)]
pub struct EpisodeReport {
    pub stop_reason: StopReason,
    pub obstacles: Vec<Obstacle>,
    pub reference: Option<ReferenceTrajectory>,
    /// Robot state after every tracking tick, starting with the initial state
    pub states: Vec<RobotState>,
    pub tracking_ticks: usize,
    pub alignment_ticks: usize,
}

impl EpisodeReport {
    fn new() -> Self {
        EpisodeReport {
            stop_reason: StopReason::Completed,
            obstacles: Vec::new(),
            reference: None,
            states: Vec::new(),
            tracking_ticks: 0,
            alignment_ticks: 0,
        }
    }
}

/// Sensor feeds read by the loop
pub struct LoopFeeds {
    pub poses: SnapshotReader<Pose2D>,
    pub proximity: SnapshotReader<f64>,
}

/// Fixed-rate sleeper. Ticks never overlap; an overrun tick restarts the
/// schedule from now.
struct Rate {
    period: Option<Duration>,
    next: Instant,
}

impl Rate {
    fn new(hz: f64) -> Self {
        Rate {
            period: (hz > 0.0).then(|| Duration::from_secs_f64(1.0 / hz)),
            next: Instant::now(),
        }
    }

    fn sleep(&mut self) {
        if let Some(period) = self.period {
            self.next += period;
            let now = Instant::now();
            if self.next > now {
                thread::sleep(self.next - now);
            } else {
                self.next = now;
            }
        }
    }
}

pub struct ControlLoop<P, F> {
    config: LoopConfig,
    vehicle: VehicleConfig,
    policy: SnapshotPolicy,
    builder: ObstacleModelBuilder,
    coordinator: PlanRequestCoordinator<P>,
    smoother: TrajectorySmoother<F>,
    tracker: StanleyController,
    model: VehicleStateModel,
    interlock: SafetyInterlock,
    poses: SnapshotReader<Pose2D>,
    drive: DualDrive,
    shutdown: Arc<AtomicBool>,
    phases: Vec<LoopPhase>,
}

impl<P: MotionPlanner, F: CurveFitter> ControlLoop<P, F> {
    pub fn new(
        config: &NavConfig,
        planner: P,
        fitter: F,
        feeds: LoopFeeds,
        drive: DualDrive,
        shutdown: Arc<AtomicBool>,
    ) -> Self {
        ControlLoop {
            config: config.control,
            vehicle: config.vehicle,
            policy: config.snapshot,
            builder: ObstacleModelBuilder::new(config.footprint),
            coordinator: PlanRequestCoordinator::new(planner, config.planning),
            smoother: TrajectorySmoother::new(fitter, config.smoothing),
            tracker: StanleyController::new(&config.stanley, config.vehicle.wheelbase),
            model: VehicleStateModel::new(&config.vehicle),
            interlock: SafetyInterlock::new(&config.safety, feeds.proximity),
            poses: feeds.poses,
            drive,
            shutdown,
            phases: Vec::new(),
        }
    }

    pub fn phase(&self) -> Option<LoopPhase> {
        self.phases.last().copied()
    }

    /// Phases entered during the last episode, in order
    pub fn phase_history(&self) -> &[LoopPhase] {
        &self.phases
    }

    /// Run one episode against a pose snapshot. Failures before tracking are
    /// errors; everything after is reported through [`StopReason`].
    pub fn run(&mut self, snapshot: &[TrackedPose]) -> NavResult<EpisodeReport> {
        let _guard = StopGuard::new(self.drive.clone());
        self.phases.clear();
        let mut report = EpisodeReport::new();

        self.enter(LoopPhase::AwaitingInitialPose);
        let partition = match self.policy.partition(snapshot) {
            Ok(partition) => partition,
            Err(e) => return Err(self.fail(e)),
        };
        if let Some(controlled) = partition.controlled {
            log::info!("Controlled robot id {}", controlled.id);
        }
        let start = match self.await_initial_pose() {
            Ok(Some(pose)) => pose,
            Ok(None) => return Ok(self.finish(StopReason::Shutdown, report)),
            Err(e) => return Err(self.fail(e)),
        };
        log::info!("Initial pose ({:.3}, {:.3}, {:.3})", start.x, start.y, start.yaw);

        self.enter(LoopPhase::Planning);
        let checker = CollisionChecker::new(self.builder.build(&partition.obstacles));
        let request = self.coordinator.request_from(start);
        let planned = self
            .coordinator
            .plan(&request, &checker)
            .and_then(|path| self.smoother.smooth(&path));
        let course = match planned {
            Ok(course) => course,
            Err(e) => return Err(self.fail(e)),
        };
        report.obstacles = checker.obstacles().to_vec();

        self.enter(LoopPhase::Tracking);
        let mut rate = Rate::new(self.config.tick_rate_hz);
        let mut state = RobotState::new(course.cx()[0], course.cy()[0], course.cyaw()[0], 0.0, 0.0);
        let (mut target_idx, _) = self.tracker.calc_target_index(&state, &course);
        report.states.push(state);
        while target_idx < course.last_index() {
            if let Some(reason) = self.check_stop() {
                report.reference = Some(course);
                return Ok(self.finish(reason, report));
            }
            let accel = self.model.pid_accel(self.vehicle.target_speed, state.v);
            let (delta, idx) = self.tracker.control(&state, &course, target_idx);
            target_idx = idx;
            let mode = match self.poses.latest_fresh(self.config.pose_stale_after()) {
                Some(pose) => LocalizationMode::Localized(pose),
                None => {
                    log::debug!("No fresh pose, keeping model state");
                    LocalizationMode::ModelOnly
                }
            };
            state = self.model.advance(state, accel, delta, mode);
            self.drive.dispatch(state.command());
            log::trace!(
                "tick {}: idx={}/{} x={:.3} y={:.3} yaw={:.3} v={:.3} w={:.3}",
                report.tracking_ticks,
                target_idx,
                course.last_index(),
                state.x,
                state.y,
                state.yaw,
                state.v,
                state.w
            );
            report.states.push(state);
            report.tracking_ticks += 1;
            rate.sleep();
        }
        log::info!("Reached the end of the course after {} ticks", report.tracking_ticks);

        self.enter(LoopPhase::HeadingAlignment);
        let target_yaw = partition
            .heading_reference
            .map(|reference| reference.pose.yaw)
            .unwrap_or_else(|| course.final_yaw());
        report.reference = Some(course);
        let tolerance = self.config.align_tolerance_deg.to_radians();
        let started = Instant::now();
        loop {
            if let Some(reason) = self.check_stop() {
                return Ok(self.finish(reason, report));
            }
            let yaw = self.poses.latest().map_or(state.yaw, |pose| pose.yaw);
            let heading_error = normalize_angle(yaw - target_yaw);
            if heading_error.abs() <= tolerance {
                break;
            }
            if let Some(limit) = self.config.align_timeout() {
                if started.elapsed() >= limit {
                    log::warn!("Heading alignment timed out {:.3} rad off target", heading_error);
                    return Ok(self.finish(StopReason::AlignmentTimeout { heading_error }, report));
                }
            }
            self.drive.dispatch(ControlCommand::new(0.0, self.config.align_angular));
            report.alignment_ticks += 1;
            rate.sleep();
        }

        Ok(self.finish(StopReason::Completed, report))
    }

    fn enter(&mut self, phase: LoopPhase) {
        log::info!("Phase -> {}", phase.name());
        self.phases.push(phase);
    }

    fn shutdown_requested(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed)
    }

    fn check_stop(&self) -> Option<StopReason> {
        if self.shutdown_requested() {
            return Some(StopReason::Shutdown);
        }
        match self.interlock.check() {
            InterlockStatus::Halt { reading } => Some(StopReason::ProximityHalt { reading }),
            InterlockStatus::Clear => None,
        }
    }

    fn await_initial_pose(&self) -> NavResult<Option<Pose2D>> {
        let timeout = self.config.initial_pose_timeout();
        let deadline = Instant::now() + timeout;
        loop {
            if self.shutdown_requested() {
                return Ok(None);
            }
            let now = Instant::now();
            if now >= deadline {
                return Err(NavError::InitialPoseTimeout(timeout.as_secs_f64()));
            }
            if let Some(pose) = self.poses.wait_for((deadline - now).min(POSE_WAIT_SLICE)) {
                return Ok(Some(pose));
            }
        }
    }

    fn stop(&mut self) {
        self.drive.stop();
        self.enter(LoopPhase::Stopped);
    }

    fn fail(&mut self, err: NavError) -> NavError {
        log::error!("Episode failed: {}", err);
        self.stop();
        err
    }

    fn finish(&mut self, reason: StopReason, mut report: EpisodeReport) -> EpisodeReport {
        log::info!("Episode stopped: {:?}", reason);
        self.stop();
        report.stop_reason = reason;
        report
    }
}
