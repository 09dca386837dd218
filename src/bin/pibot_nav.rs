//! pibot_nav - plan around tracked robots and follow the path
//!
//! Reads a pose snapshot, plans from the controlled robot to the configured
//! goal and tracks the smoothed course on a simulated drive base. Exits with
//! status 1 when the proximity interlock halts the robot or the episode fails.

use std::path::PathBuf;
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::Parser;

use pibot_nav::control::{
    snapshot_cell, ControlLoop, DualDrive, LogDrive, LoopFeeds, SimulatedRobot, StopReason,
};
use pibot_nav::io::read_pose_snapshot;
use pibot_nav::path_planning::{CubicSplineFitter, RRTPlanner};
use pibot_nav::utils::save_episode_png;
use pibot_nav::{NavConfig, NavResult, Pose2D};

#[derive(Parser, Debug)]
#[command(name = "pibot_nav", version, about = "Obstacle-aware planning and Stanley path tracking")]
struct Args {
    /// TOML configuration file; built-in defaults when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Pose snapshot, one `id x y theta_deg` record per line
    #[arg(short, long, default_value = "pose.txt")]
    poses: PathBuf,

    /// Write a PNG plot of the episode
    #[arg(long)]
    plot: Option<String>,

    /// Seed the planner for a reproducible path
    #[arg(long)]
    seed: Option<u64>,
}

fn main() {
    let args = Args::parse();
    match run(&args) {
        Ok(code) => process::exit(code),
        Err(e) => {
            log::error!("{}", e);
            eprintln!("pibot_nav: {}", e);
            process::exit(1);
        }
    }
}

fn run(args: &Args) -> NavResult<i32> {
    let mut config = match &args.config {
        Some(path) => NavConfig::from_file(path)?,
        None => NavConfig::default(),
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(config.logging.level.as_str()))
        .init();
    if let Some(path) = &args.config {
        log::info!("Using config: {}", path.display());
    }
    if args.seed.is_some() {
        config.rrt.seed = args.seed;
    }

    let snapshot = read_pose_snapshot(&args.poses)?;
    let initial = match config.snapshot.partition(&snapshot)?.controlled {
        Some(controlled) => controlled.pose,
        None => {
            log::warn!("No controlled robot selected, simulating from the origin");
            Pose2D::origin()
        }
    };

    let (pose_writer, poses) = snapshot_cell();
    let (_proximity_writer, proximity) = snapshot_cell::<f64>();
    let robot = Arc::new(SimulatedRobot::new(initial, &config.vehicle, pose_writer));
    let drive = DualDrive::new(robot.clone(), Arc::new(LogDrive::new("back")));

    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&shutdown);
    let stop_drive = drive.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        log::info!("Received shutdown signal");
        stop_drive.stop();
        flag.store(true, Ordering::Relaxed);
    }) {
        log::warn!("Failed to install Ctrl-C handler: {}", e);
    }

    let mut control = ControlLoop::new(
        &config,
        RRTPlanner::new(config.rrt),
        CubicSplineFitter,
        LoopFeeds { poses, proximity },
        drive,
        shutdown,
    );
    let report = control.run(&snapshot)?;

    let end = robot.pose();
    log::info!(
        "Stopped ({:?}) after {} tracking and {} alignment ticks at ({:.3}, {:.3}, {:.1} deg)",
        report.stop_reason,
        report.tracking_ticks,
        report.alignment_ticks,
        end.x,
        end.y,
        end.yaw.to_degrees()
    );

    if let Some(path) = &args.plot {
        if let Err(e) = save_episode_png(&report, &config.planning.goal, path) {
            log::warn!("{}", e);
        }
    }

    Ok(match report.stop_reason {
        StopReason::ProximityHalt { .. } => 1,
        _ => 0,
    })
}
