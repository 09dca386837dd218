//! Episode plots with gnuplot
//!
//! Draws the obstacle rectangles, the reference course and the driven
//! trajectory of one episode into a single set of axes.

use gnuplot::{AutoOption, AxesCommon, Caption, Color, Figure, LineWidth, PointSize, PointSymbol};

use crate::common::{NavError, NavResult, Pose2D, RobotState};
use crate::control::EpisodeReport;
use crate::mapping::Obstacle;

/// Color palette for consistent styling
pub mod colors {
    pub const OBSTACLE: &str = "#000000";
    pub const COURSE: &str = "#FF0000";
    pub const TRAJECTORY: &str = "#0000FF";
    pub const START: &str = "#00FF00";
    pub const GOAL: &str = "#FFA500";
}

/// Closed outline of an obstacle, first vertex repeated at the end
pub fn polygon_outline(obstacle: &Obstacle) -> (Vec<f64>, Vec<f64>) {
    obstacle
        .vertices()
        .iter()
        .chain(obstacle.vertices().iter().take(1))
        .map(|v| (v.x, v.y))
        .unzip()
}

pub fn trajectory_xy(states: &[RobotState]) -> (Vec<f64>, Vec<f64>) {
    states.iter().map(|s| (s.x, s.y)).unzip()
}

/// Build the figure for one episode
pub fn episode_figure(report: &EpisodeReport, goal: &Pose2D, title: &str) -> Figure {
    let mut fg = Figure::new();
    let axes = fg.axes2d();
    axes.set_title(title, &[]);
    axes.set_x_label("X [m]", &[]);
    axes.set_y_label("Y [m]", &[]);
    axes.set_aspect_ratio(AutoOption::Fix(1.0));

    for (i, obstacle) in report.obstacles.iter().enumerate() {
        let (ox, oy) = polygon_outline(obstacle);
        let caption = if i == 0 { "Obstacles" } else { "" };
        axes.lines(&ox, &oy, &[Caption(caption), Color(colors::OBSTACLE), LineWidth(1.5)]);
    }

    if let Some(course) = &report.reference {
        axes.points(
            course.cx(),
            course.cy(),
            &[Caption("Course"), Color(colors::COURSE), PointSymbol('.'), PointSize(0.5)],
        );
        axes.points(
            &[course.cx()[0]],
            &[course.cy()[0]],
            &[Caption("Start"), Color(colors::START), PointSymbol('O'), PointSize(1.5)],
        );
    }

    let (x, y) = trajectory_xy(&report.states);
    if !x.is_empty() {
        axes.lines(&x, &y, &[Caption("Trajectory"), Color(colors::TRAJECTORY), LineWidth(2.0)]);
    }

    axes.points(
        &[goal.x],
        &[goal.y],
        &[Caption("Goal"), Color(colors::GOAL), PointSymbol('x'), PointSize(1.5)],
    );
    fg
}

/// Render an episode to a PNG file
pub fn save_episode_png(report: &EpisodeReport, goal: &Pose2D, path: &str) -> NavResult<()> {
    let title = format!("{:?} after {} ticks", report.stop_reason, report.tracking_ticks);
    let mut fg = episode_figure(report, goal, &title);
    fg.save_to_png(path, 800, 800).map_err(|e| NavError::Plot(e.to_string()))?;
    log::info!("Episode plot saved to {}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::StopReason;
    use crate::mapping::FootprintConfig;

    #[test]
    fn test_polygon_outline_is_closed() {
        let obstacle = Obstacle::from_pose(&Pose2D::new(1.0, 0.0, 0.0), &FootprintConfig::default());
        let (x, y) = polygon_outline(&obstacle);
        assert_eq!(x.len(), 5);
        assert_eq!(x[0], x[4]);
        assert_eq!(y[0], y[4]);
    }

    #[test]
    fn test_episode_figure_builds() {
        let report = EpisodeReport {
            stop_reason: StopReason::Completed,
            obstacles: vec![Obstacle::from_pose(&Pose2D::new(1.0, 1.0, 0.3), &FootprintConfig::default())],
            reference: None,
            states: vec![RobotState::new(0.0, 0.0, 0.0, 0.0, 0.0), RobotState::new(0.1, 0.0, 0.0, 0.1, 0.0)],
            tracking_ticks: 1,
            alignment_ticks: 0,
        };
        let (x, _) = trajectory_xy(&report.states);
        assert_eq!(x, vec![0.0, 0.1]);
        let _fg = episode_figure(&report, &Pose2D::new(3.5, 0.3, 0.0), "episode");
    }
}
