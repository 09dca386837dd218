//! Utility modules for pibot_nav

pub mod visualization;

pub use visualization::{episode_figure, save_episode_png};
