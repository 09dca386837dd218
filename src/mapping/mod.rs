// Obstacle mapping module

pub mod obstacle_model;
pub mod collision;

pub use obstacle_model::*;
pub use collision::*;
