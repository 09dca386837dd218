// Path Tracking module: Stanley steering and vehicle state model

pub mod stanley_controller;
pub mod vehicle_model;

pub use stanley_controller::*;
pub use vehicle_model::*;
