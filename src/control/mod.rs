//! Control module
//!
//! Sensor feeds, drive outputs, the proximity interlock and the episode state
//! machine that ties planning and tracking together.

pub mod feeds;
pub mod safety;
pub mod drive;
pub mod sim;
pub mod control_loop;

pub use feeds::*;
pub use safety::*;
pub use drive::*;
pub use sim::*;
pub use control_loop::*;
