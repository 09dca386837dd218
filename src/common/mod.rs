//! Common types, traits, and error definitions for pibot_nav
//!
//! This module provides the foundational building blocks shared by the
//! planning, tracking and control modules.

pub mod types;
pub mod traits;
pub mod error;

pub use types::*;
pub use traits::*;
pub use error::*;
