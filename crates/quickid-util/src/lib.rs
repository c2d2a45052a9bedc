//! Shared utilities for quickid
//!
//! This crate provides:
//! - The wall-clock abstraction (`Clock`, `SystemClock`, `ManualClock`)
//! - Wait strategies used while the clock catches up to a requested instant
//! - Error types
//! - Default paths for the configuration file

mod error;
mod paths;
mod time;

pub use error::*;
pub use paths::*;
pub use time::*;
