//! Monotonic sortable identifier generation
//!
//! This crate provides:
//! - `Timebase`: a wall-clock wrapper whose timestamps never decrease and
//!   which can wait for the clock to reach a requested instant
//! - `QuickId`: a generator of fixed-width, time-ordered ID strings
//!   (`<time:9><system tag><sequence:4>`, base-32) and their parser
//!
//! Successive IDs from one generator are strictly increasing, both as
//! `(time, sequence)` tuples and as byte strings.

pub mod base32;
mod generator;
mod parsed;
mod timebase;

pub use generator::*;
pub use parsed::*;
pub use timebase::*;

pub use quickid_util::{Clock, ManualClock, QuickIdError, Result, SystemClock, WaitStrategy};
