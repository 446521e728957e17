//! Utility functions used throughout the crate.
//!
//! # Contents
//!
//! - [`time::unix`]: Wall-clock time as a POSIX duration

pub(crate) mod time;
