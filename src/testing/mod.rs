//! Testing utilities for crabsnap
//!
//! Synthetic frames and reference device profiles, so sessions can be
//! exercised end to end without camera hardware.

pub mod synthetic_data;

pub use synthetic_data::{synthetic_frame, ReferenceDevices};
