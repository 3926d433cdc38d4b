//! Capture scheduler
//!
//! Hosts the periodic capture loop of one run. See [`CaptureScheduler`].

pub mod capture_scheduler;
#[cfg(test)]
pub mod integration_tests;
pub mod types;

pub use capture_scheduler::CaptureScheduler;
pub use types::{SkipReason, TickOutcome};
