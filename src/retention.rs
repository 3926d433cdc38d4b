//! Rolling retention of captured artifacts.

pub mod enforcer;
pub mod types;

pub use enforcer::RetentionEnforcer;
pub use types::RetentionReport;
