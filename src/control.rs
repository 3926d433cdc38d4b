//! Control state shared between the control surface and the capture loop.
//!
//! - `types`: the persisted [`ControlState`] and the per-start [`RunEpoch`].
//! - `control_store`: durable JSON storage with atomic start/stop.

pub mod control_store;
pub mod types;

pub use control_store::ControlStore;
pub use types::{ControlState, RunEpoch, RunOwner};
