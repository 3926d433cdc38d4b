use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Persisted run flag and retention bound.
///
/// Field aliases accept the `settings.json` layout written by earlier
/// versions (`is_running`, `max_snapshots`); unknown fields are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlState {
    #[serde(alias = "is_running")]
    pub running: bool,
    #[serde(alias = "max_snapshots")]
    pub capacity: usize,
    /// Run that currently holds the flag. Absent while stopped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<RunOwner>,
}

/// Which run, in which process, set `running`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOwner {
    pub run: RunEpoch,
    pub pid: u32,
}

/// Identifies one start of the capture loop, across every process sharing
/// the data directory.
///
/// A loop keeps running only while the durable flag is set *and* the owner
/// on disk carries its epoch, so a loop that outlives a stop/start pair exits
/// instead of running alongside its successor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunEpoch(pub(crate) Uuid);

impl RunEpoch {
    pub(crate) fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for RunEpoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}
