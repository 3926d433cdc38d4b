use serde::Serialize;
use std::path::PathBuf;

use crate::storage::types::ArtifactId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Status {
    pub running: bool,
    pub capacity: usize,
    /// Artifacts currently retained
    pub count: usize,
}

/// One artifact as shown on the timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimelineEntry {
    pub id: ArtifactId,
    /// Local time, e.g. `Friday, March 01, 2024 • 09:00:00`
    pub captured_at: String,
    /// `None` when the artifact has no record yet
    pub description: Option<String>,
}

/// Bytes of one artifact, for rendering.
#[derive(Debug, Clone)]
pub struct ArtifactImage {
    pub id: ArtifactId,
    pub path: PathBuf,
    pub bytes: Vec<u8>,
}
