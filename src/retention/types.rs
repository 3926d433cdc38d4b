use serde::Serialize;

use crate::error_handling::types::ConsistencyError;
use crate::storage::types::ArtifactId;

/// Outcome of one retention or reconciliation pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RetentionReport {
    /// Artifacts present when the pass started.
    pub examined: usize,
    /// Artifacts deleted to get back under capacity, oldest first.
    pub artifacts_removed: Vec<ArtifactId>,
    /// Artifacts that should have been deleted but whose file could not be removed.
    pub failed_removals: Vec<ArtifactId>,
    /// Description records deleted, including orphans left by earlier passes.
    pub records_removed: usize,
    /// Artifacts remaining after the pass.
    pub retained: usize,
    /// Divergences seen between the directory and the store.
    #[serde(skip)]
    pub findings: Vec<ConsistencyError>,
}

impl RetentionReport {
    pub fn is_noop(&self) -> bool {
        self.artifacts_removed.is_empty() && self.records_removed == 0
    }

    pub fn undescribed(&self) -> impl Iterator<Item = &ArtifactId> {
        self.findings.iter().filter_map(|f| match f {
            ConsistencyError::UndescribedArtifact(id) => Some(id),
            ConsistencyError::OrphanRecord(_) => None,
        })
    }
}
