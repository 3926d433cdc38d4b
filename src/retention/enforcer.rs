use std::collections::BTreeSet;
use std::sync::Arc;

use log::{debug, info, warn};

use crate::error_handling::types::{ConsistencyError, StorageError};
use crate::retention::types::RetentionReport;
use crate::storage::{ArtifactDirectory, ArtifactId, DescriptionStore};

/// Keeps the artifact directory within capacity and the description store
/// in step with it.
///
/// This is the only component that deletes artifacts or records. Deleting a
/// file and deleting its record are not atomic together; instead every pass
/// ends with a sweep that removes each record whose artifact is gone, so a
/// record left behind by a failed rewrite is removed by the next pass.
/// Artifacts without a record are reported but never deleted for that reason.
pub struct RetentionEnforcer {
    artifacts: Arc<ArtifactDirectory>,
    descriptions: Arc<DescriptionStore>,
}

impl RetentionEnforcer {
    pub fn new(artifacts: Arc<ArtifactDirectory>, descriptions: Arc<DescriptionStore>) -> Self {
        Self {
            artifacts,
            descriptions,
        }
    }

    /// Deletes the oldest artifacts beyond `capacity` together with their
    /// records, then sweeps orphan records.
    ///
    /// Calling it again with the directory at or below capacity is a no-op.
    pub fn enforce(&self, capacity: usize) -> Result<RetentionReport, StorageError> {
        let listed = self.artifacts.list()?;
        let excess = listed.len().saturating_sub(capacity);
        let mut report = RetentionReport {
            examined: listed.len(),
            ..Default::default()
        };
        let mut present: BTreeSet<ArtifactId> = listed.iter().cloned().collect();

        if excess > 0 {
            info!(
                "{} artifact(s) over capacity {}, removing the oldest {}",
                listed.len(),
                capacity,
                excess
            );
        }
        for id in listed.iter().take(excess) {
            match self.artifacts.delete(id) {
                Ok(_) => {
                    present.remove(id);
                    report.artifacts_removed.push(id.clone());
                }
                Err(e) => {
                    warn!("Could not remove {}, retrying next pass: {}", id, e);
                    report.failed_removals.push(id.clone());
                }
            }
        }

        self.sweep(&present, &mut report)?;
        report.retained = present.len();
        Ok(report)
    }

    /// Sweeps orphan records without trimming anything.
    pub fn reconcile(&self) -> Result<RetentionReport, StorageError> {
        let present: BTreeSet<ArtifactId> = self.artifacts.list()?.into_iter().collect();
        let mut report = RetentionReport {
            examined: present.len(),
            ..Default::default()
        };
        self.sweep(&present, &mut report)?;
        report.retained = present.len();
        info!(
            "Reconciled {} artifact(s): {} orphan record(s) removed, {} undescribed",
            report.retained,
            report.records_removed,
            report.undescribed().count()
        );
        Ok(report)
    }

    /// Deletes one artifact and its record on request of the control surface.
    ///
    /// Returns false when neither existed.
    pub fn remove(&self, id: &ArtifactId) -> Result<bool, StorageError> {
        let file_removed = self.artifacts.delete(id)?;
        let record_removed = self.descriptions.delete(id)?;
        info!(
            "Removed {} (file: {}, description: {})",
            id, file_removed, record_removed
        );
        Ok(file_removed || record_removed)
    }

    fn sweep(
        &self,
        present: &BTreeSet<ArtifactId>,
        report: &mut RetentionReport,
    ) -> Result<(), StorageError> {
        let keys = self.descriptions.ids()?;

        for id in present.difference(&keys) {
            debug!("Artifact {} has no description", id);
            report
                .findings
                .push(ConsistencyError::UndescribedArtifact(id.clone()));
        }

        // a record is an orphan only when its file is really gone, not when
        // it merely falls outside the configured prefix or extension
        let orphans: BTreeSet<ArtifactId> = keys
            .difference(present)
            .filter(|id| !self.artifacts.path_for(id).is_file())
            .cloned()
            .collect();
        if orphans.is_empty() {
            return Ok(());
        }
        let unexpected: Vec<ConsistencyError> = orphans
            .iter()
            .filter(|id| !report.artifacts_removed.contains(*id))
            .map(|id| {
                warn!("Description record {} has no artifact, removing", id);
                ConsistencyError::OrphanRecord(id.clone())
            })
            .collect();
        report.findings.extend(unexpected);
        report.records_removed = self.descriptions.delete_many(&orphans)?;
        Ok(())
    }
}
