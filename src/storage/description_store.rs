use std::collections::{BTreeMap, BTreeSet};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use log::{debug, error, info, warn};
use tempfile::NamedTempFile;

use crate::error_handling::types::StorageError;
use crate::storage::record_codec::{decode_record, encode_record};
use crate::storage::types::{ArtifactId, DescriptionRecord};

/// Append-only text file mapping artifact identifiers to their description.
///
/// Records are appended one line at a time; deletion loads every record,
/// filters the targets out and rewrites the whole file through a temporary
/// file renamed over the original. Mutations serialise on an internal lock,
/// so appends and rewrites issued from one process never interleave.
pub struct DescriptionStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl DescriptionStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                error!("Failed to create store dir {}: {}", parent.display(), e);
                StorageError::WriteFailed(parent.to_path_buf(), e)
            })?;
        }
        info!("DescriptionStore initialized at {}", path.display());
        Ok(Self {
            path,
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends a record for `id`. Uniqueness of `id` is the caller's concern.
    pub fn append(&self, id: &ArtifactId, text: &str) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut line = encode_record(id.as_str(), text);
        line.push('\n');
        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| {
                error!("Open append failed {}: {}", self.path.display(), e);
                StorageError::WriteFailed(self.path.clone(), e)
            })?;
        f.write_all(line.as_bytes()).map_err(|e| {
            error!("Write failed {}: {}", self.path.display(), e);
            StorageError::WriteFailed(self.path.clone(), e)
        })?;
        debug!("Appended description for {} ({} byte(s))", id, text.len());
        Ok(())
    }

    /// Every live record. A store that does not exist yet is empty.
    ///
    /// When a legacy file holds several lines for the same id, the last one wins.
    pub fn load_all(&self) -> Result<BTreeMap<ArtifactId, String>, StorageError> {
        Ok(self.read_records()?.into_iter().collect())
    }

    pub fn get(&self, id: &ArtifactId) -> Result<Option<String>, StorageError> {
        Ok(self.load_all()?.remove(id))
    }

    pub fn ids(&self) -> Result<BTreeSet<ArtifactId>, StorageError> {
        Ok(self.load_all()?.into_keys().collect())
    }

    pub fn records(&self) -> Result<Vec<DescriptionRecord>, StorageError> {
        Ok(self
            .load_all()?
            .into_iter()
            .map(|(id, text)| DescriptionRecord { id, text })
            .collect())
    }

    /// Removes the record for `id`. Returns whether anything was removed;
    /// an absent id is not an error.
    pub fn delete(&self, id: &ArtifactId) -> Result<bool, StorageError> {
        let targets = BTreeSet::from([id.clone()]);
        Ok(self.delete_many(&targets)? > 0)
    }

    /// Removes every record whose id is in `ids` with a single rewrite.
    ///
    /// Returns the number of distinct ids that had a record.
    pub fn delete_many(&self, ids: &BTreeSet<ArtifactId>) -> Result<usize, StorageError> {
        if ids.is_empty() {
            return Ok(0);
        }
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let records = self.read_records()?;
        let before = records.len();
        let removed: BTreeSet<&ArtifactId> = records
            .iter()
            .map(|(id, _)| id)
            .filter(|id| ids.contains(*id))
            .collect();
        if removed.is_empty() {
            debug!("No description to delete among {} id(s)", ids.len());
            return Ok(0);
        }
        let removed = removed.len();
        let kept: Vec<(ArtifactId, String)> = records
            .into_iter()
            .filter(|(id, _)| !ids.contains(id))
            .collect();
        self.rewrite(&kept)?;
        info!(
            "Deleted {} description(s), {} line(s) rewritten out of {}",
            removed,
            kept.len(),
            before
        );
        Ok(removed)
    }

    /// Identifiers whose description contains `query`, in chronological order.
    ///
    /// An empty query matches nothing. Any other query, whitespace included,
    /// is matched literally.
    pub fn search(&self, query: &str, case_insensitive: bool) -> Result<Vec<ArtifactId>, StorageError> {
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let needle = if case_insensitive {
            query.to_lowercase()
        } else {
            query.to_string()
        };
        let hits: Vec<ArtifactId> = self
            .load_all()?
            .into_iter()
            .filter(|(_, text)| {
                if case_insensitive {
                    text.to_lowercase().contains(&needle)
                } else {
                    text.contains(&needle)
                }
            })
            .map(|(id, _)| id)
            .collect();
        debug!("Search {:?} matched {} record(s)", query, hits.len());
        Ok(hits)
    }

    /// Records in file order. Malformed lines are skipped.
    fn read_records(&self) -> Result<Vec<(ArtifactId, String)>, StorageError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("Description store {} does not exist yet", self.path.display());
                return Ok(Vec::new());
            }
            Err(e) => {
                error!("Failed to read description store {}: {}", self.path.display(), e);
                return Err(StorageError::ReadFailed(self.path.clone(), e));
            }
        };
        let mut records = Vec::new();
        for (n, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let Some((raw_id, text)) = decode_record(line) else {
                warn!("Skipping malformed line {} in {}", n + 1, self.path.display());
                continue;
            };
            match ArtifactId::parse(raw_id) {
                Ok(id) => records.push((id, text)),
                Err(e) => warn!("Skipping line {} in {}: {}", n + 1, self.path.display(), e),
            }
        }
        Ok(records)
    }

    fn rewrite(&self, records: &[(ArtifactId, String)]) -> Result<(), StorageError> {
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| {
            error!("Failed to create temp file in {}: {}", dir.display(), e);
            StorageError::WriteFailed(dir.to_path_buf(), e)
        })?;
        for (id, text) in records {
            writeln!(tmp, "{}", encode_record(id.as_str(), text)).map_err(|e| {
                error!("Write failed {}: {}", tmp.path().display(), e);
                StorageError::WriteFailed(tmp.path().to_path_buf(), e)
            })?;
        }
        tmp.as_file().sync_all().map_err(|e| {
            error!("Sync failed {}: {}", tmp.path().display(), e);
            StorageError::WriteFailed(tmp.path().to_path_buf(), e)
        })?;
        tmp.persist(&self.path).map_err(|e| {
            error!("Failed to replace {}: {}", self.path.display(), e.error);
            StorageError::WriteFailed(self.path.clone(), e.error)
        })?;
        Ok(())
    }
}
