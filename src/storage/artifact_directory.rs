use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use log::{debug, error, info};

use crate::error_handling::types::StorageError;
use crate::storage::types::ArtifactId;

/// Directory holding one image file per artifact.
///
/// Only files whose name parses as an [`ArtifactId`] with the configured
/// prefix and extension are artifacts; anything else living in the directory
/// (the description store, temp files) is ignored.
pub struct ArtifactDirectory {
    root: PathBuf,
    prefix: String,
    extension: String,
}

impl ArtifactDirectory {
    pub fn new<P: AsRef<Path>>(root: P, prefix: &str, extension: &str) -> Result<Self, StorageError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).map_err(|e| {
            error!("Failed to create artifact dir {}: {}", root.display(), e);
            StorageError::WriteFailed(root.clone(), e)
        })?;
        info!("ArtifactDirectory initialized at {}", root.display());
        Ok(Self {
            root,
            prefix: prefix.to_string(),
            extension: extension.to_string(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn path_for(&self, id: &ArtifactId) -> PathBuf {
        self.root.join(id.as_str())
    }

    /// Artifacts sorted oldest first.
    pub fn list(&self) -> Result<Vec<ArtifactId>, StorageError> {
        let entries = fs::read_dir(&self.root).map_err(|e| {
            error!("Failed to read artifact dir {}: {}", self.root.display(), e);
            StorageError::ReadFailed(self.root.clone(), e)
        })?;
        let mut ids = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| {
                error!("Dir entry error in {}: {}", self.root.display(), e);
                StorageError::ReadFailed(self.root.clone(), e)
            })?;
            if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
                continue;
            }
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if let Ok(id) = ArtifactId::parse(name) {
                if id.prefix() == self.prefix && id.extension() == self.extension {
                    ids.push(id);
                }
            }
        }
        ids.sort();
        debug!("Listed {} artifact(s) in {}", ids.len(), self.root.display());
        Ok(ids)
    }

    pub fn contains(&self, id: &ArtifactId) -> bool {
        self.path_for(id).is_file()
    }

    pub fn write(&self, id: &ArtifactId, bytes: &[u8]) -> Result<PathBuf, StorageError> {
        let path = self.path_for(id);
        let mut f = File::create(&path).map_err(|e| {
            error!("Create failed {}: {}", path.display(), e);
            StorageError::WriteFailed(path.clone(), e)
        })?;
        f.write_all(bytes).map_err(|e| {
            error!("Write failed {}: {}", path.display(), e);
            StorageError::WriteFailed(path.clone(), e)
        })?;
        debug!("Wrote {} byte(s) to {}", bytes.len(), path.display());
        Ok(path)
    }

    pub fn read(&self, id: &ArtifactId) -> Result<Vec<u8>, StorageError> {
        let path = self.path_for(id);
        let mut buf = Vec::new();
        match File::open(&path).and_then(|mut f| f.read_to_end(&mut buf)) {
            Ok(_) => Ok(buf),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(StorageError::NotFound(id.to_string())),
            Err(e) => {
                error!("Read failed {}: {}", path.display(), e);
                Err(StorageError::ReadFailed(path, e))
            }
        }
    }

    /// Deletes the file of `id`. Returns false when it was already gone.
    pub fn delete(&self, id: &ArtifactId) -> Result<bool, StorageError> {
        let path = self.path_for(id);
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!("Removed artifact {}", path.display());
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => {
                error!("Failed to remove artifact {}: {}", path.display(), e);
                Err(StorageError::WriteFailed(path, e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn id(prefix: &str, sec: u32, ext: &str) -> ArtifactId {
        let at = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(9, 30, sec)
            .unwrap();
        ArtifactId::new(prefix, at, ext)
    }

    #[test]
    fn test_list_is_sorted_and_filtered() {
        let dir = TempDir::new().unwrap();
        let artifacts = ArtifactDirectory::new(dir.path().join("snapshots"), "snapshot", "png").unwrap();
        for sec in [5, 1, 3] {
            artifacts.write(&id("snapshot", sec, "png"), b"img").unwrap();
        }
        artifacts.write(&id("other", 2, "png"), b"img").unwrap();
        artifacts.write(&id("snapshot", 2, "jpg"), b"img").unwrap();
        fs::write(artifacts.root().join("ocr_descriptions.txt"), "x").unwrap();
        fs::create_dir(artifacts.root().join("snapshot_2024-05-01_09-30-09.png")).unwrap();

        let listed = artifacts.list().unwrap();
        assert_eq!(
            listed,
            vec![
                id("snapshot", 1, "png"),
                id("snapshot", 3, "png"),
                id("snapshot", 5, "png")
            ]
        );
    }

    #[test]
    fn test_write_read_delete() {
        let dir = TempDir::new().unwrap();
        let artifacts = ArtifactDirectory::new(dir.path(), "snapshot", "png").unwrap();
        let a = id("snapshot", 1, "png");
        assert!(!artifacts.contains(&a));
        artifacts.write(&a, b"\x89PNG").unwrap();
        assert!(artifacts.contains(&a));
        assert_eq!(artifacts.read(&a).unwrap(), b"\x89PNG");
        assert!(artifacts.delete(&a).unwrap());
        assert!(!artifacts.delete(&a).unwrap());
        assert!(matches!(artifacts.read(&a), Err(StorageError::NotFound(_))));
    }
}
