use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use log::{debug, error, info, warn};
use tempfile::NamedTempFile;

use crate::control::types::{ControlState, RunEpoch, RunOwner};
use crate::error_handling::types::ControlError;

/// Durable home of the [`ControlState`].
///
/// The JSON file is the source of truth and is re-read on every call, so a
/// stop or a newer start written by another process is observed by the loop
/// at its next tick. Within this process every read-modify-write runs under
/// one mutex, which makes [`ControlStore::try_start`] a compare-and-swap.
pub struct ControlStore {
    path: PathBuf,
    default_capacity: usize,
    max_capacity: usize,
    lock: Mutex<()>,
}

impl ControlStore {
    /// Opens the store, creating the file with `running = false` and the
    /// default capacity if it does not exist.
    pub fn new<P: AsRef<Path>>(
        path: P,
        default_capacity: usize,
        max_capacity: usize,
    ) -> Result<Self, ControlError> {
        let store = Self {
            path: path.as_ref().to_path_buf(),
            default_capacity,
            max_capacity,
            lock: Mutex::new(()),
        };
        if !store.path.exists() {
            if let Some(parent) = store.path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).map_err(|e| {
                    error!("Failed to create settings dir {}: {}", parent.display(), e);
                    ControlError::WriteFailed(parent.to_path_buf(), e)
                })?;
            }
            store.write(&ControlState {
                running: false,
                capacity: default_capacity,
                owner: None,
            })?;
            info!("Created control state at {}", store.path.display());
        }
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn max_capacity(&self) -> usize {
        self.max_capacity
    }

    pub fn read(&self) -> Result<ControlState, ControlError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.load()
    }

    /// Sets `running = true` if it was false.
    ///
    /// Returns the epoch the new loop must carry, or `None` when a run is
    /// already active and nothing changed.
    pub fn try_start(&self) -> Result<Option<RunEpoch>, ControlError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut state = self.load()?;
        if state.running {
            debug!("Start requested while already running");
            return Ok(None);
        }
        let epoch = RunEpoch::generate();
        state.running = true;
        state.owner = Some(RunOwner {
            run: epoch,
            pid: std::process::id(),
        });
        self.write(&state)?;
        info!("Capture run {} started (capacity {})", epoch, state.capacity);
        Ok(Some(epoch))
    }

    /// Clears the run flag. Returns false when it was already clear.
    pub fn stop(&self) -> Result<bool, ControlError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut state = self.load()?;
        if !state.running {
            debug!("Stop requested while not running");
            return Ok(false);
        }
        state.running = false;
        state.owner = None;
        self.write(&state)?;
        info!("Capture run stop requested");
        Ok(true)
    }

    pub fn set_capacity(&self, capacity: usize) -> Result<ControlState, ControlError> {
        if capacity == 0 || capacity > self.max_capacity {
            return Err(ControlError::InvalidCapacity {
                requested: capacity,
                max: self.max_capacity,
            });
        }
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut state = self.load()?;
        state.capacity = capacity;
        self.write(&state)?;
        info!("Capacity set to {}", capacity);
        Ok(state)
    }

    /// Whether the loop started with `epoch` should run another tick.
    pub fn is_current(&self, epoch: RunEpoch) -> Result<bool, ControlError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let state = self.load()?;
        Ok(state.running && state.owner.map(|o| o.run) == Some(epoch))
    }

    /// Clears a run flag left set by a process that died without stopping.
    ///
    /// A flag whose owner process is still alive is left alone. A flag with
    /// no recorded owner predates owner tracking and is treated as stale.
    pub fn reset_stale(&self) -> Result<bool, ControlError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut state = self.load()?;
        if !state.running {
            return Ok(false);
        }
        if let Some(owner) = state.owner {
            if process_alive(owner.pid) {
                debug!("Run {} is held by live process {}", owner.run, owner.pid);
                return Ok(false);
            }
        }
        warn!(
            "Control state {} says running but its owner is gone, resetting",
            self.path.display()
        );
        state.running = false;
        state.owner = None;
        self.write(&state)?;
        Ok(true)
    }

    fn load(&self) -> Result<ControlState, ControlError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                warn!("Control state {} vanished, using defaults", self.path.display());
                return Ok(ControlState {
                    running: false,
                    capacity: self.default_capacity,
                    owner: None,
                });
            }
            Err(e) => {
                error!("Failed to read control state {}: {}", self.path.display(), e);
                return Err(ControlError::ReadFailed(self.path.clone(), e));
            }
        };
        let state: ControlState = serde_json::from_str(&content).map_err(|e| {
            error!("Invalid control state in {}: {}", self.path.display(), e);
            ControlError::Corrupt(self.path.clone(), e.to_string())
        })?;
        if state.capacity == 0 {
            error!("Control state in {} has capacity 0", self.path.display());
            return Err(ControlError::Corrupt(
                self.path.clone(),
                "capacity must be positive".to_string(),
            ));
        }
        Ok(state)
    }

    fn write(&self, state: &ControlState) -> Result<(), ControlError> {
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let body = serde_json::to_string_pretty(state)
            .map_err(|e| ControlError::Corrupt(self.path.clone(), e.to_string()))?;
        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| {
            error!("Failed to create temp file in {}: {}", dir.display(), e);
            ControlError::WriteFailed(dir.to_path_buf(), e)
        })?;
        tmp.write_all(body.as_bytes()).map_err(|e| {
            error!("Write failed {}: {}", tmp.path().display(), e);
            ControlError::WriteFailed(tmp.path().to_path_buf(), e)
        })?;
        tmp.persist(&self.path).map_err(|e| {
            error!("Failed to replace {}: {}", self.path.display(), e.error);
            ControlError::WriteFailed(self.path.clone(), e.error)
        })?;
        debug!("Saved control state {:?}", state);
        Ok(())
    }
}

/// Liveness of the process that owns a run.
///
/// Only Linux can answer this without extra dependencies; elsewhere the owner
/// is assumed alive and a leftover flag has to be cleared with `recall stop`.
fn process_alive(pid: u32) -> bool {
    if cfg!(target_os = "linux") {
        Path::new("/proc").join(pid.to_string()).exists()
    } else {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn store(dir: &TempDir) -> ControlStore {
        ControlStore::new(dir.path().join("settings.json"), 100, 1000).unwrap()
    }

    #[test]
    fn test_defaults_written_on_first_open() {
        let dir = TempDir::new().unwrap();
        let control = store(&dir);
        assert_eq!(
            control.read().unwrap(),
            ControlState {
                running: false,
                capacity: 100,
                owner: None,
            }
        );
        assert!(dir.path().join("settings.json").exists());
    }

    #[test]
    fn test_start_is_compare_and_swap() {
        let dir = TempDir::new().unwrap();
        let control = store(&dir);
        let first = control.try_start().unwrap();
        assert!(first.is_some());
        assert!(control.try_start().unwrap().is_none());
        assert!(control.read().unwrap().running);
        assert!(control.is_current(first.unwrap()).unwrap());
    }

    #[test]
    fn test_concurrent_starts_yield_one_winner() {
        let dir = TempDir::new().unwrap();
        let control = Arc::new(store(&dir));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let control = Arc::clone(&control);
                std::thread::spawn(move || control.try_start().unwrap())
            })
            .collect();
        let winners = handles
            .into_iter()
            .filter_map(|h| h.join().unwrap())
            .count();
        assert_eq!(winners, 1);
    }

    #[test]
    fn test_restart_invalidates_previous_epoch() {
        let dir = TempDir::new().unwrap();
        let control = store(&dir);
        let first = control.try_start().unwrap().unwrap();
        assert!(control.stop().unwrap());
        assert!(!control.is_current(first).unwrap());
        let second = control.try_start().unwrap().unwrap();
        assert!(!control.is_current(first).unwrap());
        assert!(control.is_current(second).unwrap());
    }

    #[test]
    fn test_start_elsewhere_supersedes_run() {
        let dir = TempDir::new().unwrap();
        let control = store(&dir);
        let epoch = control.try_start().unwrap().unwrap();
        let other = ControlStore::new(dir.path().join("settings.json"), 100, 1000).unwrap();

        assert!(other.try_start().unwrap().is_none());
        assert!(other.stop().unwrap());
        let newer = other.try_start().unwrap().unwrap();

        assert_ne!(epoch, newer);
        assert!(!control.is_current(epoch).unwrap());
        assert!(control.is_current(newer).unwrap());
        let owner = control.read().unwrap().owner.unwrap();
        assert_eq!(owner.run, newer);
        assert_eq!(owner.pid, std::process::id());
    }

    #[test]
    fn test_stop_written_elsewhere_is_observed() {
        let dir = TempDir::new().unwrap();
        let control = store(&dir);
        let epoch = control.try_start().unwrap().unwrap();
        // Another process flips the flag on disk.
        let other = ControlStore::new(dir.path().join("settings.json"), 100, 1000).unwrap();
        assert!(other.stop().unwrap());
        assert!(!control.is_current(epoch).unwrap());
    }

    #[test]
    fn test_capacity_bounds() {
        let dir = TempDir::new().unwrap();
        let control = store(&dir);
        assert_eq!(control.set_capacity(3).unwrap().capacity, 3);
        assert_eq!(control.read().unwrap().capacity, 3);
        assert!(matches!(
            control.set_capacity(0),
            Err(ControlError::InvalidCapacity { requested: 0, .. })
        ));
        assert!(control.set_capacity(1001).is_err());
        assert_eq!(control.read().unwrap().capacity, 3);
    }

    #[test]
    fn test_legacy_settings_file_is_accepted() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(
            &path,
            r#"{"stop_flag": true, "is_running": false, "max_snapshots": 42}"#,
        )
        .unwrap();
        let control = ControlStore::new(&path, 100, 1000).unwrap();
        assert_eq!(
            control.read().unwrap(),
            ControlState {
                running: false,
                capacity: 42,
                owner: None,
            }
        );
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{not json").unwrap();
        let control = ControlStore::new(&path, 100, 1000).unwrap();
        assert!(matches!(control.read(), Err(ControlError::Corrupt(..))));
        assert!(control.try_start().is_err());
    }

    #[test]
    fn test_reset_stale() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"running": true, "capacity": 5}"#).unwrap();
        let control = ControlStore::new(&path, 100, 1000).unwrap();
        assert!(control.reset_stale().unwrap());
        assert!(!control.read().unwrap().running);
        assert!(!control.reset_stale().unwrap());
    }

    #[test]
    fn test_reset_stale_keeps_live_owner() {
        let dir = TempDir::new().unwrap();
        let control = store(&dir);
        let epoch = control.try_start().unwrap().unwrap();

        let other = ControlStore::new(dir.path().join("settings.json"), 100, 1000).unwrap();
        assert!(!other.reset_stale().unwrap());
        assert!(control.is_current(epoch).unwrap());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_reset_stale_clears_dead_owner() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(
            &path,
            format!(
                r#"{{"running": true, "capacity": 5, "owner": {{"run": "{}", "pid": {}}}}}"#,
                uuid::Uuid::new_v4(),
                u32::MAX
            ),
        )
        .unwrap();
        let control = ControlStore::new(&path, 100, 1000).unwrap();
        assert!(control.reset_stale().unwrap());
        let state = control.read().unwrap();
        assert!(!state.running);
        assert_eq!(state.owner, None);
    }
}
