use log::{debug, error, info, warn};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::task::JoinHandle;

use crate::configuration::config::Config;
use crate::control::{ControlState, ControlStore};
use crate::controller::types::{ArtifactImage, Status, TimelineEntry};
use crate::data_capture::{Clock, CommandCapture, CommandOcr, OcrEngine, ScreenCapture, SystemClock};
use crate::error_handling::types::*;
use crate::retention::RetentionReport;
use crate::scheduler::CaptureScheduler;
use crate::storage::{ArtifactDirectory, ArtifactId, DescriptionStore};

/// Control surface of the application.
///
/// Owns the stores and the scheduler, and at most one spawned capture loop.
/// The CLI and the web interface only talk to this type.
pub struct Controller {
    config: Config,
    control: Arc<ControlStore>,
    artifacts: Arc<ArtifactDirectory>,
    descriptions: Arc<DescriptionStore>,
    scheduler: Arc<CaptureScheduler>,
    current_run: Mutex<Option<JoinHandle<()>>>,
}

impl Controller {
    /// Wires the components with the external screenshot and OCR tools
    /// named in `config`.
    pub fn new(config: Config) -> Result<Self, ControllerError> {
        let capture = Arc::new(CommandCapture::new(
            config.capture.command.clone(),
            &config.capture.extension,
            config.capture_timeout(),
        ));
        let ocr = Arc::new(CommandOcr::new(config.ocr.command.clone(), config.ocr_timeout()));
        Self::with_collaborators(config, capture, ocr, Arc::new(SystemClock))
    }

    pub fn with_collaborators(
        config: Config,
        capture: Arc<dyn ScreenCapture>,
        ocr: Arc<dyn OcrEngine>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ControllerError> {
        config.validate()?;

        let artifacts = Arc::new(ArtifactDirectory::new(
            config.snapshot_path(),
            &config.capture.prefix,
            &config.capture.extension,
        )?);
        let descriptions = Arc::new(DescriptionStore::new(config.descriptions_path())?);
        let control = Arc::new(ControlStore::new(
            config.settings_path(),
            config.retention.default_capacity,
            config.retention.max_capacity,
        )?);
        let scheduler = Arc::new(CaptureScheduler::new(
            control.clone(),
            artifacts.clone(),
            descriptions.clone(),
            capture,
            ocr,
            clock,
            config.capture_interval(),
        ));
        info!(
            "Controller ready: snapshots in {}, settings in {}",
            artifacts.root().display(),
            control.path().display()
        );

        Ok(Self {
            config,
            control,
            artifacts,
            descriptions,
            scheduler,
            current_run: Mutex::new(None),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Clears a run flag left behind by a process that died while capturing.
    ///
    /// A run whose owner process is still alive is left untouched.
    pub fn recover(&self) -> Result<bool, ControllerError> {
        Ok(self.control.reset_stale()?)
    }

    /// Starts a capture loop on the current Tokio runtime.
    ///
    /// Returns false when a run is already active, in this or another process.
    pub fn start(&self) -> Result<bool, ControllerError> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|e| {
            error!("No async runtime to host the capture loop: {}", e);
            ControllerError::InitializationFailed(e.to_string())
        })?;
        let Some(epoch) = self.control.try_start()? else {
            return Ok(false);
        };

        let scheduler = self.scheduler.clone();
        let handle = runtime.spawn(async move { scheduler.run(epoch).await });
        let previous = self
            .current_run
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(handle);
        if previous.is_some() {
            // a stopped run still in its last sleep; it exits on its own
            debug!("Detached previous capture loop");
        }
        Ok(true)
    }

    /// Requests the loop to stop; it exits at its next tick.
    ///
    /// Returns false when nothing was running.
    pub fn stop(&self) -> Result<bool, ControllerError> {
        Ok(self.control.stop()?)
    }

    /// Waits for the loop spawned by the last [`Controller::start`] to exit.
    pub async fn join(&self) {
        let handle = self
            .current_run
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                error!("Capture loop ended abnormally: {}", e);
            }
        }
    }

    pub fn set_capacity(&self, capacity: usize) -> Result<ControlState, ControllerError> {
        Ok(self.control.set_capacity(capacity)?)
    }

    pub fn status(&self) -> Result<Status, ControllerError> {
        let state = self.control.read()?;
        let count = self.artifacts.list()?.len();
        Ok(Status {
            running: state.running,
            capacity: state.capacity,
            count,
        })
    }

    /// Artifacts in chronological order.
    pub fn list_artifacts(&self) -> Result<Vec<ArtifactId>, ControllerError> {
        Ok(self.artifacts.list()?)
    }

    pub fn get_description(&self, id: &ArtifactId) -> Result<Option<String>, ControllerError> {
        Ok(self.descriptions.get(id)?)
    }

    /// Identifiers whose description contains `query`, in chronological order.
    pub fn search(&self, query: &str, case_insensitive: bool) -> Result<Vec<ArtifactId>, ControllerError> {
        Ok(self.descriptions.search(query, case_insensitive)?)
    }

    /// Every retained artifact with its caption and description.
    pub fn timeline(&self) -> Result<Vec<TimelineEntry>, ControllerError> {
        let ids = self.artifacts.list()?;
        let mut descriptions = self.descriptions.load_all()?;
        Ok(ids
            .into_iter()
            .map(|id| TimelineEntry {
                captured_at: id.display_time(),
                description: descriptions.remove(&id),
                id,
            })
            .collect())
    }

    pub fn artifact_image(&self, id: &ArtifactId) -> Result<ArtifactImage, ControllerError> {
        let bytes = self.artifacts.read(id)?;
        Ok(ArtifactImage {
            id: id.clone(),
            path: self.artifacts.path_for(id),
            bytes,
        })
    }

    /// Deletes one artifact and its description between ticks.
    pub async fn delete_artifact(&self, id: &ArtifactId) -> Result<bool, ControllerError> {
        let removed = self.scheduler.remove_artifact(id).await?;
        if !removed {
            warn!("Nothing to delete for {}", id);
        }
        Ok(removed)
    }

    /// Removes description records whose artifact is gone.
    pub async fn reconcile(&self) -> Result<RetentionReport, ControllerError> {
        Ok(self.scheduler.reconcile().await?)
    }
}
