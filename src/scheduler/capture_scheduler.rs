use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info, warn};
use tokio::sync::Mutex;

use crate::control::{ControlStore, RunEpoch};
use crate::data_capture::{normalize_text, Clock, OcrEngine, ScreenCapture};
use crate::error_handling::types::StorageError;
use crate::retention::{RetentionEnforcer, RetentionReport};
use crate::scheduler::types::{SkipReason, TickOutcome};
use crate::storage::{ArtifactDirectory, ArtifactId, DescriptionStore};

/// Drives the capture loop: capture, describe, append, enforce retention.
///
/// Ticks are serialised by an async lock that is also taken for manual
/// deletions, so retention and deletions never interleave with a tick.
pub struct CaptureScheduler {
    control: Arc<ControlStore>,
    artifacts: Arc<ArtifactDirectory>,
    descriptions: Arc<DescriptionStore>,
    retention: Arc<RetentionEnforcer>,
    capture: Arc<dyn ScreenCapture>,
    ocr: Arc<dyn OcrEngine>,
    clock: Arc<dyn Clock>,
    interval: Duration,
    tick_lock: Mutex<()>,
}

impl CaptureScheduler {
    pub fn new(
        control: Arc<ControlStore>,
        artifacts: Arc<ArtifactDirectory>,
        descriptions: Arc<DescriptionStore>,
        capture: Arc<dyn ScreenCapture>,
        ocr: Arc<dyn OcrEngine>,
        clock: Arc<dyn Clock>,
        interval: Duration,
    ) -> Self {
        let retention = Arc::new(RetentionEnforcer::new(artifacts.clone(), descriptions.clone()));
        Self {
            control,
            artifacts,
            descriptions,
            retention,
            capture,
            ocr,
            clock,
            interval,
            tick_lock: Mutex::new(()),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn retention(&self) -> &RetentionEnforcer {
        &self.retention
    }

    /// Runs ticks separated by `interval` until the run flag is cleared, a
    /// newer run starts, or the control state becomes unreadable.
    ///
    /// A stop is seen at the start of the next tick; the sleep in between is
    /// not interrupted.
    pub async fn run(&self, epoch: RunEpoch) {
        info!(
            "Capture loop {} running every {:?}",
            epoch,
            self.interval
        );
        loop {
            let outcome = self.tick(epoch).await;
            if outcome.ends_run() {
                info!("Capture loop {} finished: {:?}", epoch, outcome);
                return;
            }
            tokio::time::sleep(self.interval).await;
        }
    }

    /// Performs one tick on behalf of the run started with `epoch`.
    pub async fn tick(&self, epoch: RunEpoch) -> TickOutcome {
        let _guard = self.tick_lock.lock().await;

        match self.control.is_current(epoch) {
            Ok(true) => {}
            Ok(false) => {
                debug!("Run {} is no longer current", epoch);
                return TickOutcome::Stopped;
            }
            Err(e) => {
                error!("Cannot read control state, ending run {}: {}", epoch, e);
                return TickOutcome::Aborted;
            }
        }

        let id = ArtifactId::new(
            self.artifacts.prefix(),
            self.clock.now(),
            self.artifacts.extension(),
        );
        if self.artifacts.contains(&id) {
            warn!("{} already exists, skipping tick", id);
            return TickOutcome::Skipped(SkipReason::DuplicateIdentifier);
        }

        let image = match self.capture.capture().await {
            Ok(image) => image,
            Err(e) => {
                warn!("Screen capture failed, skipping tick: {}", e);
                return TickOutcome::Skipped(SkipReason::CaptureFailed);
            }
        };

        if let Err(e) = self.artifacts.write(&id, &image.bytes) {
            error!("Could not store {}, skipping tick: {}", id, e);
            return TickOutcome::Skipped(SkipReason::WriteFailed);
        }

        let text = match self.ocr.extract_text(&image).await {
            Ok(raw) => normalize_text(&raw),
            Err(e) => {
                warn!("OCR failed for {}, storing an empty description: {}", id, e);
                String::new()
            }
        };

        let described = match self.descriptions.append(&id, &text) {
            Ok(()) => true,
            Err(e) => {
                error!("{} left without description: {}", id, e);
                false
            }
        };
        debug!("Captured {} ({} chars of text)", id, text.chars().count());

        let capacity = match self.control.read() {
            Ok(state) => state.capacity,
            Err(e) => {
                error!("Cannot read capacity, ending run {}: {}", epoch, e);
                return TickOutcome::Aborted;
            }
        };
        // full-store rewrites block, keep them off the runtime workers
        let retention = self.retention.clone();
        match tokio::task::spawn_blocking(move || retention.enforce(capacity)).await {
            Ok(Ok(report)) => log_report(&report),
            Ok(Err(e)) => warn!("Retention pass failed, retrying next tick: {}", e),
            Err(e) => error!("Retention pass did not complete, retrying next tick: {}", e),
        }

        TickOutcome::Captured { id, described }
    }

    /// Deletes one artifact and its record between ticks.
    pub async fn remove_artifact(&self, id: &ArtifactId) -> Result<bool, StorageError> {
        let _guard = self.tick_lock.lock().await;
        self.retention.remove(id)
    }

    /// Runs an orphan sweep between ticks.
    pub async fn reconcile(&self) -> Result<RetentionReport, StorageError> {
        let _guard = self.tick_lock.lock().await;
        self.retention.reconcile()
    }
}

fn log_report(report: &RetentionReport) {
    if report.is_noop() {
        return;
    }
    info!(
        "Retention removed {} artifact(s) and {} record(s), {} retained",
        report.artifacts_removed.len(),
        report.records_removed,
        report.retained
    );
    if !report.failed_removals.is_empty() {
        warn!(
            "{} artifact(s) could not be removed: {:?}",
            report.failed_removals.len(),
            report.failed_removals
        );
    }
}
