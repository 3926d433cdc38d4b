#[cfg(test)]
mod integration_tests {
    use crate::control::ControlStore;
    use crate::data_capture::fakes::{FakeCapture, FakeOcr};
    use crate::data_capture::SteppingClock;
    use crate::scheduler::{CaptureScheduler, SkipReason, TickOutcome};
    use crate::storage::{ArtifactDirectory, ArtifactId, DescriptionStore};
    use chrono::{NaiveDate, NaiveDateTime};
    use std::collections::BTreeSet;
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::TempDir;
    use tokio_test::assert_ok;

    const INTERVAL: Duration = Duration::from_secs(10);

    struct Harness {
        _dir: TempDir,
        control: Arc<ControlStore>,
        artifacts: Arc<ArtifactDirectory>,
        descriptions: Arc<DescriptionStore>,
        capture: Arc<FakeCapture>,
        ocr: Arc<FakeOcr>,
        scheduler: Arc<CaptureScheduler>,
    }

    fn start_time() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    fn harness_with_step(capacity: usize, step: chrono::Duration) -> Harness {
        let _ = env_logger::builder().is_test(true).try_init();
        let dir = TempDir::new().unwrap();
        let control = Arc::new(ControlStore::new(dir.path().join("settings.json"), capacity, 1000).unwrap());
        let artifacts = Arc::new(ArtifactDirectory::new(dir.path().join("snapshots"), "snapshot", "png").unwrap());
        let descriptions = Arc::new(
            DescriptionStore::new(dir.path().join("snapshots").join("ocr_descriptions.txt")).unwrap(),
        );
        let capture = Arc::new(FakeCapture::default());
        let ocr = Arc::new(FakeOcr::default());
        let scheduler = Arc::new(CaptureScheduler::new(
            control.clone(),
            artifacts.clone(),
            descriptions.clone(),
            capture.clone(),
            ocr.clone(),
            Arc::new(SteppingClock::new(start_time(), step)),
            INTERVAL,
        ));
        Harness {
            _dir: dir,
            control,
            artifacts,
            descriptions,
            capture,
            ocr,
            scheduler,
        }
    }

    fn harness(capacity: usize) -> Harness {
        harness_with_step(capacity, chrono::Duration::seconds(10))
    }

    fn assert_consistent(h: &Harness) {
        let files: BTreeSet<ArtifactId> = h.artifacts.list().unwrap().into_iter().collect();
        assert_eq!(files, h.descriptions.ids().unwrap());
    }

    #[tokio::test]
    async fn test_tick_captures_and_describes() {
        let h = harness(100);
        let epoch = assert_ok!(h.control.try_start()).unwrap();

        let outcome = h.scheduler.tick(epoch).await;
        let id = ArtifactId::parse("snapshot_2024-03-01_09-00-00.png").unwrap();
        assert_eq!(
            outcome,
            TickOutcome::Captured {
                id: id.clone(),
                described: true
            }
        );
        assert_eq!(h.artifacts.read(&id).unwrap(), b"image-0");
        assert_eq!(
            h.descriptions.get(&id).unwrap().as_deref(),
            Some("Inbox image-0")
        );
        assert_consistent(&h);
    }

    #[tokio::test]
    async fn test_tick_without_run_does_nothing() {
        let h = harness(100);
        let epoch = assert_ok!(h.control.try_start()).unwrap();
        assert_ok!(h.control.stop());

        assert_eq!(h.scheduler.tick(epoch).await, TickOutcome::Stopped);
        assert_eq!(h.capture.calls(), 0);
        assert!(h.artifacts.list().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_capture_failure_skips_tick() {
        let h = harness(100);
        let epoch = assert_ok!(h.control.try_start()).unwrap();
        h.capture.set_failing(true);

        assert_eq!(
            h.scheduler.tick(epoch).await,
            TickOutcome::Skipped(SkipReason::CaptureFailed)
        );
        assert!(h.artifacts.list().unwrap().is_empty());
        assert!(h.descriptions.load_all().unwrap().is_empty());

        h.capture.set_failing(false);
        assert!(matches!(
            h.scheduler.tick(epoch).await,
            TickOutcome::Captured { .. }
        ));
    }

    #[tokio::test]
    async fn test_ocr_failure_stores_empty_description() {
        let h = harness(100);
        let epoch = assert_ok!(h.control.try_start()).unwrap();
        h.ocr.set_failing(true);

        let TickOutcome::Captured { id, described } = h.scheduler.tick(epoch).await else {
            panic!("tick did not capture");
        };
        assert!(described);
        assert_eq!(h.descriptions.get(&id).unwrap().as_deref(), Some(""));
        assert_consistent(&h);
    }

    #[tokio::test]
    async fn test_same_second_is_captured_once() {
        let h = harness_with_step(100, chrono::Duration::zero());
        let epoch = assert_ok!(h.control.try_start()).unwrap();

        assert!(matches!(
            h.scheduler.tick(epoch).await,
            TickOutcome::Captured { .. }
        ));
        assert_eq!(
            h.scheduler.tick(epoch).await,
            TickOutcome::Skipped(SkipReason::DuplicateIdentifier)
        );
        assert_eq!(h.capture.calls(), 1);
        assert_eq!(h.descriptions.records().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_retention_keeps_newest() {
        let h = harness(3);
        let epoch = assert_ok!(h.control.try_start()).unwrap();

        for _ in 0..5 {
            h.scheduler.tick(epoch).await;
            assert!(h.artifacts.list().unwrap().len() <= 3);
            assert_consistent(&h);
        }

        let names: Vec<String> = h
            .artifacts
            .list()
            .unwrap()
            .iter()
            .map(|id| id.to_string())
            .collect();
        assert_eq!(
            names,
            vec![
                "snapshot_2024-03-01_09-00-20.png",
                "snapshot_2024-03-01_09-00-30.png",
                "snapshot_2024-03-01_09-00-40.png",
            ]
        );
    }

    #[tokio::test]
    async fn test_capacity_change_applies_next_tick() {
        let h = harness(3);
        let epoch = assert_ok!(h.control.try_start()).unwrap();
        for _ in 0..3 {
            h.scheduler.tick(epoch).await;
        }
        assert_eq!(h.artifacts.list().unwrap().len(), 3);

        assert_ok!(h.control.set_capacity(2));
        assert_eq!(h.artifacts.list().unwrap().len(), 3);

        h.scheduler.tick(epoch).await;
        assert_eq!(h.artifacts.list().unwrap().len(), 2);
        assert_consistent(&h);
    }

    #[tokio::test]
    async fn test_older_run_cannot_tick() {
        let h = harness(100);
        let first = assert_ok!(h.control.try_start()).unwrap();
        assert!(assert_ok!(h.control.try_start()).is_none());
        assert_ok!(h.control.stop());
        let second = assert_ok!(h.control.try_start()).unwrap();

        assert_eq!(h.scheduler.tick(first).await, TickOutcome::Stopped);
        assert!(matches!(
            h.scheduler.tick(second).await,
            TickOutcome::Captured { .. }
        ));
    }

    #[tokio::test]
    async fn test_corrupt_control_state_aborts() {
        let h = harness(100);
        let epoch = assert_ok!(h.control.try_start()).unwrap();
        std::fs::write(h.control.path(), "{ not json").unwrap();

        assert_eq!(h.scheduler.tick(epoch).await, TickOutcome::Aborted);
        assert_eq!(h.capture.calls(), 0);
    }

    #[tokio::test]
    async fn test_manual_removal() {
        let h = harness(100);
        let epoch = assert_ok!(h.control.try_start()).unwrap();
        let TickOutcome::Captured { id, .. } = h.scheduler.tick(epoch).await else {
            panic!("tick did not capture");
        };

        assert!(assert_ok!(h.scheduler.remove_artifact(&id).await));
        assert!(!h.artifacts.contains(&id));
        assert_eq!(h.descriptions.get(&id).unwrap(), None);
        assert!(!assert_ok!(h.scheduler.remove_artifact(&id).await));
    }

    #[tokio::test(start_paused = true)]
    async fn test_loop_stops_within_one_interval() {
        let h = harness(100);
        let epoch = assert_ok!(h.control.try_start()).unwrap();
        let scheduler = h.scheduler.clone();
        let handle = tokio::spawn(async move { scheduler.run(epoch).await });

        // ticks at t=0, 10 and 20
        tokio::time::sleep(Duration::from_secs(25)).await;
        assert_eq!(h.capture.calls(), 3);

        assert_ok!(h.control.stop());
        tokio::time::sleep(INTERVAL * 2).await;
        assert!(handle.is_finished());
        assert_eq!(h.capture.calls(), 3);
        assert_ok!(handle.await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_then_start_leaves_one_loop() {
        let h = harness(100);
        let first = assert_ok!(h.control.try_start()).unwrap();
        let scheduler = h.scheduler.clone();
        let old_loop = tokio::spawn(async move { scheduler.run(first).await });

        // first loop ticks at t=0 and sleeps until t=10
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_ok!(h.control.stop());
        let second = assert_ok!(h.control.try_start()).unwrap();
        let scheduler = h.scheduler.clone();
        let new_loop = tokio::spawn(async move { scheduler.run(second).await });

        // new loop ticks at t=5 and t=15, old loop wakes at t=10 and exits
        tokio::time::sleep(Duration::from_secs(17)).await;
        assert!(old_loop.is_finished());
        assert!(!new_loop.is_finished());
        assert_eq!(h.capture.calls(), 3);
        assert_consistent(&h);

        assert_ok!(h.control.stop());
        assert_ok!(new_loop.await);
    }

    /// A second process hosting a scheduler on the same data directory.
    fn second_process(h: &Harness) -> (Arc<ControlStore>, CaptureScheduler) {
        let root = h._dir.path();
        let control = Arc::new(ControlStore::new(root.join("settings.json"), 100, 1000).unwrap());
        let artifacts = Arc::new(ArtifactDirectory::new(root.join("snapshots"), "snapshot", "png").unwrap());
        let descriptions = Arc::new(
            DescriptionStore::new(root.join("snapshots").join("ocr_descriptions.txt")).unwrap(),
        );
        let scheduler = CaptureScheduler::new(
            control.clone(),
            artifacts,
            descriptions,
            Arc::new(FakeCapture::default()),
            Arc::new(FakeOcr::default()),
            Arc::new(SteppingClock::new(
                start_time() + chrono::Duration::hours(1),
                chrono::Duration::seconds(10),
            )),
            INTERVAL,
        );
        (control, scheduler)
    }

    #[tokio::test]
    async fn test_second_process_cannot_run_alongside() {
        let h = harness(100);
        assert!(!assert_ok!(h.control.reset_stale()));
        let first = assert_ok!(h.control.try_start()).unwrap();
        assert!(matches!(
            h.scheduler.tick(first).await,
            TickOutcome::Captured { .. }
        ));

        let (control, scheduler) = second_process(&h);
        assert!(!assert_ok!(control.reset_stale()));
        assert!(assert_ok!(control.try_start()).is_none());
        assert!(matches!(
            h.scheduler.tick(first).await,
            TickOutcome::Captured { .. }
        ));

        // the second process takes over through stop then start
        assert_ok!(control.stop());
        let second = assert_ok!(control.try_start()).unwrap();
        assert_eq!(h.scheduler.tick(first).await, TickOutcome::Stopped);
        assert!(matches!(
            scheduler.tick(second).await,
            TickOutcome::Captured { .. }
        ));
        assert_eq!(h.artifacts.list().unwrap().len(), 3);
        assert_consistent(&h);
    }
}
