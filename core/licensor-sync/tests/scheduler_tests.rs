mod common;

use common::{license, store, FakeRemote};
use licensor_sync::{Snapshot, SyncEngine, SyncError, SyncScheduler};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn sync_now_runs_a_round() {
    let remote = Arc::new(FakeRemote::new(Snapshot {
        licenses: vec![license("lic_1", "talheim.de", "FFW-AAAA-0001")],
        ..Snapshot::default()
    }));
    let engine = SyncEngine::new(store(), remote.clone());
    let scheduler = SyncScheduler::spawn(engine.clone(), Duration::from_secs(3600));

    let report = scheduler.sync_now().await.unwrap();
    assert!(report.merge.licenses.inserted + report.merge.licenses.unchanged == 1);
    assert_eq!(engine.store().list_licenses().unwrap().len(), 1);

    let status = scheduler.status().await;
    assert!(status.rounds >= 1);
    assert!(status.last_success.is_some());
    assert!(status.last_error.is_none());
    assert!(remote.pull_count() >= 1);

    scheduler.shutdown().await.unwrap();
}

#[tokio::test]
async fn failures_are_recorded_and_loop_continues() {
    let remote = Arc::new(FakeRemote::new(Snapshot::default()));
    *remote.pull_offline.lock().unwrap() = true;
    let scheduler = SyncScheduler::spawn(SyncEngine::new(store(), remote.clone()), Duration::from_secs(3600));

    let err = scheduler.sync_now().await.unwrap_err();
    assert!(matches!(err, SyncError::Network(_)));
    assert!(scheduler.status().await.last_error.is_some());

    *remote.pull_offline.lock().unwrap() = false;
    scheduler.sync_now().await.unwrap();
    assert!(scheduler.status().await.last_error.is_none());

    scheduler.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn interval_drives_rounds() {
    let remote = Arc::new(FakeRemote::new(Snapshot::default()));
    let scheduler = SyncScheduler::spawn(SyncEngine::new(store(), remote.clone()), Duration::from_secs(30));

    tokio::time::sleep(Duration::from_secs(95)).await;
    assert!(remote.pull_count() >= 3, "pulls: {}", remote.pull_count());

    scheduler.shutdown().await.unwrap();
}
