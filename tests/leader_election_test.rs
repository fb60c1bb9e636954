//! Leader lease acquisition and election manager behavior over an
//! in-memory lease store.

mod common;

use common::{CountingWorker, FailingLeaseStore, InMemoryLeaseStore};
use chrono::{Duration as ChronoDuration, Utc};
use fleet_core::config::{LeaderElectionConfig, ReconcilerConfig};
use fleet_core::error::ServiceError;
use fleet_core::services::signalbus::SignalBus;
use fleet_core::workers::{LeaderElectionManager, Reconciler, Worker};
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;

const LEASE_TYPE: &str = "cluster";

fn manager(store: Arc<InMemoryLeaseStore>) -> Arc<LeaderElectionManager> {
    manager_with_workers(store, Vec::new())
}

fn manager_with_workers(
    store: Arc<InMemoryLeaseStore>,
    workers: Vec<Arc<dyn Worker>>,
) -> Arc<LeaderElectionManager> {
    let bus = Arc::new(SignalBus::new());
    let reconciler = Arc::new(Reconciler::new(
        ReconcilerConfig {
            interval_seconds: 3600,
        },
        bus,
    ));
    Arc::new(LeaderElectionManager::new(
        workers,
        reconciler,
        store,
        LeaderElectionConfig {
            polling_interval_seconds: 3600,
            lease_duration_seconds: 60,
            renew_ahead_seconds: 30,
        },
    ))
}

#[tokio::test]
async fn exactly_one_concurrent_acquirer_wins_an_expired_lease() {
    let store = Arc::new(InMemoryLeaseStore::new());
    store.seed(LEASE_TYPE);
    let manager = manager(store.clone());

    let mut handles = Vec::new();
    for i in 0..10 {
        let manager = manager.clone();
        handles.push(tokio::spawn(async move {
            let worker_id = format!("worker-{i}");
            manager
                .acquire_leader_lease(&worker_id, LEASE_TYPE)
                .await
                .expect("acquisition should not error")
        }));
    }

    let winners = join_all(handles)
        .await
        .into_iter()
        .filter(|outcome| outcome.as_ref().unwrap().acquired)
        .count();
    assert_eq!(winners, 1, "expected exactly one leader per lease epoch");

    let lease = store.get(LEASE_TYPE).unwrap();
    assert!(lease.leader.starts_with("worker-"));
    assert!(lease.expires > Utc::now());
}

#[tokio::test]
async fn lease_is_not_acquirable_before_expiry_and_is_after() {
    let store = Arc::new(InMemoryLeaseStore::new());
    store.seed_with(
        LEASE_TYPE,
        "dead-worker",
        Utc::now() + ChronoDuration::seconds(60),
    );
    let manager = manager(store.clone());

    let attempt = manager
        .acquire_leader_lease("worker-b", LEASE_TYPE)
        .await
        .unwrap();
    assert!(!attempt.acquired, "unexpired foreign lease must hold");

    // the recorded leader never renews; expiry passes
    store.seed_with(
        LEASE_TYPE,
        "dead-worker",
        Utc::now() - ChronoDuration::seconds(1),
    );
    let attempt = manager
        .acquire_leader_lease("worker-b", LEASE_TYPE)
        .await
        .unwrap();
    assert!(attempt.acquired, "expired lease must be claimable");
    assert_eq!(store.get(LEASE_TYPE).unwrap().leader, "worker-b");
}

#[tokio::test]
async fn current_leader_renews_inside_the_renew_ahead_window() {
    let store = Arc::new(InMemoryLeaseStore::new());
    store.seed_with(
        LEASE_TYPE,
        "worker-a",
        Utc::now() + ChronoDuration::seconds(10),
    );
    let manager = manager(store.clone());

    let attempt = manager
        .acquire_leader_lease("worker-a", LEASE_TYPE)
        .await
        .unwrap();
    assert!(attempt.acquired);
    let lease = store.get(LEASE_TYPE).unwrap();
    assert!(
        lease.expires > Utc::now() + ChronoDuration::seconds(50),
        "renewal should push expiry out by the lease duration"
    );
}

#[tokio::test]
async fn current_leader_with_safe_expiry_skips_the_storage_write() {
    let store = Arc::new(InMemoryLeaseStore::new());
    store.seed_with(
        LEASE_TYPE,
        "worker-a",
        Utc::now() + ChronoDuration::seconds(55),
    );
    let before = store.get(LEASE_TYPE).unwrap();
    let manager = manager(store.clone());

    let attempt = manager
        .acquire_leader_lease("worker-a", LEASE_TYPE)
        .await
        .unwrap();
    assert!(attempt.acquired);
    assert_eq!(store.get(LEASE_TYPE).unwrap(), before, "steady state is read-only");
}

#[tokio::test]
async fn missing_lease_row_is_a_configuration_error() {
    let store = Arc::new(InMemoryLeaseStore::new());
    let manager = manager(store);

    let err = manager
        .acquire_leader_lease("worker-a", "unseeded_type")
        .await
        .expect_err("acquisition against a missing row must fail");
    assert!(matches!(err, ServiceError::Configuration(_)));
}

#[tokio::test]
async fn manager_starts_the_worker_once_leader_and_stops_it_on_shutdown() {
    let store = Arc::new(InMemoryLeaseStore::new());
    store.seed(LEASE_TYPE);
    let worker = Arc::new(CountingWorker::new(LEASE_TYPE));
    let manager = manager_with_workers(store, vec![worker.clone()]);

    manager.start().await;
    tokio::time::timeout(Duration::from_secs(2), async {
        while worker.pass_count() == 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("worker should run at least one pass after becoming leader");
    assert!(worker.is_running());

    manager.stop().await;
    assert!(!worker.is_running(), "stop must leave no worker running");
}

#[tokio::test]
async fn storage_errors_never_grant_leadership() {
    let worker = Arc::new(CountingWorker::new(LEASE_TYPE));
    let bus = Arc::new(SignalBus::new());
    let reconciler = Arc::new(Reconciler::new(
        ReconcilerConfig {
            interval_seconds: 3600,
        },
        bus,
    ));
    let manager = Arc::new(LeaderElectionManager::new(
        vec![worker.clone()],
        reconciler,
        Arc::new(FailingLeaseStore),
        LeaderElectionConfig {
            polling_interval_seconds: 3600,
            lease_duration_seconds: 60,
            renew_ahead_seconds: 30,
        },
    ));

    manager.start().await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!worker.is_running(), "uncertain leadership must fail safe");
    assert_eq!(worker.pass_count(), 0);
    manager.stop().await;
}
