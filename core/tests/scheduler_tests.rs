mod common;

use common::{birth, runtime, sky};
use orrery_core::Scheduler;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_scheduler_ticks_until_shutdown() {
    let provider = sky();
    let rt = Arc::new(runtime(provider.clone()));
    rt.set_birth_data("ada", birth("1990-05-01")).await.unwrap();

    let handle = Scheduler::with_timing(
        rt.clone(),
        Duration::from_millis(40),
        Duration::from_millis(10),
        Duration::from_millis(40),
    )
    .spawn();
    tokio::time::sleep(Duration::from_millis(200)).await;
    handle.shutdown().await;

    let calls = provider.calls();
    assert!(calls >= 3, "only {calls} ticks");
    assert!(!rt.transit_state("ada").unwrap().stale);

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(provider.calls(), calls, "ticked after shutdown");
}

#[tokio::test]
async fn test_scheduler_keeps_retrying_through_outage() {
    let provider = sky();
    let rt = Arc::new(runtime(provider.clone()));
    rt.set_birth_data("ada", birth("1990-05-01")).await.unwrap();
    rt.tick(chrono::Utc::now()).await.unwrap();
    provider.set_failing(true);

    let handle = Scheduler::with_timing(
        rt.clone(),
        Duration::from_secs(3600),
        Duration::from_millis(10),
        Duration::from_millis(20),
    )
    .spawn();
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert!(handle.ticks() >= 3);
    assert!(rt.transit_state("ada").unwrap().stale);

    provider.set_failing(false);
    tokio::time::sleep(Duration::from_millis(100)).await;
    handle.shutdown().await;
    assert!(!rt.transit_state("ada").unwrap().stale);
}
