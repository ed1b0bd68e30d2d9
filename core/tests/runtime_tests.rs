mod common;

use common::{birth, faulty_runtime, runtime, runtime_with, sky, t0, Fault};
use orrery_core::{CoreError, MemoryPersistence, Persistence};
use orrery_signals::EntityKey;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use urania::ephemeris::MeanMotionEphemeris;
use urania::{CancelToken, GroupRequest};

fn group(id: &str, members: &[&str]) -> GroupRequest {
    GroupRequest {
        group_id: id.to_string(),
        participant_ids: members.iter().map(|m| m.to_string()).collect(),
    }
}

#[tokio::test]
async fn test_requests_before_chart_are_not_ready() {
    let rt = runtime(sky());
    rt.tick(t0()).await.unwrap();

    let expect_user = |err: CoreError| match err {
        CoreError::NotReady { entity } => assert_eq!(entity, EntityKey::user("ghost")),
        other => panic!("expected NotReady, got {other:?}"),
    };
    expect_user(rt.transit_state("ghost").unwrap_err());
    expect_user(rt.snapshot("ghost").unwrap_err());
    expect_user(rt.sacred_timing("ghost", t0(), CancelToken::new()).await.unwrap_err());

    rt.set_birth_data("ada", birth("1990-05-01")).await.unwrap();
    rt.register_group(group("pair", &["ada", "ghost"])).await.unwrap();
    expect_user(rt.analyze_group("pair", t0(), CancelToken::new()).await.unwrap_err());

    assert!(matches!(
        rt.analyze_group("nobody", t0(), CancelToken::new()).await,
        Err(CoreError::NotReady { entity }) if entity == EntityKey::group("nobody")
    ));
    assert!(rt.users().iter().all(|u| u != "ghost"));
}

#[tokio::test]
async fn test_invalid_birth_data_creates_nothing() {
    let persistence = Arc::new(MemoryPersistence::new());
    let rt = runtime_with(sky(), persistence.clone());

    match rt.set_birth_data("ada", birth("1990-13-01")).await {
        Err(CoreError::Validation(e)) => assert_eq!(e.field, "date"),
        other => panic!("expected validation error, got {other:?}"),
    }
    assert!(matches!(rt.birth_chart("ada"), Err(CoreError::NotReady { .. })));
    assert!(persistence.list("birth_data").await.unwrap().is_empty());
    assert!(rt.broadcaster().latest(&EntityKey::user("ada")).is_none());
}

#[tokio::test]
async fn test_transit_appears_after_first_tick() {
    let rt = runtime(sky());
    let chart = rt.set_birth_data("ada", birth("1990-05-01")).await.unwrap();
    assert_eq!(chart.owner_id, "ada");
    assert!(matches!(rt.transit_state("ada"), Err(CoreError::NotReady { .. })));
    assert!(rt.snapshot("ada").unwrap().last_updated.is_none());

    let report = rt.tick(t0()).await.unwrap();
    assert_eq!(report.updated, 1);
    assert_eq!(report.failed + report.timed_out, 0);

    let transit = rt.transit_state("ada").unwrap();
    assert!(!transit.stale);
    assert_eq!(transit.ephemeris_instant, t0());
    assert_eq!(rt.snapshot("ada").unwrap().houses.len(), 12);

    // Users added after a tick start from the last snapshot.
    rt.set_birth_data("alan", birth("1912-06-23")).await.unwrap();
    assert_eq!(rt.transit_state("alan").unwrap().ephemeris_instant, t0());
}

#[tokio::test]
async fn test_ephemeris_outage_marks_stale_then_recovers() {
    let provider = sky();
    let rt = runtime(provider.clone());
    rt.set_birth_data("ada", birth("1990-05-01")).await.unwrap();
    rt.tick(t0()).await.unwrap();

    let sub = rt.subscribe(EntityKey::user("ada"));
    assert_eq!(sub.latest().unwrap().state["stale"], json!(false));

    provider.set_failing(true);
    let later = t0() + chrono::Duration::hours(1);
    assert!(matches!(rt.tick(later).await, Err(CoreError::EphemerisUnavailable(_))));
    assert!(rt.transit_state("ada").unwrap().stale);
    assert_eq!(rt.last_ephemeris().unwrap().instant, t0());
    assert_eq!(sub.latest().unwrap().state["stale"], json!(true));

    // A second failure does not republish.
    assert!(rt.tick(later).await.is_err());
    assert!(sub.try_recv().is_none());

    provider.set_failing(false);
    rt.tick(later).await.unwrap();
    let transit = rt.transit_state("ada").unwrap();
    assert!(!transit.stale);
    assert_eq!(transit.ephemeris_instant, later);
    assert_eq!(sub.latest().unwrap().state["stale"], json!(false));
}

#[tokio::test]
async fn test_subscriber_receives_latest_on_join() {
    let rt = runtime(sky());
    rt.set_birth_data("ada", birth("1990-05-01")).await.unwrap();
    rt.tick(t0()).await.unwrap();

    let sub = rt.subscribe(EntityKey::user("ada"));
    let message = sub.try_recv().unwrap();
    assert_eq!(message.entity_id, "ada");
    assert_eq!(message.state["houses"].as_array().unwrap().len(), 12);
    assert!(sub.try_recv().is_none());
}

#[tokio::test]
async fn test_group_analysis_published() {
    let rt = runtime(sky());
    for (id, date) in [("ada", "1990-05-01"), ("alan", "1912-06-23"), ("grace", "1906-12-09")] {
        rt.set_birth_data(id, birth(date)).await.unwrap();
    }
    rt.register_group(group("team", &["ada", "alan", "grace"])).await.unwrap();
    assert!(matches!(rt.group_analysis("team"), Err(CoreError::NotReady { .. })));

    let sub = rt.subscribe(EntityKey::group("team"));
    let analysis = rt.analyze_group("team", t0(), CancelToken::new()).await.unwrap();
    assert_eq!(analysis.synastry_matrix.len(), 3);
    assert_eq!(analysis.participants, vec!["ada", "alan", "grace"]);
    assert_eq!(rt.group_analysis("team").unwrap().generated_at, t0());

    let message = sub.try_recv().unwrap();
    assert_eq!(message.entity_id, "team");
    assert_eq!(message.state["group_id"], json!("team"));
}

#[tokio::test]
async fn test_group_registration_is_validated() {
    let rt = runtime(sky());
    for request in [group("solo", &["ada"]), group("twice", &["ada", "ada"]), group(" ", &["a", "b"])] {
        assert!(matches!(
            rt.register_group(request).await,
            Err(CoreError::Validation(_))
        ));
    }
    assert!(rt.groups().is_empty());
}

#[tokio::test]
async fn test_cancelled_group_analysis() {
    let rt = runtime(sky());
    rt.set_birth_data("ada", birth("1990-05-01")).await.unwrap();
    rt.set_birth_data("alan", birth("1912-06-23")).await.unwrap();
    rt.register_group(group("pair", &["ada", "alan"])).await.unwrap();

    let cancel = CancelToken::new();
    cancel.cancel();
    assert!(matches!(
        rt.analyze_group("pair", t0(), cancel).await,
        Err(CoreError::Cancelled)
    ));
    assert!(rt.group_analysis("pair").is_err());
}

#[tokio::test]
async fn test_hydrate_restores_users_and_groups() {
    let persistence = Arc::new(MemoryPersistence::new());
    let first = runtime_with(sky(), persistence.clone());
    first.set_birth_data("ada", birth("1990-05-01")).await.unwrap();
    first.set_birth_data("alan", birth("1912-06-23")).await.unwrap();
    first.register_group(group("pair", &["ada", "alan"])).await.unwrap();
    persistence
        .put("birth_data", "broken", json!({ "date": 5 }))
        .await
        .unwrap();

    let second = runtime_with(sky(), persistence);
    let report = second.hydrate().await.unwrap();
    assert_eq!(report.users, 2);
    assert_eq!(report.groups, 1);
    assert_eq!(report.skipped, 1);
    assert_eq!(
        second.birth_chart("ada").unwrap().positions,
        first.birth_chart("ada").unwrap().positions
    );
    assert!(second.analyze_group("pair", t0(), CancelToken::new()).await.is_ok());
}

#[tokio::test]
async fn test_sacred_timing_for_ready_user() {
    let provider = Arc::new(MeanMotionEphemeris::new());
    let rt = runtime_with(provider, Arc::new(MemoryPersistence::new()));
    rt.set_birth_data("ada", birth("1990-05-01")).await.unwrap();
    rt.tick(t0()).await.unwrap();

    let timing = rt.sacred_timing("ada", t0(), CancelToken::new()).await.unwrap();
    assert_eq!(timing.recommendations.len(), 12);
    assert_eq!(timing.horizon_end, t0() + chrono::Duration::days(30));
    // Projection is never committed.
    assert_eq!(rt.transit_state("ada").unwrap().ephemeris_instant, t0());

    let cancel = CancelToken::new();
    cancel.cancel();
    assert!(matches!(
        rt.sacred_timing("ada", t0(), cancel).await,
        Err(CoreError::Cancelled)
    ));
}

#[tokio::test]
async fn test_chart_and_transit_written_through() {
    let persistence = Arc::new(MemoryPersistence::new());
    let rt = runtime_with(sky(), persistence.clone());
    rt.set_birth_data("ada", birth("1990-05-01")).await.unwrap();
    assert!(persistence.get("birth_chart", "ada").await.unwrap().is_some());
    assert!(persistence.get("transit_state", "ada").await.unwrap().is_none());

    rt.tick(t0()).await.unwrap();
    let stored = persistence.get("transit_state", "ada").await.unwrap().unwrap();
    assert_eq!(stored["owner_id"], json!("ada"));

    // A failing store does not fail the tick.
    persistence.set_failing(true);
    assert_eq!(rt.tick(t0()).await.unwrap().updated, 1);
}

#[tokio::test]
async fn test_failed_user_goes_stale_while_others_update() {
    let (rt, model) = faulty_runtime(Duration::from_secs(5));
    rt.set_birth_data("ada", birth("1990-05-01")).await.unwrap();
    rt.set_birth_data("grace", birth("1906-12-09")).await.unwrap();
    rt.tick(t0()).await.unwrap();

    model.set("grace", Fault::Panic);
    let later = t0() + chrono::Duration::hours(1);
    let report = rt.tick(later).await.unwrap();
    assert_eq!((report.updated, report.failed, report.timed_out), (1, 1, 0));

    let grace = rt.transit_state("grace").unwrap();
    assert!(grace.stale);
    assert_eq!(grace.ephemeris_instant, t0());
    let ada = rt.transit_state("ada").unwrap();
    assert!(!ada.stale);
    assert_eq!(ada.ephemeris_instant, later);

    model.clear();
    let next = later + chrono::Duration::hours(1);
    assert_eq!(rt.tick(next).await.unwrap().updated, 2);
    let grace = rt.transit_state("grace").unwrap();
    assert!(!grace.stale);
    assert_eq!(grace.ephemeris_instant, next);
}

#[tokio::test]
async fn test_slow_user_times_out_and_retries() {
    let (rt, model) = faulty_runtime(Duration::from_millis(50));
    rt.set_birth_data("ada", birth("1990-05-01")).await.unwrap();
    rt.set_birth_data("grace", birth("1906-12-09")).await.unwrap();
    rt.tick(t0()).await.unwrap();

    model.set("grace", Fault::Stall(Duration::from_millis(300)));
    let later = t0() + chrono::Duration::hours(1);
    let report = rt.tick(later).await.unwrap();
    assert_eq!((report.updated, report.failed, report.timed_out), (1, 0, 1));
    assert!(rt.transit_state("grace").unwrap().stale);
    assert_eq!(rt.transit_state("ada").unwrap().ephemeris_instant, later);
    assert!(rt.snapshot("grace").unwrap().stale);

    model.clear();
    let next = later + chrono::Duration::hours(1);
    let report = rt.tick(next).await.unwrap();
    assert_eq!(report.updated, 2);
    assert!(!rt.transit_state("grace").unwrap().stale);
}

#[tokio::test]
async fn test_birth_data_replaced_during_tick() {
    let (rt, model) = faulty_runtime(Duration::from_secs(5));
    let rt = Arc::new(rt);
    rt.set_birth_data("ada", birth("1990-05-01")).await.unwrap();
    assert_eq!(model.calls("ada"), 0);

    model.set("ada", Fault::Stall(Duration::from_millis(300)));
    let tick = tokio::spawn({
        let rt = rt.clone();
        async move { rt.tick(t0()).await }
    });
    while model.calls("ada") == 0 {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    model.clear();
    let replaced = rt.set_birth_data("ada", birth("1985-11-20")).await.unwrap();

    let report = tick.await.unwrap().unwrap();
    assert_eq!(report.superseded, 1);
    assert_eq!(report.updated, 0);

    // The late result for the old chart never lands.
    assert!(Arc::ptr_eq(&rt.birth_chart("ada").unwrap(), &replaced));
    let transit = rt.transit_state("ada").unwrap();
    assert_eq!(transit.ephemeris_instant, t0());
    assert!(!transit.stale);
}
