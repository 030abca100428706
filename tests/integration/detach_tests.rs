//! Detach: release, terminal notification, teardown, and pass-through.

use std::time::Duration;

use runstop::snapshot;

use super::test_helpers::{
    assert_returns, base_url, next_event, spawn_checkpoint, test_session, wait_until,
    EventReader, WAIT,
};

#[tokio::test]
async fn detach_releases_the_pending_checkpoint() {
    let session = test_session();
    let handle = spawn_checkpoint(&session, snapshot!(a = 1)).await;

    session.detach().await;

    assert_returns(handle).await;
    assert!(session.is_detached());
    assert!(!session.is_pending());
}

#[tokio::test]
async fn observers_receive_stopped_before_close() {
    let session = test_session();
    let handle = spawn_checkpoint(&session, snapshot!(a = 1)).await;

    let mut subscription = session.subscribe();
    assert_eq!(next_event(&mut subscription).await.expect("dump").name, "dump");
    assert_eq!(next_event(&mut subscription).await.expect("ready").name, "ready");

    session.detach().await;

    let stopped = next_event(&mut subscription).await.expect("stopped");
    assert_eq!(stopped.name, "stopped");
    assert_eq!(stopped.data, "{}");
    assert_eq!(next_event(&mut subscription).await, None);
    assert_eq!(session.observer_count(), 0);

    assert_returns(handle).await;
}

#[tokio::test]
async fn detach_tears_down_listener_and_history() {
    let session = test_session();
    let handle = spawn_checkpoint(&session, snapshot!(a = 1)).await;
    let url = base_url(&session);

    session.detach().await;
    assert_returns(handle).await;

    assert_eq!(session.port(), None);
    assert!(session.dumps().is_empty());
    assert!(reqwest::get(format!("{url}/")).await.is_err());
}

#[tokio::test]
async fn checkpoints_after_detach_pass_straight_through() {
    let session = test_session();
    let handle = spawn_checkpoint(&session, snapshot!(a = 1)).await;
    session.detach().await;
    assert_returns(handle).await;

    for step in 0..3 {
        tokio::time::timeout(Duration::from_millis(200), session.checkpoint(&snapshot!(step)))
            .await
            .expect("checkpoint after detach must not block")
            .expect("checkpoint after detach must not fail");
    }

    assert!(session.dumps().is_empty());
    assert_eq!(session.port(), None);
    assert!(!session.is_pending());
}

#[tokio::test]
async fn detach_before_any_checkpoint_never_listens() {
    let session = test_session();
    session.detach().await;

    session.checkpoint(&snapshot!(a = 1)).await.expect("pass through");
    assert_eq!(session.port(), None);
    assert!(session.dumps().is_empty());
}

#[tokio::test]
async fn detach_twice_is_harmless() {
    let session = test_session();
    let handle = spawn_checkpoint(&session, snapshot!(a = 1)).await;

    session.detach().await;
    session.detach().await;

    assert_returns(handle).await;
    assert!(session.is_detached());
}

#[tokio::test]
async fn subscribing_after_detach_yields_only_stopped() {
    let session = test_session();
    session.detach().await;

    let mut subscription = session.subscribe();
    assert_eq!(next_event(&mut subscription).await.expect("stopped").name, "stopped");
    assert_eq!(next_event(&mut subscription).await, None);
    assert_eq!(session.observer_count(), 0);
}

#[tokio::test]
async fn stop_route_detaches_and_notifies_http_observers() {
    let session = test_session();
    let handle = spawn_checkpoint(&session, snapshot!(a = 1)).await;

    let mut reader = EventReader::open(&session).await;
    assert_eq!(reader.next_event().await.expect("dump").name, "dump");
    assert_eq!(reader.next_event().await.expect("ready").name, "ready");

    let response = reqwest::Client::new()
        .post(format!("{}/stop", base_url(&session)))
        .send()
        .await
        .expect("POST /stop");
    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.expect("body"), "ok");

    assert_eq!(reader.next_event().await.expect("stopped").name, "stopped");
    assert_eq!(reader.next_event().await, None);

    assert_returns(handle).await;
    tokio::time::timeout(WAIT, wait_until(|| session.port().is_none()))
        .await
        .expect("listener shut down");
    assert!(session.dumps().is_empty());
}

#[tokio::test]
async fn listener_outlives_dropped_handles_until_stop() {
    let session = test_session();
    let handle = spawn_checkpoint(&session, snapshot!(a = 1)).await;
    let url = base_url(&session);
    session.resume();
    assert_returns(handle).await;
    drop(session);

    let client = reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .build()
        .expect("client");
    let response = client.get(format!("{url}/")).send().await.expect("GET /");
    assert_eq!(response.status(), 200);

    let response = client
        .post(format!("{url}/stop"))
        .send()
        .await
        .expect("POST /stop");
    assert_eq!(response.status(), 200);

    tokio::time::timeout(WAIT, async {
        while client.get(format!("{url}/")).send().await.is_ok() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("listener still serving after stop");
}
