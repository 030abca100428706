//! History replay and live delivery for observers joining at any time.

use runstop::snapshot;

use super::test_helpers::{
    assert_returns, next_event, spawn_checkpoint, test_session, wait_until, EventReader,
};

#[tokio::test]
async fn late_observer_receives_history_then_ready_then_live() {
    let session = test_session();

    for step in 1..=2 {
        let handle = spawn_checkpoint(&session, snapshot!(step)).await;
        session.resume();
        assert_returns(handle).await;
    }
    let third = spawn_checkpoint(&session, snapshot!(step = 3)).await;

    let mut subscription = session.subscribe();
    for expected in 1..=3 {
        let event = next_event(&mut subscription).await.expect("replayed dump");
        assert_eq!(event.name, "dump");
        assert_eq!(event.json()["index"], expected);
    }
    let ready = next_event(&mut subscription).await.expect("ready");
    assert_eq!(ready.name, "ready");
    assert_eq!(ready.data, "{}");

    session.resume();
    assert_returns(third).await;

    let fourth = spawn_checkpoint(&session, snapshot!(step = 4)).await;
    let live = next_event(&mut subscription).await.expect("live dump");
    assert_eq!(live.name, "dump");
    assert_eq!(live.json()["index"], 4);
    assert_eq!(live.json()["content"], "step:\n4\n");

    session.resume();
    assert_returns(fourth).await;
}

#[tokio::test]
async fn observer_before_first_dump_gets_only_ready() {
    let session = test_session();
    let mut subscription = session.subscribe();

    let ready = next_event(&mut subscription).await.expect("ready");
    assert_eq!(ready.name, "ready");
    assert_eq!(session.observer_count(), 1);
}

#[tokio::test]
async fn dropping_a_subscription_unregisters_it() {
    let session = test_session();
    let first = session.subscribe();
    let second = session.subscribe();
    assert_eq!(session.observer_count(), 2);

    drop(first);
    assert_eq!(session.observer_count(), 1);
    drop(second);
    assert_eq!(session.observer_count(), 0);
}

#[tokio::test]
async fn every_observer_sees_the_same_live_order() {
    let session = test_session();
    let first = spawn_checkpoint(&session, snapshot!(step = 1)).await;

    let mut early = session.subscribe();
    let mut other = session.subscribe();

    session.resume();
    assert_returns(first).await;
    let second = spawn_checkpoint(&session, snapshot!(step = 2)).await;

    for subscription in [&mut early, &mut other] {
        let names_and_indices = [
            next_event(subscription).await.expect("replay"),
            next_event(subscription).await.expect("ready"),
            next_event(subscription).await.expect("live"),
        ];
        assert_eq!(names_and_indices[0].name, "dump");
        assert_eq!(names_and_indices[0].json()["index"], 1);
        assert_eq!(names_and_indices[1].name, "ready");
        assert_eq!(names_and_indices[2].name, "dump");
        assert_eq!(names_and_indices[2].json()["index"], 2);
    }

    session.resume();
    assert_returns(second).await;
}

#[tokio::test]
async fn http_observer_replays_history_over_the_event_stream() {
    let session = test_session();
    let first = spawn_checkpoint(&session, snapshot!(a = 1)).await;

    let mut reader = EventReader::open(&session).await;
    assert_eq!(
        reader.headers()["content-type"].to_str().expect("ascii"),
        "text/event-stream"
    );
    assert_eq!(
        reader.headers()["cache-control"].to_str().expect("ascii"),
        "no-cache"
    );

    let replayed = reader.next_event().await.expect("replayed dump");
    assert_eq!(replayed.name, "dump");
    assert_eq!(replayed.json()["index"], 1);
    assert_eq!(replayed.json()["content"], "a:\n1\n");
    assert_eq!(reader.next_event().await.expect("ready").name, "ready");

    session.resume();
    assert_returns(first).await;
    let second = spawn_checkpoint(&session, snapshot!(b = 2)).await;

    let live = reader.next_event().await.expect("live dump");
    assert_eq!(live.json()["index"], 2);

    session.resume();
    assert_returns(second).await;
}

#[tokio::test]
async fn closing_an_http_observer_unregisters_it() {
    let session = test_session();
    let handle = spawn_checkpoint(&session, snapshot!(a = 1)).await;

    let reader = EventReader::open(&session).await;
    wait_until(|| session.observer_count() == 1).await;
    drop(reader);

    // The server notices the disconnect on its next write.
    session.resume();
    assert_returns(handle).await;
    let next = spawn_checkpoint(&session, snapshot!(b = 2)).await;
    wait_until(|| session.observer_count() == 0).await;

    session.resume();
    assert_returns(next).await;
}
