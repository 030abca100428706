//! Shared helpers for session-level integration tests.
//!
//! Sessions bind an OS-assigned port and stay quiet on stderr so tests can
//! run in parallel.

use std::time::Duration;

use runstop::{Runstop, RunstopConfig, Snapshot, Subscription};
use tokio::task::JoinHandle;

/// Upper bound for any single wait in these tests.
pub const WAIT: Duration = Duration::from_secs(5);

/// Build a session bound to an ephemeral port with a short detach grace.
pub fn test_session() -> Runstop {
    let config = RunstopConfig {
        start_port: 0,
        detach_grace_ms: 10,
        announce: false,
        ..RunstopConfig::default()
    };
    Runstop::new(config)
}

/// Poll `condition` until it holds, failing the test after [`WAIT`].
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(WAIT, async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

/// Issue a checkpoint in the background and wait until it is suspended.
pub async fn spawn_checkpoint(
    session: &Runstop,
    snapshot: Snapshot,
) -> JoinHandle<runstop::Result<()>> {
    let expected = session.dumps().len() + 1;
    let task_session = session.clone();
    let handle = tokio::spawn(async move { task_session.checkpoint(&snapshot).await });
    wait_until(|| session.is_pending() && session.dumps().len() == expected).await;
    handle
}

/// Assert that `handle` has not completed within a short window.
pub async fn assert_still_suspended(handle: &mut JoinHandle<runstop::Result<()>>) {
    let outcome = tokio::time::timeout(Duration::from_millis(100), handle).await;
    assert!(outcome.is_err(), "checkpoint returned without a resume");
}

/// Wait for a background checkpoint to return successfully.
pub async fn assert_returns(handle: JoinHandle<runstop::Result<()>>) {
    tokio::time::timeout(WAIT, handle)
        .await
        .expect("checkpoint did not return in time")
        .expect("checkpoint task panicked")
        .expect("checkpoint failed");
}

/// Base URL of the running listener.
pub fn base_url(session: &Runstop) -> String {
    let port = session.port().expect("listener running");
    format!("http://127.0.0.1:{port}")
}

/// One parsed event-stream frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub name: String,
    pub data: String,
}

impl Event {
    /// Decode the data line as JSON.
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.data).expect("event data is json")
    }
}

/// Parse a complete `event: ..\ndata: ..\n\n` frame.
pub fn parse_frame(frame: &[u8]) -> Event {
    let text = std::str::from_utf8(frame).expect("utf8 frame");
    assert!(text.ends_with("\n\n"), "frame must end with a blank line: {text:?}");
    let mut name = None;
    let mut data = None;
    for line in text.lines() {
        if let Some(value) = line.strip_prefix("event: ") {
            name = Some(value.to_owned());
        } else if let Some(value) = line.strip_prefix("data: ") {
            data = Some(value.to_owned());
        }
    }
    Event {
        name: name.expect("event line"),
        data: data.expect("data line"),
    }
}

/// Next event from an in-process subscription, or `None` once it closes.
pub async fn next_event(subscription: &mut Subscription) -> Option<Event> {
    tokio::time::timeout(WAIT, subscription.next_frame())
        .await
        .expect("event in time")
        .map(|frame| parse_frame(&frame))
}

/// Event-stream reader over an HTTP response.
pub struct EventReader {
    response: reqwest::Response,
    buffer: Vec<u8>,
}

impl EventReader {
    /// Open `/events` on the session's listener.
    pub async fn open(session: &Runstop) -> Self {
        let response = reqwest::get(format!("{}/events", base_url(session)))
            .await
            .expect("GET /events");
        assert_eq!(response.status(), 200);
        Self {
            response,
            buffer: Vec::new(),
        }
    }

    /// Response headers of the stream.
    pub fn headers(&self) -> &reqwest::header::HeaderMap {
        self.response.headers()
    }

    /// Next event, or `None` once the server closes the stream.
    pub async fn next_event(&mut self) -> Option<Event> {
        loop {
            if let Some(end) = self.buffer.windows(2).position(|pair| pair == b"\n\n") {
                let frame: Vec<u8> = self.buffer.drain(..end + 2).collect();
                return Some(parse_frame(&frame));
            }
            let chunk = tokio::time::timeout(WAIT, self.response.chunk())
                .await
                .expect("stream chunk in time")
                .expect("stream chunk")?;
            self.buffer.extend_from_slice(&chunk);
        }
    }
}
