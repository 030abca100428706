//! Route table mapping observer requests onto session operations.
//!
//! | Path        | Method | Effect                                   |
//! |-------------|--------|------------------------------------------|
//! | `/`         | GET    | observer page                            |
//! | `/events`   | GET    | event stream: history, `ready`, live     |
//! | `/continue` | POST   | release the pending checkpoint           |
//! | `/stop`     | POST   | detach the session                       |
//!
//! Anything else, including a known path with the wrong method, is `404`.

use std::convert::Infallible;

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use tracing::debug;

use super::page::OBSERVER_PAGE;
use crate::session::Runstop;

/// Build the observer router bound to `session`.
#[must_use]
pub fn build(session: Runstop) -> Router {
    Router::new()
        .route("/", get(index).fallback(not_found))
        .route("/events", get(events).fallback(not_found))
        .route("/continue", post(resume).fallback(not_found))
        .route("/stop", post(stop).fallback(not_found))
        .fallback(not_found)
        .with_state(session)
}

async fn index() -> Html<&'static str> {
    Html(OBSERVER_PAGE)
}

/// Stream encoded frames for one observer until it disconnects or the
/// session detaches. Dropping the body unregisters the observer.
async fn events(State(session): State<Runstop>) -> Response {
    let subscription = session.subscribe();
    let frames = futures_util::stream::unfold(subscription, |mut subscription| async move {
        subscription
            .next_frame()
            .await
            .map(|frame| (Ok::<_, Infallible>(frame), subscription))
    });

    (
        [
            (header::CONTENT_TYPE, "text/event-stream"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        Body::from_stream(frames),
    )
        .into_response()
}

async fn resume(State(session): State<Runstop>) -> &'static str {
    let released = session.resume();
    debug!(released, "continue requested");
    "ok"
}

/// Acknowledge first; teardown waits out the grace delay in the background.
async fn stop(State(session): State<Runstop>) -> &'static str {
    debug!("stop requested");
    tokio::spawn(async move { session.detach().await });
    "ok"
}

async fn not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "Not Found")
}
