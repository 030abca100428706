//! HTTP frontend for observers.
//!
//! Serves the observer page, the event stream, and the resume/detach
//! endpoints on a listener owned by the session.

pub mod page;
pub mod port;
pub mod router;

use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, info_span, Instrument};

use crate::session::Runstop;
use crate::{AppError, Result};

/// Serve the observer routes on `listener` until `cancel` fires.
///
/// The router keeps `session` alive for as long as the task runs. The task
/// resolves to `AppError::Server` if serving fails.
#[must_use = "the handle is needed to await listener shutdown"]
pub fn spawn_server(
    listener: TcpListener,
    session: Runstop,
    cancel: CancellationToken,
) -> JoinHandle<Result<()>> {
    let port = listener.local_addr().map(|addr| addr.port()).unwrap_or_default();
    let router = router::build(session);

    tokio::spawn(
        async move {
            info!("serving observer routes");
            let result = axum::serve(listener, router)
                .with_graceful_shutdown(async move { cancel.cancelled().await })
                .await;
            match result {
                Ok(()) => {
                    info!("observer routes shut down");
                    Ok(())
                }
                Err(err) => {
                    error!(%err, "observer listener failed");
                    Err(AppError::Server(format!("observer listener failed: {err}")))
                }
            }
        }
        .instrument(info_span!("observer_listener", port)),
    )
}
