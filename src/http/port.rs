//! Sequential free-port probing.

use std::io::ErrorKind;
use std::net::{IpAddr, SocketAddr};

use tokio::net::TcpListener;
use tracing::debug;

use crate::{AppError, Result};

/// Bind the first available port at or above `start` and keep the listener.
///
/// Busy or forbidden ports advance to the next one. A `start` of `0` lets
/// the OS choose. Returns the listener together with its bound port.
///
/// # Errors
///
/// Returns `AppError::Port` when every port up to 65535 is unavailable and
/// `AppError::Io` for any other bind failure.
pub async fn bind_first_free(host: IpAddr, start: u16) -> Result<(TcpListener, u16)> {
    let mut port = start;
    loop {
        match TcpListener::bind(SocketAddr::new(host, port)).await {
            Ok(listener) => {
                let bound = listener
                    .local_addr()
                    .map_err(|err| AppError::Io(format!("failed to read bound address: {err}")))?
                    .port();
                return Ok((listener, bound));
            }
            Err(err) if is_unavailable(err.kind()) => {
                debug!(port, %err, "port unavailable; trying next");
                port = port.checked_add(1).ok_or_else(|| {
                    AppError::Port(format!("no free port on {host} from {start} upward"))
                })?;
            }
            Err(err) => {
                return Err(AppError::Io(format!("failed to bind {host}:{port}: {err}")));
            }
        }
    }
}

/// Find the first free port at or above `start`.
///
/// The probe listener is closed before returning, so another process may
/// claim the port before the caller binds it.
///
/// # Errors
///
/// Same as [`bind_first_free`].
pub async fn find_free_port(host: IpAddr, start: u16) -> Result<u16> {
    let (listener, port) = bind_first_free(host, start).await?;
    drop(listener);
    Ok(port)
}

fn is_unavailable(kind: ErrorKind) -> bool {
    matches!(kind, ErrorKind::AddrInUse | ErrorKind::PermissionDenied)
}
