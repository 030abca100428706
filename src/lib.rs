#![forbid(unsafe_code)]

//! Pause a running program at checkpoints and inspect its values from a
//! browser.
//!
//! Each [`checkpoint`] records a formatted [`Snapshot`] as a numbered dump,
//! pushes it to every connected observer, and waits until an observer
//! presses Run. Detaching from the observer page lets the program run
//! freely from then on.

pub mod config;
pub mod errors;
pub mod format;
pub mod http;
pub mod models;
pub mod session;
pub mod snapshot;

pub use config::RunstopConfig;
pub use errors::{AppError, Result};
pub use format::{InspectFormatter, ValueFormatter};
pub use models::dump::Dump;
pub use session::{checkpoint, Runstop, Subscription};
pub use snapshot::{Captured, Snapshot};
