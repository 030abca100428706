//! Error types shared across the crate.

use std::fmt::{Display, Formatter};

/// Shared crate result type.
pub type Result<T> = std::result::Result<T, AppError>;

/// Error enumeration covering the failure modes a caller can observe.
#[derive(Debug)]
pub enum AppError {
    /// Configuration parsing or validation failure.
    Config(String),
    /// No free port could be bound for the observer listener.
    Port(String),
    /// Socket or file-system failure other than a busy port.
    Io(String),
    /// The HTTP listener failed while serving.
    Server(String),
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Port(msg) => write!(f, "port: {msg}"),
            Self::Io(msg) => write!(f, "io: {msg}"),
            Self::Server(msg) => write!(f, "server: {msg}"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(format!("invalid config: {err}"))
    }
}
