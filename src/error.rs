//! Error handling for the adbmap scanner
//!
//! Collaborator failures are plain values: a connection provider returns
//! [`ConnectError`], a protocol session returns [`ProtocolError`]. The mapper
//! folds both into a negative probe outcome. Only [`ScanError`] ever reaches
//! the caller of a scan.

use std::io;
use thiserror::Error;

/// Failure to open a connection to a candidate host
#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("connection timed out")]
    Timeout,

    #[error("connection refused")]
    Refused,

    #[error("host unreachable: {0}")]
    Unreachable(#[source] io::Error),
}

impl From<io::Error> for ConnectError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::TimedOut => ConnectError::Timeout,
            io::ErrorKind::ConnectionRefused => ConnectError::Refused,
            _ => ConnectError::Unreachable(err),
        }
    }
}

/// Failure while running a capability check over an open connection
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("handshake timed out")]
    Timeout,

    #[error("malformed message: {0}")]
    Malformed(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Main error type for scanning operations
#[derive(Debug, Error)]
pub enum ScanError {
    /// Task scheduling failed (closed semaphore, runtime shutting down).
    #[error("Runtime error: {0}")]
    Runtime(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}
