//! Dispatch Error Types
//!
//! This module provides dispatch-specific error variants that integrate
//! with the unified `kernel::error::AppError` system.

use std::io;
use std::net::{AddrParseError, SocketAddr};
use std::path::PathBuf;

use auth::AuthError;
use kernel::error::{app_error::AppError, kind::ErrorKind};
use thiserror::Error;

/// Dispatch-specific result type alias
pub type DispatchResult<T> = Result<T, DispatchError>;

/// Dispatch-specific error variants
///
/// Setup failures (`InvalidAddress`, `Listen`, `EventLog`) map to
/// `ErrorKind::Init` and stop the server; `Socket` failures only cost the
/// affected connection.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Bind address is not an IP literal
    #[error("Invalid bind address {addr}: {source}")]
    InvalidAddress {
        addr: String,
        #[source]
        source: AddrParseError,
    },

    /// Socket creation, bind or listen failed
    #[error("Could not listen on {addr}: {source}")]
    Listen {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    /// Per-connection socket failure (accept, read, write)
    #[error("Socket error: {0}")]
    Socket(#[source] io::Error),

    /// Event log could not be opened for append
    #[error("Could not open event log {}: {source}", .path.display())]
    EventLog {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Credential store or login failure
    #[error(transparent)]
    Auth(#[from] AuthError),
}

impl DispatchError {
    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            DispatchError::InvalidAddress { .. }
            | DispatchError::Listen { .. }
            | DispatchError::EventLog { .. } => ErrorKind::Init,
            DispatchError::Socket(_) => ErrorKind::Socket,
            DispatchError::Auth(e) => e.kind(),
        }
    }

    /// Convert to AppError
    pub fn to_app_error(&self) -> AppError {
        AppError::new(self.kind(), self.to_string())
    }

    /// Log the error with appropriate level
    pub fn log(&self) {
        match self {
            DispatchError::Socket(e) => {
                tracing::warn!(error = %e, "Socket error");
            }
            DispatchError::Auth(e) => e.log(),
            _ => {
                tracing::error!(error = %self, "Server initialisation failed");
            }
        }
    }
}

impl From<DispatchError> for AppError {
    fn from(err: DispatchError) -> Self {
        let app = err.to_app_error();
        app.with_source(err)
    }
}
