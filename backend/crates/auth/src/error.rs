//! Auth Error Types
//!
//! This module provides auth-specific error variants that integrate
//! with the unified `kernel::error::AppError` system.

use std::io;
use std::path::PathBuf;

use kernel::error::{app_error::AppError, kind::ErrorKind};
use platform::password::PasswordHashError;
use thiserror::Error;

/// Auth-specific result type alias
pub type AuthResult<T> = Result<T, AuthError>;

/// Auth-specific error variants
#[derive(Debug, Error)]
pub enum AuthError {
    /// Credential store could not be opened in the required mode
    #[error("Could not open credential store {}: {source}", .path.display())]
    StoreOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A record ended before its fixed shape was read
    #[error("Corrupt credential record at byte offset {offset}")]
    CorruptRecord { offset: u64 },

    /// Caller-supplied salt is not exactly 16 bytes
    #[error("Invalid salt length: expected {expected} bytes (got {actual})")]
    InvalidSalt { expected: usize, actual: usize },

    /// User name cannot be stored
    #[error("Invalid user name: {0}")]
    InvalidUserName(String),

    /// Password validation error
    #[error("Password validation failed: {0}")]
    PasswordValidation(String),

    /// Hashing engine failure
    #[error("Password hashing failed: {0}")]
    Hashing(String),

    /// Any other store I/O failure
    #[error("Credential store I/O error: {0}")]
    Io(#[from] io::Error),
}

impl AuthError {
    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::StoreOpen { .. } => ErrorKind::StoreOpen,
            AuthError::CorruptRecord { .. } => ErrorKind::CorruptRecord,
            AuthError::InvalidSalt { .. } => ErrorKind::InvalidSalt,
            AuthError::InvalidUserName(_) | AuthError::PasswordValidation(_) => {
                ErrorKind::InvalidInput
            }
            AuthError::Hashing(_) => ErrorKind::Hashing,
            AuthError::Io(_) => ErrorKind::Io,
        }
    }

    /// Convert to AppError
    pub fn to_app_error(&self) -> AppError {
        AppError::new(self.kind(), self.to_string())
    }

    /// Log the error with appropriate level
    pub fn log(&self) {
        match self {
            AuthError::StoreOpen { path, source } => {
                tracing::error!(path = %path.display(), error = %source, "Credential store unavailable");
            }
            AuthError::CorruptRecord { offset } => {
                tracing::error!(offset, "Credential store is corrupt");
            }
            AuthError::Io(e) => {
                tracing::error!(error = %e, "Credential store I/O error");
            }
            AuthError::InvalidSalt { .. } | AuthError::Hashing(_) => {
                tracing::error!(error = %self, "Password hashing error");
            }
            _ => {
                tracing::debug!(error = %self, "Auth error");
            }
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        let app = err.to_app_error();
        app.with_source(err)
    }
}

impl From<PasswordHashError> for AuthError {
    fn from(err: PasswordHashError) -> Self {
        match err {
            PasswordHashError::InvalidSalt { expected, actual } => {
                AuthError::InvalidSalt { expected, actual }
            }
            PasswordHashError::HashingFailed(msg) => AuthError::Hashing(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        let err = AuthError::StoreOpen {
            path: PathBuf::from("passwd"),
            source: io::Error::from(io::ErrorKind::NotFound),
        };
        assert_eq!(err.kind(), ErrorKind::StoreOpen);
        assert!(err.to_string().contains("passwd"));

        assert_eq!(
            AuthError::CorruptRecord { offset: 3 }.kind(),
            ErrorKind::CorruptRecord
        );
        assert_eq!(
            AuthError::InvalidUserName("empty".into()).kind(),
            ErrorKind::InvalidInput
        );
    }

    #[test]
    fn test_from_password_hash_error() {
        let err: AuthError = PasswordHashError::InvalidSalt {
            expected: 16,
            actual: 4,
        }
        .into();
        assert!(matches!(
            err,
            AuthError::InvalidSalt {
                expected: 16,
                actual: 4
            }
        ));
        assert_eq!(err.kind(), ErrorKind::InvalidSalt);
    }

    #[test]
    fn test_into_app_error_keeps_kind() {
        let app: AppError = AuthError::CorruptRecord { offset: 10 }.into();
        assert_eq!(app.kind(), ErrorKind::CorruptRecord);
        assert!(!app.is_recoverable());
    }
}
