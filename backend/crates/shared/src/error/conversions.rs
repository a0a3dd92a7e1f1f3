//! Error conversions - From implementations for common error types
//!
//! Provides automatic conversion from common error types to [`AppError`].

use super::app_error::AppError;
use super::kind::ErrorKind;

// ============================================================================
// Standard library conversions
// ============================================================================

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        let kind = match err.kind() {
            std::io::ErrorKind::AddrInUse | std::io::ErrorKind::AddrNotAvailable => {
                ErrorKind::Init
            }
            _ => ErrorKind::Io,
        };
        AppError::new(kind, "I/O operation failed").with_source(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_io_error_conversion() {
        // record corruption is classified by the store, not here
        let io_err = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "short read");
        let app_err: AppError = io_err.into();
        assert_eq!(app_err.kind(), ErrorKind::Io);
        assert!(app_err.source().is_some());

        let io_err = std::io::Error::new(std::io::ErrorKind::AddrInUse, "in use");
        let app_err: AppError = io_err.into();
        assert_eq!(app_err.kind(), ErrorKind::Init);

        let io_err = std::io::Error::other("boom");
        let app_err: AppError = io_err.into();
        assert_eq!(app_err.kind(), ErrorKind::Io);
    }
}
