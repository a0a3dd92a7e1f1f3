//! User Name Value Object
//!
//! A user name is the key of a credential record. It is stored and matched
//! byte-for-byte: no trimming, no Unicode normalization, no case folding.
//!
//! ## Invariants
//! - Non-empty
//! - No `\n` (the record format terminates the name with one)
//! - At most [`USER_NAME_MAX_LENGTH`] bytes
//!
//! ## Case sensitivity
//! `Alice` and `alice` are different users. Older documentation for this
//! file format described case-insensitive names, but every lookup has always
//! compared bytes exactly, so exact matching is what existing stores rely on.

use std::fmt;

// ============================================================================
// Constants
// ============================================================================

/// Maximum length for user name (in bytes)
pub const USER_NAME_MAX_LENGTH: usize = 255;

// ============================================================================
// Error Types
// ============================================================================

/// Error returned when user name validation fails
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserNameError {
    /// User name is empty
    Empty,

    /// User name is too long (maximum: USER_NAME_MAX_LENGTH)
    TooLong { length: usize, max: usize },

    /// User name contains the record delimiter
    ContainsNewline,
}

impl fmt::Display for UserNameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "User name cannot be empty"),
            Self::TooLong { length, max } => {
                write!(f, "User name is too long ({length} bytes, maximum {max})")
            }
            Self::ContainsNewline => write!(f, "User name cannot contain a newline"),
        }
    }
}

impl std::error::Error for UserNameError {}

// ============================================================================
// UserName Value Object
// ============================================================================

/// Validated user name, compared byte-exactly
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct UserName(String);

impl UserName {
    /// Create a new UserName from raw input
    pub fn new(input: impl Into<String>) -> Result<Self, UserNameError> {
        let input = input.into();
        Self::validate(&input)?;
        Ok(Self(input))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    fn validate(input: &str) -> Result<(), UserNameError> {
        if input.is_empty() {
            return Err(UserNameError::Empty);
        }
        if input.len() > USER_NAME_MAX_LENGTH {
            return Err(UserNameError::TooLong {
                length: input.len(),
                max: USER_NAME_MAX_LENGTH,
            });
        }
        if input.contains('\n') {
            return Err(UserNameError::ContainsNewline);
        }
        Ok(())
    }
}

impl fmt::Display for UserName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for UserName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("UserName").field(&self.0).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_names() {
        assert!(UserName::new("alice").is_ok());
        assert!(UserName::new("Bob Smith").is_ok());
        assert!(UserName::new("ユーザー").is_ok());
    }

    #[test]
    fn test_empty_rejected() {
        assert_eq!(UserName::new("").unwrap_err(), UserNameError::Empty);
    }

    #[test]
    fn test_newline_rejected() {
        assert_eq!(
            UserName::new("al\nice").unwrap_err(),
            UserNameError::ContainsNewline
        );
    }

    #[test]
    fn test_too_long_rejected() {
        let name = "a".repeat(USER_NAME_MAX_LENGTH + 1);
        assert!(matches!(
            UserName::new(name),
            Err(UserNameError::TooLong { .. })
        ));
        assert!(UserName::new("a".repeat(USER_NAME_MAX_LENGTH)).is_ok());
    }

    #[test]
    fn test_no_normalization() {
        let name = UserName::new(" Alice ").unwrap();
        assert_eq!(name.as_str(), " Alice ");
        assert_ne!(UserName::new("Alice").unwrap(), UserName::new("alice").unwrap());
    }
}
