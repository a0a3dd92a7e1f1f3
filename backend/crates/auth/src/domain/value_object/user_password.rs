//! User Password Value Object
//!
//! Policy applied to passwords that are about to be stored (new users and
//! password changes). Login attempts bypass this and go straight to
//! `platform::password::ClearTextPassword`, so a policy change never locks
//! out an existing user.
//!
//! ## Rules
//! - Not empty
//! - At most [`MAX_PASSWORD_LENGTH`] characters
//! - No control characters (the wire protocol is line based)

use platform::password::ClearTextPassword;
use std::fmt;

/// Maximum password length in characters
pub const MAX_PASSWORD_LENGTH: usize = 128;

/// Password policy violation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PasswordPolicyError {
    Empty,
    TooLong { max: usize, actual: usize },
    InvalidCharacter,
}

impl fmt::Display for PasswordPolicyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "Password cannot be empty"),
            Self::TooLong { max, actual } => {
                write!(f, "Password must be at most {max} characters (got {actual})")
            }
            Self::InvalidCharacter => write!(f, "Password contains invalid control characters"),
        }
    }
}

impl std::error::Error for PasswordPolicyError {}

/// Raw password that passed the storage policy
///
/// Memory is zeroized when dropped (via `ClearTextPassword`).
pub struct RawPassword(ClearTextPassword);

impl RawPassword {
    pub fn new(raw: impl Into<String>) -> Result<Self, PasswordPolicyError> {
        let raw = raw.into();
        let clear_text = ClearTextPassword::new(raw);

        let actual = clear_text.char_count();
        if actual == 0 {
            return Err(PasswordPolicyError::Empty);
        }
        if actual > MAX_PASSWORD_LENGTH {
            return Err(PasswordPolicyError::TooLong {
                max: MAX_PASSWORD_LENGTH,
                actual,
            });
        }
        if clear_text.as_bytes().iter().any(|b| b.is_ascii_control()) {
            return Err(PasswordPolicyError::InvalidCharacter);
        }

        Ok(Self(clear_text))
    }

    /// Access the inner ClearTextPassword
    pub fn inner(&self) -> &ClearTextPassword {
        &self.0
    }
}

impl fmt::Debug for RawPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RawPassword").field(&"[REDACTED]").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_password() {
        assert!(RawPassword::new("MySecure#Pass2024!").is_ok());
        assert!(RawPassword::new("パスワード").is_ok());
    }

    #[test]
    fn test_empty_password() {
        assert_eq!(RawPassword::new("").unwrap_err(), PasswordPolicyError::Empty);
    }

    #[test]
    fn test_too_long() {
        let long_password = "a".repeat(MAX_PASSWORD_LENGTH + 1);
        assert!(matches!(
            RawPassword::new(long_password),
            Err(PasswordPolicyError::TooLong { .. })
        ));
    }

    #[test]
    fn test_control_characters() {
        assert_eq!(
            RawPassword::new("abc\ndef").unwrap_err(),
            PasswordPolicyError::InvalidCharacter
        );
        assert_eq!(
            RawPassword::new("abc\x07def").unwrap_err(),
            PasswordPolicyError::InvalidCharacter
        );
    }

    #[test]
    fn test_debug_redaction() {
        let raw = RawPassword::new("hunter22").unwrap();
        let debug = format!("{:?}", raw);
        assert!(debug.contains("REDACTED"));
        assert!(!debug.contains("hunter22"));
    }
}
