//! Password Hashing and Verification
//!
//! The hashing engine behind the credential store:
//! - Argon2i (memory-hard) with fixed cost parameters
//! - Raw 32-byte digest and 16-byte salt, no PHC string
//! - Salts drawn from the OS CSPRNG
//! - Zeroization of clear text passwords
//! - Constant-time digest comparison
//!
//! ## Cost Parameters
//! Time cost 2, memory cost 64 MiB, parallelism 1. The store file records
//! neither algorithm nor parameters, so these must never change for an
//! existing store.
//!
//! ## Salt Source
//! Salts come from [`rand::rngs::OsRng`]. A generator seeded from the wall
//! clock makes salts predictable and lets two users created in the same
//! second share a salt, so it is never used here.

use std::fmt;

use argon2::{Algorithm, Argon2, Params, Version};
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::crypto::{constant_time_eq, random_array};

// ============================================================================
// Constants
// ============================================================================

/// Digest length in bytes
pub const HASH_LEN: usize = 32;

/// Salt length in bytes
pub const SALT_LEN: usize = 16;

/// Argon2 iterations
const TIME_COST: u32 = 2;

/// Argon2 memory in KiB (64 MiB)
const MEMORY_COST_KIB: u32 = 1 << 16;

/// Argon2 lanes
const PARALLELISM: u32 = 1;

// ============================================================================
// Error Types
// ============================================================================

/// Password hashing errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PasswordHashError {
    /// Caller-supplied salt is not exactly [`SALT_LEN`] bytes
    #[error("Invalid salt length: expected {expected} bytes (got {actual})")]
    InvalidSalt { expected: usize, actual: usize },

    /// Hashing operation failed
    #[error("Password hashing failed: {0}")]
    HashingFailed(String),
}

// ============================================================================
// Clear Text Password (Zeroized on drop)
// ============================================================================

/// Clear text password with automatic memory zeroization
///
/// ## Security
/// - Implements `Zeroize` and `ZeroizeOnDrop`
/// - Does not implement `Clone` to prevent accidental copies
/// - Debug output is redacted
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct ClearTextPassword(String);

impl ClearTextPassword {
    /// Wrap a password exactly as received; bytes are hashed unmodified
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Get the password as bytes for hashing
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// Number of characters (for policy checks)
    pub fn char_count(&self) -> usize {
        self.0.chars().count()
    }

    /// Hash with a fresh random salt, or with `salt` when given
    pub fn hash(&self, salt: Option<&[u8]>) -> Result<(PasswordDigest, Salt), PasswordHashError> {
        hash_argon2(self.as_bytes(), salt)
    }

    /// Recompute the digest with `salt` and compare against `expected`
    pub fn verify(&self, expected: &PasswordDigest, salt: &Salt) -> Result<bool, PasswordHashError> {
        let (digest, _) = hash_argon2(self.as_bytes(), Some(salt.as_bytes()))?;
        Ok(digest.matches(expected))
    }
}

impl fmt::Debug for ClearTextPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ClearTextPassword")
            .field(&"[REDACTED]")
            .finish()
    }
}

// ============================================================================
// Digest and Salt
// ============================================================================

/// Raw Argon2 output
#[derive(Clone)]
pub struct PasswordDigest([u8; HASH_LEN]);

impl PasswordDigest {
    pub fn from_bytes(bytes: [u8; HASH_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; HASH_LEN] {
        &self.0
    }

    /// Constant-time equality
    pub fn matches(&self, other: &PasswordDigest) -> bool {
        constant_time_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for PasswordDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PasswordDigest").field(&"[HASH]").finish()
    }
}

/// Per-record salt
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Salt([u8; SALT_LEN]);

impl Salt {
    /// Draw a new salt from the OS CSPRNG
    pub fn generate() -> Self {
        Self(random_array())
    }

    pub fn from_bytes(bytes: [u8; SALT_LEN]) -> Self {
        Self(bytes)
    }

    /// Accepts exactly [`SALT_LEN`] bytes; never truncates or pads
    pub fn from_slice(bytes: &[u8]) -> Result<Self, PasswordHashError> {
        let array: [u8; SALT_LEN] =
            bytes
                .try_into()
                .map_err(|_| PasswordHashError::InvalidSalt {
                    expected: SALT_LEN,
                    actual: bytes.len(),
                })?;
        Ok(Self(array))
    }

    pub fn as_bytes(&self) -> &[u8; SALT_LEN] {
        &self.0
    }
}

impl fmt::Debug for Salt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Salt(")?;
        for b in self.0 {
            write!(f, "{:02x}", b)?;
        }
        write!(f, ")")
    }
}

// ============================================================================
// Hashing Engine
// ============================================================================

/// Hash `password` with Argon2i at the fixed cost
///
/// ## Arguments
/// * `password` - Raw password bytes
/// * `salt` - `None` to generate a fresh salt, otherwise exactly 16 bytes
///
/// ## Returns
/// The 32-byte digest together with the salt that produced it.
/// Deterministic for a fixed (password, salt) pair.
pub fn hash_argon2(
    password: &[u8],
    salt: Option<&[u8]>,
) -> Result<(PasswordDigest, Salt), PasswordHashError> {
    let salt = match salt {
        Some(bytes) => Salt::from_slice(bytes)?,
        None => Salt::generate(),
    };

    let params = Params::new(MEMORY_COST_KIB, TIME_COST, PARALLELISM, Some(HASH_LEN))
        .map_err(|e| PasswordHashError::HashingFailed(e.to_string()))?;
    let argon2 = Argon2::new(Algorithm::Argon2i, Version::V0x13, params);

    let mut out = [0u8; HASH_LEN];
    argon2
        .hash_password_into(password, salt.as_bytes(), &mut out)
        .map_err(|e| PasswordHashError::HashingFailed(e.to_string()))?;

    Ok((PasswordDigest(out), salt))
}

// ============================================================================
// Tests
// ============================================================================
