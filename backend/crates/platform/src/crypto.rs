//! Cryptographic Utilities

use rand::{RngCore, rngs::OsRng};

/// Fill a fixed-size buffer from the OS CSPRNG
pub fn random_array<const N: usize>() -> [u8; N] {
    let mut bytes = [0u8; N];
    OsRng.fill_bytes(&mut bytes);
    bytes
}

/// Constant-time comparison to prevent timing attacks
///
/// Runs over every byte regardless of where the first difference is.
/// Only the length check short-circuits, and lengths are not secret here.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}
