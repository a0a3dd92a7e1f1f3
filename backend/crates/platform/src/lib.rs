//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations:
//! - Cryptographic utilities (OS randomness, constant-time comparison)
//! - Password hashing (Argon2i with fixed cost, raw digest + salt)

pub mod crypto;
pub mod password;
