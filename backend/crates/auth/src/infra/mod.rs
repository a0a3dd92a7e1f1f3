//! Infrastructure Layer
//!
//! File-backed storage implementations.

pub mod file_store;

pub use file_store::FileCredentialStore;
