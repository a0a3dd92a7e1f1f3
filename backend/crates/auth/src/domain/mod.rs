//! Domain Layer
//!
//! Contains the credential record, value objects, and the repository trait.

pub mod entity;
pub mod repository;
pub mod value_object;

// Re-exports
pub use entity::credential_record::{CredentialRecord, LocatedRecord, RecordScanner};
pub use repository::{CredentialRepository, LocalCredentialRepository};
