//! Repository Traits
//!
//! Interfaces for credential persistence. Implementation is in infrastructure layer.

use platform::password::ClearTextPassword;

use crate::domain::entity::credential_record::CredentialRecord;
use crate::domain::value_object::{user_name::UserName, user_password::RawPassword};
use crate::error::AuthResult;

/// Credential repository trait
///
/// Every method is a self-contained operation: nothing is cached between
/// calls and no lock is held across them.
#[trait_variant::make(CredentialRepository: Send)]
pub trait LocalCredentialRepository {
    /// Find the first record named `name` (scan primitive behind the rest)
    async fn lookup(&self, name: &UserName) -> AuthResult<Option<CredentialRecord>>;

    /// Check if a record named `name` exists
    async fn user_exists(&self, name: &UserName) -> AuthResult<bool>;

    /// Check `password` against the stored digest; false for unknown users
    async fn verify_password(&self, name: &UserName, password: &ClearTextPassword)
    -> AuthResult<bool>;

    /// Append a new user unless one already exists
    ///
    /// Returns `true` if a record was written.
    async fn add_user(&self, name: &UserName, password: &RawPassword) -> AuthResult<bool>;

    /// Replace the hash and salt of an existing user
    ///
    /// Returns `false`, leaving the store untouched, if the user is absent.
    async fn change_password(&self, name: &UserName, password: &RawPassword) -> AuthResult<bool>;
}
