//! Change Password Use Case
//!
//! Replaces the hash and salt of an existing user with a fresh pair.

use std::sync::Arc;

use crate::domain::repository::CredentialRepository;
use crate::domain::value_object::{user_name::UserName, user_password::RawPassword};
use crate::error::{AuthError, AuthResult};

/// Change password input
pub struct ChangePasswordInput {
    pub user_name: String,
    pub new_password: String,
}

/// Change password output
#[derive(Debug)]
pub struct ChangePasswordOutput {
    /// `false` if no such user exists
    pub changed: bool,
}

/// Change password use case
pub struct ChangePasswordUseCase<R>
where
    R: CredentialRepository,
{
    repo: Arc<R>,
}

impl<R> ChangePasswordUseCase<R>
where
    R: CredentialRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn execute(&self, input: ChangePasswordInput) -> AuthResult<ChangePasswordOutput> {
        let user_name = UserName::new(input.user_name)
            .map_err(|e| AuthError::InvalidUserName(e.to_string()))?;

        let raw_password = RawPassword::new(input.new_password)
            .map_err(|e| AuthError::PasswordValidation(e.to_string()))?;

        let changed = self.repo.change_password(&user_name, &raw_password).await?;

        if changed {
            tracing::info!(user_name = %user_name, "Password changed");
        } else {
            tracing::warn!(user_name = %user_name, "Password change requested for unknown user");
        }

        Ok(ChangePasswordOutput { changed })
    }
}
