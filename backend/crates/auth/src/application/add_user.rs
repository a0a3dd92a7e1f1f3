//! Add User Use Case
//!
//! Creates a credential record for a new user. Adding a name that already
//! exists is not an error: the store is left as it was.

use std::sync::Arc;

use crate::domain::repository::CredentialRepository;
use crate::domain::value_object::{user_name::UserName, user_password::RawPassword};
use crate::error::{AuthError, AuthResult};

/// Add user input
pub struct AddUserInput {
    pub user_name: String,
    pub password: String,
}

/// Add user output
#[derive(Debug)]
pub struct AddUserOutput {
    /// `false` if the user already existed
    pub created: bool,
}

/// Add user use case
pub struct AddUserUseCase<R>
where
    R: CredentialRepository,
{
    repo: Arc<R>,
}

impl<R> AddUserUseCase<R>
where
    R: CredentialRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn execute(&self, input: AddUserInput) -> AuthResult<AddUserOutput> {
        let user_name = UserName::new(input.user_name)
            .map_err(|e| AuthError::InvalidUserName(e.to_string()))?;

        let raw_password = RawPassword::new(input.password)
            .map_err(|e| AuthError::PasswordValidation(e.to_string()))?;

        let created = self.repo.add_user(&user_name, &raw_password).await?;

        if created {
            tracing::info!(user_name = %user_name, "User created");
        } else {
            tracing::info!(user_name = %user_name, "User already exists");
        }

        Ok(AddUserOutput { created })
    }
}
