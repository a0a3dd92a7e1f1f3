//! Auth (Authentication) Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Credential records, value objects, repository trait
//! - `application/` - Access gate, login state machine, account use cases
//! - `infra/` - File-backed credential store
//!
//! ## Features
//! - Username + password login against a flat credential file
//! - Source-IP allow-list, re-read on every check
//! - Idempotent user creation and crash-safe password change
//!
//! ## Security Model
//! - Passwords hashed with Argon2i (time 2, memory 64 MiB, parallelism 1)
//! - Salts drawn from the OS CSPRNG
//! - Constant-time digest comparison
//! - Login failures never tell the client whether the user exists

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;

// Re-exports for convenience
pub use application::access_gate::AccessGate;
pub use application::add_user::{AddUserInput, AddUserOutput, AddUserUseCase};
pub use application::change_password::{
    ChangePasswordInput, ChangePasswordOutput, ChangePasswordUseCase,
};
pub use application::config::AuthConfig;
pub use application::login::{LoginState, LoginStateMachine, RejectReason};
pub use domain::repository::{CredentialRepository, LocalCredentialRepository};
pub use error::{AuthError, AuthResult};
pub use infra::file_store::FileCredentialStore;

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

pub mod models {
    pub use crate::domain::entity::*;
    pub use crate::domain::value_object::*;
}
