//! Application Layer
//!
//! Use cases and application services.

pub mod access_gate;
pub mod add_user;
pub mod change_password;
pub mod config;
pub mod login;

// Re-exports
pub use access_gate::AccessGate;
pub use add_user::{AddUserInput, AddUserOutput, AddUserUseCase};
pub use change_password::{ChangePasswordInput, ChangePasswordOutput, ChangePasswordUseCase};
pub use config::AuthConfig;
pub use login::{LoginState, LoginStateMachine, RejectReason};
