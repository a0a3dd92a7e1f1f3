//! Application Configuration
//!
//! Configuration for the Auth application layer.

use std::path::PathBuf;

use crate::application::access_gate::AccessGate;
use crate::infra::file_store::FileCredentialStore;

/// Auth application configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Credential store file
    pub passwd_file: PathBuf,
    /// IP allow-list file
    pub whitelist_file: PathBuf,
    /// Failed username/password pairs before the connection is dropped
    pub max_login_attempts: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            passwd_file: PathBuf::from("passwd"),
            whitelist_file: PathBuf::from("whitelist"),
            max_login_attempts: 3,
        }
    }
}

impl AuthConfig {
    /// Config for development and tests: both files under `dir`
    pub fn development(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        Self {
            passwd_file: dir.join("passwd"),
            whitelist_file: dir.join("whitelist"),
            ..Default::default()
        }
    }

    /// Credential store over `passwd_file`
    pub fn credential_store(&self) -> FileCredentialStore {
        FileCredentialStore::new(&self.passwd_file)
    }

    /// Access gate over `whitelist_file`
    pub fn access_gate(&self) -> AccessGate {
        AccessGate::new(&self.whitelist_file)
    }
}
