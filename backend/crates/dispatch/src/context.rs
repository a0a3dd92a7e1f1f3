//! Server Context
//!
//! Process-wide state handed to the dispatch loop at construction.

use std::sync::Arc;

use auth::{AccessGate, CredentialRepository, FileCredentialStore};

use crate::config::ServerConfig;
use crate::error::DispatchResult;
use crate::event_log::EventLog;

pub struct ServerContext<R> {
    pub config: ServerConfig,
    pub gate: AccessGate,
    pub repo: Arc<R>,
    pub event_log: EventLog,
}

impl<R> ServerContext<R>
where
    R: CredentialRepository,
{
    pub fn new(config: ServerConfig, repo: Arc<R>, event_log: EventLog) -> Self {
        let gate = config.auth.access_gate();
        Self {
            config,
            gate,
            repo,
            event_log,
        }
    }
}

impl ServerContext<FileCredentialStore> {
    /// Build the file-backed context described by `config`
    pub fn open(config: ServerConfig) -> DispatchResult<Self> {
        let event_log = EventLog::open(&config.log_file)?;
        let repo = Arc::new(config.auth.credential_store());
        tracing::info!(
            passwd = %repo.path().display(),
            whitelist = %config.auth.whitelist_file.display(),
            log = %event_log.path().display(),
            "Server context ready"
        );
        Ok(Self::new(config, repo, event_log))
    }
}
