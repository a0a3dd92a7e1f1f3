//! Server Configuration

use std::path::PathBuf;
use std::time::Duration;

use auth::AuthConfig;

/// Listener, loop and message settings for the login server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// IP literal to bind
    pub bind_addr: String,
    pub port: u16,
    /// Pending-connection queue length passed to `listen`
    pub backlog: u32,
    /// Sleep between dispatch ticks
    pub tick_interval: Duration,
    /// Event log file, opened for append
    pub log_file: PathBuf,
    /// Sent to an admitted client before the first prompt
    pub welcome_banner: String,
    /// Sent to a client whose IP is not on the allow-list
    pub rejection_message: String,
    pub auth: AuthConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1".to_string(),
            port: 9999,
            backlog: 5,
            tick_interval: Duration::from_millis(100),
            log_file: PathBuf::from("server.log"),
            welcome_banner: "Welcome to the login server".to_string(),
            rejection_message: "Connection refused".to_string(),
            auth: AuthConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Config for development and tests: every file under `dir`, ephemeral port
    pub fn development(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        Self {
            port: 0,
            tick_interval: Duration::from_millis(10),
            log_file: dir.join("server.log"),
            auth: AuthConfig::development(dir),
            ..Default::default()
        }
    }
}
