//! Access Control Gate
//!
//! Source-IP allow-list. The file is the only source of truth: it is read
//! again on every call, so edits take effect for the next connection.
//! Matching is exact string equality per line (no subnets, no wildcards).

use std::path::{Path, PathBuf};

use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};

/// IP allow-list backed by a newline-delimited file
#[derive(Debug, Clone)]
pub struct AccessGate {
    whitelist_path: PathBuf,
}

impl AccessGate {
    pub fn new(whitelist_path: impl Into<PathBuf>) -> Self {
        Self {
            whitelist_path: whitelist_path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.whitelist_path
    }

    /// Check `ip` against the allow-list
    ///
    /// A missing or unreadable allow-list admits nobody.
    pub async fn authorize(&self, ip: &str) -> bool {
        let file = match File::open(&self.whitelist_path).await {
            Ok(file) => file,
            Err(e) => {
                tracing::warn!(
                    path = %self.whitelist_path.display(),
                    error = %e,
                    "Allow-list unavailable, denying connection"
                );
                return false;
            }
        };

        let mut lines = BufReader::new(file).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) if line == ip => return true,
                Ok(Some(_)) => continue,
                Ok(None) => return false,
                Err(e) => {
                    tracing::warn!(
                        path = %self.whitelist_path.display(),
                        error = %e,
                        "Allow-list read failed, denying connection"
                    );
                    return false;
                }
            }
        }
    }
}
