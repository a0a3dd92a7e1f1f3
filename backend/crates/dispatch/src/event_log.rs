//! Event Log
//!
//! Append-only audit trail of connection events, one `<timestamp> <message>`
//! line per event. Every line is flushed as it is written and mirrored to
//! `tracing`.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Local;

use crate::error::{DispatchError, DispatchResult};

/// ctime-style local timestamp, e.g. `Mon Mar  3 14:07:09 2025`
const TIMESTAMP_FORMAT: &str = "%a %b %e %H:%M:%S %Y";

pub struct EventLog {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
}

impl EventLog {
    /// Open `path` for append, creating it if needed
    pub fn open(path: impl Into<PathBuf>) -> DispatchResult<Self> {
        let path = path.into();
        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&path)
            .map_err(|source| DispatchError::EventLog {
                path: path.clone(),
                source,
            })?;

        Ok(Self {
            path,
            writer: Some(BufWriter::new(file)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one event line
    ///
    /// Write failures are reported through `tracing` and otherwise ignored.
    pub fn write(&mut self, message: &str) {
        let message: String = message.chars().filter(|&c| c != '\n' && c != '\r').collect();
        tracing::info!(target: "dispatch::event", "{message}");

        let Some(writer) = self.writer.as_mut() else {
            tracing::warn!(path = %self.path.display(), "Event log already closed");
            return;
        };

        let timestamp = Local::now().format(TIMESTAMP_FORMAT);
        let result = writeln!(writer, "{timestamp} {message}").and_then(|_| writer.flush());
        if let Err(e) = result {
            tracing::error!(path = %self.path.display(), error = %e, "Event log write failed");
        }
    }

    /// Flush and close; later writes only reach `tracing`
    pub fn close(&mut self) {
        let Some(mut writer) = self.writer.take() else {
            return;
        };
        if let Err(e) = writer.flush() {
            tracing::error!(path = %self.path.display(), error = %e, "Event log flush failed");
        }
    }
}

impl Drop for EventLog {
    fn drop(&mut self) {
        self.close();
    }
}
