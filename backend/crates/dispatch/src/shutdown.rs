//! Shutdown Signal
//!
//! One-shot, clonable stop request for the dispatch loop.

use tokio::sync::watch;

/// Requests a shutdown
#[derive(Debug)]
pub struct ShutdownHandle(watch::Sender<bool>);

/// Observes a shutdown request
#[derive(Debug, Clone)]
pub struct Shutdown(watch::Receiver<bool>);

pub fn channel() -> (ShutdownHandle, Shutdown) {
    let (tx, rx) = watch::channel(false);
    (ShutdownHandle(tx), Shutdown(rx))
}

impl ShutdownHandle {
    pub fn trigger(&self) {
        // no receivers left means nothing is running
        let _ = self.0.send(true);
    }
}

impl Shutdown {
    pub fn is_triggered(&self) -> bool {
        *self.0.borrow()
    }

    /// Resolve once a shutdown has been requested or every handle is gone
    pub async fn wait(&mut self) {
        while !*self.0.borrow_and_update() {
            if self.0.changed().await.is_err() {
                return;
            }
        }
    }
}
