//! Dispatch (Connection Handling) Backend Module
//!
//! Structure:
//! - `listener` / `transport` - Non-blocking socket layer
//! - `connection` / `session` - Per-client login and command state
//! - `dispatch_loop` - Single-task accept/service loop
//! - `event_log` - Append-only audit log
//!
//! ## Concurrency Model
//! - One task, one thread: connections are serviced in turn, never in parallel
//! - The loop only suspends for the inter-tick sleep
//! - Every connection gets at most one input line per tick

pub mod config;
pub mod connection;
pub mod context;
pub mod dispatch_loop;
pub mod error;
pub mod event_log;
pub mod listener;
pub mod session;
pub mod shutdown;
pub mod transport;

// Re-exports for convenience
pub use config::ServerConfig;
pub use connection::Connection;
pub use context::ServerContext;
pub use dispatch_loop::DispatchLoop;
pub use error::{DispatchError, DispatchResult};
pub use event_log::EventLog;
pub use listener::{ConnectionSource, TcpConnectionSource};
pub use session::SessionEvent;
pub use shutdown::{Shutdown, ShutdownHandle};
pub use transport::{ConnectionTransport, TcpTransport};

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};
