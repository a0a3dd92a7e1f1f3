//! Dispatch Loop
//!
//! Single-task cooperative server loop. Each tick:
//! 1. accept at most one pending connection and run it through the gate
//! 2. walk the active set once, in insertion order, dropping closed
//!    connections and handing each live one at most one input line
//! 3. sleep for the tick interval, or stop if shutdown was requested
//!
//! No connection ever holds the loop: a login or command only advances when
//! its client has sent a full line. Hashing still runs inline and delays
//! the tick by its cost.

use auth::{CredentialRepository, RejectReason};

use crate::connection::Connection;
use crate::context::ServerContext;
use crate::listener::ConnectionSource;
use crate::session::SessionEvent;
use crate::shutdown::Shutdown;

pub struct DispatchLoop<S, R>
where
    S: ConnectionSource,
{
    source: S,
    ctx: ServerContext<R>,
    connections: Vec<Connection<S::Transport, R>>,
    next_id: u64,
}

impl<S, R> DispatchLoop<S, R>
where
    S: ConnectionSource,
    R: CredentialRepository,
{
    pub fn new(source: S, ctx: ServerContext<R>) -> Self {
        Self {
            source,
            ctx,
            connections: Vec::new(),
            next_id: 0,
        }
    }

    /// Connections currently in the active set
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    pub fn context(&self) -> &ServerContext<R> {
        &self.ctx
    }

    /// Run ticks until `shutdown` fires
    ///
    /// Dropping the loop afterwards closes the listener and every remaining
    /// connection without draining them.
    pub async fn run(mut self, mut shutdown: Shutdown) {
        self.ctx.event_log.write("server started");

        while !shutdown.is_triggered() {
            self.tick().await;

            tokio::select! {
                _ = tokio::time::sleep(self.ctx.config.tick_interval) => {}
                _ = shutdown.wait() => break,
            }
        }

        self.ctx.event_log.write("server stopped");
        self.ctx.event_log.close();
    }

    /// One accept check plus one pass over the active set
    pub async fn tick(&mut self) {
        match self.source.try_accept().await {
            Ok(Some(transport)) => {
                self.next_id += 1;
                self.admit(Connection::new(self.next_id, transport)).await;
            }
            Ok(None) => {}
            Err(e) => e.log(),
        }

        self.service_connections().await;
    }

    async fn admit(&mut self, mut conn: Connection<S::Transport, R>) {
        let ip = conn.peer_ip().to_string();
        tracing::debug!(conn = conn.id(), peer = %ip, "New connection");

        if self.ctx.gate.authorize(&ip).await {
            conn.send_text(&self.ctx.config.welcome_banner);
            self.ctx
                .event_log
                .write(&format!("authorized connection from {ip}"));
            conn.start_login(self.ctx.repo.clone(), self.ctx.config.auth.max_login_attempts);
        } else {
            conn.send_text(&self.ctx.config.rejection_message);
            conn.disconnect();
            self.ctx
                .event_log
                .write(&format!("unauthorized connection from {ip}"));
        }

        self.connections.push(conn);
    }

    async fn service_connections(&mut self) {
        let mut i = 0;
        while i < self.connections.len() {
            if !self.connections[i].is_connected() {
                let conn = self.connections.remove(i);
                tracing::debug!(conn = conn.id(), "Removing closed connection");
                self.ctx
                    .event_log
                    .write(&format!("disconnected {}", conn.peer_ip()));
                continue;
            }

            let conn = &mut self.connections[i];
            if let Some(event) = conn.service(&self.ctx.repo).await {
                let message = event_message(&event, conn.peer_ip());
                self.ctx.event_log.write(&message);
            }
            i += 1;
        }
    }
}

fn event_message(event: &SessionEvent, ip: &str) -> String {
    match event {
        SessionEvent::LoginSucceeded => format!("login successful for {ip}"),
        SessionEvent::LoginRejected(RejectReason::PasswordAttemptsExhausted) => {
            format!("password attempts exhausted for {ip}")
        }
        SessionEvent::LoginRejected(RejectReason::UnknownUser) => {
            format!("unrecognized user from {ip}")
        }
        SessionEvent::LoginRejected(RejectReason::StoreFailure(kind)) => {
            format!("login unavailable for {ip} ({kind})")
        }
        SessionEvent::PasswordChanged(user) => {
            format!("password changed for {user} from {ip}")
        }
    }
}
