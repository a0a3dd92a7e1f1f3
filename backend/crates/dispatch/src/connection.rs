//! Connection
//!
//! One client in the active set: its transport plus where it is in the
//! login handshake or the post-login session.

use std::sync::Arc;

use auth::{CredentialRepository, LoginState, LoginStateMachine};

use crate::session::{ActiveSession, SessionEvent};
use crate::transport::ConnectionTransport;

enum Session<R> {
    /// Not logging in; input is discarded
    Idle,
    Login(LoginStateMachine<R>),
    Active(ActiveSession),
}

pub struct Connection<T, R> {
    id: u64,
    transport: T,
    peer_ip: String,
    session: Session<R>,
}

impl<T, R> Connection<T, R>
where
    T: ConnectionTransport,
    R: CredentialRepository,
{
    pub fn new(id: u64, transport: T) -> Self {
        let peer_ip = transport.peer_ip().to_string();
        Self {
            id,
            transport,
            peer_ip,
            session: Session::Idle,
        }
    }

    /// Accept sequence number, unique for the life of the loop
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn peer_ip(&self) -> &str {
        &self.peer_ip
    }

    pub fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }

    pub fn send_text(&mut self, text: &str) {
        self.transport.send_text(text);
    }

    pub fn disconnect(&mut self) {
        self.transport.disconnect();
        self.session = Session::Idle;
    }

    /// Begin the login handshake and send the first prompt
    pub fn start_login(&mut self, repo: Arc<R>, max_attempts: u32) {
        let machine = LoginStateMachine::new(repo, max_attempts);
        for line in machine.start() {
            self.transport.send_text(line);
        }
        self.session = Session::Login(machine);
    }

    /// Pump the socket and handle at most one input line
    pub async fn service(&mut self, repo: &R) -> Option<SessionEvent> {
        if let Err(e) = self.transport.pump_io() {
            e.log();
            self.disconnect();
            return None;
        }

        let line = self.transport.next_line()?;

        match &mut self.session {
            Session::Idle => None,
            Session::Login(machine) => {
                for reply in machine.advance(&line).await {
                    self.transport.send_text(reply);
                }

                match machine.state().clone() {
                    LoginState::Unauthenticated { .. } => None,
                    LoginState::Authenticated => {
                        let user = machine.authenticated_user().cloned()?;
                        self.session = Session::Active(ActiveSession::new(user));
                        Some(SessionEvent::LoginSucceeded)
                    }
                    LoginState::Rejected(reason) => {
                        self.disconnect();
                        Some(SessionEvent::LoginRejected(reason))
                    }
                }
            }
            Session::Active(active) => {
                let reply = active.handle(&line, repo).await;
                for text in &reply.lines {
                    self.transport.send_text(text);
                }
                if reply.close {
                    self.disconnect();
                }
                reply.event
            }
        }
    }
}
