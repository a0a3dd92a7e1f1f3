//! Post-login Session
//!
//! Commands available to an authenticated connection. One input line is
//! handled per call, like the login handshake.

use auth::CredentialRepository;
use auth::RejectReason;
use auth::models::{user_name::UserName, user_password::RawPassword};
use platform::crypto::constant_time_eq;

pub const MENU: &str = "Commands: hello, menu, passwd, exit";
pub const NEW_PASSWORD_PROMPT: &str = "New password:";
pub const CONFIRM_PASSWORD_PROMPT: &str = "Confirm password:";
pub const PASSWORD_MISMATCH: &str = "Passwords do not match, password unchanged";
pub const PASSWORD_CHANGED: &str = "Password changed";
pub const PASSWORD_CHANGE_FAILED: &str = "Password change failed";
pub const GOODBYE: &str = "Goodbye";
pub const UNRECOGNIZED_COMMAND: &str = "Unrecognized command";

/// Something the dispatch loop writes to the event log
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    LoginSucceeded,
    LoginRejected(RejectReason),
    PasswordChanged(UserName),
}

/// Result of handling one line
#[derive(Debug, Default)]
pub struct Reply {
    pub lines: Vec<String>,
    pub event: Option<SessionEvent>,
    /// Close the connection after sending `lines`
    pub close: bool,
}

impl Reply {
    fn line(text: impl Into<String>) -> Self {
        Self {
            lines: vec![text.into()],
            ..Default::default()
        }
    }
}

enum PasswordChange {
    AwaitingNew,
    AwaitingConfirm(RawPassword),
}

/// Command state of an authenticated connection
pub struct ActiveSession {
    user: UserName,
    password_change: Option<PasswordChange>,
}

impl ActiveSession {
    pub fn new(user: UserName) -> Self {
        Self {
            user,
            password_change: None,
        }
    }

    pub async fn handle<R>(&mut self, line: &str, repo: &R) -> Reply
    where
        R: CredentialRepository,
    {
        match self.password_change.take() {
            Some(PasswordChange::AwaitingNew) => self.new_password(line),
            Some(PasswordChange::AwaitingConfirm(first)) => {
                self.confirm_password(first, line, repo).await
            }
            None => self.command(line),
        }
    }

    fn command(&mut self, line: &str) -> Reply {
        match line.trim() {
            "" => Reply::default(),
            "hello" => Reply::line(format!("Hello, {}!", self.user)),
            "menu" => Reply::line(MENU),
            "passwd" => {
                self.password_change = Some(PasswordChange::AwaitingNew);
                Reply::line(NEW_PASSWORD_PROMPT)
            }
            "exit" => Reply {
                close: true,
                ..Reply::line(GOODBYE)
            },
            _ => Reply::line(UNRECOGNIZED_COMMAND),
        }
    }

    fn new_password(&mut self, line: &str) -> Reply {
        match RawPassword::new(line) {
            Ok(password) => {
                self.password_change = Some(PasswordChange::AwaitingConfirm(password));
                Reply::line(CONFIRM_PASSWORD_PROMPT)
            }
            Err(e) => Reply::line(format!("Password rejected: {e}")),
        }
    }

    async fn confirm_password<R>(&mut self, first: RawPassword, line: &str, repo: &R) -> Reply
    where
        R: CredentialRepository,
    {
        if !constant_time_eq(first.inner().as_bytes(), line.as_bytes()) {
            return Reply::line(PASSWORD_MISMATCH);
        }

        match repo.change_password(&self.user, &first).await {
            Ok(true) => Reply {
                event: Some(SessionEvent::PasswordChanged(self.user.clone())),
                ..Reply::line(PASSWORD_CHANGED)
            },
            Ok(false) => {
                tracing::warn!(user = %self.user, "Logged-in user no longer in credential store");
                Reply::line(PASSWORD_CHANGE_FAILED)
            }
            Err(e) => {
                e.log();
                Reply::line(PASSWORD_CHANGE_FAILED)
            }
        }
    }
}
