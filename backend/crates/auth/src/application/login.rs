//! Login State Machine
//!
//! Per-connection username/password handshake. The machine consumes one
//! input line per [`LoginStateMachine::advance`] call, so the caller can
//! interleave many logins without any of them blocking the others.
//!
//! ```text
//! Unauthenticated{attempts} --correct pair--> Authenticated
//!          |
//!          +--wrong pair, attempts+1 == max--> Rejected(reason)
//! ```
//!
//! Every attempt asks for a username and then a password, whether or not the
//! username exists. The client sees the same replies either way; only
//! [`RejectReason`] tells the two apart, for the server log.

use std::sync::Arc;

use kernel::error::kind::ErrorKind;
use platform::password::ClearTextPassword;

use crate::domain::repository::CredentialRepository;
use crate::domain::value_object::user_name::UserName;
use crate::error::AuthResult;

pub const USERNAME_PROMPT: &str = "Username:";
pub const PASSWORD_PROMPT: &str = "Password:";
pub const INVALID_CREDENTIALS: &str = "Invalid credentials";
pub const TOO_MANY_ATTEMPTS: &str = "Too many failed attempts, goodbye";
pub const LOGIN_SUCCESSFUL: &str = "Login successful";
pub const SERVICE_UNAVAILABLE: &str = "Login unavailable, try again later";

/// Why a login ended in `Rejected`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// At least one attempt named an existing user
    PasswordAttemptsExhausted,
    /// No attempt named an existing user
    UnknownUser,
    /// The credential store failed mid-login
    StoreFailure(ErrorKind),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginState {
    Unauthenticated { attempts: u32 },
    Authenticated,
    Rejected(RejectReason),
}

/// What the next input line is for
enum Stage {
    AwaitingUsername,
    /// `None` when the submitted name could never be stored (empty, too long)
    AwaitingPassword { username: Option<UserName> },
}

/// Login handshake for one connection
pub struct LoginStateMachine<R> {
    repo: Arc<R>,
    max_attempts: u32,
    state: LoginState,
    stage: Stage,
    known_user_seen: bool,
    user: Option<UserName>,
}

impl<R> LoginStateMachine<R>
where
    R: CredentialRepository,
{
    pub fn new(repo: Arc<R>, max_attempts: u32) -> Self {
        Self {
            repo,
            max_attempts: max_attempts.max(1),
            state: LoginState::Unauthenticated { attempts: 0 },
            stage: Stage::AwaitingUsername,
            known_user_seen: false,
            user: None,
        }
    }

    /// Lines to send when the handshake begins
    pub fn start(&self) -> Vec<&'static str> {
        vec![USERNAME_PROMPT]
    }

    pub fn state(&self) -> &LoginState {
        &self.state
    }

    pub fn is_finished(&self) -> bool {
        !matches!(self.state, LoginState::Unauthenticated { .. })
    }

    /// The logged-in user, once `Authenticated`
    pub fn authenticated_user(&self) -> Option<&UserName> {
        match self.state {
            LoginState::Authenticated => self.user.as_ref(),
            _ => None,
        }
    }

    /// Feed one input line; returns the lines to send back
    ///
    /// Does nothing once the machine has reached a terminal state.
    pub async fn advance(&mut self, line: &str) -> Vec<&'static str> {
        let LoginState::Unauthenticated { attempts } = self.state else {
            return Vec::new();
        };

        match std::mem::replace(&mut self.stage, Stage::AwaitingUsername) {
            Stage::AwaitingUsername => {
                self.stage = Stage::AwaitingPassword {
                    username: UserName::new(line).ok(),
                };
                vec![PASSWORD_PROMPT]
            }
            Stage::AwaitingPassword { username } => {
                let password = ClearTextPassword::new(line);
                let verdict = self.check(username.as_ref(), &password).await;
                match verdict {
                    Ok(true) => {
                        self.state = LoginState::Authenticated;
                        self.user = username;
                        vec![LOGIN_SUCCESSFUL]
                    }
                    Ok(false) => self.record_failure(attempts),
                    Err(e) => {
                        e.log();
                        self.state = LoginState::Rejected(RejectReason::StoreFailure(e.kind()));
                        vec![SERVICE_UNAVAILABLE]
                    }
                }
            }
        }
    }

    async fn check(
        &mut self,
        username: Option<&UserName>,
        password: &ClearTextPassword,
    ) -> AuthResult<bool> {
        let Some(username) = username else {
            burn_hash(password);
            return Ok(false);
        };
        if !self.repo.user_exists(username).await? {
            burn_hash(password);
            return Ok(false);
        }
        self.known_user_seen = true;
        self.repo.verify_password(username, password).await
    }

    fn record_failure(&mut self, attempts: u32) -> Vec<&'static str> {
        let attempts = attempts + 1;
        if attempts >= self.max_attempts {
            let reason = if self.known_user_seen {
                RejectReason::PasswordAttemptsExhausted
            } else {
                RejectReason::UnknownUser
            };
            self.state = LoginState::Rejected(reason);
            vec![INVALID_CREDENTIALS, TOO_MANY_ATTEMPTS]
        } else {
            self.state = LoginState::Unauthenticated { attempts };
            vec![INVALID_CREDENTIALS, USERNAME_PROMPT]
        }
    }
}

/// Spend one hash so an unknown user costs the same time as a wrong password
fn burn_hash(password: &ClearTextPassword) {
    let _ = password.hash(None);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::credential_record::CredentialRecord;
    use crate::domain::value_object::user_password::RawPassword;
    use crate::error::AuthError;
    use std::collections::HashMap;
    use std::path::PathBuf;

    /// Plain-text repository so state machine tests skip the real hash
    struct MemoryRepository {
        users: HashMap<String, Vec<u8>>,
        broken: bool,
    }

    impl MemoryRepository {
        fn with_user(name: &str, password: &str) -> Self {
            let mut users = HashMap::new();
            users.insert(name.to_string(), password.as_bytes().to_vec());
            Self {
                users,
                broken: false,
            }
        }

        fn fail(&self) -> AuthResult<()> {
            if self.broken {
                return Err(AuthError::StoreOpen {
                    path: PathBuf::from("passwd"),
                    source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
                });
            }
            Ok(())
        }
    }

    impl CredentialRepository for MemoryRepository {
        async fn lookup(&self, _name: &UserName) -> AuthResult<Option<CredentialRecord>> {
            self.fail()?;
            Ok(None)
        }

        async fn user_exists(&self, name: &UserName) -> AuthResult<bool> {
            self.fail()?;
            Ok(self.users.contains_key(name.as_str()))
        }

        async fn verify_password(
            &self,
            name: &UserName,
            password: &ClearTextPassword,
        ) -> AuthResult<bool> {
            self.fail()?;
            Ok(self
                .users
                .get(name.as_str())
                .is_some_and(|stored| stored == password.as_bytes()))
        }

        async fn add_user(&self, _name: &UserName, _password: &RawPassword) -> AuthResult<bool> {
            Ok(false)
        }

        async fn change_password(
            &self,
            _name: &UserName,
            _password: &RawPassword,
        ) -> AuthResult<bool> {
            Ok(false)
        }
    }

    fn machine(repo: MemoryRepository) -> LoginStateMachine<MemoryRepository> {
        LoginStateMachine::new(Arc::new(repo), 3)
    }

    async fn attempt(
        machine: &mut LoginStateMachine<MemoryRepository>,
        user: &str,
        password: &str,
    ) -> Vec<&'static str> {
        assert_eq!(machine.advance(user).await, vec![PASSWORD_PROMPT]);
        machine.advance(password).await
    }

    #[tokio::test]
    async fn test_success_first_try() {
        let mut m = machine(MemoryRepository::with_user("alice", "secret"));
        assert_eq!(m.start(), vec![USERNAME_PROMPT]);

        let replies = attempt(&mut m, "alice", "secret").await;
        assert_eq!(replies, vec![LOGIN_SUCCESSFUL]);
        assert_eq!(m.state(), &LoginState::Authenticated);
        assert_eq!(m.authenticated_user().unwrap().as_str(), "alice");
        assert!(m.is_finished());
    }

    #[tokio::test]
    async fn test_success_after_failure() {
        let mut m = machine(MemoryRepository::with_user("alice", "secret"));

        let replies = attempt(&mut m, "alice", "nope").await;
        assert_eq!(replies, vec![INVALID_CREDENTIALS, USERNAME_PROMPT]);
        assert_eq!(m.state(), &LoginState::Unauthenticated { attempts: 1 });
        assert!(m.authenticated_user().is_none());

        let replies = attempt(&mut m, "alice", "secret").await;
        assert_eq!(replies, vec![LOGIN_SUCCESSFUL]);
    }

    #[tokio::test]
    async fn test_known_user_exhausts_attempts() {
        let mut m = machine(MemoryRepository::with_user("alice", "secret"));

        attempt(&mut m, "alice", "one").await;
        attempt(&mut m, "alice", "two").await;
        assert_eq!(m.state(), &LoginState::Unauthenticated { attempts: 2 });

        let replies = attempt(&mut m, "alice", "three").await;
        assert_eq!(replies, vec![INVALID_CREDENTIALS, TOO_MANY_ATTEMPTS]);
        assert_eq!(
            m.state(),
            &LoginState::Rejected(RejectReason::PasswordAttemptsExhausted)
        );
    }

    #[tokio::test]
    async fn test_unknown_user_gets_identical_replies() {
        let mut known = machine(MemoryRepository::with_user("alice", "secret"));
        let mut unknown = machine(MemoryRepository::with_user("alice", "secret"));

        for _ in 0..3 {
            let a = attempt(&mut known, "alice", "wrong").await;
            let b = attempt(&mut unknown, "mallory", "wrong").await;
            assert_eq!(a, b);
        }
        assert_eq!(
            unknown.state(),
            &LoginState::Rejected(RejectReason::UnknownUser)
        );
    }

    #[tokio::test]
    async fn test_any_known_attempt_counts_as_password_failure() {
        let mut m = machine(MemoryRepository::with_user("alice", "secret"));

        attempt(&mut m, "mallory", "x").await;
        attempt(&mut m, "alice", "x").await;
        attempt(&mut m, "mallory", "x").await;
        assert_eq!(
            m.state(),
            &LoginState::Rejected(RejectReason::PasswordAttemptsExhausted)
        );
    }

    #[tokio::test]
    async fn test_empty_username_is_a_failed_attempt() {
        let mut m = machine(MemoryRepository::with_user("alice", "secret"));
        let replies = attempt(&mut m, "", "secret").await;
        assert_eq!(replies, vec![INVALID_CREDENTIALS, USERNAME_PROMPT]);
    }

    #[tokio::test]
    async fn test_usernames_are_case_sensitive() {
        let mut m = machine(MemoryRepository::with_user("alice", "secret"));
        let replies = attempt(&mut m, "Alice", "secret").await;
        assert_eq!(replies, vec![INVALID_CREDENTIALS, USERNAME_PROMPT]);
    }

    #[tokio::test]
    async fn test_store_failure_rejects() {
        let mut repo = MemoryRepository::with_user("alice", "secret");
        repo.broken = true;
        let mut m = machine(repo);

        let replies = attempt(&mut m, "alice", "secret").await;
        assert_eq!(replies, vec![SERVICE_UNAVAILABLE]);
        assert_eq!(
            m.state(),
            &LoginState::Rejected(RejectReason::StoreFailure(ErrorKind::StoreOpen))
        );
    }

    #[tokio::test]
    async fn test_terminal_state_ignores_input() {
        let mut m = machine(MemoryRepository::with_user("alice", "secret"));
        attempt(&mut m, "alice", "secret").await;
        assert!(m.advance("anything").await.is_empty());
        assert_eq!(m.state(), &LoginState::Authenticated);
    }

    #[tokio::test]
    async fn test_single_attempt_limit() {
        let mut m = LoginStateMachine::new(
            Arc::new(MemoryRepository::with_user("alice", "secret")),
            1,
        );
        let replies = attempt(&mut m, "alice", "wrong").await;
        assert_eq!(replies, vec![INVALID_CREDENTIALS, TOO_MANY_ATTEMPTS]);
        assert!(m.is_finished());
    }
}
