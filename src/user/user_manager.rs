use super::auth::{AuthToken, AuthTokenValue, LibraryHasher};
use super::user_store::UserStore;
use anyhow::Result;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tracing::{debug, info, warn};

pub const MIN_PASSWORD_LENGTH: usize = 6;

#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("Invalid input. {0}")]
    InvalidInput(String),
    #[error("Username already exists")]
    UsernameTaken,
    #[error("Email already registered")]
    EmailTaken,
    #[error("Registration failed: {0:#}")]
    Storage(#[from] anyhow::Error),
}

#[derive(Debug, Error)]
pub enum LoginError {
    #[error("Invalid username or password")]
    InvalidCredentials,
    #[error("Login failed: {0:#}")]
    Storage(#[from] anyhow::Error),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: i64,
    pub username: String,
}

#[derive(Clone, Debug)]
pub struct LoginSession {
    pub user: AuthenticatedUser,
    pub token: AuthTokenValue,
}

fn now_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}

/// Registration, login and session token resolution on top of a [`UserStore`].
pub struct UserManager {
    user_store: Arc<dyn UserStore>,
}

impl UserManager {
    pub fn new(user_store: Arc<dyn UserStore>) -> Self {
        Self { user_store }
    }

    pub fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthenticatedUser, RegistrationError> {
        let username = username.trim();
        let email = email.trim();
        if username.is_empty() || email.is_empty() || password.is_empty() {
            return Err(RegistrationError::InvalidInput(
                "Username, email and password are required.".to_string(),
            ));
        }
        if password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(RegistrationError::InvalidInput(format!(
                "Password must be at least {} characters.",
                MIN_PASSWORD_LENGTH
            )));
        }
        self.ensure_available(username, email)?;

        let hasher = LibraryHasher::default();
        let password_hash = hasher.hash(password)?;
        match self
            .user_store
            .create_user(username, email, &password_hash, hasher)?
        {
            Some(user_id) => {
                info!("Registered user {} with id {}", username, user_id);
                Ok(AuthenticatedUser {
                    user_id,
                    username: username.to_string(),
                })
            }
            None => {
                // Someone else took the username or email since the check above.
                self.ensure_available(username, email)?;
                Err(RegistrationError::UsernameTaken)
            }
        }
    }

    fn ensure_available(&self, username: &str, email: &str) -> Result<(), RegistrationError> {
        if self.user_store.is_username_taken(username)? {
            return Err(RegistrationError::UsernameTaken);
        }
        if self.user_store.is_email_taken(email)? {
            return Err(RegistrationError::EmailTaken);
        }
        Ok(())
    }

    /// `login` is either the username or the email.
    pub fn login(&self, login: &str, password: &str) -> Result<LoginSession, LoginError> {
        let credentials = self
            .user_store
            .get_user_credentials(login.trim())?
            .ok_or(LoginError::InvalidCredentials)?;
        let password_hash = match &credentials.password_hash {
            Some(hash) => hash,
            None => {
                warn!("User {} has no password set", credentials.user_id);
                return Err(LoginError::InvalidCredentials);
            }
        };
        if !credentials.hasher.verify(password, password_hash)? {
            debug!("Wrong password for user {}", credentials.user_id);
            return Err(LoginError::InvalidCredentials);
        }

        let token = AuthToken {
            value: AuthTokenValue::generate(),
            user_id: credentials.user_id,
            created_at: now_secs(),
            last_used: None,
        };
        self.user_store.add_auth_token(&token)?;
        info!("User {} logged in", credentials.username);
        Ok(LoginSession {
            user: AuthenticatedUser {
                user_id: credentials.user_id,
                username: credentials.username,
            },
            token: token.value,
        })
    }

    /// Returns false if the token was not known.
    pub fn logout(&self, token: &AuthTokenValue) -> Result<bool> {
        self.user_store.delete_auth_token(token)
    }

    pub fn resolve_token(&self, token: &AuthTokenValue) -> Result<Option<AuthenticatedUser>> {
        let token = match self.user_store.get_auth_token(token)? {
            Some(token) => token,
            None => return Ok(None),
        };
        if let Err(err) = self.user_store.update_auth_token_last_used(&token.value) {
            warn!("Could not update auth token usage: {:#}", err);
        }
        self.resolve_user_id(token.user_id)
    }

    pub fn resolve_user_id(&self, user_id: i64) -> Result<Option<AuthenticatedUser>> {
        Ok(self
            .user_store
            .get_username(user_id)?
            .map(|username| AuthenticatedUser { user_id, username }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library_db::open_library_db;
    use crate::user::SqliteUserStore;
    use tempfile::TempDir;

    fn create_tmp_manager() -> (UserManager, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db = open_library_db(temp_dir.path().join("library.db")).unwrap();
        (
            UserManager::new(Arc::new(SqliteUserStore::new(db))),
            temp_dir,
        )
    }

    #[test]
    fn registers_and_logs_in() {
        let (manager, _temp_dir) = create_tmp_manager();
        let user = manager
            .register("alice", "alice@example.com", "secret1")
            .unwrap();
        assert_eq!(user.username, "alice");

        let session = manager.login("alice", "secret1").unwrap();
        assert_eq!(session.user, user);
        assert_eq!(manager.resolve_token(&session.token).unwrap(), Some(user.clone()));

        let by_email = manager.login("alice@example.com", "secret1").unwrap();
        assert_ne!(by_email.token, session.token);

        assert!(manager.logout(&session.token).unwrap());
        assert_eq!(manager.resolve_token(&session.token).unwrap(), None);
        assert_eq!(manager.resolve_token(&by_email.token).unwrap(), Some(user));
    }

    #[test]
    fn validates_registration_input() {
        let (manager, _temp_dir) = create_tmp_manager();
        for (username, email, password) in [
            ("", "a@example.com", "secret1"),
            ("alice", "  ", "secret1"),
            ("alice", "a@example.com", ""),
            ("alice", "a@example.com", "short"),
        ] {
            assert!(matches!(
                manager.register(username, email, password),
                Err(RegistrationError::InvalidInput(_))
            ));
        }
    }

    #[test]
    fn rejects_taken_username_and_email() {
        let (manager, _temp_dir) = create_tmp_manager();
        manager
            .register("alice", "alice@example.com", "secret1")
            .unwrap();

        assert!(matches!(
            manager.register("alice", "new@example.com", "secret1"),
            Err(RegistrationError::UsernameTaken)
        ));
        assert!(matches!(
            manager.register("bob", "alice@example.com", "secret1"),
            Err(RegistrationError::EmailTaken)
        ));
    }

    #[test]
    fn rejects_bad_credentials() {
        let (manager, _temp_dir) = create_tmp_manager();
        manager
            .register("alice", "alice@example.com", "secret1")
            .unwrap();

        assert!(matches!(
            manager.login("alice", "wrong-password"),
            Err(LoginError::InvalidCredentials)
        ));
        assert!(matches!(
            manager.login("nobody", "secret1"),
            Err(LoginError::InvalidCredentials)
        ));
        assert_eq!(
            manager
                .resolve_token(&AuthTokenValue("not-a-token".to_string()))
                .unwrap(),
            None
        );
    }
}
