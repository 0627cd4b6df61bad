use super::auth::{AuthToken, AuthTokenValue, LibraryHasher, UserCredentials};
use anyhow::Result;

pub trait UserAuthTokenStore: Send + Sync {
    /// Returns Ok(None) if the token does not exist.
    fn get_auth_token(&self, value: &AuthTokenValue) -> Result<Option<AuthToken>>;

    fn add_auth_token(&self, token: &AuthToken) -> Result<()>;

    /// Returns Ok(false) if the token did not exist.
    fn delete_auth_token(&self, value: &AuthTokenValue) -> Result<bool>;

    fn update_auth_token_last_used(&self, value: &AuthTokenValue) -> Result<()>;
}

pub trait UserStore: UserAuthTokenStore + Send + Sync {
    /// Creates a user and returns its id.
    /// Returns Ok(None) if the username or the email is already taken.
    fn create_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
        hasher: LibraryHasher,
    ) -> Result<Option<i64>>;

    fn is_username_taken(&self, username: &str) -> Result<bool>;

    fn is_email_taken(&self, email: &str) -> Result<bool>;

    /// Looks the user up by username first, then by email.
    fn get_user_credentials(&self, login: &str) -> Result<Option<UserCredentials>>;

    fn get_username(&self, user_id: i64) -> Result<Option<String>>;
}
