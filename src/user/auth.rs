//! Session tokens and password hashing.

use anyhow::{bail, Result};
use rand::Rng;
use rand_distr::Alphanumeric;
use std::fmt;
use std::str::FromStr;

const AUTH_TOKEN_LENGTH: usize = 64;

#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct AuthTokenValue(pub String);

impl AuthTokenValue {
    pub fn generate() -> AuthTokenValue {
        let rng = rand::rng();
        let random_string: String = rng
            .sample_iter(&Alphanumeric)
            .take(AUTH_TOKEN_LENGTH)
            .map(char::from)
            .collect();
        AuthTokenValue(random_string)
    }
}

/// Timestamps are seconds since the unix epoch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthToken {
    pub value: AuthTokenValue,
    pub user_id: i64,
    pub created_at: i64,
    pub last_used: Option<i64>,
}

mod library_argon2 {
    use anyhow::{anyhow, Result};
    use argon2::{
        password_hash::{
            rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
        },
        Argon2,
    };

    /// The returned PHC string embeds the salt and the parameters.
    pub fn hash(plain: &[u8]) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        Ok(Argon2::default()
            .hash_password(plain, &salt)
            .map_err(|err| anyhow!("{}", err))?
            .to_string())
    }

    pub fn verify(plain: &[u8], target_hash: &str) -> Result<bool> {
        let password_hash = PasswordHash::new(target_hash).map_err(|err| anyhow!("{}", err))?;
        Ok(Argon2::default()
            .verify_password(plain, &password_hash)
            .is_ok())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum LibraryHasher {
    #[default]
    Argon2,
}

impl FromStr for LibraryHasher {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "argon2" => Ok(LibraryHasher::Argon2),
            _ => bail!("Unknown hasher {}", s),
        }
    }
}

impl fmt::Display for LibraryHasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LibraryHasher::Argon2 => write!(f, "argon2"),
        }
    }
}

impl LibraryHasher {
    pub fn hash(&self, plain: &str) -> Result<String> {
        match self {
            LibraryHasher::Argon2 => library_argon2::hash(plain.as_bytes()),
        }
    }

    pub fn verify(&self, plain: &str, target_hash: &str) -> Result<bool> {
        match self {
            LibraryHasher::Argon2 => library_argon2::verify(plain.as_bytes(), target_hash),
        }
    }
}

/// What is needed to check a login attempt.
#[derive(Clone, Debug)]
pub struct UserCredentials {
    pub user_id: i64,
    pub username: String,
    /// None for accounts created before passwords were stored.
    pub password_hash: Option<String>,
    pub hasher: LibraryHasher,
}
