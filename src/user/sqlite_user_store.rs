use super::auth::{AuthToken, AuthTokenValue, LibraryHasher, UserCredentials};
use super::user_store::{UserAuthTokenStore, UserStore};
use crate::sqlite_persistence::{is_constraint_violation, SqliteConnectionPool, DEFAULT_TIMESTAMP};
use anyhow::{Context, Result};
use rusqlite::{params, OptionalExtension};
use tracing::{debug, warn};

/// Users and their session tokens, stored in the library database.
#[derive(Clone)]
pub struct SqliteUserStore {
    db: SqliteConnectionPool,
}

impl SqliteUserStore {
    pub fn new(db: SqliteConnectionPool) -> Self {
        SqliteUserStore { db }
    }
}

impl UserStore for SqliteUserStore {
    fn create_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
        hasher: LibraryHasher,
    ) -> Result<Option<i64>> {
        self.db.with_write_tx(|tx| {
            match tx.execute(
                "INSERT INTO users (username, email, password_hash, hasher) VALUES (?1, ?2, ?3, ?4)",
                params![username, email, password_hash, hasher.to_string()],
            ) {
                Ok(_) => {
                    let user_id = tx.last_insert_rowid();
                    debug!("Created user {} with id {}", username, user_id);
                    Ok(Some(user_id))
                }
                Err(err) if is_constraint_violation(&err) => {
                    debug!("Could not create user {}: {}", username, err);
                    Ok(None)
                }
                Err(err) => Err(err).with_context(|| format!("Failed to create user {}", username)),
            }
        })
    }

    fn is_username_taken(&self, username: &str) -> Result<bool> {
        self.db.with_read(|conn| {
            Ok(conn
                .prepare_cached("SELECT 1 FROM users WHERE username = ?1")?
                .query_row(params![username], |_| Ok(()))
                .optional()?
                .is_some())
        })
    }

    fn is_email_taken(&self, email: &str) -> Result<bool> {
        self.db.with_read(|conn| {
            Ok(conn
                .prepare_cached("SELECT 1 FROM users WHERE email = ?1")?
                .query_row(params![email], |_| Ok(()))
                .optional()?
                .is_some())
        })
    }

    fn get_user_credentials(&self, login: &str) -> Result<Option<UserCredentials>> {
        let row = self.db.with_read(|conn| {
            Ok(conn
                .prepare_cached(
                    "SELECT id, username, password_hash, hasher FROM users
                     WHERE username = ?1 OR email = ?1
                     ORDER BY CASE WHEN username = ?1 THEN 0 ELSE 1 END
                     LIMIT 1",
                )?
                .query_row(params![login], |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, Option<String>>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                })
                .optional()?)
        })?;

        let (user_id, username, password_hash, hasher) = match row {
            Some(row) => row,
            None => return Ok(None),
        };
        let hasher = hasher.parse::<LibraryHasher>().unwrap_or_else(|err| {
            warn!("User {} has an unusable hasher: {}", user_id, err);
            LibraryHasher::default()
        });
        Ok(Some(UserCredentials {
            user_id,
            username,
            password_hash,
            hasher,
        }))
    }

    fn get_username(&self, user_id: i64) -> Result<Option<String>> {
        self.db.with_read(|conn| {
            Ok(conn
                .prepare_cached("SELECT username FROM users WHERE id = ?1")?
                .query_row(params![user_id], |row| row.get(0))
                .optional()?)
        })
    }
}

impl UserAuthTokenStore for SqliteUserStore {
    fn get_auth_token(&self, value: &AuthTokenValue) -> Result<Option<AuthToken>> {
        self.db.with_read(|conn| {
            Ok(conn
                .prepare_cached(
                    "SELECT value, user_id, created_at, last_used FROM auth_tokens WHERE value = ?1",
                )?
                .query_row(params![value.0], |row| {
                    Ok(AuthToken {
                        value: AuthTokenValue(row.get(0)?),
                        user_id: row.get(1)?,
                        created_at: row.get(2)?,
                        last_used: row.get(3)?,
                    })
                })
                .optional()?)
        })
    }

    fn add_auth_token(&self, token: &AuthToken) -> Result<()> {
        self.db.with_write_tx(|tx| {
            tx.execute(
                "INSERT INTO auth_tokens (value, user_id, created_at) VALUES (?1, ?2, ?3)",
                params![token.value.0, token.user_id, token.created_at],
            )
            .with_context(|| format!("Failed to add auth token of user {}", token.user_id))?;
            Ok(())
        })
    }

    fn delete_auth_token(&self, value: &AuthTokenValue) -> Result<bool> {
        self.db.with_write_tx(|tx| {
            Ok(tx.execute(
                "DELETE FROM auth_tokens WHERE value = ?1",
                params![value.0],
            )? == 1)
        })
    }

    fn update_auth_token_last_used(&self, value: &AuthTokenValue) -> Result<()> {
        self.db.with_write_tx(|tx| {
            tx.execute(
                &format!(
                    "UPDATE auth_tokens SET last_used = {} WHERE value = ?1",
                    DEFAULT_TIMESTAMP
                ),
                params![value.0],
            )?;
            Ok(())
        })
    }
}
