mod connection_pool;
pub mod schema_evolver;
mod versioned_schema;

pub use connection_pool::{SqliteConnectionPool, DEFAULT_READ_POOL_SIZE};
pub use versioned_schema::{
    Column, ForeignKey, ForeignKeyOnChange, SqlType, Table, VersionedSchema, BASE_DB_VERSION,
    DEFAULT_TIMESTAMP,
};

/// True when `err` is SQLite rejecting a row because of a UNIQUE, NOT NULL,
/// CHECK or FOREIGN KEY constraint.
pub fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.code == rusqlite::ErrorCode::ConstraintViolation
    )
}
