//! Opening the library database and bringing its schema up to date.

mod schema;

pub use schema::LIBRARY_VERSIONED_SCHEMAS;

use crate::sqlite_column;
use crate::sqlite_persistence::schema_evolver::{ensure_column, ensure_table};
use crate::sqlite_persistence::{
    Column, SqlType, SqliteConnectionPool, BASE_DB_VERSION, DEFAULT_READ_POOL_SIZE,
};
use anyhow::{bail, Context, Result};
use rusqlite::Connection;
use schema::*;
use std::path::Path;
use tracing::{info, warn};

/// Playlists created before ownership existed belong to the first user.
const LEGACY_PLAYLIST_USER_ID_COLUMN: Column = sqlite_column!(
    "user_id",
    &SqlType::Integer,
    non_null = true,
    default_value = Some("1")
);
const LEGACY_PLAYLIST_CREATED_AT_COLUMN: Column = sqlite_column!(
    "created_at",
    &SqlType::Integer,
    non_null = true,
    default_value = Some("0")
);
const LEGACY_PLAYLIST_UPDATED_AT_COLUMN: Column = sqlite_column!(
    "updated_at",
    &SqlType::Integer,
    non_null = true,
    default_value = Some("0")
);
const LEGACY_MEMBERSHIP_POSITION_COLUMN: Column = sqlite_column!(
    "position",
    &SqlType::Integer,
    non_null = true,
    default_value = Some("0")
);
const LEGACY_MEMBERSHIP_ADDED_AT_COLUMN: Column = sqlite_column!(
    "added_at",
    &SqlType::Integer,
    non_null = true,
    default_value = Some("0")
);

fn ensure_catalog_tables(conn: &Connection) -> Result<()> {
    ensure_table(conn, &ARTISTS_TABLE)?;
    ensure_table(conn, &ALBUMS_TABLE)?;
    ensure_table(conn, &SONGS_TABLE_V_1)?;
    Ok(())
}

fn ensure_song_audio_file_path(conn: &Connection) -> Result<()> {
    ensure_column(conn, SONGS_TABLE_V_1.name, &SONG_AUDIO_FILE_PATH_COLUMN)?;
    Ok(())
}

fn ensure_users_table(conn: &Connection) -> Result<()> {
    ensure_table(conn, &USERS_TABLE)?;
    ensure_column(conn, USERS_TABLE.name, &USER_PASSWORD_HASH_COLUMN)?;
    ensure_column(conn, USERS_TABLE.name, &USER_HASHER_COLUMN)?;
    Ok(())
}

fn ensure_playlist_base_schema(conn: &Connection) -> Result<()> {
    ensure_table(conn, &PLAYLISTS_TABLE)?;
    ensure_column(conn, PLAYLISTS_TABLE.name, &LEGACY_PLAYLIST_CREATED_AT_COLUMN)?;
    ensure_column(conn, PLAYLISTS_TABLE.name, &LEGACY_PLAYLIST_UPDATED_AT_COLUMN)?;
    Ok(())
}

fn ensure_playlist_user_id(conn: &Connection) -> Result<()> {
    ensure_column(conn, PLAYLISTS_TABLE.name, &LEGACY_PLAYLIST_USER_ID_COLUMN)?;
    Ok(())
}

fn ensure_playlist_songs_table(conn: &Connection) -> Result<()> {
    ensure_table(conn, &PLAYLIST_SONGS_TABLE)?;
    ensure_column(conn, PLAYLIST_SONGS_TABLE.name, &LEGACY_MEMBERSHIP_POSITION_COLUMN)?;
    ensure_column(conn, PLAYLIST_SONGS_TABLE.name, &LEGACY_MEMBERSHIP_ADDED_AT_COLUMN)?;
    Ok(())
}

fn ensure_auth_tokens_table(conn: &Connection) -> Result<()> {
    ensure_table(conn, &AUTH_TOKENS_TABLE)?;
    Ok(())
}

type EvolutionStep = (&'static str, fn(&Connection) -> Result<()>);

/// Steps applied to databases this server did not create. Prerequisite tables come
/// first so later foreign keys can be satisfied.
const LEGACY_EVOLUTION_STEPS: &[EvolutionStep] = &[
    ("ensure catalog tables", ensure_catalog_tables),
    ("ensure songs.audio_file_path column", ensure_song_audio_file_path),
    ("ensure users table", ensure_users_table),
    ("ensure playlist base schema", ensure_playlist_base_schema),
    ("ensure playlists.user_id column", ensure_playlist_user_id),
    ("ensure playlist membership table", ensure_playlist_songs_table),
    ("ensure auth tokens table", ensure_auth_tokens_table),
];

/// Runs every legacy step, logging failures and moving on. Returns the number of
/// steps that failed.
fn evolve_legacy_schema(conn: &Connection) -> usize {
    let mut failures = 0;
    for (description, step) in LEGACY_EVOLUTION_STEPS {
        match step(conn) {
            Ok(()) => info!("Schema evolution: {} ok", description),
            Err(err) => {
                failures += 1;
                warn!("Schema evolution: {} failed: {:#}", description, err);
            }
        }
    }
    failures
}

fn migrate_if_needed(conn: &mut Connection, version: usize) -> Result<()> {
    let tx = conn.transaction()?;
    let mut latest_from = version;
    for schema in LIBRARY_VERSIONED_SCHEMAS.iter().skip(version + 1) {
        if let Some(migration_fn) = schema.migration {
            info!(
                "Migrating library db from version {} to {}",
                latest_from, schema.version
            );
            migration_fn(&tx)?;
            latest_from = schema.version;
        }
    }
    tx.pragma_update(None, "user_version", BASE_DB_VERSION + latest_from)?;
    tx.commit()?;
    Ok(())
}

fn count_tables(conn: &Connection) -> Result<i64> {
    Ok(conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table'",
        [],
        |row| row.get(0),
    )?)
}

/// Opens (or creates) the library database at `db_path`, brings its schema to the
/// latest version and returns the connection pool every store is built on.
pub fn open_library_db<P: AsRef<Path>>(db_path: P) -> Result<SqliteConnectionPool> {
    let db_path = db_path.as_ref();
    let mut conn = Connection::open(db_path)
        .with_context(|| format!("Failed to open library db at {:?}", db_path))?;
    conn.execute("PRAGMA foreign_keys = ON;", [])?;

    let latest = LIBRARY_VERSIONED_SCHEMAS
        .last()
        .context("No library schema defined")?;

    if count_tables(&conn)? == 0 {
        info!(
            "Creating library db at {:?} with schema version {}",
            db_path, latest.version
        );
        latest.create(&conn)?;
    } else {
        let user_version: i64 = conn
            .query_row("PRAGMA user_version;", [], |row| row.get(0))
            .context("Failed to read database version")?;

        if user_version < BASE_DB_VERSION as i64 {
            warn!(
                "Library db at {:?} was not created by this server (user_version {}), evolving it in place",
                db_path, user_version
            );
            let failures = evolve_legacy_schema(&conn);
            if failures > 0 {
                warn!(
                    "{} schema evolution step(s) failed, some features may be unavailable",
                    failures
                );
            }
        } else {
            let version = (user_version - BASE_DB_VERSION as i64) as usize;
            if version > latest.version {
                bail!("Library db version {} is too new", version);
            }
            LIBRARY_VERSIONED_SCHEMAS
                .get(version)
                .context("Failed to get schema")?
                .validate(&conn)?;
            migrate_if_needed(&mut conn, version)?;
        }
    }

    SqliteConnectionPool::new(db_path, conn, DEFAULT_READ_POOL_SIZE)
}
