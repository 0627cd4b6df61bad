//! SQLite schema definitions for the library database.
//!
//! A single database file holds the catalog (artists, albums, songs), the users
//! and their playlists, since playlist reads join through the songs table.

use crate::sqlite_column;
use crate::sqlite_persistence::schema_evolver::{ensure_column, ensure_table};
use crate::sqlite_persistence::{
    Column, ForeignKey, ForeignKeyOnChange, SqlType, Table, VersionedSchema, DEFAULT_TIMESTAMP,
};
use anyhow::Result;
use rusqlite::Connection;

// =============================================================================
// Catalog
// =============================================================================

const ARTIST_FOREIGN_KEY: ForeignKey = ForeignKey {
    foreign_table: "artists",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::Restrict,
};

const ALBUM_FOREIGN_KEY: ForeignKey = ForeignKey {
    foreign_table: "albums",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::Restrict,
};

pub const ARTISTS_TABLE: Table = Table {
    name: "artists",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("name", &SqlType::Text, non_null = true),
    ],
    indices: &[],
    unique_constraints: &[&["name"]],
};

pub const ALBUMS_TABLE: Table = Table {
    name: "albums",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("name", &SqlType::Text, non_null = true),
        sqlite_column!(
            "artist_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&ARTIST_FOREIGN_KEY)
        ),
    ],
    indices: &[("idx_albums_artist", "artist_id")],
    unique_constraints: &[&["name", "artist_id"]],
};

const SONG_COLUMNS_V_0: &[Column] = &[
    sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
    sqlite_column!("title", &SqlType::Text, non_null = true),
    sqlite_column!(
        "artist_id",
        &SqlType::Integer,
        non_null = true,
        foreign_key = Some(&ARTIST_FOREIGN_KEY)
    ),
    sqlite_column!(
        "album_id",
        &SqlType::Integer,
        non_null = true,
        foreign_key = Some(&ALBUM_FOREIGN_KEY)
    ),
    sqlite_column!(
        "duration_seconds",
        &SqlType::Integer,
        non_null = true,
        default_value = Some("0")
    ),
];

pub const SONGS_TABLE_V_0: Table = Table {
    name: "songs",
    columns: SONG_COLUMNS_V_0,
    indices: &[("idx_songs_artist", "artist_id"), ("idx_songs_album", "album_id")],
    unique_constraints: &[],
};

pub const SONG_AUDIO_FILE_PATH_COLUMN: Column = sqlite_column!("audio_file_path", &SqlType::Text);

/// Added in v1. Appended last, matching what ALTER TABLE produces.
pub const SONGS_TABLE_V_1: Table = Table {
    name: "songs",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("title", &SqlType::Text, non_null = true),
        sqlite_column!(
            "artist_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&ARTIST_FOREIGN_KEY)
        ),
        sqlite_column!(
            "album_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&ALBUM_FOREIGN_KEY)
        ),
        sqlite_column!(
            "duration_seconds",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("0")
        ),
        SONG_AUDIO_FILE_PATH_COLUMN,
    ],
    indices: &[("idx_songs_artist", "artist_id"), ("idx_songs_album", "album_id")],
    unique_constraints: &[],
};

// =============================================================================
// Users
// =============================================================================

pub const USER_PASSWORD_HASH_COLUMN: Column = sqlite_column!("password_hash", &SqlType::Text);

pub const USER_HASHER_COLUMN: Column = sqlite_column!(
    "hasher",
    &SqlType::Text,
    non_null = true,
    default_value = Some("'argon2'")
);

pub const USERS_TABLE: Table = Table {
    name: "users",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("username", &SqlType::Text, non_null = true),
        sqlite_column!("email", &SqlType::Text, non_null = true),
        USER_PASSWORD_HASH_COLUMN,
        USER_HASHER_COLUMN,
        sqlite_column!(
            "created_at",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[],
    unique_constraints: &[&["username"], &["email"]],
};

const USER_FOREIGN_KEY: ForeignKey = ForeignKey {
    foreign_table: "users",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::Cascade,
};

pub const AUTH_TOKENS_TABLE: Table = Table {
    name: "auth_tokens",
    columns: &[
        sqlite_column!("value", &SqlType::Text, is_primary_key = true),
        sqlite_column!(
            "user_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&USER_FOREIGN_KEY)
        ),
        sqlite_column!(
            "created_at",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
        sqlite_column!("last_used", &SqlType::Integer),
    ],
    indices: &[("idx_auth_tokens_user", "user_id")],
    unique_constraints: &[],
};

// =============================================================================
// Playlists
// =============================================================================

const PLAYLIST_FOREIGN_KEY: ForeignKey = ForeignKey {
    foreign_table: "playlists",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::Cascade,
};

const SONG_FOREIGN_KEY: ForeignKey = ForeignKey {
    foreign_table: "songs",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::Cascade,
};

pub const PLAYLISTS_TABLE: Table = Table {
    name: "playlists",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("name", &SqlType::Text, non_null = true),
        sqlite_column!("description", &SqlType::Text),
        sqlite_column!(
            "user_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&USER_FOREIGN_KEY)
        ),
        sqlite_column!(
            "created_at",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
        sqlite_column!(
            "updated_at",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[("idx_playlists_user", "user_id")],
    unique_constraints: &[],
};

pub const PLAYLIST_SONGS_TABLE: Table = Table {
    name: "playlist_songs",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!(
            "playlist_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&PLAYLIST_FOREIGN_KEY)
        ),
        sqlite_column!(
            "song_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&SONG_FOREIGN_KEY)
        ),
        sqlite_column!("position", &SqlType::Integer, non_null = true),
        sqlite_column!(
            "added_at",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[("idx_playlist_songs_playlist", "playlist_id")],
    unique_constraints: &[&["playlist_id", "song_id"]],
};

// =============================================================================
// Versions
// =============================================================================

fn migrate_v0_to_v1(conn: &Connection) -> Result<()> {
    ensure_column(conn, SONGS_TABLE_V_1.name, &SONG_AUDIO_FILE_PATH_COLUMN)?;
    Ok(())
}

fn migrate_v1_to_v2(conn: &Connection) -> Result<()> {
    ensure_table(conn, &PLAYLISTS_TABLE)?;
    ensure_table(conn, &PLAYLIST_SONGS_TABLE)?;
    Ok(())
}

fn migrate_v2_to_v3(conn: &Connection) -> Result<()> {
    ensure_table(conn, &AUTH_TOKENS_TABLE)?;
    Ok(())
}

pub const LIBRARY_VERSIONED_SCHEMAS: &[VersionedSchema] = &[
    VersionedSchema {
        version: 0,
        tables: &[ARTISTS_TABLE, ALBUMS_TABLE, SONGS_TABLE_V_0, USERS_TABLE],
        migration: None,
    },
    VersionedSchema {
        version: 1,
        tables: &[ARTISTS_TABLE, ALBUMS_TABLE, SONGS_TABLE_V_1, USERS_TABLE],
        migration: Some(migrate_v0_to_v1),
    },
    VersionedSchema {
        version: 2,
        tables: &[
            ARTISTS_TABLE,
            ALBUMS_TABLE,
            SONGS_TABLE_V_1,
            USERS_TABLE,
            PLAYLISTS_TABLE,
            PLAYLIST_SONGS_TABLE,
        ],
        migration: Some(migrate_v1_to_v2),
    },
    VersionedSchema {
        version: 3,
        tables: &[
            ARTISTS_TABLE,
            ALBUMS_TABLE,
            SONGS_TABLE_V_1,
            USERS_TABLE,
            PLAYLISTS_TABLE,
            PLAYLIST_SONGS_TABLE,
            AUTH_TOKENS_TABLE,
        ],
        migration: Some(migrate_v2_to_v3),
    },
];
