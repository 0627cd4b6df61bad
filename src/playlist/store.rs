//! SQLite implementation of [`PlaylistStore`].

use super::models::{AddSongOutcome, Playlist, PlaylistEntry, PlaylistWithSongs};
use super::trait_def::PlaylistStore;
use crate::library::Song;
use crate::sqlite_persistence::{is_constraint_violation, SqliteConnectionPool, DEFAULT_TIMESTAMP};
use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::{debug, error};

const PLAYLIST_SELECT: &str = "SELECT p.id, p.name, p.description, p.user_id, p.created_at, p.updated_at, COUNT(ps.song_id)
     FROM playlists p
     LEFT JOIN playlist_songs ps ON ps.playlist_id = p.id";

const ENTRIES_SELECT: &str = "SELECT s.id, s.title, s.artist_id, COALESCE(ar.name, ''), s.album_id, COALESCE(al.name, ''), s.duration_seconds, s.audio_file_path, ps.position, ps.added_at
     FROM playlist_songs ps
     JOIN songs s ON s.id = ps.song_id
     LEFT JOIN artists ar ON ar.id = s.artist_id
     LEFT JOIN albums al ON al.id = s.album_id
     WHERE ps.playlist_id = ?1
     ORDER BY ps.position ASC, ps.added_at ASC, ps.rowid ASC";

fn parse_playlist_row(row: &Row) -> rusqlite::Result<Playlist> {
    Ok(Playlist {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        user_id: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
        song_count: row.get::<_, i64>(6)? as usize,
    })
}

fn parse_entry_row(row: &Row) -> rusqlite::Result<PlaylistEntry> {
    Ok(PlaylistEntry {
        song: Song {
            id: row.get(0)?,
            title: row.get(1)?,
            artist_id: row.get(2)?,
            artist_name: row.get(3)?,
            album_id: row.get(4)?,
            album_name: row.get(5)?,
            duration_seconds: row.get(6)?,
            audio_file_path: row.get(7)?,
        },
        position: row.get(8)?,
        added_at: row.get(9)?,
    })
}

fn owns_playlist(conn: &Connection, id: i64, owner_user_id: i64) -> Result<bool> {
    Ok(conn
        .prepare_cached("SELECT 1 FROM playlists WHERE id = ?1 AND user_id = ?2")?
        .query_row(params![id, owner_user_id], |_| Ok(()))
        .optional()?
        .is_some())
}

fn touch_playlist(conn: &Connection, id: i64) -> Result<()> {
    conn.execute(
        &format!(
            "UPDATE playlists SET updated_at = {} WHERE id = ?1",
            DEFAULT_TIMESTAMP
        ),
        params![id],
    )?;
    Ok(())
}

fn find_playlist(conn: &Connection, id: i64, owner_user_id: i64) -> Result<Option<Playlist>> {
    Ok(conn
        .prepare_cached(&format!(
            "{} WHERE p.id = ?1 AND p.user_id = ?2 GROUP BY p.id",
            PLAYLIST_SELECT
        ))?
        .query_row(params![id, owner_user_id], parse_playlist_row)
        .optional()?)
}

#[derive(Clone)]
pub struct SqlitePlaylistStore {
    db: SqliteConnectionPool,
}

impl SqlitePlaylistStore {
    pub fn new(db: SqliteConnectionPool) -> Self {
        SqlitePlaylistStore { db }
    }

    fn try_add_song_to_playlist(
        &self,
        id: i64,
        owner_user_id: i64,
        song_id: i64,
    ) -> Result<AddSongOutcome> {
        self.db.with_write_tx(|tx| {
            if !owns_playlist(tx, id, owner_user_id)? {
                return Ok(AddSongOutcome::PlaylistNotFound);
            }
            let song_exists = tx
                .query_row("SELECT 1 FROM songs WHERE id = ?1", params![song_id], |_| {
                    Ok(())
                })
                .optional()?
                .is_some();
            if !song_exists {
                return Ok(AddSongOutcome::SongNotFound);
            }
            let already_present = tx
                .query_row(
                    "SELECT 1 FROM playlist_songs WHERE playlist_id = ?1 AND song_id = ?2",
                    params![id, song_id],
                    |_| Ok(()),
                )
                .optional()?
                .is_some();
            if already_present {
                return Ok(AddSongOutcome::AlreadyPresent);
            }

            let position: i64 = tx.query_row(
                "SELECT COALESCE(MAX(position), 0) + 1 FROM playlist_songs WHERE playlist_id = ?1",
                params![id],
                |row| row.get(0),
            )?;
            match tx.execute(
                "INSERT INTO playlist_songs (playlist_id, song_id, position) VALUES (?1, ?2, ?3)",
                params![id, song_id, position],
            ) {
                Ok(_) => {}
                Err(err) if is_constraint_violation(&err) => {
                    return Ok(AddSongOutcome::AlreadyPresent)
                }
                Err(err) => return Err(err.into()),
            }
            touch_playlist(tx, id)?;
            Ok(AddSongOutcome::Added { position })
        })
    }
}

impl PlaylistStore for SqlitePlaylistStore {
    fn create_playlist(
        &self,
        name: &str,
        description: Option<&str>,
        owner_user_id: i64,
    ) -> Option<i64> {
        let result = self.db.with_write_tx(|tx| {
            tx.execute(
                "INSERT INTO playlists (name, description, user_id) VALUES (?1, ?2, ?3)",
                params![name, description, owner_user_id],
            )?;
            Ok(tx.last_insert_rowid())
        });
        match result {
            Ok(id) => {
                debug!("Created playlist {} for user {}", id, owner_user_id);
                Some(id)
            }
            Err(err) => {
                error!(
                    "Error creating playlist {} for user {}: {:#}",
                    name, owner_user_id, err
                );
                None
            }
        }
    }

    fn list_playlists(&self, owner_user_id: i64) -> Vec<Playlist> {
        let result = self.db.with_read(|conn| {
            let mut stmt = conn.prepare_cached(&format!(
                "{} WHERE p.user_id = ?1 GROUP BY p.id ORDER BY p.updated_at DESC, p.id DESC",
                PLAYLIST_SELECT
            ))?;
            let playlists = stmt
                .query_map(params![owner_user_id], parse_playlist_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(playlists)
        });
        result.unwrap_or_else(|err| {
            error!("Error listing playlists of user {}: {:#}", owner_user_id, err);
            vec![]
        })
    }

    fn get_playlist(&self, id: i64, owner_user_id: i64) -> Option<Playlist> {
        self.db
            .with_read(|conn| find_playlist(conn, id, owner_user_id))
            .unwrap_or_else(|err| {
                error!("Error getting playlist {}: {:#}", id, err);
                None
            })
    }

    fn update_playlist(
        &self,
        id: i64,
        owner_user_id: i64,
        name: &str,
        description: Option<&str>,
    ) -> bool {
        let result = self.db.with_write_tx(|tx| {
            Ok(tx.execute(
                &format!(
                    "UPDATE playlists SET name = ?1, description = ?2, updated_at = {} WHERE id = ?3 AND user_id = ?4",
                    DEFAULT_TIMESTAMP
                ),
                params![name, description, id, owner_user_id],
            )?)
        });
        match result {
            Ok(updated) => updated == 1,
            Err(err) => {
                error!("Error updating playlist {}: {:#}", id, err);
                false
            }
        }
    }

    fn delete_playlist(&self, id: i64, owner_user_id: i64) -> bool {
        let result = self.db.with_write_tx(|tx| {
            if !owns_playlist(tx, id, owner_user_id)? {
                return Ok(false);
            }
            // The foreign key cascades too, but databases evolved from older
            // schemas may not carry it.
            let removed = tx.execute(
                "DELETE FROM playlist_songs WHERE playlist_id = ?1",
                params![id],
            )?;
            debug!("Removed {} memberships of playlist {}", removed, id);
            Ok(tx.execute("DELETE FROM playlists WHERE id = ?1", params![id])? == 1)
        });
        result.unwrap_or_else(|err| {
            error!("Error deleting playlist {}: {:#}", id, err);
            false
        })
    }

    fn add_song_to_playlist(&self, id: i64, owner_user_id: i64, song_id: i64) -> AddSongOutcome {
        match self.try_add_song_to_playlist(id, owner_user_id, song_id) {
            Ok(outcome) => {
                debug!(
                    "Adding song {} to playlist {}: {:?}",
                    song_id, id, outcome
                );
                outcome
            }
            Err(err) => {
                error!(
                    "Error adding song {} to playlist {}: {:#}",
                    song_id, id, err
                );
                AddSongOutcome::Failed
            }
        }
    }

    fn remove_song_from_playlist(&self, id: i64, owner_user_id: i64, song_id: i64) -> bool {
        let result = self.db.with_write_tx(|tx| {
            if !owns_playlist(tx, id, owner_user_id)? {
                return Ok(false);
            }
            let removed = tx.execute(
                "DELETE FROM playlist_songs WHERE playlist_id = ?1 AND song_id = ?2",
                params![id, song_id],
            )?;
            if removed == 0 {
                return Ok(false);
            }
            touch_playlist(tx, id)?;
            Ok(true)
        });
        result.unwrap_or_else(|err| {
            error!(
                "Error removing song {} from playlist {}: {:#}",
                song_id, id, err
            );
            false
        })
    }

    fn get_playlist_with_songs(&self, id: i64, owner_user_id: i64) -> Option<PlaylistWithSongs> {
        let result = self.db.with_read(|conn| {
            let playlist = match find_playlist(conn, id, owner_user_id)? {
                Some(playlist) => playlist,
                None => return Ok(None),
            };
            let songs = conn
                .prepare_cached(ENTRIES_SELECT)?
                .query_map(params![id], parse_entry_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Some(PlaylistWithSongs { playlist, songs }))
        });
        result.unwrap_or_else(|err| {
            error!("Error getting songs of playlist {}: {:#}", id, err);
            None
        })
    }
}
