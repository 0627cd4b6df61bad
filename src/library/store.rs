//! SQLite implementation of [`LibraryStore`].

use super::models::{Album, Artist, NewSong, Song};
use super::trait_def::LibraryStore;
use crate::sqlite_persistence::{is_constraint_violation, SqliteConnectionPool};
use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::{debug, error};

const SONG_SELECT: &str = "SELECT s.id, s.title, s.artist_id, COALESCE(ar.name, ''), s.album_id, COALESCE(al.name, ''), s.duration_seconds, s.audio_file_path
     FROM songs s
     LEFT JOIN artists ar ON ar.id = s.artist_id
     LEFT JOIN albums al ON al.id = s.album_id";

const TITLE_ORDER: &str = "ORDER BY s.title COLLATE NOCASE, s.id";

fn parse_song_row(row: &Row) -> rusqlite::Result<Song> {
    Ok(Song {
        id: row.get(0)?,
        title: row.get(1)?,
        artist_id: row.get(2)?,
        artist_name: row.get(3)?,
        album_id: row.get(4)?,
        album_name: row.get(5)?,
        duration_seconds: row.get(6)?,
        audio_file_path: row.get(7)?,
    })
}

fn find_artist_id(conn: &Connection, name: &str) -> Result<Option<i64>> {
    Ok(conn
        .prepare_cached("SELECT id FROM artists WHERE name = ?1")?
        .query_row(params![name], |row| row.get(0))
        .optional()?)
}

fn find_album_id(conn: &Connection, name: &str, artist_id: i64) -> Result<Option<i64>> {
    Ok(conn
        .prepare_cached("SELECT id FROM albums WHERE name = ?1 AND artist_id = ?2")?
        .query_row(params![name, artist_id], |row| row.get(0))
        .optional()?)
}

/// Lookup, then insert. Must run inside a write transaction: the transaction
/// serializes callers of this process, the constraint check covers other writers.
fn resolve_artist_in(conn: &Connection, name: &str) -> Result<i64> {
    if let Some(id) = find_artist_id(conn, name)? {
        return Ok(id);
    }
    match conn.execute("INSERT INTO artists (name) VALUES (?1)", params![name]) {
        Ok(_) => {
            let id = conn.last_insert_rowid();
            debug!("Created artist {} with id {}", name, id);
            Ok(id)
        }
        Err(err) if is_constraint_violation(&err) => find_artist_id(conn, name)?
            .with_context(|| format!("Artist {} vanished after insert conflict", name)),
        Err(err) => Err(err.into()),
    }
}

fn resolve_album_in(conn: &Connection, name: &str, artist_id: i64) -> Result<i64> {
    if let Some(id) = find_album_id(conn, name, artist_id)? {
        return Ok(id);
    }
    match conn.execute(
        "INSERT INTO albums (name, artist_id) VALUES (?1, ?2)",
        params![name, artist_id],
    ) {
        Ok(_) => {
            let id = conn.last_insert_rowid();
            debug!(
                "Created album {} for artist {} with id {}",
                name, artist_id, id
            );
            Ok(id)
        }
        Err(err) if is_constraint_violation(&err) => find_album_id(conn, name, artist_id)?
            .with_context(|| format!("Album {} vanished after insert conflict", name)),
        Err(err) => Err(err.into()),
    }
}

#[derive(Clone)]
pub struct SqliteLibraryStore {
    db: SqliteConnectionPool,
}

impl SqliteLibraryStore {
    pub fn new(db: SqliteConnectionPool) -> Self {
        SqliteLibraryStore { db }
    }

    fn try_add_song(&self, song: &NewSong) -> Result<Option<i64>> {
        self.db.with_write_tx(|tx| {
            let artist_id = resolve_artist_in(tx, &song.artist_name)?;
            let album_id = resolve_album_in(tx, &song.album_name, artist_id)?;
            let inserted = tx.execute(
                "INSERT INTO songs (title, artist_id, album_id, duration_seconds, audio_file_path)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    song.title,
                    artist_id,
                    album_id,
                    song.duration_seconds,
                    song.audio_file_path
                ],
            )?;
            if inserted != 1 {
                return Ok(None);
            }
            Ok(Some(tx.last_insert_rowid()))
        })
    }

    fn query_songs(&self, sql_tail: &str) -> Result<Vec<Song>> {
        self.db.with_read(|conn| {
            let mut stmt = conn.prepare_cached(&format!("{} {}", SONG_SELECT, sql_tail))?;
            let songs = stmt
                .query_map([], parse_song_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(songs)
        })
    }

    fn count(&self, table: &str) -> usize {
        let result = self.db.with_read(|conn| {
            let count: i64 =
                conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
                    row.get(0)
                })?;
            Ok(count as usize)
        });
        result.unwrap_or_else(|err| {
            error!("Failed to count {}: {:#}", table, err);
            0
        })
    }
}

impl LibraryStore for SqliteLibraryStore {
    fn resolve_artist(&self, name: &str) -> Option<i64> {
        match self.db.with_write_tx(|tx| resolve_artist_in(tx, name)) {
            Ok(id) => Some(id),
            Err(err) => {
                error!("Error resolving artist {}: {:#}", name, err);
                None
            }
        }
    }

    fn resolve_album(&self, name: &str, artist_id: i64) -> Option<i64> {
        match self
            .db
            .with_write_tx(|tx| resolve_album_in(tx, name, artist_id))
        {
            Ok(id) => Some(id),
            Err(err) => {
                error!(
                    "Error resolving album {} for artist {}: {:#}",
                    name, artist_id, err
                );
                None
            }
        }
    }

    fn add_song(&self, song: &NewSong) -> Option<i64> {
        match self.try_add_song(song) {
            Ok(Some(id)) => {
                debug!("Added song {} with id {}", song.title, id);
                Some(id)
            }
            Ok(None) => None,
            Err(err) => {
                error!("Error adding song {}: {:#}", song.title, err);
                None
            }
        }
    }

    fn get_song(&self, id: i64) -> Option<Song> {
        let result = self.db.with_read(|conn| {
            Ok(conn
                .prepare_cached(&format!("{} WHERE s.id = ?1", SONG_SELECT))?
                .query_row(params![id], parse_song_row)
                .optional()?)
        });
        result.unwrap_or_else(|err| {
            error!("Error getting song {}: {:#}", id, err);
            None
        })
    }

    fn list_songs(&self) -> Vec<Song> {
        self.query_songs(TITLE_ORDER)
            .unwrap_or_else(|err| {
                error!("Error listing songs: {:#}", err);
                vec![]
            })
    }

    fn search_songs_by_title(&self, fragment: &str) -> Vec<Song> {
        // SQLite's LOWER only folds ASCII, so the match happens here.
        let fragment = fragment.to_lowercase();
        match self.query_songs(TITLE_ORDER) {
            Ok(songs) => songs
                .into_iter()
                .filter(|song| song.title.to_lowercase().contains(&fragment))
                .collect(),
            Err(err) => {
                error!("Error searching songs by '{}': {:#}", fragment, err);
                vec![]
            }
        }
    }

    fn delete_song(&self, id: i64) -> bool {
        let result = self.db.with_write_tx(|tx| {
            tx.execute("DELETE FROM playlist_songs WHERE song_id = ?1", params![id])?;
            Ok(tx.execute("DELETE FROM songs WHERE id = ?1", params![id])?)
        });
        match result {
            Ok(deleted) => deleted == 1,
            Err(err) => {
                error!("Error deleting song {}: {:#}", id, err);
                false
            }
        }
    }

    fn get_artist(&self, id: i64) -> Option<Artist> {
        let result = self.db.with_read(|conn| {
            Ok(conn
                .query_row(
                    "SELECT id, name FROM artists WHERE id = ?1",
                    params![id],
                    |row| {
                        Ok(Artist {
                            id: row.get(0)?,
                            name: row.get(1)?,
                        })
                    },
                )
                .optional()?)
        });
        result.unwrap_or_else(|err| {
            error!("Error getting artist {}: {:#}", id, err);
            None
        })
    }

    fn get_album(&self, id: i64) -> Option<Album> {
        let result = self.db.with_read(|conn| {
            Ok(conn
                .query_row(
                    "SELECT id, name, artist_id FROM albums WHERE id = ?1",
                    params![id],
                    |row| {
                        Ok(Album {
                            id: row.get(0)?,
                            name: row.get(1)?,
                            artist_id: row.get(2)?,
                        })
                    },
                )
                .optional()?)
        });
        result.unwrap_or_else(|err| {
            error!("Error getting album {}: {:#}", id, err);
            None
        })
    }

    fn get_artists_count(&self) -> usize {
        self.count("artists")
    }

    fn get_albums_count(&self) -> usize {
        self.count("albums")
    }

    fn get_songs_count(&self) -> usize {
        self.count("songs")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library_db::open_library_db;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn create_tmp_store() -> (TempDir, SqliteLibraryStore) {
        let dir = TempDir::new().unwrap();
        let db = open_library_db(dir.path().join("library.db")).unwrap();
        (dir, SqliteLibraryStore::new(db))
    }

    fn new_song(title: &str, artist: &str, album: &str, duration: i64) -> NewSong {
        NewSong {
            title: title.to_string(),
            artist_name: artist.to_string(),
            album_name: album.to_string(),
            duration_seconds: duration,
            audio_file_path: None,
        }
    }

    #[test]
    fn resolves_artist_idempotently() {
        let (_dir, store) = create_tmp_store();
        let first = store.resolve_artist("Nina Simone").unwrap();
        let second = store.resolve_artist("Nina Simone").unwrap();
        assert_eq!(first, second);
        assert_eq!(store.get_artists_count(), 1);

        // Names are matched exactly.
        let other = store.resolve_artist("nina simone").unwrap();
        assert_ne!(first, other);
    }

    #[test]
    fn resolves_album_scoped_by_artist() {
        let (_dir, store) = create_tmp_store();
        let a = store.resolve_artist("A").unwrap();
        let b = store.resolve_artist("B").unwrap();

        let greatest_a = store.resolve_album("Greatest Hits", a).unwrap();
        assert_eq!(store.resolve_album("Greatest Hits", a), Some(greatest_a));

        let greatest_b = store.resolve_album("Greatest Hits", b).unwrap();
        assert_ne!(greatest_a, greatest_b);
        assert_eq!(store.get_album(greatest_b).unwrap().artist_id, b);
    }

    #[test]
    fn adding_songs_reuses_artist_and_album() {
        let (_dir, store) = create_tmp_store();
        let first = store.add_song(&new_song("X", "A", "M", 200)).unwrap();
        let second = store.add_song(&new_song("X", "A", "M", 200)).unwrap();
        assert_ne!(first, second);

        assert_eq!(store.get_artists_count(), 1);
        assert_eq!(store.get_albums_count(), 1);
        assert_eq!(store.get_songs_count(), 2);

        let first = store.get_song(first).unwrap();
        let second = store.get_song(second).unwrap();
        assert_eq!(first.artist_id, second.artist_id);
        assert_eq!(first.album_id, second.album_id);
        assert_eq!(first.artist_name, "A");
        assert_eq!(first.album_name, "M");
        assert_eq!(first.duration_seconds, 200);
    }

    #[test]
    fn concurrent_resolution_creates_a_single_artist() {
        let (_dir, store) = create_tmp_store();
        let store = Arc::new(store);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                std::thread::spawn(move || store.resolve_artist("Race Condition").unwrap())
            })
            .collect();
        let ids: Vec<i64> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert!(ids.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(store.get_artists_count(), 1);
    }

    #[test]
    fn keeps_audio_file_path() {
        let (_dir, store) = create_tmp_store();
        let mut song = new_song("With Audio", "A", "M", 3);
        song.audio_file_path = Some("a/with_audio.ogg".to_string());
        let id = store.add_song(&song).unwrap();
        assert_eq!(
            store.get_song(id).unwrap().audio_file_path.as_deref(),
            Some("a/with_audio.ogg")
        );
        assert_eq!(store.get_song(id + 1000), None);
    }

    #[test]
    fn searches_titles_case_insensitively_in_title_order() {
        let (_dir, store) = create_tmp_store();
        store.add_song(&new_song("Lovely Day", "Bill Withers", "Menagerie", 255));
        store.add_song(&new_song("a love supreme", "Coltrane", "A Love Supreme", 1800));
        store.add_song(&new_song("Yesterday", "The Beatles", "Help!", 125));
        store.add_song(&new_song("100% Pure LOVE", "Crystal Waters", "Storyteller", 210));

        let titles: Vec<String> = store
            .search_songs_by_title("LOVE")
            .into_iter()
            .map(|s| s.title)
            .collect();
        assert_eq!(titles, vec!["100% Pure LOVE", "a love supreme", "Lovely Day"]);

        // Wildcard characters are matched literally.
        let titles: Vec<String> = store
            .search_songs_by_title("%")
            .into_iter()
            .map(|s| s.title)
            .collect();
        assert_eq!(titles, vec!["100% Pure LOVE"]);

        assert!(store.search_songs_by_title("nothing like this").is_empty());
        assert_eq!(store.search_songs_by_title("").len(), 4);
    }

    #[test]
    fn searches_accented_titles_case_insensitively() {
        let (_dir, store) = create_tmp_store();
        store.add_song(&new_song("Été Indien", "Joe Dassin", "L'Album", 270));
        store.add_song(&new_song("Ещё раз", "Кино", "Группа крови", 200));
        store.add_song(&new_song("Ete", "Someone", "Else", 100));

        let titles: Vec<String> = store
            .search_songs_by_title("été")
            .into_iter()
            .map(|s| s.title)
            .collect();
        assert_eq!(titles, vec!["Été Indien"]);
        assert_eq!(store.search_songs_by_title("ÉTÉ IND").len(), 1);
        assert_eq!(store.search_songs_by_title("ЕЩЁ").len(), 1);
    }

    #[test]
    fn lists_all_songs_by_title() {
        let (_dir, store) = create_tmp_store();
        store.add_song(&new_song("b", "A", "M", 1));
        store.add_song(&new_song("C", "A", "M", 1));
        store.add_song(&new_song("a", "A", "M", 1));
        let titles: Vec<String> = store.list_songs().into_iter().map(|s| s.title).collect();
        assert_eq!(titles, vec!["a", "b", "C"]);
    }

    #[test]
    fn deleting_a_song_keeps_reference_data() {
        let (_dir, store) = create_tmp_store();
        let id = store.add_song(&new_song("Gone", "A", "M", 1)).unwrap();

        assert!(store.delete_song(id));
        assert!(!store.delete_song(id));
        assert_eq!(store.get_song(id), None);
        assert_eq!(store.get_artists_count(), 1);
        assert_eq!(store.get_albums_count(), 1);
    }
}
