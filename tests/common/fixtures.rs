//! Test data: a small library, two users and their audio files.

use super::constants::*;
use anyhow::{Context, Result};
use music_library_server::library::NewSong;
use music_library_server::{open_library_db, LibraryStore, SqliteLibraryStore, SqliteUserStore, UserManager};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// Deterministic audio content, so that any window can be checked.
pub fn test_audio_bytes(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

fn song(title: &str, artist: &str, album: &str, audio_file_path: Option<String>) -> NewSong {
    NewSong {
        title: title.to_string(),
        artist_name: artist.to_string(),
        album_name: album.to_string(),
        duration_seconds: 180,
        audio_file_path,
    }
}

fn write_media_files(media_dir: &Path) -> Result<()> {
    std::fs::write(
        media_dir.join(SONG_1_AUDIO_FILE),
        test_audio_bytes(TEST_AUDIO_SIZE_BYTES),
    )?;
    std::fs::write(
        media_dir.join(SONG_2_AUDIO_FILE),
        test_audio_bytes(TEST_AUDIO_SIZE_BYTES),
    )?;
    std::fs::write(media_dir.join(SONG_5_AUDIO_FILE), b"")?;
    Ok(())
}

/// Creates the library database with the test songs and users.
///
/// Returns the temp dir holding everything, the database directory and the
/// media directory.
pub fn create_test_library() -> Result<(TempDir, PathBuf, PathBuf)> {
    let temp_dir = TempDir::new()?;
    let db_dir = temp_dir.path().join("db");
    let media_dir = temp_dir.path().join("media");
    std::fs::create_dir(&db_dir)?;
    std::fs::create_dir(&media_dir)?;
    write_media_files(&media_dir)?;

    let db = open_library_db(db_dir.join("library.db"))?;
    let library = SqliteLibraryStore::new(db.clone());
    let songs = [
        song(
            SONG_1_TITLE,
            ARTIST_1_NAME,
            ALBUM_1_TITLE,
            Some(SONG_1_AUDIO_FILE.to_string()),
        ),
        song(
            SONG_2_TITLE,
            ARTIST_1_NAME,
            ALBUM_1_TITLE,
            Some(media_dir.join(SONG_2_AUDIO_FILE).to_string_lossy().to_string()),
        ),
        song(SONG_3_TITLE, ARTIST_1_NAME, ALBUM_1_TITLE, None),
        song(
            SONG_4_TITLE,
            ARTIST_2_NAME,
            ALBUM_2_TITLE,
            Some(SONG_4_AUDIO_FILE.to_string()),
        ),
        song(
            SONG_5_TITLE,
            ARTIST_2_NAME,
            ALBUM_2_TITLE,
            Some(SONG_5_AUDIO_FILE.to_string()),
        ),
    ];
    for song in songs.iter() {
        library
            .add_song(song)
            .with_context(|| format!("Failed to add {}", song.title))?;
    }

    let user_manager = UserManager::new(Arc::new(SqliteUserStore::new(db)));
    user_manager.register(TEST_USER, TEST_EMAIL, TEST_PASS)?;
    user_manager.register(OTHER_USER, OTHER_EMAIL, OTHER_PASS)?;

    Ok((temp_dir, db_dir, media_dir))
}
