use super::models::{Album, Artist, NewSong, Song};

/// Catalog access: artists and albums are resolved by name, songs are plain CRUD.
///
/// Storage failures never cross this boundary. Implementations log them and
/// return `None`, `false` or an empty list.
pub trait LibraryStore: Send + Sync {
    /// Returns the id of the artist with exactly this name, creating it if needed.
    fn resolve_artist(&self, name: &str) -> Option<i64>;

    /// Returns the id of the album `name` by `artist_id`, creating it if needed.
    fn resolve_album(&self, name: &str, artist_id: i64) -> Option<i64>;

    /// Inserts a song, resolving its artist and album first.
    /// Returns the new song id, or None if nothing was created.
    fn add_song(&self, song: &NewSong) -> Option<i64>;

    fn get_song(&self, id: i64) -> Option<Song>;

    /// All songs ordered by title.
    fn list_songs(&self) -> Vec<Song>;

    /// Songs whose title contains `fragment`, ignoring case, ordered by title.
    fn search_songs_by_title(&self, fragment: &str) -> Vec<Song>;

    /// Deletes a song and its playlist memberships. Artists and albums are kept.
    fn delete_song(&self, id: i64) -> bool;

    fn get_artist(&self, id: i64) -> Option<Artist>;

    fn get_album(&self, id: i64) -> Option<Album>;

    fn get_artists_count(&self) -> usize;

    fn get_albums_count(&self) -> usize;

    fn get_songs_count(&self) -> usize;
}
