use super::models::{AddSongOutcome, Playlist, PlaylistWithSongs};

/// Owner-scoped playlist storage. A playlist owned by another user behaves
/// exactly like one that does not exist.
pub trait PlaylistStore: Send + Sync {
    /// Creates a playlist and returns its id. The name must already be validated.
    fn create_playlist(
        &self,
        name: &str,
        description: Option<&str>,
        owner_user_id: i64,
    ) -> Option<i64>;

    /// The owner's playlists, most recently updated first.
    fn list_playlists(&self, owner_user_id: i64) -> Vec<Playlist>;

    fn get_playlist(&self, id: i64, owner_user_id: i64) -> Option<Playlist>;

    /// Renames the playlist and refreshes its update time.
    fn update_playlist(
        &self,
        id: i64,
        owner_user_id: i64,
        name: &str,
        description: Option<&str>,
    ) -> bool;

    /// Deletes the playlist together with its memberships.
    fn delete_playlist(&self, id: i64, owner_user_id: i64) -> bool;

    /// Appends a song after the current highest position.
    fn add_song_to_playlist(&self, id: i64, owner_user_id: i64, song_id: i64) -> AddSongOutcome;

    /// Returns false when the song was not in the playlist.
    fn remove_song_from_playlist(&self, id: i64, owner_user_id: i64, song_id: i64) -> bool;

    /// The playlist with its songs ordered by position.
    fn get_playlist_with_songs(&self, id: i64, owner_user_id: i64) -> Option<PlaylistWithSongs>;
}
