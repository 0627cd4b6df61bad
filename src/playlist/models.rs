use crate::library::Song;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Playlist {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub user_id: i64,
    pub created_at: i64,
    pub updated_at: i64,
    /// Computed from the memberships on every read.
    pub song_count: usize,
}

/// A song as it appears in a playlist.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistEntry {
    #[serde(flatten)]
    pub song: Song,
    pub position: i64,
    pub added_at: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistWithSongs {
    #[serde(flatten)]
    pub playlist: Playlist,
    pub songs: Vec<PlaylistEntry>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AddSongOutcome {
    Added { position: i64 },
    AlreadyPresent,
    /// The playlist does not exist or belongs to someone else.
    PlaylistNotFound,
    SongNotFound,
    Failed,
}

impl AddSongOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, AddSongOutcome::Added { .. })
    }
}
