use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artist {
    pub id: i64,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Album {
    pub id: i64,
    pub name: String,
    pub artist_id: i64,
}

/// A song joined with the names of its artist and album.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Song {
    pub id: i64,
    pub title: String,
    pub artist_id: i64,
    pub artist_name: String,
    pub album_id: i64,
    pub album_name: String,
    pub duration_seconds: i64,
    pub audio_file_path: Option<String>,
}

impl Song {
    /// Duration as `m:ss`.
    pub fn formatted_duration(&self) -> String {
        let seconds = self.duration_seconds.max(0);
        format!("{}:{:02}", seconds / 60, seconds % 60)
    }
}

impl fmt::Display for Song {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}. {} - {} ({}) {}",
            self.id,
            self.title,
            self.artist_name,
            self.album_name,
            self.formatted_duration()
        )
    }
}

/// Everything needed to insert a song. Artist and album are given by name and
/// resolved (or created) on insertion.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSong {
    pub title: String,
    pub artist_name: String,
    pub album_name: String,
    #[serde(default)]
    pub duration_seconds: i64,
    #[serde(default)]
    pub audio_file_path: Option<String>,
}
