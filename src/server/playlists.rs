//! Playlist routes. Every route acts on the caller's own playlists only.

use super::responses::{error_response, failure_response, success_response};
use super::session::Session;
use super::state::{GuardedPlaylistStore, ServerState};
use crate::playlist::AddSongOutcome;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

#[derive(Deserialize, Debug)]
struct PlaylistBody {
    #[serde(default)]
    name: String,
    description: Option<String>,
}

impl PlaylistBody {
    /// Trimmed name and description, None if the name is blank.
    fn validated(&self) -> Option<(&str, Option<&str>)> {
        let name = self.name.trim();
        if name.is_empty() {
            return None;
        }
        let description = self
            .description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty());
        Some((name, description))
    }
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct AddSongBody {
    song_id: i64,
}

const PLAYLIST_NAME_REQUIRED: &str = "Playlist name is required";
const PLAYLIST_NOT_FOUND: &str = "Playlist not found";

async fn get_playlists(session: Session, State(store): State<GuardedPlaylistStore>) -> Response {
    Json(store.list_playlists(session.user_id)).into_response()
}

async fn get_playlist(
    session: Session,
    State(store): State<GuardedPlaylistStore>,
    Path(id): Path<i64>,
) -> Response {
    match store.get_playlist_with_songs(id, session.user_id) {
        Some(playlist) => Json(playlist).into_response(),
        None => error_response(StatusCode::NOT_FOUND, PLAYLIST_NOT_FOUND),
    }
}

async fn post_playlist(
    session: Session,
    State(store): State<GuardedPlaylistStore>,
    Json(body): Json<PlaylistBody>,
) -> Response {
    let (name, description) = match body.validated() {
        Some(valid) => valid,
        None => return failure_response(StatusCode::BAD_REQUEST, PLAYLIST_NAME_REQUIRED),
    };
    match store.create_playlist(name, description, session.user_id) {
        Some(playlist_id) => success_response(
            StatusCode::CREATED,
            "Playlist created successfully",
            json!({ "playlistId": playlist_id }),
        ),
        None => failure_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to create playlist",
        ),
    }
}

async fn put_playlist(
    session: Session,
    State(store): State<GuardedPlaylistStore>,
    Path(id): Path<i64>,
    Json(body): Json<PlaylistBody>,
) -> Response {
    let (name, description) = match body.validated() {
        Some(valid) => valid,
        None => return failure_response(StatusCode::BAD_REQUEST, PLAYLIST_NAME_REQUIRED),
    };
    if store.update_playlist(id, session.user_id, name, description) {
        success_response(StatusCode::OK, "Playlist updated successfully", json!({}))
    } else {
        failure_response(StatusCode::NOT_FOUND, PLAYLIST_NOT_FOUND)
    }
}

async fn delete_playlist(
    session: Session,
    State(store): State<GuardedPlaylistStore>,
    Path(id): Path<i64>,
) -> Response {
    if store.delete_playlist(id, session.user_id) {
        success_response(StatusCode::OK, "Playlist deleted successfully", json!({}))
    } else {
        failure_response(StatusCode::NOT_FOUND, PLAYLIST_NOT_FOUND)
    }
}

fn add_song_response(outcome: AddSongOutcome) -> Response {
    match outcome {
        AddSongOutcome::Added { position } => success_response(
            StatusCode::OK,
            "Song added to playlist",
            json!({ "position": position }),
        ),
        AddSongOutcome::AlreadyPresent => {
            failure_response(StatusCode::CONFLICT, "Song already in playlist")
        }
        AddSongOutcome::PlaylistNotFound => failure_response(
            StatusCode::FORBIDDEN,
            "Playlist not found or access denied",
        ),
        AddSongOutcome::SongNotFound => failure_response(StatusCode::NOT_FOUND, "Song not found"),
        AddSongOutcome::Failed => failure_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to add song to playlist",
        ),
    }
}

async fn add_song_to_playlist(
    session: Session,
    State(store): State<GuardedPlaylistStore>,
    Path(id): Path<i64>,
    Json(body): Json<AddSongBody>,
) -> Response {
    let outcome = store.add_song_to_playlist(id, session.user_id, body.song_id);
    debug!(
        "User {} adding song {} to playlist {}: {:?}",
        session.user_id, body.song_id, id, outcome
    );
    add_song_response(outcome)
}

async fn remove_song_from_playlist(
    session: Session,
    State(store): State<GuardedPlaylistStore>,
    Path((id, song_id)): Path<(i64, i64)>,
) -> Response {
    if store.remove_song_from_playlist(id, session.user_id, song_id) {
        success_response(StatusCode::OK, "Song removed from playlist", json!({}))
    } else {
        failure_response(
            StatusCode::NOT_FOUND,
            "Song not in playlist or access denied",
        )
    }
}

pub(super) fn make_playlists_routes(state: ServerState) -> Router {
    Router::new()
        .route("/", get(get_playlists).post(post_playlist))
        .route(
            "/{id}",
            get(get_playlist)
                .put(put_playlist)
                .delete(delete_playlist)
                .post(add_song_to_playlist),
        )
        .route("/{id}/{song_id}", delete(remove_song_from_playlist))
        .with_state(state)
}
