//! Catalog routes: songs, artists and albums.

use super::responses::{error_response, failure_response, success_response};
use super::session::Session;
use super::state::{GuardedLibraryStore, ServerState};
use crate::library::NewSong;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

#[derive(Deserialize, Debug)]
struct SongsQuery {
    search: Option<String>,
}

/// Returns the trimmed song, or the reason it cannot be stored.
fn validate_new_song(song: NewSong) -> Result<NewSong, &'static str> {
    let title = song.title.trim();
    let artist_name = song.artist_name.trim();
    let album_name = song.album_name.trim();
    if title.is_empty() || artist_name.is_empty() || album_name.is_empty() {
        return Err("Title, artist and album are required");
    }
    if song.duration_seconds < 0 {
        return Err("Duration cannot be negative");
    }
    Ok(NewSong {
        title: title.to_string(),
        artist_name: artist_name.to_string(),
        album_name: album_name.to_string(),
        duration_seconds: song.duration_seconds,
        audio_file_path: song
            .audio_file_path
            .map(|path| path.trim().to_string())
            .filter(|path| !path.is_empty()),
    })
}

async fn get_songs(
    State(library): State<GuardedLibraryStore>,
    Query(query): Query<SongsQuery>,
) -> Response {
    let songs = match query.search.as_deref().map(str::trim) {
        Some(fragment) if !fragment.is_empty() => {
            debug!("Searching songs for '{}'", fragment);
            library.search_songs_by_title(fragment)
        }
        _ => library.list_songs(),
    };
    Json(songs).into_response()
}

async fn get_song(State(library): State<GuardedLibraryStore>, Path(id): Path<i64>) -> Response {
    match library.get_song(id) {
        Some(song) => Json(song).into_response(),
        None => error_response(StatusCode::NOT_FOUND, "Song not found"),
    }
}

async fn post_song(
    session: Session,
    State(library): State<GuardedLibraryStore>,
    Json(body): Json<NewSong>,
) -> Response {
    let song = match validate_new_song(body) {
        Ok(song) => song,
        Err(message) => return failure_response(StatusCode::BAD_REQUEST, message),
    };
    match library.add_song(&song) {
        Some(song_id) => {
            info!(
                "User {} added song {} ({})",
                session.username, song_id, song.title
            );
            success_response(
                StatusCode::CREATED,
                "Song added successfully",
                json!({ "songId": song_id }),
            )
        }
        None => failure_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to add song"),
    }
}

async fn delete_song(
    session: Session,
    State(library): State<GuardedLibraryStore>,
    Path(id): Path<i64>,
) -> Response {
    if library.delete_song(id) {
        info!("User {} deleted song {}", session.username, id);
        success_response(StatusCode::OK, "Song deleted successfully", json!({}))
    } else {
        failure_response(StatusCode::NOT_FOUND, "Song not found")
    }
}

async fn get_artist(State(library): State<GuardedLibraryStore>, Path(id): Path<i64>) -> Response {
    match library.get_artist(id) {
        Some(artist) => Json(artist).into_response(),
        None => error_response(StatusCode::NOT_FOUND, "Artist not found"),
    }
}

async fn get_album(State(library): State<GuardedLibraryStore>, Path(id): Path<i64>) -> Response {
    match library.get_album(id) {
        Some(album) => Json(album).into_response(),
        None => error_response(StatusCode::NOT_FOUND, "Album not found"),
    }
}

pub(super) fn make_songs_routes(state: ServerState) -> Router {
    Router::new()
        .route("/", get(get_songs).post(post_song))
        .route("/{id}", get(get_song).delete(delete_song))
        .with_state(state)
}

pub(super) fn make_catalog_routes(state: ServerState) -> Router {
    Router::new()
        .route("/artists/{id}", get(get_artist))
        .route("/albums/{id}", get(get_album))
        .with_state(state)
}
