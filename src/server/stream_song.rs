//! Audio streaming with byte range support.

use super::responses::error_response;
use super::state::ServerState;
use crate::media::{audio_content_type, copy_window, CopyCompletion, ResolvedRange};

use axum::{
    body::Body,
    extract::{FromRequestParts, Path, Query, State},
    http::{header, request::Parts, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::convert::Infallible;
use std::path::PathBuf;
use tokio::fs::File;
use tokio_util::io::ReaderStream;
use tracing::{debug, error, warn};

/// Capacity of the pipe between the copy task and the response body.
const STREAM_PIPE_CAPACITY: usize = 64 * 1024;

/// The raw `Range` header, if any.
pub struct RangeHeader(pub Option<String>);

impl FromRequestParts<ServerState> for RangeHeader {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        Ok(RangeHeader(
            parts
                .headers
                .get(header::RANGE)
                .and_then(|value| value.to_str().ok())
                .map(|value| value.to_string()),
        ))
    }
}

#[derive(Deserialize, Debug)]
pub struct AudioQuery {
    id: Option<String>,
}

fn content_disposition(title: &str) -> String {
    let filename: String = title
        .chars()
        .filter(|c| *c != '"' && !c.is_control())
        .collect();
    format!("inline; filename=\"{}\"", filename)
}

fn resolve_audio_path(state: &ServerState, audio_file_path: &str) -> PathBuf {
    let path = PathBuf::from(audio_file_path);
    if path.is_absolute() {
        path
    } else {
        state.config.media_path.join(path)
    }
}

pub async fn stream_song_by_query(
    State(state): State<ServerState>,
    range: RangeHeader,
    Query(query): Query<AudioQuery>,
) -> Response {
    stream_song(state, range, query.id).await
}

pub async fn stream_song_by_path(
    State(state): State<ServerState>,
    range: RangeHeader,
    Path(id): Path<String>,
) -> Response {
    stream_song(state, range, Some(id)).await
}

async fn stream_song(state: ServerState, range: RangeHeader, id: Option<String>) -> Response {
    let id = match id.as_deref().map(str::trim).and_then(|id| id.parse::<i64>().ok()) {
        Some(id) => id,
        None => return error_response(StatusCode::BAD_REQUEST, "Song ID required"),
    };

    let song = match state.library_store.get_song(id) {
        Some(song) => song,
        None => return error_response(StatusCode::NOT_FOUND, "Song not found"),
    };

    let audio_file_path = match song.audio_file_path.as_deref().map(str::trim) {
        Some(path) if !path.is_empty() => path,
        // The song exists but has nothing to play: 204, never 404.
        _ => {
            debug!("Song {} has no audio", song.id);
            return StatusCode::NO_CONTENT.into_response();
        }
    };
    let path = resolve_audio_path(&state, audio_file_path);

    let file_not_found = || error_response(StatusCode::NOT_FOUND, "Audio file not found on server");
    let total_length = match tokio::fs::metadata(&path).await {
        Ok(metadata) if metadata.is_file() => metadata.len(),
        _ => {
            warn!("Audio file of song {} not found: {}", song.id, path.display());
            return file_not_found();
        }
    };
    let mut file = match File::open(&path).await {
        Ok(file) => file,
        Err(err) => {
            warn!("Could not open {}: {}", path.display(), err);
            return file_not_found();
        }
    };

    let resolved = ResolvedRange::resolve(range.0.as_deref(), total_length);
    debug!(
        "Streaming song {} from {} ({:?})",
        song.id,
        path.display(),
        resolved
    );

    let mut builder = Response::builder()
        .status(resolved.status())
        .header(header::CONTENT_TYPE, audio_content_type(&path))
        .header(header::ACCEPT_RANGES, "bytes")
        .header(header::CONTENT_DISPOSITION, content_disposition(&song.title))
        .header(header::CONTENT_LENGTH, resolved.content_length());
    if let Some(content_range) = resolved.content_range() {
        builder = builder.header(header::CONTENT_RANGE, content_range);
    }

    let body = match resolved.window() {
        None => Body::empty(),
        Some(window) => {
            let (mut writer, reader) = tokio::io::duplex(STREAM_PIPE_CAPACITY);
            let song_id = song.id;
            tokio::spawn(async move {
                match copy_window(&mut file, window, &mut writer).await {
                    Ok(outcome) if outcome.completion == CopyCompletion::Complete => {
                        debug!("Streamed {} bytes of song {}", outcome.bytes_copied, song_id)
                    }
                    Ok(outcome) => debug!(
                        "Stopped streaming song {} after {} bytes: {:?}",
                        song_id, outcome.bytes_copied, outcome.completion
                    ),
                    Err(err) => error!("Error reading audio of song {}: {}", song_id, err),
                }
            });
            Body::from_stream(ReaderStream::new(reader))
        }
    };

    builder.body(body).unwrap_or_else(|err| {
        error!("Could not build audio response: {}", err);
        StatusCode::INTERNAL_SERVER_ERROR.into_response()
    })
}
