use anyhow::{Context, Result};
use std::{sync::Arc, time::Duration};

use tracing::{debug, error, info};

use crate::library::LibraryStore;
use crate::playlist::PlaylistStore;
use crate::user::{LoginError, RegistrationError, UserManager};
use axum_extra::extract::cookie::{Cookie, SameSite};
use tower_http::services::ServeDir;

use axum::{
    extract::State,
    http::{header, HeaderValue, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::playlists::make_playlists_routes;
use super::responses::{failure_response, success_response};
use super::session::{Session, COOKIE_SESSION_TOKEN_KEY};
use super::songs::{make_catalog_routes, make_songs_routes};
use super::stream_song::{stream_song_by_path, stream_song_by_query};
use super::{log_requests, state::*, ServerConfig};

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
    pub version: String,
    pub songs: usize,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

#[derive(Deserialize, Debug)]
struct RegisterBody {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// `username` may also hold the email address.
#[derive(Deserialize)]
struct LoginBody {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

async fn home(State(state): State<ServerState>) -> impl IntoResponse {
    let stats = ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        version: env!("CARGO_PKG_VERSION").to_string(),
        songs: state.library_store.get_songs_count(),
    };
    Json(stats)
}

async fn register(
    State(user_manager): State<GuardedUserManager>,
    Json(body): Json<RegisterBody>,
) -> Response {
    debug!("register() called for {}", body.username);
    match user_manager.register(&body.username, &body.email, &body.password) {
        Ok(user) => success_response(
            StatusCode::CREATED,
            "Account created successfully",
            json!({ "userId": user.user_id, "username": user.username }),
        ),
        Err(err @ RegistrationError::InvalidInput(_)) => {
            failure_response(StatusCode::BAD_REQUEST, &err.to_string())
        }
        Err(err @ (RegistrationError::UsernameTaken | RegistrationError::EmailTaken)) => {
            failure_response(StatusCode::CONFLICT, &err.to_string())
        }
        Err(err @ RegistrationError::Storage(_)) => {
            error!("{}", err);
            failure_response(StatusCode::INTERNAL_SERVER_ERROR, "Registration failed")
        }
    }
}

fn session_cookie(value: String) -> Cookie<'static> {
    Cookie::build((COOKIE_SESSION_TOKEN_KEY, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

async fn login(
    State(user_manager): State<GuardedUserManager>,
    Json(body): Json<LoginBody>,
) -> Response {
    if body.username.trim().is_empty() || body.password.is_empty() {
        return failure_response(StatusCode::BAD_REQUEST, "Username and password required");
    }
    match user_manager.login(&body.username, &body.password) {
        Ok(session) => {
            let mut response = success_response(
                StatusCode::OK,
                "Login successful",
                json!({ "userId": session.user.user_id, "username": session.user.username }),
            );
            match session_cookie(session.token.0)
                .to_string()
                .parse::<HeaderValue>()
            {
                Ok(cookie) => {
                    response.headers_mut().insert(header::SET_COOKIE, cookie);
                    response
                }
                Err(err) => {
                    error!("Could not build session cookie: {}", err);
                    StatusCode::INTERNAL_SERVER_ERROR.into_response()
                }
            }
        }
        Err(err @ LoginError::InvalidCredentials) => {
            failure_response(StatusCode::UNAUTHORIZED, &err.to_string())
        }
        Err(err @ LoginError::Storage(_)) => {
            error!("{}", err);
            failure_response(StatusCode::INTERNAL_SERVER_ERROR, "Login failed")
        }
    }
}

async fn logout(
    State(user_manager): State<GuardedUserManager>,
    session: Option<Session>,
) -> Response {
    if let Some(token) = session.and_then(|s| s.token) {
        if let Err(err) = user_manager.logout(&token) {
            error!("Error deleting auth token: {:#}", err);
        }
    }

    let mut expired = session_cookie(String::new());
    // Expire it in the past.
    expired.set_expires(time::OffsetDateTime::now_utc() - time::Duration::days(1));
    let mut response = success_response(StatusCode::OK, "Logged out", json!({}));
    if let Ok(cookie) = expired.to_string().parse::<HeaderValue>() {
        response.headers_mut().insert(header::SET_COOKIE, cookie);
    }
    response
}

async fn get_session(session: Session) -> Response {
    Json(json!({ "userId": session.user_id, "username": session.username })).into_response()
}

pub fn make_app(
    config: ServerConfig,
    library_store: Arc<dyn LibraryStore>,
    playlist_store: Arc<dyn PlaylistStore>,
    user_manager: Arc<UserManager>,
) -> Result<Router> {
    let state = ServerState::new(config.clone(), library_store, playlist_store, user_manager);

    let auth_routes: Router = Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/session", get(get_session))
        .with_state(state.clone());

    let audio_routes: Router = Router::new()
        .route("/", get(stream_song_by_query))
        .route("/{id}", get(stream_song_by_path))
        .with_state(state.clone());

    let home_router: Router = match &config.frontend_dir_path {
        Some(frontend_path) => {
            let static_files_service =
                ServeDir::new(frontend_path).append_index_html_on_directories(true);
            Router::new()
                .route("/api/stats", get(home))
                .with_state(state.clone())
                .fallback_service(static_files_service)
        }
        None => Router::new()
            .route("/", get(home))
            .with_state(state.clone()),
    };

    let app: Router = home_router
        .nest("/api/auth", auth_routes)
        .nest("/api/songs", make_songs_routes(state.clone()))
        .nest("/api/playlists", make_playlists_routes(state.clone()))
        .nest("/api/audio", audio_routes)
        .nest("/api", make_catalog_routes(state.clone()))
        .layer(middleware::from_fn_with_state(state, log_requests));

    Ok(app)
}

pub async fn run_server(
    config: ServerConfig,
    library_store: Arc<dyn LibraryStore>,
    playlist_store: Arc<dyn PlaylistStore>,
    user_manager: Arc<UserManager>,
) -> Result<()> {
    let port = config.port;
    let app = make_app(config, library_store, playlist_store, user_manager)?;

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port))
        .await
        .with_context(|| format!("Could not bind port {}", port))?;
    info!("Listening on port {}", port);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                error!("Could not listen for shutdown signal: {}", err);
            }
            info!("Shutting down");
        })
        .await?;
    Ok(())
}
