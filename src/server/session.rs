use super::state::ServerState;
use crate::user::{AuthTokenValue, AuthenticatedUser};

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde_json::json;
use tracing::{debug, error};

/// The authenticated caller. Handlers taking a `Session` answer 401 to
/// anonymous requests.
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: i64,
    pub username: String,
    /// None when the user was identified through the trusted user id header.
    pub token: Option<AuthTokenValue>,
}

pub const COOKIE_SESSION_TOKEN_KEY: &str = "session_token";
pub const HEADER_SESSION_TOKEN_KEY: &str = "Authorization";
pub const HEADER_USER_ID_KEY: &str = "X-User-Id";

pub enum SessionExtractionError {
    NotAuthenticated,
    InternalError,
}

impl IntoResponse for SessionExtractionError {
    fn into_response(self) -> Response {
        match self {
            SessionExtractionError::NotAuthenticated => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "User not authenticated" })),
            )
                .into_response(),
            SessionExtractionError::InternalError => {
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

async fn extract_session_token_from_cookies(
    parts: &mut Parts,
    ctx: &ServerState,
) -> Option<String> {
    CookieJar::from_request_parts(parts, ctx)
        .await
        .ok()?
        .get(COOKIE_SESSION_TOKEN_KEY)
        .map(Cookie::value)
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

fn extract_session_token_from_headers(parts: &Parts) -> Option<String> {
    let value = parts.headers.get(HEADER_SESSION_TOKEN_KEY)?.to_str().ok()?;
    let value = value.strip_prefix("Bearer ").unwrap_or(value).trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn extract_trusted_user_id(parts: &Parts) -> Option<i64> {
    parts
        .headers
        .get(HEADER_USER_ID_KEY)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

async fn extract_session_from_request_parts(
    parts: &mut Parts,
    ctx: &ServerState,
) -> Result<Option<Session>, SessionExtractionError> {
    // A stale cookie must not shadow a valid Authorization header.
    let candidates = [
        extract_session_token_from_cookies(parts, ctx).await,
        extract_session_token_from_headers(parts),
    ];
    for token in candidates.into_iter().flatten() {
        let token = AuthTokenValue(token);
        match ctx.user_manager.resolve_token(&token) {
            Ok(Some(AuthenticatedUser { user_id, username })) => {
                return Ok(Some(Session {
                    user_id,
                    username,
                    token: Some(token),
                }))
            }
            Ok(None) => debug!("Auth token not found in database"),
            Err(err) => {
                error!("Failed to resolve auth token: {:#}", err);
                return Err(SessionExtractionError::InternalError);
            }
        }
    }

    if !ctx.config.trust_user_id_header {
        return Ok(None);
    }
    let user_id = match extract_trusted_user_id(parts) {
        Some(user_id) => user_id,
        None => return Ok(None),
    };
    match ctx.user_manager.resolve_user_id(user_id) {
        Ok(user) => Ok(user.map(|AuthenticatedUser { user_id, username }| Session {
            user_id,
            username,
            token: None,
        })),
        Err(err) => {
            error!("Failed to resolve user {}: {:#}", user_id, err);
            Err(SessionExtractionError::InternalError)
        }
    }
}

impl FromRequestParts<ServerState> for Session {
    type Rejection = SessionExtractionError;

    async fn from_request_parts(
        parts: &mut Parts,
        ctx: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        extract_session_from_request_parts(parts, ctx)
            .await?
            .ok_or(SessionExtractionError::NotAuthenticated)
    }
}

impl axum::extract::OptionalFromRequestParts<ServerState> for Session {
    type Rejection = SessionExtractionError;

    async fn from_request_parts(
        parts: &mut Parts,
        ctx: &ServerState,
    ) -> Result<Option<Self>, Self::Rejection> {
        extract_session_from_request_parts(parts, ctx).await
    }
}
