use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use time::OffsetDateTime;
use tracing::{debug, warn};

use crate::{
    auth::{repo::SessionRepo, repo_types::User},
    error::AppError,
    state::AppState,
};

/// Cookie carrying the session token.
pub const SESSION_COOKIE: &str = "session";

/// Session token from `Authorization: Bearer`, else from the `session` cookie.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    bearer_token(headers).or_else(|| cookie_value(headers, SESSION_COOKIE))
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let auth = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = auth
        .strip_prefix("Bearer ")
        .or_else(|| auth.strip_prefix("bearer "))?
        .trim();
    (!token.is_empty()).then(|| token.to_string())
}

fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, v)| *k == name && !v.is_empty())
        .map(|(_, v)| v.to_string())
}

/// Authenticated caller: the session's owner and the token it presented.
pub struct AuthUser {
    pub user: User,
    pub token: String,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = session_token(&parts.headers).ok_or_else(|| {
            debug!("no session token on request");
            AppError::NotAuthenticated
        })?;

        let user = state
            .store
            .find_session_user(&token, OffsetDateTime::now_utc())
            .await?
            .ok_or_else(|| {
                warn!("unknown or expired session token");
                AppError::SessionExpired
            })?;

        Ok(AuthUser { user, token })
    }
}
