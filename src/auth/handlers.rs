use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue},
    routing::{get, post},
    Json, Router,
};
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest, MessageResponse, PublicUser, RegisterRequest},
        extractors::AuthUser,
        password::{hash_password, verify_password},
        repo::{SessionRepo, UserRepo},
        repo_types::NewUser,
        services::{
            cleared_cookie, default_name, is_valid_email, open_session, session_cookie,
            MIN_PASSWORD_LEN,
        },
    },
    error::AppError,
    extract::JsonBody,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/auth/me", get(get_me))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    JsonBody(mut payload): JsonBody<RegisterRequest>,
) -> Result<(HeaderMap, Json<AuthResponse>), AppError> {
    payload.email = payload.email.trim().to_lowercase();

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(AppError::Validation("Invalid email".into()));
    }

    if payload.password.chars().count() < MIN_PASSWORD_LEN {
        warn!("password too short");
        return Err(AppError::Validation("Password too short".into()));
    }

    // Ensure email is not taken
    if state.store.find_user_by_email(&payload.email).await?.is_some() {
        warn!(email = %payload.email, "email already registered");
        return Err(AppError::UserExists);
    }

    let hash = hash_password(&payload.password).map_err(|e| {
        error!(error = %e, "hash_password failed");
        AppError::Internal(e)
    })?;

    let name = match payload.name.as_deref().map(str::trim) {
        Some(n) if !n.is_empty() => n.to_string(),
        _ => default_name(&payload.email),
    };

    // A concurrent registration can still win the unique index; that surfaces as UserExists too.
    let user = state
        .store
        .create_user(NewUser {
            email: &payload.email,
            password_hash: &hash,
            name: &name,
        })
        .await?;

    let session = open_session(state.store.as_ref(), &state.config.session, user.id).await?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((
        cookie_headers(&session_cookie(&session.id, &state.config.session))?,
        Json(AuthResponse {
            user: user.into(),
            token: session.id,
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    JsonBody(mut payload): JsonBody<LoginRequest>,
) -> Result<(HeaderMap, Json<AuthResponse>), AppError> {
    payload.email = payload.email.trim().to_lowercase();

    let user = match state.store.find_user_by_email(&payload.email).await? {
        Some(u) => u,
        None => {
            warn!(email = %payload.email, "login unknown email");
            return Err(AppError::InvalidCredentials);
        }
    };

    let ok = verify_password(&payload.password, &user.password_hash).map_err(|e| {
        error!(error = %e, user_id = %user.id, "verify_password failed");
        AppError::Internal(e)
    })?;

    if !ok {
        warn!(email = %payload.email, user_id = %user.id, "login invalid password");
        return Err(AppError::InvalidCredentials);
    }

    let session = open_session(state.store.as_ref(), &state.config.session, user.id).await?;

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok((
        cookie_headers(&session_cookie(&session.id, &state.config.session))?,
        Json(AuthResponse {
            user: user.into(),
            token: session.id,
        }),
    ))
}

#[instrument(skip(state, auth))]
pub async fn logout(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<(HeaderMap, Json<MessageResponse>), AppError> {
    state.store.delete_session(&auth.token).await?;
    info!(user_id = %auth.user.id, "user logged out");
    Ok((
        cookie_headers(&cleared_cookie(&state.config.session))?,
        Json(MessageResponse {
            message: "Logged out",
        }),
    ))
}

#[instrument(skip(auth))]
pub async fn get_me(auth: AuthUser) -> Json<PublicUser> {
    Json(auth.user.into())
}

fn cookie_headers(cookie: &str) -> Result<HeaderMap, AppError> {
    let value = HeaderValue::from_str(cookie)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("invalid cookie header: {e}")))?;
    let mut headers = HeaderMap::new();
    headers.insert(header::SET_COOKIE, value);
    Ok(headers)
}

#[cfg(test)]
mod me_tests {
    use super::*;

    #[test]
    fn test_me_response_serialization() {
        let response = PublicUser {
            id: uuid::Uuid::new_v4(),
            email: "test@example.com".to_string(),
            name: "Test".to_string(),
        };

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["email"], "test@example.com");
        assert_eq!(json["name"], "Test");
        assert!(json.get("password_hash").is_none());
    }

    #[test]
    fn auth_response_is_flat() {
        let response = AuthResponse {
            user: PublicUser {
                id: uuid::Uuid::new_v4(),
                email: "a@x.com".into(),
                name: "Ann".into(),
            },
            token: "abc".into(),
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["email"], "a@x.com");
        assert_eq!(json["token"], "abc");
        assert!(json.get("user").is_none());
    }
}
