use axum::async_trait;
use time::OffsetDateTime;

use crate::auth::repo_types::{NewUser, Session, User};
use crate::error::AppError;

#[async_trait]
pub trait UserRepo: Send + Sync {
    /// Insert a user. A taken email yields [`AppError::UserExists`].
    async fn create_user(&self, new: NewUser<'_>) -> Result<User, AppError>;

    /// Find a user by (normalized) email.
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
}

#[async_trait]
pub trait SessionRepo: Send + Sync {
    async fn insert_session(&self, session: &Session) -> Result<(), AppError>;

    /// Owner of the session `token`, provided it has not expired at `now`.
    async fn find_session_user(
        &self,
        token: &str,
        now: OffsetDateTime,
    ) -> Result<Option<User>, AppError>;

    async fn delete_session(&self, token: &str) -> Result<(), AppError>;

    /// Remove every session expired at `now`; returns how many went.
    async fn delete_expired_sessions(&self, now: OffsetDateTime) -> Result<u64, AppError>;
}
