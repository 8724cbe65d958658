use rand::RngCore;
use sqlx::FromRow;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

/// Random bytes behind a session token (64 hex chars once encoded).
const TOKEN_BYTES: usize = 32;

/// User record in the database.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,                   // unique user ID
    pub email: String,              // trimmed, lowercased
    pub password_hash: String,      // Argon2 PHC string or legacy SHA-256 hex
    pub name: String,               // display name
    pub created_at: OffsetDateTime, // creation timestamp
}

/// Fields needed to insert a user.
#[derive(Debug)]
pub struct NewUser<'a> {
    pub email: &'a str,
    pub password_hash: &'a str,
    pub name: &'a str,
}

/// Server-side session; `id` is the opaque token handed to the client.
#[derive(Debug, Clone, FromRow)]
pub struct Session {
    pub id: String,
    pub user_id: Uuid,
    pub created_at: OffsetDateTime,
    pub expires_at: OffsetDateTime,
}

impl Session {
    /// Mint a fresh session for `user_id` expiring `ttl` from now.
    /// `None` when the expiry falls outside the representable range.
    pub fn issue(user_id: Uuid, ttl: Duration) -> Option<Self> {
        let now = OffsetDateTime::now_utc();
        let expires_at = now.checked_add(ttl)?;
        let mut bytes = [0u8; TOKEN_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);
        Some(Self {
            id: hex::encode(bytes),
            user_id,
            created_at: now,
            expires_at,
        })
    }

    pub fn is_live(&self, now: OffsetDateTime) -> bool {
        self.expires_at > now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_tokens_are_hex_and_distinct() {
        let user_id = Uuid::new_v4();
        let a = Session::issue(user_id, Duration::days(7)).unwrap();
        let b = Session::issue(user_id, Duration::days(7)).unwrap();
        assert_eq!(a.id.len(), TOKEN_BYTES * 2);
        assert!(a.id.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn liveness_is_strictly_before_expiry() {
        let session = Session::issue(Uuid::new_v4(), Duration::days(7)).unwrap();
        assert!(session.is_live(OffsetDateTime::now_utc()));
        assert!(!session.is_live(session.expires_at));
        assert!(!session.is_live(session.expires_at + Duration::seconds(1)));
    }

    #[test]
    fn unrepresentable_expiry_is_refused() {
        assert!(Session::issue(Uuid::new_v4(), Duration::MAX).is_none());
        assert!(Session::issue(Uuid::new_v4(), Duration::days(365_000_000)).is_none());
    }
}
