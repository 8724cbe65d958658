use std::{sync::Arc, time::Duration as StdDuration};

use anyhow::anyhow;
use lazy_static::lazy_static;
use regex::Regex;
use time::{Duration, OffsetDateTime};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    auth::{extractors::SESSION_COOKIE, repo::SessionRepo, repo_types::Session},
    config::{SessionConfig, MAX_SWEEP_MINUTES},
    error::AppError,
    store::Store,
};

pub const MIN_PASSWORD_LEN: usize = 6;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Display name used when registration omits one: the email's local part.
pub(crate) fn default_name(email: &str) -> String {
    email.split('@').next().unwrap_or(email).to_string()
}

/// Session lifetime; `None` if `ttl_days` overflows a duration.
pub(crate) fn session_ttl(cfg: &SessionConfig) -> Option<Duration> {
    cfg.ttl_days.checked_mul(86_400).map(Duration::seconds)
}

/// Create and persist a session for `user_id`.
pub(crate) async fn open_session(
    store: &dyn Store,
    cfg: &SessionConfig,
    user_id: Uuid,
) -> Result<Session, AppError> {
    let session = session_ttl(cfg)
        .and_then(|ttl| Session::issue(user_id, ttl))
        .ok_or_else(|| anyhow!("session ttl of {} days is out of range", cfg.ttl_days))?;
    store.insert_session(&session).await?;
    debug!(%user_id, expires_at = %session.expires_at, "session opened");
    Ok(session)
}

/// `Set-Cookie` value carrying `token`.
pub(crate) fn session_cookie(token: &str, cfg: &SessionConfig) -> String {
    let max_age = session_ttl(cfg).map_or(0, |ttl| ttl.whole_seconds());
    build_cookie(token, max_age, cfg.cookie_secure)
}

/// `Set-Cookie` value that clears the session cookie.
pub(crate) fn cleared_cookie(cfg: &SessionConfig) -> String {
    build_cookie("", 0, cfg.cookie_secure)
}

fn build_cookie(value: &str, max_age: i64, secure: bool) -> String {
    let mut cookie =
        format!("{SESSION_COOKIE}={value}; HttpOnly; SameSite=Strict; Path=/; Max-Age={max_age}");
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Periodically delete expired sessions. Returns `None` when disabled.
pub fn spawn_session_sweeper(store: Arc<dyn Store>, every_minutes: u64) -> Option<JoinHandle<()>> {
    if every_minutes == 0 {
        info!("session sweeper disabled");
        return None;
    }
    if every_minutes > MAX_SWEEP_MINUTES {
        warn!(every_minutes, "session sweep interval out of range; sweeper disabled");
        return None;
    }

    let period = StdDuration::from_secs(every_minutes * 60);
    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            match store.delete_expired_sessions(OffsetDateTime::now_utc()).await {
                Ok(0) => debug!("no expired sessions"),
                Ok(n) => info!(removed = n, "expired sessions swept"),
                Err(e) => warn!(error = %e, "session sweep failed"),
            }
        }
    }))
}
