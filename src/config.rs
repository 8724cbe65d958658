use anyhow::{bail, Context};
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    Postgres,
    Memory,
}

/// Longest session lifetime accepted from the environment.
pub const MAX_SESSION_TTL_DAYS: i64 = 3650;
/// Longest gap between expired-session sweeps (one week).
pub const MAX_SWEEP_MINUTES: u64 = 7 * 24 * 60;

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub ttl_days: i64,
    pub sweep_minutes: u64,
    pub cookie_secure: bool,
}

impl SessionConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if !(1..=MAX_SESSION_TTL_DAYS).contains(&self.ttl_days) {
            bail!(
                "SESSION_TTL_DAYS must be between 1 and {MAX_SESSION_TTL_DAYS}, got {}",
                self.ttl_days
            );
        }
        if self.sweep_minutes > MAX_SWEEP_MINUTES {
            bail!(
                "SESSION_SWEEP_MINUTES must be at most {MAX_SWEEP_MINUTES}, got {}",
                self.sweep_minutes
            );
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    pub allowed_origin_suffixes: Vec<String>,
    pub default_origin: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub store: StoreKind,
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub session: SessionConfig,
    pub cors: CorsConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let store = match std::env::var("STORE").as_deref() {
            Ok("memory") => StoreKind::Memory,
            Ok("postgres") | Err(_) => StoreKind::Postgres,
            Ok(other) => bail!("unknown STORE value {other:?}, expected postgres or memory"),
        };

        let database_url = std::env::var("DATABASE_URL").ok();
        if store == StoreKind::Postgres && database_url.is_none() {
            bail!("DATABASE_URL is required when STORE=postgres");
        }

        let session = SessionConfig {
            ttl_days: parse_env("SESSION_TTL_DAYS", 7)?,
            sweep_minutes: parse_env("SESSION_SWEEP_MINUTES", 60)?,
            cookie_secure: parse_env("COOKIE_SECURE", true)?,
        };
        session.validate()?;

        let allowed_origins = std::env::var("CORS_ALLOWED_ORIGINS")
            .map(|v| split_list(&v))
            .unwrap_or_else(|_| vec!["http://localhost:3000".into()]);
        let allowed_origin_suffixes = std::env::var("CORS_ALLOWED_ORIGIN_SUFFIXES")
            .map(|v| split_list(&v))
            .unwrap_or_else(|_| vec![".netlify.app".into()]);
        let default_origin = std::env::var("CORS_DEFAULT_ORIGIN")
            .ok()
            .or_else(|| allowed_origins.first().cloned())
            .unwrap_or_else(|| "http://localhost:3000".into());

        Ok(Self {
            store,
            database_url,
            max_connections: parse_env("DATABASE_MAX_CONNECTIONS", 10)?,
            session,
            cors: CorsConfig {
                allowed_origins,
                allowed_origin_suffixes,
                default_origin,
            },
        })
    }
}

fn parse_env<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(v) => v
            .trim()
            .parse::<T>()
            .with_context(|| format!("invalid value for {key}: {v:?}")),
        Err(_) => Ok(default),
    }
}

/// Comma-separated list; blanks are dropped.
fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_list_trims_and_skips_blanks() {
        assert_eq!(
            split_list(" https://a.example , ,https://b.example,"),
            vec!["https://a.example".to_string(), "https://b.example".to_string()]
        );
        assert!(split_list("").is_empty());
    }

    fn session(ttl_days: i64, sweep_minutes: u64) -> SessionConfig {
        SessionConfig {
            ttl_days,
            sweep_minutes,
            cookie_secure: true,
        }
    }

    #[test]
    fn session_ttl_must_be_in_range() {
        assert!(session(7, 60).validate().is_ok());
        assert!(session(1, 60).validate().is_ok());
        assert!(session(MAX_SESSION_TTL_DAYS, 60).validate().is_ok());

        for ttl in [0, -1, MAX_SESSION_TTL_DAYS + 1, 1_000_000_000] {
            let err = session(ttl, 60).validate().unwrap_err();
            assert!(err.to_string().contains("SESSION_TTL_DAYS"), "{err}");
        }
    }

    #[test]
    fn sweep_interval_is_bounded() {
        assert!(session(7, 0).validate().is_ok());
        assert!(session(7, MAX_SWEEP_MINUTES).validate().is_ok());

        for minutes in [MAX_SWEEP_MINUTES + 1, u64::MAX] {
            let err = session(7, minutes).validate().unwrap_err();
            assert!(err.to_string().contains("SESSION_SWEEP_MINUTES"), "{err}");
        }
    }

    #[test]
    fn parse_env_falls_back_to_default() {
        let ttl: i64 = parse_env("DAILY_PAUSE_TEST_UNSET_VARIABLE", 7).unwrap();
        assert_eq!(ttl, 7);
    }
}
