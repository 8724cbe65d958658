use crate::config::{AppConfig, StoreKind};
use crate::cors::CorsPolicy;
use crate::db::PgStore;
use crate::memory::MemoryStore;
use crate::store::Store;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: Arc<AppConfig>,
    pub cors: Arc<CorsPolicy>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = AppConfig::from_env()?;

        let store = match config.store {
            StoreKind::Postgres => {
                let pg = PgStore::connect(&config).await?;
                // Run migrations if present
                if let Err(e) = pg.migrate().await {
                    tracing::warn!(error = %e, "migration failed; continuing");
                }
                Arc::new(pg) as Arc<dyn Store>
            }
            StoreKind::Memory => {
                tracing::warn!("using in-memory store; data is lost on restart");
                Arc::new(MemoryStore::new()) as Arc<dyn Store>
            }
        };

        Self::from_parts(store, config)
    }

    pub fn from_parts(store: Arc<dyn Store>, config: AppConfig) -> anyhow::Result<Self> {
        let cors = Arc::new(CorsPolicy::new(&config.cors)?);
        Ok(Self {
            store,
            config: Arc::new(config),
            cors,
        })
    }

    #[cfg(test)]
    pub fn fake() -> Self {
        use crate::config::{CorsConfig, SessionConfig};

        let config = AppConfig {
            store: StoreKind::Memory,
            database_url: None,
            max_connections: 1,
            session: SessionConfig {
                ttl_days: 7,
                sweep_minutes: 0,
                cookie_secure: true,
            },
            cors: CorsConfig {
                allowed_origins: vec!["http://localhost:3000".into()],
                allowed_origin_suffixes: vec![".netlify.app".into()],
                default_origin: "http://localhost:3000".into(),
            },
        };

        Self::from_parts(Arc::new(MemoryStore::new()), config).expect("fake state")
    }
}
