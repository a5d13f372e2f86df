use std::sync::Arc;

use crate::{
    auth::{jwt::JwtKeys, repo::UserStore},
    config::{AppConfig, CookieConfig, JwtConfig, StoreBackend},
    db::PgStore,
    memory::MemoryStore,
    tasks::repo::TaskStore,
};

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub tasks: Arc<dyn TaskStore>,
    pub keys: JwtKeys,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let config = Arc::new(config);
        let (users, tasks): (Arc<dyn UserStore>, Arc<dyn TaskStore>) = match &config.store {
            StoreBackend::Postgres {
                database_url,
                max_connections,
            } => {
                let pg = PgStore::connect(database_url, *max_connections).await?;
                pg.migrate().await?;
                (Arc::new(pg.clone()), Arc::new(pg))
            }
            StoreBackend::Memory => {
                tracing::warn!("using in-memory store; data is lost on restart");
                let mem = MemoryStore::new();
                (Arc::new(mem.clone()), Arc::new(mem))
            }
        };
        Ok(Self::from_parts(users, tasks, config))
    }

    pub fn from_parts(
        users: Arc<dyn UserStore>,
        tasks: Arc<dyn TaskStore>,
        config: Arc<AppConfig>,
    ) -> Self {
        let keys = JwtKeys::new(&config.jwt);
        Self {
            users,
            tasks,
            keys,
            config,
        }
    }

    /// State over a fresh `MemoryStore` with a fixed test secret.
    pub fn in_memory() -> Self {
        let config = Arc::new(AppConfig {
            store: StoreBackend::Memory,
            jwt: JwtConfig {
                secret: "test-secret".into(),
                issuer: "test-issuer".into(),
                audience: "test-aud".into(),
                ttl_minutes: 60 * 24 * 7,
            },
            cookie: CookieConfig {
                name: "Authorization".into(),
                secure: false,
            },
            host: "127.0.0.1".into(),
            port: 0,
        });
        let mem = MemoryStore::new();
        Self::from_parts(Arc::new(mem.clone()), Arc::new(mem), config)
    }
}
