use anyhow::Context;

use crate::auth::services::ensure_admin;
use crate::config::AppConfig;
use crate::store::{memory::MemoryStore, postgres::PgStore, ParkingStore};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ParkingStore>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let store: Arc<dyn ParkingStore> = if config.uses_memory_store() {
            tracing::warn!("using in-memory store; data is lost on restart");
            Arc::new(MemoryStore::new())
        } else {
            let db = sqlx::postgres::PgPoolOptions::new()
                .max_connections(10)
                .connect(&config.database_url)
                .await
                .context("connecting to postgres")?;
            sqlx::migrate!("./migrations")
                .run(&db)
                .await
                .context("running migrations")?;
            Arc::new(PgStore::new(db))
        };

        ensure_admin(store.as_ref(), &config.admin)
            .await
            .context("seeding admin account")?;

        Ok(Self::from_parts(store, config))
    }

    pub fn from_parts(store: Arc<dyn ParkingStore>, config: Arc<AppConfig>) -> Self {
        Self { store, config }
    }

    #[cfg(test)]
    pub fn fake() -> Self {
        use crate::config::{AdminSeed, JwtConfig};

        let config = Arc::new(AppConfig {
            database_url: "memory://".into(),
            jwt: JwtConfig {
                secret: "test".into(),
                issuer: "test".into(),
                audience: "test".into(),
                ttl_minutes: 5,
            },
            admin: AdminSeed {
                username: "admin".into(),
                email: "admin@parkspot.local".into(),
                password: "admin".into(),
            },
        });

        Self::from_parts(Arc::new(MemoryStore::new()), config)
    }
}
