use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

/// Credentials for the administrator account created at startup.
#[derive(Debug, Clone, Deserialize)]
pub struct AdminSeed {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// A `postgres://` URL, or `memory://` for a non-persistent store.
    pub database_url: String,
    pub jwt: JwtConfig,
    pub admin: AdminSeed,
}

fn var_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.into())
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: var_or("JWT_ISSUER", "parkspot"),
            audience: var_or("JWT_AUDIENCE", "parkspot-users"),
            ttl_minutes: std::env::var("JWT_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60 * 12),
        };
        let admin = AdminSeed {
            username: var_or("ADMIN_USERNAME", "admin"),
            email: var_or("ADMIN_EMAIL", "admin@parkspot.local"),
            password: var_or("ADMIN_PASSWORD", "admin"),
        };
        Ok(Self {
            database_url,
            jwt,
            admin,
        })
    }

    pub fn uses_memory_store(&self) -> bool {
        self.database_url.starts_with("memory:")
    }
}
