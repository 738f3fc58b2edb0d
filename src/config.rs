use anyhow::Result;
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    /// Bootstrap super-admin: always privileged, configured outside the store.
    pub super_admin: i64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:hozur.db".to_string());

        let super_admin = env::var("SUPER_ADMIN")
            .map_err(|_| anyhow::anyhow!("SUPER_ADMIN environment variable is required"))?
            .parse::<i64>()
            .map_err(|_| anyhow::anyhow!("SUPER_ADMIN must be a numeric caller id"))?;

        Ok(Config {
            database_url,
            super_admin,
        })
    }
}
