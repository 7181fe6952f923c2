use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub database_max_connections: u32,
    pub api_keys: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("PORT must be a number")?,
            database_url: std::env::var("DATABASE_URL")
                .context("Cannot load DATABASE_URL env variable")?,
            database_max_connections: std::env::var("DATABASE_MAX_CONNECTIONS")
                .ok()
                .map(|v| v.parse())
                .transpose()
                .context("DATABASE_MAX_CONNECTIONS must be a number")?
                .unwrap_or(5),
            api_keys: std::env::var("API_KEYS").unwrap_or_default(),
        })
    }

    /// Database URL without credentials, for logging
    pub fn redacted_database_url(&self) -> &str {
        self.database_url
            .split('@')
            .next_back()
            .unwrap_or("unknown")
    }
}
