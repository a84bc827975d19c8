//! Configuration management
//!
//! Loaded from a `.env` file (if present) and the process environment.

use serde::{Deserialize, Serialize};

// ============================================================================
// Ingestion Configuration Constants
// ============================================================================

/// Rows transformed and written per bulk insert.
pub const DEFAULT_CHUNK_SIZE: usize = 500;

/// CSV files larger than this skip up-front row counting (15 MiB).
pub const DEFAULT_MAX_ESTIMATE_BYTES: u64 = 15 * 1024 * 1024;

/// Default maximum database connections in the pool.
pub const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 10;

/// Default minimum database connections in the pool.
pub const DEFAULT_DATABASE_MIN_CONNECTIONS: u32 = 1;

/// Default database connection timeout in seconds.
pub const DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Leadflow configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub ingest: IngestConfig,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Connection URL. `None` leaves uploads without a record store.
    pub url: Option<String>,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
}

/// Pipeline tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    pub chunk_size: usize,
    pub max_estimate_bytes: u64,
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.parse().ok())
}

impl Config {
    /// Load configuration from environment and defaults
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Config {
            database: DatabaseConfig {
                url: std::env::var("DATABASE_URL")
                    .ok()
                    .filter(|url| !url.trim().is_empty()),
                max_connections: env_parse("DATABASE_MAX_CONNECTIONS")
                    .unwrap_or(DEFAULT_DATABASE_MAX_CONNECTIONS),
                min_connections: env_parse("DATABASE_MIN_CONNECTIONS")
                    .unwrap_or(DEFAULT_DATABASE_MIN_CONNECTIONS),
                connect_timeout_secs: env_parse("DATABASE_CONNECT_TIMEOUT")
                    .unwrap_or(DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS),
            },
            ingest: IngestConfig {
                chunk_size: env_parse("LEADFLOW_CHUNK_SIZE").unwrap_or(DEFAULT_CHUNK_SIZE),
                max_estimate_bytes: env_parse("LEADFLOW_MAX_ESTIMATE_BYTES")
                    .unwrap_or(DEFAULT_MAX_ESTIMATE_BYTES),
            },
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.ingest.chunk_size == 0 {
            anyhow::bail!("Chunk size must be greater than 0");
        }

        if self.database.max_connections == 0 {
            anyhow::bail!("Database max_connections must be greater than 0");
        }

        if self.database.min_connections > self.database.max_connections {
            anyhow::bail!(
                "Database min_connections ({}) cannot be greater than max_connections ({})",
                self.database.min_connections,
                self.database.max_connections
            );
        }

        if self.database.url.is_none() {
            tracing::warn!(
                "DATABASE_URL is not configured - uploads will fail until a record store is available"
            );
        }

        Ok(())
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: DEFAULT_DATABASE_MAX_CONNECTIONS,
            min_connections: DEFAULT_DATABASE_MIN_CONNECTIONS,
            connect_timeout_secs: DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS,
        }
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_estimate_bytes: DEFAULT_MAX_ESTIMATE_BYTES,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            ingest: IngestConfig::default(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.ingest.chunk_size, 500);
        assert_eq!(config.ingest.max_estimate_bytes, 15 * 1024 * 1024);
        assert!(config.database.url.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_chunk_size() {
        let mut config = Config::default();
        config.ingest.chunk_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_inverted_pool_bounds() {
        let mut config = Config::default();
        config.database.min_connections = 20;
        assert!(config.validate().is_err());
    }

    #[test]
    #[serial]
    fn test_load_from_env() {
        std::env::set_var("DATABASE_URL", "postgresql://localhost/leadflow_test");
        std::env::set_var("LEADFLOW_CHUNK_SIZE", "250");

        let config = Config::load().unwrap();
        assert_eq!(config.ingest.chunk_size, 250);
        assert_eq!(
            config.database.url.as_deref(),
            Some("postgresql://localhost/leadflow_test")
        );

        std::env::remove_var("DATABASE_URL");
        std::env::remove_var("LEADFLOW_CHUNK_SIZE");
    }

    #[test]
    #[serial]
    fn test_blank_database_url_is_missing() {
        std::env::set_var("DATABASE_URL", "   ");
        let config = Config::load().unwrap();
        assert!(config.database.url.is_none());
        std::env::remove_var("DATABASE_URL");
    }

    #[test]
    #[serial]
    fn test_pool_settings_from_env() {
        std::env::set_var("DATABASE_MAX_CONNECTIONS", "25");
        std::env::set_var("DATABASE_MIN_CONNECTIONS", "5");
        std::env::set_var("DATABASE_CONNECT_TIMEOUT", "30");

        let config = Config::load().unwrap();
        assert_eq!(config.database.max_connections, 25);
        assert_eq!(config.database.min_connections, 5);
        assert_eq!(config.database.connect_timeout_secs, 30);

        std::env::remove_var("DATABASE_MAX_CONNECTIONS");
        std::env::remove_var("DATABASE_MIN_CONNECTIONS");
        std::env::remove_var("DATABASE_CONNECT_TIMEOUT");
    }
}
