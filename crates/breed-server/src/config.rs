//! Configuration management
//!
//! Everything comes from the process environment, with a `.env` file in the
//! working directory loaded first when present.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::middleware::rate_limit::RateLimitConfig;

// ============================================================================
// Server Configuration Constants
// ============================================================================

/// Default server host binding.
pub const DEFAULT_SERVER_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_SERVER_PORT: u16 = 8280;

/// Default shutdown timeout in seconds.
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 15;

/// Default maximum database connections in the pool.
pub const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 10;

/// Default minimum database connections in the pool.
pub const DEFAULT_DATABASE_MIN_CONNECTIONS: u32 = 1;

/// Default database connection timeout in seconds.
pub const DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default database idle timeout in seconds (10 minutes).
pub const DEFAULT_DATABASE_IDLE_TIMEOUT_SECS: u64 = 600;

/// Default CORS allowed origin.
pub const DEFAULT_CORS_ALLOWED_ORIGIN: &str = "*";

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub cors: CorsConfig,
    pub rate_limit: RateLimitConfig,
}

/// Server-specific configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub shutdown_timeout_secs: u64,
}

impl ServerConfig {
    /// Address the listener binds to
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid bind address {}:{}: {}", self.host, self.port, e))
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
    pub idle_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: DEFAULT_DATABASE_MAX_CONNECTIONS,
            min_connections: DEFAULT_DATABASE_MIN_CONNECTIONS,
            connect_timeout_secs: DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS,
            idle_timeout_secs: DEFAULT_DATABASE_IDLE_TIMEOUT_SECS,
        }
    }
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    pub allow_credentials: bool,
}

impl CorsConfig {
    /// True when any origin is accepted
    pub fn allows_any_origin(&self) -> bool {
        self.allowed_origins.is_empty() || self.allowed_origins.iter().any(|o| o == "*")
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

/// Load `.env` from the working directory (or a parent) into the process
/// environment
///
/// Variables already set are left alone. A missing file is not an error.
/// Call this before anything else reads the environment, logging included.
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

impl Config {
    /// Load configuration from environment and defaults
    pub fn load() -> anyhow::Result<Self> {
        load_dotenv();

        let port = std::env::var("BREED_PORT")
            .or_else(|_| std::env::var("PORT"))
            .ok()
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(DEFAULT_SERVER_PORT);

        let config = Config {
            server: ServerConfig {
                host: std::env::var("BREED_HOST").unwrap_or_else(|_| DEFAULT_SERVER_HOST.to_string()),
                port,
                shutdown_timeout_secs: env_or("BREED_SHUTDOWN_TIMEOUT", DEFAULT_SHUTDOWN_TIMEOUT_SECS),
            },
            database: DatabaseConfig {
                url: std::env::var("DATABASE_URL")
                    .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?,
                max_connections: env_or("DATABASE_MAX_CONNECTIONS", DEFAULT_DATABASE_MAX_CONNECTIONS),
                min_connections: env_or("DATABASE_MIN_CONNECTIONS", DEFAULT_DATABASE_MIN_CONNECTIONS),
                connect_timeout_secs: env_or(
                    "DATABASE_CONNECT_TIMEOUT",
                    DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS,
                ),
                idle_timeout_secs: env_or("DATABASE_IDLE_TIMEOUT", DEFAULT_DATABASE_IDLE_TIMEOUT_SECS),
            },
            cors: CorsConfig {
                allowed_origins: std::env::var("CORS_ALLOWED_ORIGINS")
                    .unwrap_or_else(|_| DEFAULT_CORS_ALLOWED_ORIGIN.to_string())
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
                allow_credentials: env_or("CORS_ALLOW_CREDENTIALS", false),
            },
            rate_limit: RateLimitConfig::from_env(),
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.server.port == 0 {
            anyhow::bail!("Server port must be greater than 0");
        }

        if self.database.url.is_empty() {
            anyhow::bail!("Database URL cannot be empty");
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

        // Browsers reject credentialed responses carrying `*`.
        if self.cors.allow_credentials && self.cors.allows_any_origin() {
            anyhow::bail!("CORS_ALLOW_CREDENTIALS requires explicit CORS_ALLOWED_ORIGINS");
        }

        self.rate_limit.validate()?;

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: DEFAULT_SERVER_HOST.to_string(),
                port: DEFAULT_SERVER_PORT,
                shutdown_timeout_secs: DEFAULT_SHUTDOWN_TIMEOUT_SECS,
            },
            database: DatabaseConfig::default(),
            cors: CorsConfig {
                allowed_origins: vec![DEFAULT_CORS_ALLOWED_ORIGIN.to_string()],
                allow_credentials: false,
            },
            rate_limit: RateLimitConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const ENV_KEYS: &[&str] = &[
        "BREED_HOST",
        "BREED_PORT",
        "PORT",
        "BREED_SHUTDOWN_TIMEOUT",
        "DATABASE_URL",
        "DATABASE_MAX_CONNECTIONS",
        "DATABASE_MIN_CONNECTIONS",
        "DATABASE_CONNECT_TIMEOUT",
        "DATABASE_IDLE_TIMEOUT",
        "CORS_ALLOWED_ORIGINS",
        "CORS_ALLOW_CREDENTIALS",
        "RATE_LIMIT_ENABLED",
        "RATE_LIMIT_REQUESTS_PER_SECOND",
        "RATE_LIMIT_BURST_SIZE",
    ];

    /// Restores the captured variables when dropped
    struct EnvSnapshot(Vec<(&'static str, Option<String>)>);

    impl EnvSnapshot {
        fn capture(keys: &[&'static str]) -> Self {
            Self(keys.iter().map(|k| (*k, std::env::var(k).ok())).collect())
        }
    }

    impl Drop for EnvSnapshot {
        fn drop(&mut self) {
            for (key, value) in &self.0 {
                match value {
                    Some(v) => std::env::set_var(key, v),
                    None => std::env::remove_var(key),
                }
            }
        }
    }

    fn clear_env() -> EnvSnapshot {
        let snapshot = EnvSnapshot::capture(ENV_KEYS);
        for key in ENV_KEYS {
            std::env::remove_var(key);
        }
        snapshot
    }

    fn valid_config() -> Config {
        Config {
            database: DatabaseConfig {
                url: "postgres://localhost/breeds".to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    #[serial]
    fn test_load_defaults() {
        let _env = clear_env();
        std::env::set_var("DATABASE_URL", "postgres://localhost/breeds");

        let config = Config::load().unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8280);
        assert_eq!(config.server.shutdown_timeout(), Duration::from_secs(15));
        assert_eq!(config.database.max_connections, 10);
        assert_eq!(config.database.min_connections, 1);
        assert_eq!(config.cors.allowed_origins, vec!["*"]);
        assert!(!config.cors.allow_credentials);
        assert!(config.rate_limit.enabled);
    }

    #[test]
    #[serial]
    fn test_load_requires_database_url() {
        let _env = clear_env();

        let err = Config::load().unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL"));
    }

    #[test]
    #[serial]
    fn test_port_fallback_order() {
        let _env = clear_env();
        std::env::set_var("DATABASE_URL", "postgres://localhost/breeds");
        std::env::set_var("PORT", "9000");

        assert_eq!(Config::load().unwrap().server.port, 9000);

        std::env::set_var("BREED_PORT", "9100");
        assert_eq!(Config::load().unwrap().server.port, 9100);
    }

    #[test]
    #[serial]
    fn test_load_overrides() {
        let _env = clear_env();
        std::env::set_var("DATABASE_URL", "postgres://db/breeds");
        std::env::set_var("DATABASE_MAX_CONNECTIONS", "4");
        std::env::set_var("CORS_ALLOWED_ORIGINS", "https://a.example, https://b.example");
        std::env::set_var("CORS_ALLOW_CREDENTIALS", "true");

        let config = Config::load().unwrap();
        assert_eq!(config.database.max_connections, 4);
        assert_eq!(
            config.cors.allowed_origins,
            vec!["https://a.example", "https://b.example"]
        );
        assert!(config.cors.allow_credentials);
    }

    #[test]
    #[serial]
    fn test_clear_env_restores_previous_values() {
        std::env::set_var("DATABASE_URL", "postgres://outer/breeds");
        std::env::remove_var("BREED_PORT");

        {
            let _env = clear_env();
            std::env::set_var("BREED_PORT", "9100");
            assert!(std::env::var("DATABASE_URL").is_err());
        }

        assert_eq!(std::env::var("DATABASE_URL").unwrap(), "postgres://outer/breeds");
        assert!(std::env::var("BREED_PORT").is_err());
        std::env::remove_var("DATABASE_URL");
    }

    #[test]
    #[serial]
    fn test_load_dotenv_feeds_logging_config() {
        use breed_common::logging::{LogConfig, LogLevel};

        let _env = EnvSnapshot::capture(&["LOG_LEVEL"]);
        std::env::remove_var("LOG_LEVEL");

        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".env"), "LOG_LEVEL=debug\n").unwrap();
        let cwd = std::env::current_dir().unwrap();
        std::env::set_current_dir(dir.path()).unwrap();

        load_dotenv();
        let level = LogConfig::from_env().map(|c| c.level);

        std::env::set_current_dir(cwd).unwrap();
        assert_eq!(level.unwrap(), LogLevel::Debug);
    }

    #[test]
    fn test_validate_accepts_defaults_with_url() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_port() {
        let mut config = valid_config();
        config.server.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_min_above_max() {
        let mut config = valid_config();
        config.database.min_connections = 20;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("min_connections"));
    }

    #[test]
    fn test_validate_rejects_credentials_with_wildcard() {
        let mut config = valid_config();
        config.cors.allow_credentials = true;
        assert!(config.validate().is_err());

        config.cors.allowed_origins = vec!["https://a.example".to_string()];
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_rate() {
        let mut config = valid_config();
        config.rate_limit.requests_per_second = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_socket_addr() {
        let config = valid_config();
        assert_eq!(
            config.server.socket_addr().unwrap(),
            "0.0.0.0:8280".parse::<SocketAddr>().unwrap()
        );

        let mut bad = valid_config();
        bad.server.host = "not a host".to_string();
        assert!(bad.server.socket_addr().is_err());
    }
}
