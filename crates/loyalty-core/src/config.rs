//! Service configuration
//!
//! Both binaries load their settings with the `config` crate from, in
//! increasing priority: built-in defaults, an optional `config/<service>`
//! file, `LOYALTY__*` environment variables and the conventional variables
//! `RUN_ADDRESS`, `DATABASE_URI`, `ACCRUAL_SYSTEM_ADDRESS` and `SECRET_KEY`.

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::time::Duration;

const ENV_PREFIX: &str = "LOYALTY";

/// Accrual service configuration
#[derive(Debug, Deserialize, Clone)]
pub struct AccrualConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub accrual: AccrualSettings,
}

/// Mart service configuration
#[derive(Debug, Deserialize, Clone)]
pub struct MartConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub sync: SyncConfig,
}

/// HTTP server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Full `host:port` address, wins over `host`/`port` when set
    #[serde(default)]
    pub address: Option<String>,

    /// Number of worker threads
    #[serde(default = "default_workers")]
    pub workers: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_workers() -> usize {
    num_cpus::get()
}

impl ServerConfig {
    /// Address to bind the HTTP server to
    ///
    /// A bare `:port` address binds all interfaces.
    pub fn bind_addr(&self) -> String {
        match self.address.as_deref().map(str::trim) {
            Some(addr) if addr.starts_with(':') => format!("0.0.0.0{}", addr),
            Some(addr) if !addr.is_empty() => addr.to_string(),
            _ => format!("{}:{}", self.host, self.port),
        }
    }
}

/// Database configuration
#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Connection acquire timeout in seconds
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,
}

fn default_max_connections() -> u32 {
    10
}

fn default_acquire_timeout() -> u64 {
    30
}

/// Worker pool and lookup throttling
#[derive(Debug, Deserialize, Clone)]
pub struct AccrualSettings {
    /// Number of workers consuming the task queue
    #[serde(default = "default_accrual_workers")]
    pub workers: usize,

    /// Task queue capacity
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Sustained status lookups per second
    #[serde(default = "default_rate_limit_per_second")]
    pub rate_limit_per_second: u32,

    /// Lookups allowed in a burst
    #[serde(default = "default_rate_limit_burst")]
    pub rate_limit_burst: u32,
}

fn default_accrual_workers() -> usize {
    1
}

fn default_queue_capacity() -> usize {
    1024
}

fn default_rate_limit_per_second() -> u32 {
    5
}

fn default_rate_limit_burst() -> u32 {
    60
}

impl Default for AccrualSettings {
    fn default() -> Self {
        Self {
            workers: default_accrual_workers(),
            queue_capacity: default_queue_capacity(),
            rate_limit_per_second: default_rate_limit_per_second(),
            rate_limit_burst: default_rate_limit_burst(),
        }
    }
}

/// Authentication configuration
#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    /// JWT signing secret
    pub jwt_secret: String,

    /// JWT lifetime in seconds
    #[serde(default = "default_jwt_expiration")]
    pub jwt_expiration_secs: i64,
}

fn default_jwt_expiration() -> i64 {
    86400 // 24 hours
}

/// Order sync poller configuration
#[derive(Debug, Deserialize, Clone)]
pub struct SyncConfig {
    /// Base URL of the Accrual service
    pub accrual_address: String,

    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Interval used after the Accrual service rate-limited a tick
    #[serde(default = "default_backoff_interval")]
    pub backoff_interval_secs: u64,

    /// Timeout of a single lookup request
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_poll_interval() -> u64 {
    10
}

fn default_backoff_interval() -> u64 {
    60
}

fn default_request_timeout() -> u64 {
    5
}

impl SyncConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }

    pub fn backoff_interval(&self) -> Duration {
        Duration::from_secs(self.backoff_interval_secs.max(1))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

/// Defaults and sources shared by both services
fn base_builder(
    service: &str,
    default_port: u16,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", i64::from(default_port))?
        .set_default("server.workers", num_cpus::get() as i64)?
        .set_default("database.max_connections", 10)?
        .set_default("database.acquire_timeout_secs", 30)?
        .add_source(File::with_name(&format!("config/{}", service)).required(false))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        )
        // Conventional variables
        .set_override_option("server.address", env::var("RUN_ADDRESS").ok())?
        .set_override_option("database.url", env::var("DATABASE_URI").ok())
}

impl AccrualConfig {
    /// Load configuration from environment and optional `config/accrual` file
    pub fn load() -> Result<Self, ConfigError> {
        let config = Self::with_defaults(base_builder("accrual", 8081)?)?.build()?;
        config.try_deserialize()
    }

    fn with_defaults(
        builder: ConfigBuilder<DefaultState>,
    ) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        builder
            .set_default("accrual.workers", 1)?
            .set_default("accrual.queue_capacity", 1024)?
            .set_default("accrual.rate_limit_per_second", 5)?
            .set_default("accrual.rate_limit_burst", 60)
    }
}

impl MartConfig {
    /// Load configuration from environment and optional `config/mart` file
    pub fn load() -> Result<Self, ConfigError> {
        let config = Self::with_defaults(base_builder("mart", 8080)?)?
            .set_override_option("sync.accrual_address", env::var("ACCRUAL_SYSTEM_ADDRESS").ok())?
            .set_override_option("auth.jwt_secret", env::var("SECRET_KEY").ok())?
            .build()?;
        config.try_deserialize()
    }

    fn with_defaults(
        builder: ConfigBuilder<DefaultState>,
    ) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        builder
            .set_default("auth.jwt_expiration_secs", 86400)?
            .set_default("sync.poll_interval_secs", 10)?
            .set_default("sync.backoff_interval_secs", 60)?
            .set_default("sync.request_timeout_secs", 5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    fn from_toml<T: serde::de::DeserializeOwned>(
        toml: &str,
        with_defaults: fn(ConfigBuilder<DefaultState>) -> Result<ConfigBuilder<DefaultState>, ConfigError>,
    ) -> Result<T, ConfigError> {
        with_defaults(Config::builder())?
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?
            .try_deserialize()
    }

    #[test]
    fn test_accrual_defaults() {
        let config: AccrualConfig = from_toml(
            r#"
            [server]
            port = 8081
            [database]
            url = "postgres://localhost/accrual"
            "#,
            AccrualConfig::with_defaults,
        )
        .unwrap();

        assert_eq!(config.accrual.workers, 1);
        assert_eq!(config.accrual.queue_capacity, 1024);
        assert_eq!(config.accrual.rate_limit_per_second, 5);
        assert_eq!(config.accrual.rate_limit_burst, 60);
        assert_eq!(config.database.max_connections, 10);
        assert_eq!(config.server.bind_addr(), "0.0.0.0:8081");
    }

    #[test]
    fn test_mart_requires_accrual_address() {
        let result: Result<MartConfig, _> = from_toml(
            r#"
            [server]
            [database]
            url = "postgres://localhost/mart"
            [auth]
            jwt_secret = "secret"
            [sync]
            "#,
            MartConfig::with_defaults,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_mart_sync_defaults() {
        let config: MartConfig = from_toml(
            r#"
            [server]
            address = ":8080"
            [database]
            url = "postgres://localhost/mart"
            [auth]
            jwt_secret = "secret"
            [sync]
            accrual_address = "http://localhost:8081"
            "#,
            MartConfig::with_defaults,
        )
        .unwrap();

        assert_eq!(config.sync.poll_interval(), Duration::from_secs(10));
        assert_eq!(config.sync.backoff_interval(), Duration::from_secs(60));
        assert_eq!(config.sync.request_timeout(), Duration::from_secs(5));
        assert_eq!(config.auth.jwt_expiration_secs, 86400);
        assert_eq!(config.server.bind_addr(), "0.0.0.0:8080");
    }

    #[test]
    fn test_bind_addr_prefers_address() {
        let server = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 9000,
            address: Some("localhost:8080".to_string()),
            workers: 1,
        };
        assert_eq!(server.bind_addr(), "localhost:8080");

        let server = ServerConfig {
            address: None,
            ..server
        };
        assert_eq!(server.bind_addr(), "127.0.0.1:9000");
    }
}
