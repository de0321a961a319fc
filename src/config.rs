use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::Path;
use thiserror::Error;
use tracing::info;
use validator::Validate;

const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_PORT: u16 = 8080;
const CONFIG_DIR: &str = "config";
const DEFAULT_HEARTBEAT_SECS: u64 = 30;
const DEFAULT_CLIENT_CHANNEL_CAPACITY: usize = 64;
const DEV_DEFAULT_JWT_SECRET: &str =
    "this_is_a_development_secret_key_that_is_at_least_64_characters_long_for_testing";

/// Realtime (SSE) channel tuning
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct RealtimeConfig {
    /// Interval between keepalive comment frames, in seconds
    #[serde(default = "default_heartbeat_secs")]
    pub heartbeat_secs: u64,

    /// Per-client buffered event capacity; a client that falls this far
    /// behind is treated as dead and pruned on the next broadcast
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            heartbeat_secs: default_heartbeat_secs(),
            channel_capacity: default_channel_capacity(),
        }
    }
}

/// Application configuration with validation
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Database connection URL
    pub database_url: String,

    /// JWT secret key (minimum 32 characters)
    #[validate(length(min = 32))]
    pub jwt_secret: String,

    /// JWT access-token expiration in seconds
    #[serde(default = "default_jwt_expiration")]
    pub jwt_expiration: u64,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Application environment
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Logging level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,

    /// Whether to run database migrations on startup
    #[serde(default)]
    pub auto_migrate: bool,

    /// Comma-separated list of allowed CORS origins; unset means permissive
    /// CORS in development and a startup error elsewhere
    #[serde(default)]
    pub cors_allowed_origins: Option<String>,

    /// Maximum database connections
    #[serde(default = "default_db_max_connections")]
    pub db_max_connections: u32,

    /// Minimum database connections
    #[serde(default = "default_db_min_connections")]
    pub db_min_connections: u32,

    /// Realtime channel configuration
    #[serde(default)]
    pub realtime: RealtimeConfig,
}

fn default_heartbeat_secs() -> u64 {
    DEFAULT_HEARTBEAT_SECS
}
fn default_channel_capacity() -> usize {
    DEFAULT_CLIENT_CHANNEL_CAPACITY
}
fn default_jwt_expiration() -> u64 {
    60 * 60 * 8
}
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_environment() -> String {
    DEFAULT_ENV.to_string()
}
fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}
fn default_db_max_connections() -> u32 {
    10
}
fn default_db_min_connections() -> u32 {
    1
}

#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("configuration loading failed: {0}")]
    Load(#[from] ConfigError),

    #[error("configuration validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

impl AppConfig {
    /// Construct a configuration programmatically (used by tests)
    pub fn new(database_url: String, jwt_secret: String, environment: String) -> Self {
        Self {
            database_url,
            jwt_secret,
            jwt_expiration: default_jwt_expiration(),
            host: default_host(),
            port: default_port(),
            environment,
            log_level: default_log_level(),
            log_json: false,
            auto_migrate: false,
            cors_allowed_origins: None,
            db_max_connections: default_db_max_connections(),
            db_min_connections: default_db_min_connections(),
            realtime: RealtimeConfig::default(),
        }
    }

    pub fn is_development(&self) -> bool {
        self.environment.eq_ignore_ascii_case("development") || self.environment.eq_ignore_ascii_case("test")
    }

    pub fn log_level(&self) -> &str {
        &self.log_level
    }
}

/// Loads configuration from `config/{default,<env>}.toml` plus `APP__*`
/// environment variable overrides
pub fn load_config() -> Result<AppConfig, ConfigurationError> {
    let environment = env::var("APP__ENVIRONMENT").unwrap_or_else(|_| DEFAULT_ENV.to_string());

    let mut builder = Config::builder()
        .set_default("environment", environment.clone())?
        .set_default("database_url", "sqlite://marketbooth.db?mode=rwc")?;

    if environment.eq_ignore_ascii_case(DEFAULT_ENV) {
        builder = builder.set_default("jwt_secret", DEV_DEFAULT_JWT_SECRET)?;
    }

    let default_path = Path::new(CONFIG_DIR).join("default.toml");
    let env_path = Path::new(CONFIG_DIR).join(format!("{environment}.toml"));

    let cfg: AppConfig = builder
        .add_source(File::from(default_path).required(false))
        .add_source(File::from(env_path).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?
        .try_deserialize()?;

    cfg.validate()?;
    info!(environment = %cfg.environment, "configuration loaded");
    Ok(cfg)
}

/// Initializes the tracing subscriber. Called once at startup.
pub fn init_tracing(log_level: &str, json: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));

    if json {
        let _ = fmt().with_env_filter(filter).json().try_init();
    } else {
        let _ = fmt().with_env_filter(filter).try_init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_jwt_secret_fails_validation() {
        let cfg = AppConfig::new(
            "sqlite::memory:".into(),
            "too-short".into(),
            "test".into(),
        );
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn defaults_are_applied() {
        let cfg = AppConfig::new(
            "sqlite::memory:".into(),
            "a_sufficiently_long_secret_key_for_testing_purposes".into(),
            "test".into(),
        );
        assert_eq!(cfg.port, DEFAULT_PORT);
        assert_eq!(cfg.realtime.heartbeat_secs, DEFAULT_HEARTBEAT_SECS);
        assert!(cfg.validate().is_ok());
    }
}
