use crate::config::AppConfig;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use sea_orm_migration::MigratorTrait;
use std::time::Duration;
use tracing::{debug, info};

/// Type alias for a database connection pool
pub type DbPool = DatabaseConnection;

/// Configuration for database connection
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout: Duration,
    pub idle_timeout: Duration,
    pub acquire_timeout: Duration,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: 10,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
            acquire_timeout: Duration::from_secs(8),
        }
    }
}

/// Establishes a connection pool to the database
pub async fn establish_connection(database_url: &str) -> Result<DbPool, DbErr> {
    let config = DbConfig {
        url: database_url.to_string(),
        ..Default::default()
    };
    establish_connection_with_config(&config).await
}

/// Establishes a connection pool with custom configuration
pub async fn establish_connection_with_config(config: &DbConfig) -> Result<DbPool, DbErr> {
    debug!("configuring database connection: {:?}", config);

    let mut opt = ConnectOptions::new(config.url.clone());
    opt.max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(config.connect_timeout)
        .acquire_timeout(config.acquire_timeout)
        .idle_timeout(config.idle_timeout)
        .sqlx_logging(false);

    info!(
        max_connections = config.max_connections,
        "connecting to database"
    );

    Database::connect(opt).await
}

/// Establishes a connection using application config values
pub async fn establish_connection_from_app_config(cfg: &AppConfig) -> Result<DbPool, DbErr> {
    let config = DbConfig {
        url: cfg.database_url.clone(),
        max_connections: cfg.db_max_connections,
        min_connections: cfg.db_min_connections,
        ..Default::default()
    };
    establish_connection_with_config(&config).await
}

/// Runs all pending migrations
pub async fn run_migrations(db: &DatabaseConnection) -> Result<(), DbErr> {
    info!("running database migrations");
    crate::migrator::Migrator::up(db, None).await
}
