//! PostgreSQL connection pool management.

use std::str::FromStr;

use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions, PgSslMode};
use tracing::info;

use ynews_core::config::DatabaseConfig;
use ynews_core::error::{AppError, ErrorKind};

/// Wrapper around the sqlx PostgreSQL connection pool.
#[derive(Debug, Clone)]
pub struct DatabasePool {
    /// The underlying sqlx connection pool.
    pool: PgPool,
}

impl DatabasePool {
    /// Create a new database pool from configuration.
    ///
    /// Fails if the server cannot be reached within the configured timeout.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, AppError> {
        info!(
            target_db = %config,
            max_connections = config.max_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.connect_timeout())
            .connect_with(connect_options(config)?)
            .await
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Database,
                    format!("Failed to connect to database: {e}"),
                    e,
                )
            })?;

        info!("Successfully connected to PostgreSQL");
        Ok(Self { pool })
    }

    /// Return a reference to the underlying sqlx pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Round-trip a trivial query; unreachable databases are reported as
    /// `ServiceUnavailable`.
    pub async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::ServiceUnavailable,
                    format!("Database health check failed: {e}"),
                    e,
                )
            })?;
        Ok(())
    }

    /// Close all connections in the pool.
    pub async fn close(&self) {
        self.pool.close().await;
        info!("Database pool closed");
    }
}

/// Build sqlx connect options from discrete connection parameters.
pub fn connect_options(config: &DatabaseConfig) -> Result<PgConnectOptions, AppError> {
    let ssl_mode = PgSslMode::from_str(&config.ssl_mode).map_err(|e| {
        AppError::with_source(
            ErrorKind::Configuration,
            format!("Unknown database SSL mode '{}'", config.ssl_mode),
            e,
        )
    })?;

    Ok(PgConnectOptions::new()
        .host(&config.host)
        .port(config.port)
        .username(&config.user)
        .password(&config.password)
        .database(&config.name)
        .ssl_mode(ssl_mode))
}
