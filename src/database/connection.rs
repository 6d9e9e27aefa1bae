//! Connection pool management for PostgreSQL.

use crate::config::DatabaseConfig;
use crate::error::ServerError;
use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod, Runtime};
use tokio_postgres::NoTls;
use tracing::{debug, info};

/// Type alias for the connection pool.
pub type ConnectionPool = Pool;

/// Parse the connection string and apply session settings.
///
/// With a statement timeout set, the server cancels any statement that runs
/// past it, so a request that gave up does not leave its query holding a
/// pooled connection.
pub fn connect_config(config: &DatabaseConfig) -> Result<tokio_postgres::Config, ServerError> {
    let mut pg_config: tokio_postgres::Config = config
        .url
        .parse()
        .map_err(|e| ServerError::config(format!("Invalid DATABASE_URL: {}", e)))?;

    if let Some(limit) = config.statement_timeout {
        let setting = format!("-c statement_timeout={}", limit.as_millis());
        let options = match pg_config.get_options() {
            Some(existing) if !existing.trim().is_empty() => format!("{existing} {setting}"),
            _ => setting,
        };
        pg_config.options(options);
    }

    Ok(pg_config)
}

/// Build a connection pool from configuration without connecting.
pub fn build_pool(config: &DatabaseConfig) -> Result<ConnectionPool, ServerError> {
    let pg_config = connect_config(config)?;

    let manager = Manager::from_config(
        pg_config,
        NoTls,
        ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        },
    );

    Pool::builder(manager)
        .max_size(config.max_connections)
        .wait_timeout(Some(config.connection_timeout))
        .create_timeout(Some(config.connection_timeout))
        .runtime(Runtime::Tokio1)
        .build()
        .map_err(|e| ServerError::connection_with_source("Failed to create connection pool", e))
}

/// Create a connection pool and verify that a connection can be established.
pub async fn create_pool(config: &DatabaseConfig) -> Result<ConnectionPool, ServerError> {
    info!(
        "Creating connection pool (max: {})",
        config.max_connections
    );

    let pool = build_pool(config)?;

    // Test the pool by getting a connection
    {
        let _conn = pool.get().await.map_err(|e| {
            ServerError::connection(format!("Failed to establish initial connection: {}", e))
        })?;
        debug!("Initial connection test successful");
    }

    info!("Connection pool created successfully");
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_invalid_url_is_config_error() {
        let config = DatabaseConfig::with_url("not a url at all ::");
        let err = build_pool(&config).unwrap_err();
        assert!(matches!(err, ServerError::Config(_)));
    }

    #[test]
    fn test_statement_timeout_option() {
        let mut config = DatabaseConfig::with_url("postgres://user:pw@localhost/db");
        assert_eq!(connect_config(&config).unwrap().get_options(), None);

        config.statement_timeout = Some(Duration::from_secs(5));
        assert_eq!(
            connect_config(&config).unwrap().get_options(),
            Some("-c statement_timeout=5000")
        );
    }

    #[test]
    fn test_statement_timeout_keeps_url_options() {
        let mut config = DatabaseConfig::with_url(
            "postgres://user:pw@localhost/db?options=-c%20search_path%3Dsales",
        );
        config.statement_timeout = Some(Duration::from_millis(1500));
        assert_eq!(
            connect_config(&config).unwrap().get_options(),
            Some("-c search_path=sales -c statement_timeout=1500")
        );
    }

    #[tokio::test]
    async fn test_build_pool_is_lazy() {
        // Nothing listens here; building must still succeed without connecting.
        let config = DatabaseConfig::with_url("postgres://user:pw@127.0.0.1:1/db");
        let pool = build_pool(&config).unwrap();
        assert_eq!(pool.status().max_size, config.max_connections);
    }
}
