//! PostgreSQL connection pool
//!
//! The pool is built straight from [`DatabaseConfig`], so every tuning knob
//! the config carries (connection bounds, acquire/idle timeouts) takes
//! effect instead of being shadowed by local defaults.

use rentflow_core::config::DatabaseConfig;
use rentflow_core::{AppError, AppResult};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;
use tracing::{info, warn};

/// Translate database configuration into pool options
fn pool_options(config: &DatabaseConfig) -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .idle_timeout(Some(Duration::from_secs(config.idle_timeout_secs)))
        .test_before_acquire(true)
}

/// Create a PostgreSQL connection pool from configuration
///
/// Connects and then runs a probe query before handing the pool out, so a
/// misconfigured URL fails at startup rather than on the first request.
pub async fn create_pool(config: &DatabaseConfig) -> AppResult<PgPool> {
    info!(
        "Creating database pool ({}-{} connections)",
        config.min_connections, config.max_connections
    );

    let pool = pool_options(config)
        .connect(&config.url)
        .await
        .map_err(|e| {
            warn!("Failed to create database pool: {}", e);
            AppError::Pool(format!("Failed to connect to database: {}", e))
        })?;

    sqlx::query("SELECT 1")
        .execute(&pool)
        .await
        .map_err(|e| AppError::Database(format!("Database health check failed: {}", e)))?;

    info!("Database connection verified");

    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(url: &str) -> DatabaseConfig {
        DatabaseConfig {
            url: url.to_string(),
            max_connections: 7,
            min_connections: 2,
            acquire_timeout_secs: 3,
            idle_timeout_secs: 120,
        }
    }

    #[test]
    fn test_pool_options_follow_config() {
        let opts = pool_options(&config("postgresql://localhost/rentflow"));
        assert_eq!(opts.get_max_connections(), 7);
        assert_eq!(opts.get_min_connections(), 2);
        assert_eq!(opts.get_acquire_timeout(), Duration::from_secs(3));
        assert_eq!(opts.get_idle_timeout(), Some(Duration::from_secs(120)));
    }

    #[tokio::test]
    #[ignore] // Requires database
    async fn test_create_pool() {
        let url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "postgresql://localhost/rentflow".to_string());

        let result = create_pool(&config(&url)).await;
        assert!(result.is_ok());
    }
}
