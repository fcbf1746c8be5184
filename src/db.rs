use crate::config::AppConfig;
use crate::errors::ServiceError;
use metrics::{counter, gauge, histogram};
use sea_orm::{
    ConnectOptions, Database, DatabaseConnection, DatabaseTransaction, DbErr, TransactionTrait,
};
use sea_orm_migration::MigratorTrait;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Type alias for a database connection pool
pub type DbPool = DatabaseConnection;

/// Boxed future handed to [`in_transaction`] callbacks
pub type TxFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, ServiceError>> + Send + 'a>>;

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

impl From<&AppConfig> for DbConfig {
    fn from(cfg: &AppConfig) -> Self {
        Self {
            url: cfg.database_url.clone(),
            max_connections: cfg.db_max_connections,
            min_connections: cfg.db_min_connections,
            connect_timeout: Duration::from_secs(cfg.db_connect_timeout_secs),
            idle_timeout: Duration::from_secs(cfg.db_idle_timeout_secs),
            acquire_timeout: Duration::from_secs(cfg.db_acquire_timeout_secs),
        }
    }
}

/// Establishes a connection pool to the database
pub async fn establish_connection(database_url: &str) -> Result<DbPool, ServiceError> {
    let config = DbConfig {
        url: database_url.to_string(),
        ..Default::default()
    };

    establish_connection_with_config(&config).await
}

/// Establishes a connection pool to the database with custom configuration
pub async fn establish_connection_with_config(config: &DbConfig) -> Result<DbPool, ServiceError> {
    debug!(
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        "Configuring database connection"
    );

    let mut opt = ConnectOptions::new(config.url.clone());
    opt.max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(config.connect_timeout)
        .acquire_timeout(config.acquire_timeout)
        .idle_timeout(config.idle_timeout)
        .sqlx_logging(false);

    gauge!("restaurant_db.max_connections", config.max_connections as f64);

    let db_pool = Database::connect(opt).await.map_err(|e| {
        error!("Database connection establishment failed: {}", e);
        ServiceError::classify_db(e)
    })?;

    info!("Database connection pool established successfully");
    Ok(db_pool)
}

/// Establish DB pool using AppConfig tuning
pub async fn establish_connection_from_app_config(cfg: &AppConfig) -> Result<DbPool, ServiceError> {
    let db_cfg: DbConfig = cfg.into();
    establish_connection_with_config(&db_cfg).await
}

/// Runs `f` inside a single database transaction.
///
/// The transaction commits only when `f` returns `Ok`; any error, or dropping
/// the returned future before completion, rolls everything back. A failure to
/// begin is classified through [`ServiceError::classify_db`] and may be
/// transient. A failure to commit never is: the server may have applied the
/// commit before the connection dropped, so the caller must not retry.
pub async fn in_transaction<F, T>(db: &DbPool, f: F) -> Result<T, ServiceError>
where
    F: for<'c> FnOnce(&'c DatabaseTransaction) -> TxFuture<'c, T> + Send,
    T: Send,
{
    let transaction_id = Uuid::new_v4();
    let start = std::time::Instant::now();

    debug!(transaction_id = %transaction_id, "Starting database transaction");
    counter!("restaurant_db.transaction.started", 1);

    let txn = db.begin().await.map_err(ServiceError::classify_db)?;
    let result = match f(&txn).await {
        Ok(value) => txn.commit().await.map(|_| value).map_err(commit_failed),
        Err(err) => {
            if let Err(rollback_err) = txn.rollback().await {
                warn!(transaction_id = %transaction_id, error = %rollback_err, "Rollback failed");
            }
            Err(err)
        }
    };

    let elapsed = start.elapsed();
    histogram!("restaurant_db.transaction.duration", elapsed);

    match &result {
        Ok(_) => {
            counter!("restaurant_db.transaction.committed", 1);
            debug!(transaction_id = %transaction_id, "Transaction committed in {:?}", elapsed);
        }
        Err(err) => {
            counter!("restaurant_db.transaction.rolled_back", 1);
            warn!(transaction_id = %transaction_id, error = %err, "Transaction rolled back after {:?}", elapsed);
        }
    }

    result
}

/// Commit outcome is unknown, so the error is never retryable
fn commit_failed(err: DbErr) -> ServiceError {
    error!(error = %err, "Transaction commit failed; outcome unknown");
    ServiceError::DatabaseError(err)
}

/// Runs database migrations
pub async fn run_migrations(pool: &DbPool) -> Result<(), ServiceError> {
    info!("Running database migrations");
    let start = std::time::Instant::now();

    let result = crate::migrator::Migrator::up(pool, None)
        .await
        .map_err(ServiceError::DatabaseError);

    let elapsed = start.elapsed();
    match &result {
        Ok(_) => info!("Database migrations completed successfully in {:?}", elapsed),
        Err(e) => error!("Database migrations failed after {:?}: {}", elapsed, e),
    }

    result
}

/// Checks if the database connection is active
pub async fn check_connection(pool: &DbPool) -> Result<(), DbErr> {
    let start = std::time::Instant::now();
    let result = pool.ping().await;

    let elapsed = start.elapsed();
    match &result {
        Ok(_) => {
            gauge!("restaurant_db.connection_latency", elapsed.as_millis() as f64);
        }
        Err(e) => {
            error!("Database connection check failed after {:?}: {}", elapsed, e);
            counter!("restaurant_db.connection_failures", 1);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::RuntimeErr;

    #[test]
    fn commit_failures_are_not_retried() {
        let lost = || DbErr::Conn(RuntimeErr::Internal("connection reset".into()));

        assert!(ServiceError::classify_db(lost()).is_transient());
        assert!(!commit_failed(lost()).is_transient());
    }
}
