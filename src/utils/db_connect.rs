// src/utils/db_connect.rs

use anyhow::{Context, Result};
use bb8::Pool;
use bb8_postgres::PostgresConnectionManager;
use log::info;
use std::time::Duration;
use tokio_postgres::{Config, NoTls};

use crate::utils::env::non_empty_var;

pub type PgPool = Pool<PostgresConnectionManager<NoTls>>;

/// Connection and pool settings from `POSTGRES_*` and `DB_POOL_*`.
///
/// The pool only has to cover one sync run (a pass per dataset and language,
/// each holding one connection while it writes) plus concurrent HTTP reads.
#[derive(Debug, Clone, PartialEq)]
pub struct DbConfig {
    pub host: String,
    pub port: u16,
    pub dbname: String,
    pub user: String,
    pub password: String,
    pub pool_max_size: u32,
    pub pool_min_idle: u32,
    pub checkout_timeout: Duration,
}

impl DbConfig {
    pub fn from_env() -> Self {
        let number = |key: &str, default: u32| {
            non_empty_var(key)
                .and_then(|v| v.parse::<u32>().ok())
                .filter(|n| *n > 0)
                .unwrap_or(default)
        };
        let pool_max_size = number("DB_POOL_MAX_SIZE", 10);
        Self {
            host: non_empty_var("POSTGRES_HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: non_empty_var("POSTGRES_PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(5432),
            dbname: non_empty_var("POSTGRES_DB").unwrap_or_else(|| "ips_data".to_string()),
            user: non_empty_var("POSTGRES_USER").unwrap_or_else(|| "postgres".to_string()),
            password: std::env::var("POSTGRES_PASSWORD").unwrap_or_default(),
            pool_max_size,
            pool_min_idle: number("DB_POOL_MIN_IDLE", 1).min(pool_max_size),
            checkout_timeout: Duration::from_secs(u64::from(number("DB_POOL_TIMEOUT_SECS", 30))),
        }
    }

    pub fn log_config(&self) {
        info!(
            "🗄️  Postgres {}@{}:{}/{} (pool max {}, min idle {}, checkout timeout {:?})",
            self.user,
            self.host,
            self.port,
            self.dbname,
            self.pool_max_size,
            self.pool_min_idle,
            self.checkout_timeout
        );
    }

    fn pg_config(&self) -> Config {
        let mut config = Config::new();
        config
            .host(&self.host)
            .port(self.port)
            .dbname(&self.dbname)
            .user(&self.user)
            .password(&self.password)
            .application_name(env!("CARGO_PKG_NAME"))
            .connect_timeout(Duration::from_secs(10));
        config
    }
}

/// Builds the pool and checks that a connection can run a query.
pub async fn connect(db: &DbConfig) -> Result<PgPool> {
    db.log_config();
    let manager = PostgresConnectionManager::new(db.pg_config(), NoTls);
    let pool = Pool::builder()
        .max_size(db.pool_max_size)
        .min_idle(Some(db.pool_min_idle))
        .idle_timeout(Some(Duration::from_secs(600)))
        .connection_timeout(db.checkout_timeout)
        .build(manager)
        .await
        .context("Failed to build database connection pool")?;

    {
        let conn = pool.get().await.context("No connection available from the pool")?;
        conn.query_one("SELECT 1", &[])
            .await
            .context("Database did not answer 'SELECT 1'")?;
    }
    info!("Database pool ready ({} max connections)", db.pool_max_size);
    Ok(pool)
}

/// Creates the document table if it does not exist yet.
pub async fn ensure_schema(pool: &PgPool) -> Result<()> {
    const SCHEMA_SQL: &str = "
        CREATE SCHEMA IF NOT EXISTS ips_data;
        CREATE TABLE IF NOT EXISTS ips_data.documents (
            collection  TEXT        NOT NULL,
            doc_key     TEXT        NOT NULL,
            doc         JSONB       NOT NULL,
            created_at  TIMESTAMPTZ NOT NULL DEFAULT now(),
            updated_at  TIMESTAMPTZ NOT NULL DEFAULT now(),
            PRIMARY KEY (collection, doc_key)
        );
        CREATE INDEX IF NOT EXISTS documents_collection_idx
            ON ips_data.documents (collection);
    ";

    let conn = pool
        .get()
        .await
        .context("Failed to get DB connection for ensure_schema")?;
    conn.batch_execute(SCHEMA_SQL)
        .await
        .context("Failed to create ips_data.documents")?;
    info!("Document schema ready (ips_data.documents)");
    Ok(())
}

pub fn get_pool_status(pool: &PgPool) -> (u32, u32) {
    let state = pool.state();
    (state.connections, state.idle_connections)
}
