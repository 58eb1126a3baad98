//! 数据库访问基础设施：连接池、迁移与就绪检查

use crate::config::DatabaseConfig;
use secrecy::ExposeSecret;
use sqlx::{migrate::MigrateError, postgres::PgPoolOptions, PgPool};
use std::time::Duration;

/// PostgreSQL: undefined_table
const UNDEFINED_TABLE: &str = "42P01";

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("database connection failed: {0}")]
    Connect(#[from] sqlx::Error),

    #[error("schema migration failed: {0}")]
    Migrate(#[from] MigrateError),
}

/// 按配置建立连接池
pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool, DbError> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
        .max_lifetime(Duration::from_secs(config.max_lifetime_secs))
        .connect(config.url.expose_secret())
        .await?;

    tracing::info!(
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        "Catalog database pool ready"
    );

    Ok(pool)
}

/// 执行内嵌的目录表结构迁移
pub async fn run_migrations(pool: &PgPool) -> Result<(), DbError> {
    let migrator = sqlx::migrate!("./migrations");
    migrator.run(pool).await?;

    tracing::info!(
        migrations = migrator.iter().count(),
        "Catalog schema up to date"
    );
    Ok(())
}

/// 目录存储的就绪状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    Healthy,
    /// 数据库可连通，但目录表尚未迁移
    SchemaMissing,
    Unreachable(String),
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        matches!(self, HealthStatus::Healthy)
    }

    pub fn message(&self) -> Option<String> {
        match self {
            HealthStatus::Healthy => None,
            HealthStatus::SchemaMissing => Some("catalog tables not migrated".to_string()),
            HealthStatus::Unreachable(msg) => Some(msg.clone()),
        }
    }

    fn from_error(e: &sqlx::Error) -> Self {
        match e {
            sqlx::Error::Database(db) if db.code().as_deref() == Some(UNDEFINED_TABLE) => {
                HealthStatus::SchemaMissing
            }
            other => HealthStatus::Unreachable(other.to_string()),
        }
    }
}

/// 探测 services 表是否可读
pub async fn health_check(pool: &PgPool) -> HealthStatus {
    match sqlx::query("SELECT 1 FROM services LIMIT 1")
        .fetch_optional(pool)
        .await
    {
        Ok(_) => HealthStatus::Healthy,
        Err(e) => {
            let status = HealthStatus::from_error(&e);
            tracing::warn!(error = %e, status = ?status, "Catalog store not ready");
            status
        }
    }
}

/// 连接池指标
pub fn record_pool_metrics(pool: &PgPool) {
    let size = pool.size() as f64;
    let idle = pool.num_idle() as f64;

    metrics::gauge!("catalog_db_pool_connections", "state" => "open").set(size);
    metrics::gauge!("catalog_db_pool_connections", "state" => "idle").set(idle);
    metrics::gauge!("catalog_db_pool_connections", "state" => "in_use").set(size - idle);
}
