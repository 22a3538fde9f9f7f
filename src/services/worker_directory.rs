use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::{postgres::PgPoolOptions, FromRow, PgPool};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::config::DatabaseConfig;
use crate::scope::ScopePredicate;

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Worker row as stored in the `workers` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct WorkerRecord {
    pub id: i64,
    pub username: Option<String>,
    pub name: String,
    pub dni: Option<String>,
    pub phone: Option<String>,
    pub status: Option<String>,
    pub role: String,
    pub id_site: Option<i64>,
    pub id_subsite: Option<i64>,
}

/// Read-only access to worker/user records.
///
/// Callers hand in the scope's predicate; implementations apply it and must
/// not widen it.
#[async_trait]
pub trait WorkerDirectory: Send + Sync {
    async fn list_workers(&self, predicate: &ScopePredicate) -> Result<Vec<WorkerRecord>, DirectoryError>;

    async fn find_principal(&self, id: i64) -> Result<Option<WorkerRecord>, DirectoryError>;

    async fn health_check(&self) -> Result<(), DirectoryError>;
}

const WORKER_COLUMNS: &str = "id, username, name, dni, phone, status, role, id_site, id_subsite";

/// Postgres-backed directory
pub struct PgDirectory {
    pool: PgPool,
}

impl PgDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Build a lazily connecting pool; nothing touches the network until the first query
    pub fn connect_lazy(config: &DatabaseConfig) -> Result<Self, DirectoryError> {
        let url = config
            .url
            .as_deref()
            .ok_or(DirectoryError::ConfigMissing("DATABASE_URL"))?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect_lazy(url)?;

        info!("Created lazy database pool (max {} connections)", config.max_connections);
        Ok(Self::new(pool))
    }
}

#[async_trait]
impl WorkerDirectory for PgDirectory {
    async fn list_workers(&self, predicate: &ScopePredicate) -> Result<Vec<WorkerRecord>, DirectoryError> {
        let (where_clause, params) = predicate.to_sql(1);
        let sql = format!(
            "SELECT {} FROM workers WHERE {} AND deleted_at IS NULL ORDER BY id",
            WORKER_COLUMNS, where_clause
        );
        tracing::debug!("Listing workers: {} {:?}", sql, params);

        let mut query = sqlx::query_as::<_, WorkerRecord>(&sql);
        for param in params {
            query = query.bind(param);
        }
        Ok(query.fetch_all(&self.pool).await?)
    }

    async fn find_principal(&self, id: i64) -> Result<Option<WorkerRecord>, DirectoryError> {
        let sql = format!(
            "SELECT {} FROM workers WHERE id = $1 AND deleted_at IS NULL",
            WORKER_COLUMNS
        );
        let record = sqlx::query_as::<_, WorkerRecord>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(record)
    }

    async fn health_check(&self) -> Result<(), DirectoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Directory over a fixed set of records, used without a database and in tests
#[derive(Debug, Clone, Default)]
pub struct InMemoryDirectory {
    workers: Vec<WorkerRecord>,
}

impl InMemoryDirectory {
    pub fn new(workers: Vec<WorkerRecord>) -> Self {
        Self { workers }
    }
}

#[async_trait]
impl WorkerDirectory for InMemoryDirectory {
    async fn list_workers(&self, predicate: &ScopePredicate) -> Result<Vec<WorkerRecord>, DirectoryError> {
        Ok(self
            .workers
            .iter()
            .filter(|w| predicate.matches(w.id_site, w.id_subsite))
            .cloned()
            .collect())
    }

    async fn find_principal(&self, id: i64) -> Result<Option<WorkerRecord>, DirectoryError> {
        Ok(self.workers.iter().find(|w| w.id == id).cloned())
    }

    async fn health_check(&self) -> Result<(), DirectoryError> {
        Ok(())
    }
}
