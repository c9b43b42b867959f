//! Postgres-backed record store.
//!
//! All kinds share the `records` table; `(kind, id)` is the primary key and the
//! serialized record is kept in a JSONB `body` column.
//!
//! ## Error Mapping
//!
//! | SQLx error                        | StoreError      |
//! |-----------------------------------|-----------------|
//! | unique violation (`23505`)        | `Conflict`      |
//! | any other database error          | `Backend`       |
//! | pool closed, IO, protocol, ...    | `Backend`       |

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use tracing::instrument;
use uuid::Uuid;

use super::r#trait::{Record, Repository, StoreError};

const MIGRATION: &str = include_str!("../../migrations/0001_records.sql");

/// Connect to Postgres and apply the embedded schema.
pub async fn connect(database_url: &str) -> Result<PgPool, StoreError> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
        .map_err(|e| map_sqlx_error("connect", e))?;
    migrate(&pool).await?;
    Ok(pool)
}

/// Apply the schema. Idempotent.
pub async fn migrate(pool: &PgPool) -> Result<(), StoreError> {
    sqlx::raw_sql(MIGRATION)
        .execute(pool)
        .await
        .map_err(|e| map_sqlx_error("migrate", e))?;
    tracing::info!("records schema is up to date");
    Ok(())
}

/// Postgres repository for one record kind.
pub struct PostgresRepository<V> {
    pool: Arc<PgPool>,
    _record: PhantomData<fn() -> V>,
}

impl<V> Clone for PostgresRepository<V> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            _record: PhantomData,
        }
    }
}

impl<V> PostgresRepository<V> {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
            _record: PhantomData,
        }
    }
}

fn to_body<V: Record>(value: &V) -> Result<serde_json::Value, StoreError> {
    serde_json::to_value(value).map_err(|e| StoreError::Serialization(format!("{}: {e}", V::KIND)))
}

fn from_row<V: Record>(row: &sqlx::postgres::PgRow) -> Result<V, StoreError> {
    let body: serde_json::Value = row
        .try_get("body")
        .map_err(|e| StoreError::Backend(format!("failed to read body: {e}")))?;
    serde_json::from_value(body).map_err(|e| StoreError::Serialization(format!("{}: {e}", V::KIND)))
}

#[async_trait]
impl<V: Record> Repository<V> for PostgresRepository<V> {
    #[instrument(skip(self), fields(kind = V::KIND), err)]
    async fn get(&self, id: V::Id) -> Result<Option<V>, StoreError> {
        let id: Uuid = id.into();
        let row = sqlx::query("SELECT body FROM records WHERE kind = $1 AND id = $2")
            .bind(V::KIND)
            .bind(id)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get", e))?;
        row.as_ref().map(from_row::<V>).transpose()
    }

    #[instrument(skip(self), fields(kind = V::KIND), err)]
    async fn list(&self) -> Result<Vec<V>, StoreError> {
        let rows = sqlx::query("SELECT body FROM records WHERE kind = $1 ORDER BY id ASC")
            .bind(V::KIND)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list", e))?;
        rows.iter().map(from_row::<V>).collect()
    }

    #[instrument(skip(self, value), fields(kind = V::KIND, id = %value.uuid()), err)]
    async fn insert(&self, value: V) -> Result<V, StoreError> {
        let id = value.uuid();
        sqlx::query("INSERT INTO records (kind, id, body) VALUES ($1, $2, $3)")
            .bind(V::KIND)
            .bind(id)
            .bind(to_body(&value)?)
            .execute(&*self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    StoreError::Conflict { kind: V::KIND, id }
                } else {
                    map_sqlx_error("insert", e)
                }
            })?;
        Ok(value)
    }

    #[instrument(skip(self, value), fields(kind = V::KIND, id = %value.uuid()), err)]
    async fn update(&self, value: V) -> Result<V, StoreError> {
        let id = value.uuid();
        let result = sqlx::query(
            "UPDATE records SET body = $3, updated_at = NOW() WHERE kind = $1 AND id = $2",
        )
        .bind(V::KIND)
        .bind(id)
        .bind(to_body(&value)?)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound { kind: V::KIND, id });
        }
        Ok(value)
    }

    #[instrument(skip(self), fields(kind = V::KIND), err)]
    async fn delete(&self, id: V::Id) -> Result<(), StoreError> {
        let id: Uuid = id.into();
        let result = sqlx::query("DELETE FROM records WHERE kind = $1 AND id = $2")
            .bind(V::KIND)
            .bind(id)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound { kind: V::KIND, id });
        }
        Ok(())
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().as_deref() == Some("23505"),
        _ => false,
    }
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            StoreError::Backend(format!("database error in {operation}: {}", db_err.message()))
        }
        sqlx::Error::PoolClosed => StoreError::Backend(format!("connection pool closed in {operation}")),
        other => StoreError::Backend(format!("sqlx error in {operation}: {other}")),
    }
}
