//! Postgres-backed [`ActivityStore`].
//!
//! Rows live in `at_api_activity`. The table is owned by the embedding
//! system's migrations; the shape this store expects is:
//!
//! ```sql
//! CREATE TABLE at_api_activity (
//!     id                BIGSERIAL PRIMARY KEY,
//!     ac_user_id        BIGINT    NOT NULL,
//!     ac_token          TEXT      NOT NULL,
//!     ac_api_date       TIMESTAMP NOT NULL,
//!     ac_api_name       TEXT      NOT NULL,
//!     ac_request        TEXT      NOT NULL,
//!     ac_error_request  TEXT      NOT NULL,
//!     ac_response       TEXT      NOT NULL,
//!     ac_error_response TEXT      NOT NULL,
//!     ac_created_by     BIGINT    NOT NULL,
//!     ac_created_at     TIMESTAMP NOT NULL
//! );
//! ```

use async_trait::async_trait;
use chrono::NaiveDateTime;
use outcall_activity::{ActivityRow, ActivityStore, StoreError};
use sqlx::FromRow;
use sqlx::postgres::PgPoolOptions;

const INSERT_QUERY: &str = "INSERT INTO at_api_activity \
    (ac_user_id, ac_token, ac_api_date, ac_api_name, ac_request, ac_error_request, \
     ac_response, ac_error_response, ac_created_by, ac_created_at) \
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, now())";

const FIND_BY_ACTOR_QUERY: &str = "SELECT id, ac_user_id, ac_token, ac_api_date, ac_api_name, \
    ac_request, ac_error_request, ac_response, ac_error_response, ac_created_by, ac_created_at \
    FROM at_api_activity WHERE ac_user_id = $1 ORDER BY ac_created_at DESC";

#[derive(Debug, Clone, Copy)]
pub struct PgActivityStoreOptions {
    pub max_connections: u32,
}

impl Default for PgActivityStoreOptions {
    fn default() -> Self {
        Self { max_connections: 5 }
    }
}

pub struct PgActivityStore {
    pool: sqlx::PgPool,
}

impl PgActivityStore {
    pub async fn connect(
        database_url: &str,
        options: PgActivityStoreOptions,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(options.max_connections)
            .connect(database_url)
            .await
            .map_err(db_error)?;
        Ok(Self { pool })
    }

    /// Use a pool owned by the caller.
    pub fn from_pool(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &sqlx::PgPool {
        &self.pool
    }
}

#[derive(Debug, FromRow)]
struct PgActivityRow {
    id: i64,
    ac_user_id: i64,
    ac_token: String,
    ac_api_date: NaiveDateTime,
    ac_api_name: String,
    ac_request: String,
    ac_error_request: String,
    ac_response: String,
    ac_error_response: String,
    ac_created_by: i64,
    ac_created_at: NaiveDateTime,
}

impl From<PgActivityRow> for ActivityRow {
    fn from(row: PgActivityRow) -> Self {
        Self {
            id: Some(row.id),
            actor_id: row.ac_user_id,
            token: row.ac_token,
            called_at: row.ac_api_date,
            call_name: row.ac_api_name,
            request: row.ac_request,
            error_request: row.ac_error_request,
            response: row.ac_response,
            error_response: row.ac_error_response,
            created_by: row.ac_created_by,
            created_at: Some(row.ac_created_at),
        }
    }
}

#[async_trait]
impl ActivityStore for PgActivityStore {
    async fn insert(&self, row: &ActivityRow) -> Result<u64, StoreError> {
        let result = sqlx::query(INSERT_QUERY)
            .bind(row.actor_id)
            .bind(&row.token)
            .bind(row.called_at)
            .bind(&row.call_name)
            .bind(&row.request)
            .bind(&row.error_request)
            .bind(&row.response)
            .bind(&row.error_response)
            .bind(row.created_by)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;

        tracing::debug!(
            actor_id = row.actor_id,
            call = %row.call_name,
            rows = result.rows_affected(),
            "Inserted activity"
        );
        Ok(result.rows_affected())
    }

    async fn find_by_actor(&self, actor_id: i64) -> Result<Vec<ActivityRow>, StoreError> {
        let rows: Vec<PgActivityRow> = sqlx::query_as(FIND_BY_ACTOR_QUERY)
            .bind(actor_id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(rows.into_iter().map(ActivityRow::from).collect())
    }
}

fn db_error(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::ColumnDecode { .. } | sqlx::Error::ColumnNotFound(_) => {
            StoreError::InvalidRow(err.to_string())
        }
        other => StoreError::Database(other.to_string()),
    }
}
