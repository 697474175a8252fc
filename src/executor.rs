//! Read-only query execution against PostgreSQL.
//!
//! Callers validate first; the executor still refuses anything that is not
//! read-only and caps row counts for non-aggregate statements.

use crate::error::{Nl2SqlError, Result};
use crate::helpers::{has_aggregation, summarize_query, QuerySummary};
use crate::validator::QueryValidator;
use serde::Serialize;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Column, Executor};
use std::time::{Duration, Instant};
use tracing::{error, info};

#[derive(Debug, Clone, Serialize)]
pub struct ExecutionOutcome {
    pub results: Vec<serde_json::Value>,
    pub row_count: usize,
    pub column_count: usize,
    pub columns: Vec<String>,
    pub sql_executed: String,
    /// Seconds.
    pub execution_time: f64,
    pub summary: QuerySummary,
}

#[derive(Debug, Clone)]
pub struct QueryExecutor {
    pool: PgPool,
    max_rows: usize,
    validator: QueryValidator,
}

impl QueryExecutor {
    /// Open a pool and probe it with `SELECT 1`.
    pub async fn connect(database_url: &str, max_rows: usize) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(30))
            .connect(database_url)
            .await?;

        sqlx::query("SELECT 1").execute(&pool).await?;
        info!("Connected to database");

        Ok(Self::from_pool(pool, max_rows, QueryValidator::new()))
    }

    pub fn from_pool(pool: PgPool, max_rows: usize, validator: QueryValidator) -> Self {
        Self {
            pool,
            max_rows,
            validator,
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn max_rows(&self) -> usize {
        self.max_rows
    }

    pub async fn execute(&self, sql: &str) -> Result<ExecutionOutcome> {
        if !self.validator.is_read_only(sql) {
            return Err(Nl2SqlError::InvalidInput(
                "Only SELECT queries are allowed for security reasons".to_string(),
            ));
        }

        let sql = apply_row_limit(sql.trim().trim_end_matches(';'), self.max_rows);
        let started = Instant::now();

        let described = self.pool.describe(&sql).await.map_err(|e| {
            error!("Database error describing query: {}", e);
            Nl2SqlError::from(e)
        })?;
        let columns: Vec<String> = described
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect();

        let wrapped = format!("SELECT row_to_json(q)::text FROM ({}) AS q", sql);
        let rows: Vec<String> = sqlx::query_scalar(&wrapped)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error executing query: {}", e);
                Nl2SqlError::from(e)
            })?;

        let results = rows
            .iter()
            .map(|row| serde_json::from_str(row))
            .collect::<std::result::Result<Vec<serde_json::Value>, _>>()?;

        let execution_time = started.elapsed().as_secs_f64();
        info!("Executed query: {} rows in {:.3}s", results.len(), execution_time);

        Ok(ExecutionOutcome {
            row_count: results.len(),
            column_count: columns.len(),
            summary: summarize_query(&sql, &columns, results.len()),
            columns,
            results,
            sql_executed: sql,
            execution_time,
        })
    }
}

/// Append `LIMIT max_rows` unless the statement has a LIMIT or aggregates.
pub fn apply_row_limit(sql: &str, max_rows: usize) -> String {
    if sql.to_uppercase().contains("LIMIT") || has_aggregation(sql) {
        sql.to_string()
    } else {
        format!("{} LIMIT {}", sql, max_rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_row_limit() {
        assert_eq!(
            apply_row_limit("SELECT * FROM users", 100),
            "SELECT * FROM users LIMIT 100"
        );
        assert_eq!(
            apply_row_limit("SELECT * FROM users LIMIT 5", 100),
            "SELECT * FROM users LIMIT 5"
        );
        assert_eq!(
            apply_row_limit("SELECT count(*) FROM users", 100),
            "SELECT count(*) FROM users"
        );
    }

    #[tokio::test]
    async fn test_connect_failure_is_database_error() {
        let err = QueryExecutor::connect("not-a-url", 100).await.unwrap_err();
        assert!(matches!(err, Nl2SqlError::Database(_)));
    }
}
