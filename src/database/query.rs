//! Query execution and result handling.

use crate::constants::{LOG_QUERY_TRUNCATE_LENGTH, NULL_TEXT};
use crate::database::ConnectionPool;
use crate::error::ServerError;
use async_trait::async_trait;
use futures_util::{pin_mut, TryStreamExt};
use std::time::Instant;
use tokio_postgres::{Client, SimpleQueryMessage, SimpleQueryRow};
use tracing::debug;

/// Result of a query execution, with every value rendered as text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryResult {
    /// Column names in order.
    pub columns: Vec<String>,

    /// Result rows, each aligned with `columns`.
    pub rows: Vec<Vec<String>>,

    /// Whether results were truncated due to the row limit.
    pub truncated: bool,

    /// Execution time in milliseconds.
    pub execution_time_ms: u64,
}

impl QueryResult {
    /// Create a result from column names and rows.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            columns,
            rows,
            truncated: false,
            execution_time_ms: 0,
        }
    }
}

/// Executes filtered SQL against a database.
#[async_trait]
pub trait QueryRunner: Send + Sync {
    /// Run `sql` and materialize its columns and text-coerced rows.
    async fn execute(&self, sql: &str) -> Result<QueryResult, ServerError>;
}

/// Query executor backed by the connection pool.
pub struct QueryExecutor {
    pool: ConnectionPool,
    max_rows: usize,
    read_only_transactions: bool,
}

impl QueryExecutor {
    /// Create a new query executor.
    pub fn new(pool: ConnectionPool, max_rows: usize) -> Self {
        Self {
            pool,
            max_rows,
            read_only_transactions: false,
        }
    }

    /// Run every statement inside a `READ ONLY` transaction.
    pub fn with_read_only_transactions(mut self, enabled: bool) -> Self {
        self.read_only_transactions = enabled;
        self
    }
}

#[async_trait]
impl QueryRunner for QueryExecutor {
    async fn execute(&self, sql: &str) -> Result<QueryResult, ServerError> {
        let start = Instant::now();

        debug!(
            "Executing query: {}",
            truncate_for_log(sql, LOG_QUERY_TRUNCATE_LENGTH)
        );

        let mut conn = self.pool.get().await?;

        let mut result = if self.read_only_transactions {
            let client: &mut tokio_postgres::Client = &mut conn;
            let tx = client.build_transaction().read_only(true).start().await?;
            let result = run_statement(tx.client(), sql, self.max_rows).await?;
            tx.commit().await?;
            result
        } else {
            run_statement(&conn, sql, self.max_rows).await?
        };

        result.execution_time_ms = start.elapsed().as_millis() as u64;

        debug!(
            "Query completed: {} rows in {} ms",
            result.rows.len(),
            result.execution_time_ms
        );

        Ok(result)
    }
}

/// Run a single statement and collect its rows as server-rendered text.
///
/// Reading stops after `max_rows` rows.
async fn run_statement(
    client: &Client,
    sql: &str,
    max_rows: usize,
) -> Result<QueryResult, ServerError> {
    // Extended protocol rejects more than one statement per prepare
    let statement = client.prepare(sql).await?;

    let columns: Vec<String> = statement
        .columns()
        .iter()
        .map(|c| c.name().to_string())
        .collect();

    // Simple protocol returns every value in its text output form
    let stream = client.simple_query_raw(sql).await?;
    pin_mut!(stream);

    let mut rows = Vec::new();
    let mut truncated = false;

    while let Some(message) = stream.try_next().await? {
        let SimpleQueryMessage::Row(row) = message else {
            continue;
        };
        if rows.len() >= max_rows {
            truncated = true;
            break;
        }
        rows.push(row_text(&row)?);
    }

    Ok(QueryResult {
        columns,
        rows,
        truncated,
        execution_time_ms: 0,
    })
}

fn row_text(row: &SimpleQueryRow) -> Result<Vec<String>, ServerError> {
    (0..row.len())
        .map(|idx| -> Result<String, ServerError> {
            Ok(row
                .try_get(idx)?
                .map_or_else(|| NULL_TEXT.to_string(), str::to_string))
        })
        .collect()
}

/// Truncate a string for logging purposes.
pub(crate) fn truncate_for_log(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        let mut end = max_len;
        while !s.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &s[..end])
    }
}
