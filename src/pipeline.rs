//! The question-to-result pipeline.
//!
//! Stages run in a fixed order: validate, describe, generate, filter,
//! execute. The first failing stage ends the request and nothing is retried.

use crate::constants::LOG_QUERY_TRUNCATE_LENGTH;
use crate::database::{describe_schema, truncate_for_log, Catalog, QueryRunner};
use crate::error::ServerError;
use crate::generation::TextGenerator;
use crate::prompts::build_prompt;
use crate::security::SafetyFilter;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Body of a query request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    pub question: String,
}

/// Body of a successful query response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryResponse {
    pub sql: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// Present only when rows were capped.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub truncated: bool,
}

/// Stage timeouts.
#[derive(Debug, Clone, Copy)]
pub struct StageTimeouts {
    /// Bound on the generation call.
    pub generation: Duration,
    /// Bound on schema description and on execution, each.
    pub database: Duration,
}

impl Default for StageTimeouts {
    fn default() -> Self {
        Self {
            generation: crate::constants::DEFAULT_LLM_TIMEOUT,
            database: crate::constants::DEFAULT_QUERY_TIMEOUT,
        }
    }
}

/// Runs one question through every stage.
#[derive(Clone)]
pub struct QueryPipeline {
    catalog: Arc<dyn Catalog>,
    generator: Arc<dyn TextGenerator>,
    filter: SafetyFilter,
    runner: Arc<dyn QueryRunner>,
    timeouts: StageTimeouts,
}

impl QueryPipeline {
    pub fn new(
        catalog: Arc<dyn Catalog>,
        generator: Arc<dyn TextGenerator>,
        filter: SafetyFilter,
        runner: Arc<dyn QueryRunner>,
    ) -> Self {
        Self {
            catalog,
            generator,
            filter,
            runner,
            timeouts: StageTimeouts::default(),
        }
    }

    /// Override the stage timeouts.
    pub fn with_timeouts(mut self, timeouts: StageTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Answer a natural-language question.
    pub async fn answer(&self, question: &str) -> Result<QueryResponse, ServerError> {
        if question.trim().is_empty() {
            return Err(ServerError::invalid_input("Question cannot be empty."));
        }

        let schema = bounded(
            "schema introspection",
            self.timeouts.database,
            describe_schema(self.catalog.as_ref()),
        )
        .await?;
        debug!(schema_bytes = schema.len(), "Schema described");

        let prompt = build_prompt(&schema, question);
        let sql = bounded(
            "generation",
            self.timeouts.generation,
            self.generator.generate(&prompt),
        )
        .await?;
        debug!(
            provider = self.generator.name(),
            sql = %truncate_for_log(&sql, LOG_QUERY_TRUNCATE_LENGTH),
            "SQL generated"
        );

        if let Err(e) = self.filter.check(&sql) {
            warn!(
                sql = %truncate_for_log(&sql, LOG_QUERY_TRUNCATE_LENGTH),
                "Rejected generated SQL"
            );
            return Err(e);
        }

        let result = bounded(
            "query execution",
            self.timeouts.database,
            self.runner.execute(&sql),
        )
        .await?;
        debug!(
            rows = result.rows.len(),
            truncated = result.truncated,
            elapsed_ms = result.execution_time_ms,
            "Query executed"
        );

        Ok(QueryResponse {
            sql,
            columns: result.columns,
            rows: result.rows,
            truncated: result.truncated,
        })
    }
}

/// Run `fut` under a deadline, mapping expiry to a timeout error.
async fn bounded<T, F>(stage: &'static str, limit: Duration, fut: F) -> Result<T, ServerError>
where
    F: Future<Output = Result<T, ServerError>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(ServerError::timeout(stage, limit.as_secs())),
    }
}
