//! Server construction from configuration.

use crate::config::Config;
use crate::database::{create_pool, ConnectionPool, MetadataQueries, QueryExecutor};
use crate::error::ServerError;
use crate::generation::build_generator;
use crate::pipeline::{QueryPipeline, StageTimeouts};
use crate::security::SafetyFilter;
use std::sync::Arc;
use tracing::info;

/// The genai-sql server instance.
///
/// Cloned into every request handler; the pipeline and pool are shared.
#[derive(Clone)]
pub struct GenaiSqlServer {
    pipeline: Arc<QueryPipeline>,
    pool: Option<ConnectionPool>,
}

impl GenaiSqlServer {
    /// Create a new server instance with the given configuration.
    ///
    /// This connects to the database and builds the generator chain.
    pub async fn new(config: Config) -> Result<Self, ServerError> {
        let pool = create_pool(&config.database).await?;

        let generator = build_generator(&config.llm)?;
        info!(
            "Language-model providers: {}",
            config.provider_names().join(", ")
        );

        let catalog = Arc::new(MetadataQueries::new(pool.clone()));
        let executor = Arc::new(
            QueryExecutor::new(pool.clone(), config.query.max_result_rows)
                .with_read_only_transactions(config.security.read_only_transactions),
        );
        let filter = SafetyFilter::new(config.security.safety_mode);
        info!("Safety filter mode: {}", filter.mode());

        let pipeline = QueryPipeline::new(catalog, generator, filter, executor).with_timeouts(
            StageTimeouts {
                generation: config.llm.timeout,
                database: config.query.timeout,
            },
        );

        Ok(Self::from_parts(pipeline, pool))
    }

    /// Create a server that owns `pool` and releases it at shutdown.
    pub fn from_parts(pipeline: QueryPipeline, pool: ConnectionPool) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            pool: Some(pool),
        }
    }

    /// Create a server around an already-assembled pipeline.
    pub fn from_pipeline(pipeline: QueryPipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            pool: None,
        }
    }

    /// The question-answering pipeline.
    pub fn pipeline(&self) -> &QueryPipeline {
        &self.pipeline
    }

    /// The database connection pool, when the server owns one.
    pub fn pool(&self) -> Option<&ConnectionPool> {
        self.pool.as_ref()
    }
}
