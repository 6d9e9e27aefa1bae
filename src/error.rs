//! Error types for the genai-sql service.
//!
//! Every pipeline stage fails fast with one of these variants. The HTTP
//! layer maps each variant to a status code in [`ServerError::status_code`].

use axum::http::StatusCode;
use thiserror::Error;

/// Domain errors for the question-to-SQL pipeline.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Connection error
    #[error("Connection error: {message}")]
    Connection {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Invalid client input (e.g. blank question)
    #[error("{0}")]
    InvalidInput(String),

    /// The language-model service failed or returned nothing usable
    #[error("SQL generation failed: {0}")]
    Generation(String),

    /// Generated SQL was rejected by the safety filter
    #[error("{message}")]
    PolicyViolation {
        message: String,
        detail: Option<String>,
    },

    /// The database rejected the SQL
    #[error("SQL execution error: {message}")]
    Execution {
        message: String,
        sql_state: Option<String>,
    },

    /// A bounded stage ran past its deadline
    #[error("{stage} timed out after {timeout_seconds} seconds")]
    Timeout {
        stage: &'static str,
        timeout_seconds: u64,
    },

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServerError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection {
            message: msg.into(),
            source: None,
        }
    }

    /// Create a connection error with a source.
    pub fn connection_with_source(
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Connection {
            message: msg.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an invalid input error.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a generation error.
    pub fn generation(msg: impl Into<String>) -> Self {
        Self::Generation(msg.into())
    }

    /// Create a policy violation with the generic read-only message.
    pub fn not_read_only(detail: Option<String>) -> Self {
        Self::PolicyViolation {
            message: "Generated SQL is not read-only.".to_string(),
            detail,
        }
    }

    /// Create a query execution error.
    pub fn execution(msg: impl Into<String>) -> Self {
        Self::Execution {
            message: msg.into(),
            sql_state: None,
        }
    }

    /// Create a query execution error carrying a SQLSTATE code.
    pub fn execution_with_state(msg: impl Into<String>, state: impl Into<String>) -> Self {
        Self::Execution {
            message: msg.into(),
            sql_state: Some(state.into()),
        }
    }

    /// Create a timeout error.
    pub fn timeout(stage: &'static str, seconds: u64) -> Self {
        Self::Timeout {
            stage,
            timeout_seconds: seconds,
        }
    }

    /// Create an internal error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Short machine-readable category for error responses.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Connection { .. } => "connection",
            Self::InvalidInput(_) => "invalid_input",
            Self::Generation(_) => "generation",
            Self::PolicyViolation { .. } => "policy_violation",
            Self::Execution { .. } => "execution",
            Self::Timeout { .. } => "timeout",
            Self::Internal(_) => "internal",
        }
    }

    /// HTTP status for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidInput(_) | Self::PolicyViolation { .. } | Self::Execution { .. } => {
                StatusCode::BAD_REQUEST
            }
            Self::Generation(_) => StatusCode::BAD_GATEWAY,
            Self::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            Self::Connection { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Self::Config(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<tokio_postgres::Error> for ServerError {
    fn from(e: tokio_postgres::Error) -> Self {
        if let Some(db) = e.as_db_error() {
            return ServerError::execution_with_state(db.message(), db.code().code());
        }
        if e.is_closed() {
            return ServerError::connection_with_source("Connection closed", e);
        }
        ServerError::execution(e.to_string())
    }
}

impl From<deadpool_postgres::PoolError> for ServerError {
    fn from(e: deadpool_postgres::PoolError) -> Self {
        ServerError::connection_with_source("Pool error", e)
    }
}

impl From<reqwest::Error> for ServerError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            return ServerError::generation(format!("provider request timed out: {e}"));
        }
        ServerError::generation(format!("provider request failed: {e}"))
    }
}
