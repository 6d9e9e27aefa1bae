//! Configuration management for the genai-sql service.
//!
//! Configuration is loaded from environment variables following the 12-factor app pattern.

use crate::constants::{
    DEFAULT_ANTHROPIC_BASE_URL, DEFAULT_ANTHROPIC_MODEL, DEFAULT_CONNECTION_TIMEOUT,
    DEFAULT_CONNECTION_TIMEOUT_SECS, DEFAULT_LLM_TIMEOUT, DEFAULT_LLM_TIMEOUT_SECS,
    DEFAULT_MAX_CONNECTIONS, DEFAULT_MAX_RESULT_ROWS, DEFAULT_OPENAI_BASE_URL,
    DEFAULT_OPENAI_MODEL, DEFAULT_PROVIDER_TIMEOUT, DEFAULT_PROVIDER_TIMEOUT_SECS,
    DEFAULT_QUERY_TIMEOUT_SECS,
};
use crate::error::ServerError;
use crate::security::SafetyMode;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Service configuration loaded from environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Database connection configuration
    pub database: DatabaseConfig,

    /// Language-model provider configuration
    pub llm: LlmConfig,

    /// Security configuration
    pub security: SecurityConfig,

    /// Query execution configuration
    pub query: QueryConfig,
}

/// Database connection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection string
    #[serde(skip_serializing)]
    pub url: String,

    /// Maximum number of pooled connections
    pub max_connections: usize,

    /// Time to wait for a pooled connection
    pub connection_timeout: Duration,

    /// Server-side `statement_timeout` for every pooled session
    pub statement_timeout: Option<Duration>,
}

/// A language-model vendor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProviderKind {
    OpenAi,
    Anthropic,
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderKind::OpenAi => write!(f, "openai"),
            ProviderKind::Anthropic => write!(f, "anthropic"),
        }
    }
}

/// Error returned when parsing a provider name fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseProviderKindError(String);

impl std::fmt::Display for ParseProviderKindError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid provider: '{}'", self.0)
    }
}

impl std::error::Error for ParseProviderKindError {}

impl std::str::FromStr for ProviderKind {
    type Err = ParseProviderKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" | "gpt" => Ok(ProviderKind::OpenAi),
            "anthropic" | "claude" => Ok(ProviderKind::Anthropic),
            _ => Err(ParseProviderKindError(s.to_string())),
        }
    }
}

/// Settings for a single provider endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub kind: ProviderKind,

    #[serde(skip_serializing)]
    pub api_key: String,

    pub model: String,

    pub base_url: String,
}

/// Language-model configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Configured providers in preference order
    pub providers: Vec<ProviderConfig>,

    /// Timeout for a whole generation call (across all fallbacks)
    pub timeout: Duration,

    /// Timeout for a single provider attempt
    pub provider_timeout: Duration,
}

/// Security configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// Safety filter mode
    pub safety_mode: SafetyMode,

    /// Run generated SQL inside a READ ONLY transaction
    pub read_only_transactions: bool,
}

/// Query execution configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Timeout for schema introspection and for execution
    pub timeout: Duration,

    /// Maximum result rows returned per query
    pub max_result_rows: usize,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// ## Required
    /// - `DATABASE_URL`: PostgreSQL connection string
    /// - `OPENAI_API_KEY` and/or `ANTHROPIC_API_KEY`: at least one provider key
    ///
    /// ## Optional
    /// - `DB_POOL_MAX`: Maximum pool connections (default: 10)
    /// - `DB_CONNECT_TIMEOUT`: Pool wait timeout in seconds (default: 30)
    /// - `OPENAI_MODEL` / `OPENAI_BASE_URL`
    /// - `ANTHROPIC_MODEL` / `ANTHROPIC_BASE_URL`
    /// - `LLM_PROVIDERS`: Preference order, comma separated (default: openai,anthropic)
    /// - `LLM_TIMEOUT_SECS`: Generation timeout in seconds, all providers together (default: 30)
    /// - `LLM_PROVIDER_TIMEOUT_SECS`: Timeout of one provider attempt in seconds (default: 12)
    /// - `QUERY_TIMEOUT_SECS`: Database timeout in seconds, also the session
    ///   `statement_timeout` (default: 30)
    /// - `MAX_ROWS`: Maximum result rows (default: 10000)
    /// - `SAFETY_MODE`: blocklist or strict (default: blocklist)
    /// - `READ_ONLY_TRANSACTIONS`: Wrap execution in READ ONLY transactions (default: false)
    pub fn from_env() -> Result<Self, ServerError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ServerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        // Required: database URL
        let url = var("DATABASE_URL")
            .ok_or_else(|| ServerError::config("DATABASE_URL environment variable is required"))?;

        let max_connections = var("DB_POOL_MAX")
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_MAX_CONNECTIONS);

        let connection_timeout_secs = var("DB_CONNECT_TIMEOUT")
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_CONNECTION_TIMEOUT_SECS);

        // Providers in preference order; unset keys are skipped
        let order: Vec<ProviderKind> = match var("LLM_PROVIDERS") {
            Some(list) => list
                .split(',')
                .filter(|s| !s.trim().is_empty())
                .map(|s| {
                    s.parse()
                        .map_err(|e| ServerError::config(format!("LLM_PROVIDERS: {e}")))
                })
                .collect::<Result<_, _>>()?,
            None => vec![ProviderKind::OpenAi, ProviderKind::Anthropic],
        };

        let mut providers = Vec::new();
        for kind in order {
            if providers.iter().any(|p: &ProviderConfig| p.kind == kind) {
                continue;
            }
            let (key_var, model_var, url_var, default_model, default_url) = match kind {
                ProviderKind::OpenAi => (
                    "OPENAI_API_KEY",
                    "OPENAI_MODEL",
                    "OPENAI_BASE_URL",
                    DEFAULT_OPENAI_MODEL,
                    DEFAULT_OPENAI_BASE_URL,
                ),
                ProviderKind::Anthropic => (
                    "ANTHROPIC_API_KEY",
                    "ANTHROPIC_MODEL",
                    "ANTHROPIC_BASE_URL",
                    DEFAULT_ANTHROPIC_MODEL,
                    DEFAULT_ANTHROPIC_BASE_URL,
                ),
            };
            if let Some(api_key) = var(key_var) {
                providers.push(ProviderConfig {
                    kind,
                    api_key,
                    model: var(model_var).unwrap_or_else(|| default_model.to_string()),
                    base_url: var(url_var)
                        .map(|u| u.trim_end_matches('/').to_string())
                        .unwrap_or_else(|| default_url.to_string()),
                });
            }
        }

        if providers.is_empty() {
            return Err(ServerError::config(
                "No language-model provider configured: set OPENAI_API_KEY or ANTHROPIC_API_KEY",
            ));
        }

        let llm_timeout_secs = var("LLM_TIMEOUT_SECS")
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_LLM_TIMEOUT_SECS);

        let provider_timeout_secs = var("LLM_PROVIDER_TIMEOUT_SECS")
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PROVIDER_TIMEOUT_SECS);

        let query_timeout_secs = var("QUERY_TIMEOUT_SECS")
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_QUERY_TIMEOUT_SECS);

        let max_result_rows = var("MAX_ROWS")
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_MAX_RESULT_ROWS);

        let safety_mode = match var("SAFETY_MODE") {
            Some(m) => m
                .parse()
                .map_err(|e| ServerError::config(format!("SAFETY_MODE: {e}")))?,
            None => SafetyMode::default(),
        };

        let read_only_transactions = var("READ_ONLY_TRANSACTIONS")
            .map(|v| v.to_lowercase() == "true" || v == "1")
            .unwrap_or(false);

        Ok(Config {
            database: DatabaseConfig {
                url,
                max_connections,
                connection_timeout: Duration::from_secs(connection_timeout_secs),
                statement_timeout: Some(Duration::from_secs(query_timeout_secs)),
            },
            llm: LlmConfig {
                providers,
                timeout: Duration::from_secs(llm_timeout_secs),
                provider_timeout: Duration::from_secs(provider_timeout_secs),
            },
            security: SecurityConfig {
                safety_mode,
                read_only_transactions,
            },
            query: QueryConfig {
                timeout: Duration::from_secs(query_timeout_secs),
                max_result_rows,
            },
        })
    }

    /// Names of the configured providers, in preference order.
    pub fn provider_names(&self) -> Vec<String> {
        self.llm.providers.iter().map(|p| p.kind.to_string()).collect()
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            providers: Vec::new(),
            timeout: DEFAULT_LLM_TIMEOUT,
            provider_timeout: DEFAULT_PROVIDER_TIMEOUT,
        }
    }
}

impl DatabaseConfig {
    /// Create a database config for the given URL with default pool settings.
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            connection_timeout: DEFAULT_CONNECTION_TIMEOUT,
            statement_timeout: None,
        }
    }
}
