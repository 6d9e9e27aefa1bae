//! Centralized constants for the genai-sql service.
//!
//! This module contains the default values used throughout the codebase,
//! making them easy to find, understand, and modify.

use std::time::Duration;

// =============================================================================
// Timeout Constants
// =============================================================================

/// Default language-model call timeout in seconds.
pub const DEFAULT_LLM_TIMEOUT_SECS: u64 = 30;

/// Default timeout of a single provider attempt in seconds.
///
/// Smaller than the whole-call timeout so a hung provider leaves time for
/// the next one in the chain.
pub const DEFAULT_PROVIDER_TIMEOUT_SECS: u64 = 12;

/// Default database timeout (introspection + execution) in seconds.
pub const DEFAULT_QUERY_TIMEOUT_SECS: u64 = 30;

/// Default connection timeout in seconds.
pub const DEFAULT_CONNECTION_TIMEOUT_SECS: u64 = 30;

/// Default language-model call timeout as Duration.
pub const DEFAULT_LLM_TIMEOUT: Duration = Duration::from_secs(DEFAULT_LLM_TIMEOUT_SECS);

/// Default provider attempt timeout as Duration.
pub const DEFAULT_PROVIDER_TIMEOUT: Duration =
    Duration::from_secs(DEFAULT_PROVIDER_TIMEOUT_SECS);

/// Default database timeout as Duration.
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(DEFAULT_QUERY_TIMEOUT_SECS);

/// Default connection timeout as Duration.
pub const DEFAULT_CONNECTION_TIMEOUT: Duration =
    Duration::from_secs(DEFAULT_CONNECTION_TIMEOUT_SECS);

// =============================================================================
// Connection Pool Constants
// =============================================================================

/// Default maximum connections in pool.
pub const DEFAULT_MAX_CONNECTIONS: usize = 10;

// =============================================================================
// Result Size Constants
// =============================================================================

/// Default maximum result rows.
pub const DEFAULT_MAX_RESULT_ROWS: usize = 10_000;

/// Text rendered for SQL NULL values.
pub const NULL_TEXT: &str = "NULL";

// =============================================================================
// Language Model Constants
// =============================================================================

/// Default OpenAI chat model.
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

/// Default OpenAI API base URL.
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Default Anthropic model.
pub const DEFAULT_ANTHROPIC_MODEL: &str = "claude-3-5-haiku-latest";

/// Default Anthropic API base URL.
pub const DEFAULT_ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com/v1";

/// Anthropic API version header value.
pub const ANTHROPIC_API_VERSION: &str = "2023-06-01";

/// Sampling temperature used for SQL generation.
pub const GENERATION_TEMPERATURE: f32 = 0.1;

/// Maximum completion tokens requested from providers that require a bound.
pub const GENERATION_MAX_TOKENS: u32 = 1024;

/// Maximum bytes of a provider error body kept in error messages.
pub const PROVIDER_ERROR_BODY_LIMIT: usize = 200;

// =============================================================================
// HTTP Constants
// =============================================================================

/// Default HTTP bind host.
pub const DEFAULT_HTTP_HOST: &str = "127.0.0.1";

/// Default HTTP port.
pub const DEFAULT_HTTP_PORT: u16 = 8000;

/// Default maximum request body size in bytes.
pub const DEFAULT_MAX_BODY_BYTES: usize = 64 * 1024;

// =============================================================================
// Shutdown Constants
// =============================================================================

/// Default shutdown drain timeout in seconds.
pub const DEFAULT_DRAIN_TIMEOUT_SECS: u64 = 30;

/// Default shutdown drain timeout as Duration.
pub const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_secs(DEFAULT_DRAIN_TIMEOUT_SECS);

// =============================================================================
// Logging Constants
// =============================================================================

/// Default truncation length for query logging.
pub const LOG_QUERY_TRUNCATE_LENGTH: usize = 200;
