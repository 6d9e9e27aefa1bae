//! SQL generation through external language-model services.
//!
//! Each vendor backend implements [`TextGenerator`]. Backends are chained in
//! the configured preference order by [`FallbackGenerator`].

mod anthropic;
mod fallback;
mod openai;

pub use anthropic::AnthropicGenerator;
pub use fallback::FallbackGenerator;
pub use openai::OpenAiGenerator;

use crate::config::{LlmConfig, ProviderKind};
use crate::constants::PROVIDER_ERROR_BODY_LIMIT;
use crate::error::ServerError;
use async_trait::async_trait;
use std::sync::Arc;

/// A text-generation backend.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Send `prompt` and return the model's SQL with code fences stripped.
    async fn generate(&self, prompt: &str) -> Result<String, ServerError>;

    /// Short provider name for logs and error messages.
    fn name(&self) -> &str;
}

/// Build the generator chain described by `config`.
///
/// All backends share one HTTP client. Each provider attempt is bounded by
/// `provider_timeout`, so a hung provider falls through to the next one.
pub fn build_generator(config: &LlmConfig) -> Result<Arc<dyn TextGenerator>, ServerError> {
    let client = reqwest::Client::builder()
        .timeout(config.provider_timeout)
        .build()
        .map_err(|e| ServerError::config(format!("Failed to build HTTP client: {e}")))?;

    let backends: Vec<Arc<dyn TextGenerator>> = config
        .providers
        .iter()
        .map(|provider| -> Arc<dyn TextGenerator> {
            match provider.kind {
                ProviderKind::OpenAi => Arc::new(OpenAiGenerator::new(client.clone(), provider)),
                ProviderKind::Anthropic => {
                    Arc::new(AnthropicGenerator::new(client.clone(), provider))
                }
            }
        })
        .collect();

    match backends.len() {
        0 => Err(ServerError::config("No language-model provider configured")),
        1 => Ok(Arc::clone(&backends[0])),
        _ => Ok(Arc::new(
            FallbackGenerator::new(backends).with_attempt_timeout(config.provider_timeout),
        )),
    }
}

/// Strip surrounding whitespace and code-fence markers from model output.
///
/// Handles an opening fence with or without a language tag and a closing
/// fence. Text without fences is returned trimmed and otherwise unchanged.
pub fn strip_code_fences(text: &str) -> String {
    let mut sql = text.trim();

    if let Some(rest) = sql.strip_prefix("```") {
        // Drop the info string (e.g. "sql") on the opening line
        sql = match rest.find('\n') {
            Some(pos) if is_fence_tag(&rest[..pos]) => &rest[pos + 1..],
            _ => rest
                .strip_prefix("sql")
                .or_else(|| rest.strip_prefix("SQL"))
                .unwrap_or(rest),
        };
    }

    sql = sql.trim();
    if let Some(rest) = sql.strip_suffix("```") {
        sql = rest;
    }

    sql.trim().to_string()
}

fn is_fence_tag(line: &str) -> bool {
    let tag = line.trim();
    tag.is_empty()
        || ["sql", "postgresql", "postgres", "pgsql"]
            .iter()
            .any(|t| tag.eq_ignore_ascii_case(t))
}

/// Reject empty completions so a failure never looks like SQL.
pub(crate) fn non_empty(provider: &str, sql: String) -> Result<String, ServerError> {
    if sql.is_empty() {
        return Err(ServerError::generation(format!(
            "{provider} returned an empty completion"
        )));
    }
    Ok(sql)
}

/// Turn a non-success provider response into a generation error.
pub(crate) async fn status_error(provider: &str, resp: reqwest::Response) -> ServerError {
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    let mut end = body.len().min(PROVIDER_ERROR_BODY_LIMIT);
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    ServerError::generation(format!("{provider} HTTP {status}: {}", &body[..end]))
}
