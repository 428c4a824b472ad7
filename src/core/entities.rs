// src/core/entities.rs — Entity Source: asks the oracle for the candidate pool

use std::sync::Arc;

use crate::cache::{CacheStore, CacheValue};
use crate::core::types::generation_key;
use crate::infra::errors::TourneyError;
use crate::provider::{ChatRequest, ModelProvider};

/// Produces the initial list of entities for a theme.
pub struct EntitySource {
    provider: Arc<dyn ModelProvider>,
    model: String,
    cache: Arc<CacheStore>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

impl EntitySource {
    pub fn new(provider: Arc<dyn ModelProvider>, model: String, cache: Arc<CacheStore>) -> Self {
        Self {
            provider,
            model,
            cache,
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn with_sampling(mut self, temperature: Option<f32>, max_tokens: Option<u32>) -> Self {
        self.temperature = temperature;
        // Lists need more room than a single verdict.
        self.max_tokens = max_tokens.map(|m| m.max(1_024));
        self
    }

    /// Generate up to `n` well-known entities for `theme`.
    ///
    /// Cached per (theme, n): repeated calls never reach the oracle. An oracle
    /// failure or an empty answer is a `Generation` error and nothing is cached.
    pub async fn generate(&self, n: usize, theme: &str) -> Result<Vec<String>, TourneyError> {
        let key = generation_key(n);
        if let Some(items) = self.cache.get(theme, &key).as_ref().and_then(CacheValue::as_list) {
            if !items.is_empty() {
                tracing::debug!(theme, n, "entity list served from cache");
                return Ok(items.to_vec());
            }
        }

        let mut request = ChatRequest::instruct(
            self.model.clone(),
            format!("You are a helpful assistant generating lists of {theme}."),
            format!(
                "Generate a list of {n} well-known {theme}. \
                 Respond with only the names or titles, separated by commas."
            ),
        );
        request.temperature = self.temperature;
        request.max_tokens = self.max_tokens;

        let response = self.provider.chat(request).await.map_err(|e| {
            tracing::error!(theme, "entity generation failed: {e}");
            TourneyError::Generation {
                theme: theme.to_string(),
                message: e.to_string(),
            }
        })?;

        let entities = parse_entity_list(&response.content, n);
        if entities.is_empty() {
            tracing::error!(
                theme,
                response = crate::util::truncate_str(&response.content, 200),
                "oracle returned no usable entities"
            );
            return Err(TourneyError::Generation {
                theme: theme.to_string(),
                message: "the oracle returned no usable names".into(),
            });
        }
        if entities.len() < n {
            tracing::warn!(theme, requested = n, got = entities.len(), "short entity list");
        }

        if let Err(e) = self
            .cache
            .set(theme, &key, CacheValue::List(entities.clone()))
        {
            tracing::warn!(theme, "could not cache entity list: {e}");
        }
        Ok(entities)
    }
}

/// Split a comma-separated answer into at most `n` distinct names.
pub fn parse_entity_list(content: &str, n: usize) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for raw in content.split([',', '\n']) {
        let name = clean_name(raw);
        if name.is_empty() || out.iter().any(|e| e == name) {
            continue;
        }
        out.push(name.to_string());
        if out.len() == n {
            break;
        }
    }
    out
}

/// Strip list markers ("1.", "-", "*"), wrapping quotes and a trailing period.
fn clean_name(raw: &str) -> &str {
    let mut s = raw.trim();
    s = s.trim_start_matches(['-', '*', '•']).trim_start();

    let digits = s.len() - s.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    if digits > 0 {
        let rest = &s[digits..];
        if let Some(stripped) = rest.strip_prefix(['.', ')']) {
            s = stripped.trim_start();
        }
    }

    s = s.trim_end_matches('.');
    for (open, close) in [('"', '"'), ('\'', '\''), ('“', '”')] {
        if s.len() >= 2 && s.starts_with(open) && s.ends_with(close) {
            s = &s[open.len_utf8()..s.len() - close.len_utf8()];
            break;
        }
    }
    s.trim()
}
