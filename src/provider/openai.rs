// src/provider/openai.rs — OpenAI-compatible Chat Completions provider

use async_trait::async_trait;
use std::time::Duration;

use super::{ChatRequest, ChatResponse, ModelProvider, Role, TokenUsage};
use crate::infra::errors::TourneyError;

/// Wait used for a 429 that carries no usable Retry-After header.
const DEFAULT_RATE_LIMIT_MS: u64 = 5_000;

/// Provider for OpenAI and any endpoint speaking the same `/chat/completions` API.
pub struct OpenAIProvider {
    id_str: String,
    api_key: String,
    client: reqwest::Client,
    base_url: String,
}

impl OpenAIProvider {
    pub fn with_base_url(id: impl Into<String>, api_key: String, base_url: String) -> Self {
        Self {
            id_str: id.into(),
            api_key,
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Apply a per-request timeout. Without one, a hung request stalls its round.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        match reqwest::Client::builder().timeout(timeout).build() {
            Ok(client) => self.client = client,
            Err(e) => tracing::warn!("{}: could not build HTTP client with timeout: {e}", self.id_str),
        }
        self
    }

    fn provider_error(&self, message: impl Into<String>, retriable: bool) -> TourneyError {
        TourneyError::Provider {
            provider: self.id_str.clone(),
            message: message.into(),
            retriable,
        }
    }
}

/// Build the JSON request body for `/chat/completions`.
pub(crate) fn build_body(request: &ChatRequest) -> serde_json::Value {
    let mut messages = Vec::with_capacity(request.messages.len() + 1);
    if let Some(system) = &request.system {
        messages.push(serde_json::json!({
            "role": Role::System.as_str(),
            "content": system,
        }));
    }
    for m in &request.messages {
        messages.push(serde_json::json!({
            "role": m.role.as_str(),
            "content": m.content,
        }));
    }

    let mut body = serde_json::json!({
        "model": request.model,
        "messages": messages,
    });
    if let Some(max_tokens) = request.max_tokens {
        body["max_tokens"] = serde_json::json!(max_tokens);
    }
    if let Some(temp) = request.temperature {
        body["temperature"] = serde_json::json!(temp);
    }
    body
}

/// Extract content and usage from a `/chat/completions` response.
pub(crate) fn parse_response(resp: &serde_json::Value) -> Option<ChatResponse> {
    let content = resp["choices"][0]["message"]["content"].as_str()?.to_string();
    let usage = TokenUsage {
        input_tokens: resp["usage"]["prompt_tokens"].as_u64().unwrap_or(0) as u32,
        output_tokens: resp["usage"]["completion_tokens"].as_u64().unwrap_or(0) as u32,
    };
    Some(ChatResponse { content, usage })
}

/// Parse a Retry-After header given in whole seconds.
fn retry_after_ms(value: Option<&reqwest::header::HeaderValue>) -> u64 {
    value
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
        .map(|secs| secs.saturating_mul(1_000))
        .unwrap_or(DEFAULT_RATE_LIMIT_MS)
}

#[async_trait]
impl ModelProvider for OpenAIProvider {
    fn id(&self) -> &str {
        &self.id_str
    }

    fn name(&self) -> &str {
        "OpenAI-compatible"
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, TourneyError> {
        let body = build_body(&request);

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header(
                "User-Agent",
                format!("tourney/{}", env!("CARGO_PKG_VERSION")),
            )
            .json(&body)
            .send()
            .await
            .map_err(|e| self.provider_error(e.to_string(), e.is_timeout() || e.is_connect()))?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(TourneyError::RateLimited {
                provider: self.id_str.clone(),
                retry_after_ms: retry_after_ms(response.headers().get("retry-after")),
            });
        }

        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(self.provider_error(
                format!(
                    "HTTP {}: {}",
                    status,
                    crate::util::truncate_str(&error_body, 300)
                ),
                status.is_server_error(),
            ));
        }

        let resp: serde_json::Value = response
            .json()
            .await
            .map_err(|e| self.provider_error(format!("Failed to parse response: {e}"), false))?;

        let parsed = parse_response(&resp)
            .ok_or_else(|| self.provider_error("Response has no message content", false))?;

        tracing::debug!(
            provider = %self.id_str,
            tokens = parsed.usage.total(),
            "chat completed"
        );
        Ok(parsed)
    }
}
