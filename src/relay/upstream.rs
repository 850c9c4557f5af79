use serde::{Deserialize, Serialize};

use crate::model::config::RelayConfig;
use crate::relay::history::WireMessage;

/// Classified failure from the hosted completion API.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UpstreamError {
    /// The requested model id is unknown to the service (fallback advances)
    #[error("model not available: {0}")]
    ModelNotFound(String),
    #[error("invalid credential: {0}")]
    BadCredential(String),
    #[error("rate limited: {0}")]
    RateLimited(String),
    #[error("upstream error: {0}")]
    Other(String),
}

/// Classify an upstream failure by substring match on its error message,
/// falling back to the HTTP status code for terse bodies.
pub fn classify(status: u16, body: &str) -> UpstreamError {
    let text = body.to_lowercase();
    let has = |needles: &[&str]| needles.iter().any(|n| text.contains(n));

    if has(&["not found", "does not exist", "unknown model", "is not supported"]) {
        return UpstreamError::ModelNotFound(body.to_string());
    }
    if has(&["api key", "unauthorized", "invalid authentication", "permission denied"]) {
        return UpstreamError::BadCredential(body.to_string());
    }
    if has(&["rate limit", "quota", "too many requests", "resource exhausted"]) {
        return UpstreamError::RateLimited(body.to_string());
    }
    match status {
        404 => UpstreamError::ModelNotFound(body.to_string()),
        401 | 403 => UpstreamError::BadCredential(body.to_string()),
        429 => UpstreamError::RateLimited(body.to_string()),
        _ => UpstreamError::Other(body.to_string()),
    }
}

/// Anything that can answer a completion request for a named model.
/// The fallback loop is generic over this so it can be tested offline.
pub trait CompletionBackend {
    fn complete(
        &self,
        model: &str,
        messages: &[WireMessage],
    ) -> impl Future<Output = Result<String, UpstreamError>> + Send;
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [WireMessage],
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: String,
}

/// HTTP client for the hosted completion API (OpenAI-compatible surface).
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HttpBackend {
    /// Build from config; the API key comes from the configured env var.
    pub fn from_config(config: &RelayConfig) -> Result<HttpBackend, UpstreamError> {
        let api_key = std::env::var(&config.api_key_env).map_err(|_| {
            UpstreamError::BadCredential(format!("api key not set (${})", config.api_key_env))
        })?;
        Ok(HttpBackend {
            client: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }
}

impl CompletionBackend for HttpBackend {
    async fn complete(
        &self,
        model: &str,
        messages: &[WireMessage],
    ) -> Result<String, UpstreamError> {
        let url = format!("{}/chat/completions", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&CompletionRequest { model, messages })
            .send()
            .await
            .map_err(|e| UpstreamError::Other(e.to_string()))?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            let body = response.text().await.unwrap_or_default();
            return Err(classify(status, &body));
        }

        let parsed: CompletionResponse = response
            .json()
            .await
            .map_err(|e| UpstreamError::Other(format!("malformed upstream response: {e}")))?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| UpstreamError::Other("upstream returned no choices".to_string()))
    }
}
