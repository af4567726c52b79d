//! Text generation collaborator.
//!
//! The pipeline only needs one operation from a language model:
//! `complete(prompt, temperature, max_tokens)`. It is used for query
//! decomposition, history-based query rewriting and borderline mode
//! classification. Callers treat it as unreliable and always have a
//! degradation path.
//!
//! [`OpenAiGenerator`] talks to any OpenAI-compatible `/chat/completions`
//! endpoint. Some models reject custom sampling parameters, so the request
//! shape depends on the model family and a rejected parameter triggers one
//! retry with defaults.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::GenerationConfig;
use crate::error::{Result, SiftError};

/// A text completion backend.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Complete `prompt` and return the generated text.
    ///
    /// # Errors
    ///
    /// Returns [`SiftError::Generation`] on request failure or an empty
    /// response, and [`SiftError::Timeout`] when the request times out.
    async fn complete(&self, prompt: &str, temperature: f64, max_tokens: u32) -> Result<String>;
}

/// Which sampling parameters a model family accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParamSupport {
    /// Temperature and max_tokens are both sent.
    Full,
    /// Temperature only; max_tokens is left to the server.
    TemperatureOnly,
    /// Neither parameter is sent.
    None,
}

impl ParamSupport {
    fn for_model(model: &str) -> Self {
        let model = model.to_lowercase();
        if model.starts_with("o1") {
            Self::None
        } else if model.starts_with("gpt-4") {
            Self::TemperatureOnly
        } else {
            Self::Full
        }
    }
}

/// Build the chat completions request body for `model`.
///
/// `None` for either parameter means "use the server default" and the key
/// is omitted.
pub fn build_chat_request(
    model: &str,
    prompt: &str,
    temperature: Option<f64>,
    max_tokens: Option<u32>,
) -> serde_json::Value {
    let mut body = serde_json::json!({
        "model": model,
        "messages": [{"role": "user", "content": prompt}],
    });

    if let Some(obj) = body.as_object_mut() {
        if let Some(temp) = temperature {
            obj.insert("temperature".into(), serde_json::json!(temp));
        }
        if let Some(max_tokens) = max_tokens {
            obj.insert("max_tokens".into(), serde_json::json!(max_tokens));
        }
    }

    body
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

/// OpenAI-compatible chat completion client.
pub struct OpenAiGenerator {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

impl std::fmt::Debug for OpenAiGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiGenerator")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .finish()
    }
}

impl OpenAiGenerator {
    /// Create a generator from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SiftError::Config`] if the HTTP client cannot be built.
    pub fn new(config: &GenerationConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .map_err(|e| SiftError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            model: config.model.clone(),
            api_key: config.api_key.clone().filter(|k| !k.trim().is_empty()),
        })
    }

    /// Model identifier used for requests.
    pub fn model(&self) -> &str {
        &self.model
    }

    async fn send(&self, body: &serde_json::Value) -> Result<String> {
        let mut request = self.client.post(&self.endpoint).json(body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                SiftError::Timeout(format!("generation request timed out: {e}"))
            } else {
                SiftError::Generation(format!("generation request failed: {e}"))
            }
        })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| SiftError::Generation(format!("failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(SiftError::Generation(format!(
                "HTTP {}: {}",
                status.as_u16(),
                extract_error_message(&text)
            )));
        }

        let parsed: ChatResponse = serde_json::from_str(&text)
            .map_err(|e| SiftError::Generation(format!("invalid response JSON: {e}")))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| SiftError::Generation("no choices in response".into()))?;

        Ok(content)
    }
}

/// Whether an upstream error message complains about a sampling parameter.
fn rejects_parameter(message: &str) -> bool {
    let lower = message.to_lowercase();
    ["temperature", "max_tokens", "max_completion_tokens"]
        .iter()
        .any(|p| lower.contains(p))
}

/// Extract `error.message` from an OpenAI-style error body.
fn extract_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(String::from)
        })
        .unwrap_or_else(|| body.to_string())
}

#[async_trait]
impl Generator for OpenAiGenerator {
    async fn complete(&self, prompt: &str, temperature: f64, max_tokens: u32) -> Result<String> {
        let (temp, max) = match ParamSupport::for_model(&self.model) {
            ParamSupport::Full => (Some(temperature), Some(max_tokens)),
            ParamSupport::TemperatureOnly => (Some(temperature), None),
            ParamSupport::None => (None, None),
        };

        let body = build_chat_request(&self.model, prompt, temp, max);
        match self.send(&body).await {
            Ok(text) => Ok(text),
            Err(SiftError::Generation(msg)) if rejects_parameter(&msg) => {
                tracing::warn!(model = %self.model, "model rejected sampling parameters, retrying with defaults");
                let retry = build_chat_request(&self.model, prompt, None, None);
                self.send(&retry).await
            }
            Err(e) => Err(e),
        }
    }
}
