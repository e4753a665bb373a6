//! Groq LLM client implementation.
//!
//! Talks to Groq's OpenAI-compatible chat completions API. The pipeline
//! performs a single pass per call: failures map to generation errors and
//! surface as error turns, with no retry or backoff.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{ChatError, Result};
use crate::llm::LlmClient;

/// Default timeout for API requests.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Groq API endpoint (OpenAI-compatible).
const GROQ_API_URL: &str = "https://api.groq.com/openai/v1/chat/completions";

/// Default model identifier.
pub const DEFAULT_MODEL: &str = "llama3-8b-8192";

/// Sampling temperature. Zero keeps SQL generation deterministic-leaning.
const TEMPERATURE: f32 = 0.0;

/// Groq client configuration.
#[derive(Debug, Clone)]
pub struct GroqConfig {
    /// API key for authentication.
    pub api_key: String,
    /// Model to use (e.g., "llama3-8b-8192").
    pub model: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl GroqConfig {
    /// Creates a new config with the given API key and the default model.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Sets the model identifier.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Creates a config from environment variables.
    ///
    /// Reads `GROQ_API_KEY` for the API key and optionally `GROQ_MODEL`
    /// for the model.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("GROQ_API_KEY")
            .map_err(|_| ChatError::generation("GROQ_API_KEY environment variable not set"))?;

        let mut config = Self::new(api_key);
        if let Ok(model) = std::env::var("GROQ_MODEL") {
            config = config.with_model(model);
        }
        Ok(config)
    }
}

/// Groq LLM client.
#[derive(Debug, Clone)]
pub struct GroqClient {
    config: GroqConfig,
    client: Client,
}

impl GroqClient {
    /// Creates a new Groq client with the given configuration.
    ///
    /// The HTTP client is constructed once, here. If construction fails
    /// with ambient proxy settings (a common source of misconfiguration),
    /// it is rebuilt exactly once with proxies disabled; if that also
    /// fails, the original construction error is propagated.
    pub fn new(config: GroqConfig) -> Result<Self> {
        let client = build_http_client(config.timeout_secs)?;
        Ok(Self { config, client })
    }

    /// Parses an API error response into a generation error.
    fn parse_error(status: reqwest::StatusCode, body: &str) -> ChatError {
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return ChatError::generation("Authentication failed. Check your GROQ_API_KEY.");
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return ChatError::generation("Rate limited. Please wait and try again.");
        }

        if let Ok(error_response) = serde_json::from_str::<GroqErrorResponse>(body) {
            return ChatError::generation(format!(
                "Groq API error: {}",
                error_response.error.message
            ));
        }

        ChatError::generation(format!("Groq API error ({status}): {body}"))
    }
}

#[async_trait]
impl LlmClient for GroqClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let request = GroqRequest {
            model: self.config.model.clone(),
            messages: vec![GroqMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            temperature: TEMPERATURE,
        };

        debug!(
            model = %self.config.model,
            prompt_len = prompt.len(),
            "Sending Groq API request"
        );

        let response = self
            .client
            .post(GROQ_API_URL)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ChatError::generation("Request timed out. Try again.")
                } else if e.is_connect() {
                    ChatError::generation("Failed to connect to the Groq API. Check your network.")
                } else {
                    ChatError::generation(format!("Request failed: {e}"))
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ChatError::generation(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(Self::parse_error(status, &body));
        }

        let response: GroqResponse = serde_json::from_str(&body)
            .map_err(|e| ChatError::generation(format!("Failed to parse response: {e}")))?;

        response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| ChatError::generation("No response from Groq"))
    }
}

/// Builds the HTTP client, falling back to a proxy-free client once if the
/// first construction fails.
fn build_http_client(timeout_secs: u64) -> Result<Client> {
    let timeout = Duration::from_secs(timeout_secs);

    match Client::builder().timeout(timeout).build() {
        Ok(client) => Ok(client),
        Err(original) => {
            warn!("HTTP client construction failed, retrying without proxies: {original}");
            match Client::builder().timeout(timeout).no_proxy().build() {
                Ok(client) => Ok(client),
                // The retry masked nothing: report the first failure.
                Err(_) => Err(ChatError::generation(format!(
                    "Failed to create HTTP client: {original}"
                ))),
            }
        }
    }
}

// Groq API wire types (OpenAI chat completions shape)

#[derive(Debug, Serialize)]
struct GroqRequest {
    model: String,
    messages: Vec<GroqMessage>,
    temperature: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct GroqMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct GroqResponse {
    choices: Vec<GroqChoice>,
}

#[derive(Debug, Deserialize)]
struct GroqChoice {
    message: GroqMessage,
}

#[derive(Debug, Deserialize)]
struct GroqErrorResponse {
    error: GroqError,
}

#[derive(Debug, Deserialize)]
struct GroqError {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_new_defaults() {
        let config = GroqConfig::new("gsk-test");
        assert_eq!(config.api_key, "gsk-test");
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn test_config_with_model_and_timeout() {
        let config = GroqConfig::new("gsk-test")
            .with_model("llama3-70b-8192")
            .with_timeout(60);
        assert_eq!(config.model, "llama3-70b-8192");
        assert_eq!(config.timeout_secs, 60);
    }

    #[test]
    fn test_client_construction() {
        let client = GroqClient::new(GroqConfig::new("gsk-test"));
        assert!(client.is_ok());
    }

    #[test]
    fn test_parse_error_unauthorized() {
        let error = GroqClient::parse_error(reqwest::StatusCode::UNAUTHORIZED, "");
        assert!(error.to_string().contains("Authentication failed"));
    }

    #[test]
    fn test_parse_error_rate_limited() {
        let error = GroqClient::parse_error(reqwest::StatusCode::TOO_MANY_REQUESTS, "");
        assert!(error.to_string().contains("Rate limited"));
    }

    #[test]
    fn test_parse_error_with_message() {
        let body = r#"{"error":{"message":"Invalid API key"}}"#;
        let error = GroqClient::parse_error(reqwest::StatusCode::BAD_REQUEST, body);
        assert!(error.to_string().contains("Invalid API key"));
    }

    #[test]
    fn test_parse_error_unknown_body() {
        let error = GroqClient::parse_error(reqwest::StatusCode::INTERNAL_SERVER_ERROR, "boom");
        assert!(error.to_string().contains("500"));
        assert!(error.to_string().contains("boom"));
    }

    #[test]
    fn test_request_serialization_pins_temperature() {
        let request = GroqRequest {
            model: DEFAULT_MODEL.to_string(),
            messages: vec![GroqMessage {
                role: "user".to_string(),
                content: "hi".to_string(),
            }],
            temperature: TEMPERATURE,
        };
        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("\"temperature\":0"));
        assert!(json.contains("\"role\":\"user\""));
    }
}
