//! LLM integration for sql-chat.
//!
//! Both pipeline stages render a complete prompt and hand it to an
//! [`LlmClient`]; the client owns the wire format and authentication.

pub mod groq;
pub mod mock;
pub mod prompt;

pub use groq::{GroqClient, GroqConfig};
pub use mock::MockLlmClient;

use crate::error::Result;
use async_trait::async_trait;
use std::str::FromStr;

/// Trait for LLM clients that can generate completions.
///
/// Implementations must be thread-safe (Send + Sync) to support async
/// operations.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Generates a completion for the given prompt.
    ///
    /// Returns the model's raw text output. Callers treat it verbatim;
    /// no post-processing happens here.
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// LLM provider type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LlmProvider {
    /// Groq (OpenAI-compatible chat completions API).
    #[default]
    Groq,
    /// Mock client for testing (no API key required).
    Mock,
}

impl LlmProvider {
    /// Returns the provider as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Groq => "groq",
            Self::Mock => "mock",
        }
    }
}

impl FromStr for LlmProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "groq" => Ok(Self::Groq),
            "mock" => Ok(Self::Mock),
            _ => Err(format!("Unknown LLM provider: {s}")),
        }
    }
}

impl std::fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Creates an LLM client for the given provider.
pub fn create_client(provider: LlmProvider, config: GroqConfig) -> Result<Box<dyn LlmClient>> {
    match provider {
        LlmProvider::Groq => Ok(Box::new(GroqClient::new(config)?)),
        LlmProvider::Mock => Ok(Box::new(MockLlmClient::new())),
    }
}
