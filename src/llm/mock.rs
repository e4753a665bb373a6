//! Mock LLM client for testing.
//!
//! Recognizes which pipeline stage built the prompt and returns canned
//! but deterministic responses, so the full pipeline can run without API
//! calls.

use async_trait::async_trait;

use crate::error::{ChatError, Result};
use crate::llm::LlmClient;

/// Mock LLM client that returns canned responses based on prompt patterns.
#[derive(Debug, Clone, Default)]
pub struct MockLlmClient {
    /// Custom response mappings (pattern -> response), checked first.
    custom_responses: Vec<(String, String)>,
    /// When set, every completion fails with this message.
    fail_with: Option<String>,
}

impl MockLlmClient {
    /// Creates a new mock client with default responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a custom response mapping.
    ///
    /// When the prompt contains `pattern`, the mock returns `response`.
    pub fn with_response(
        mut self,
        pattern: impl Into<String>,
        response: impl Into<String>,
    ) -> Self {
        self.custom_responses
            .push((pattern.into(), response.into()));
        self
    }

    /// Makes every completion fail with the given message.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            custom_responses: Vec::new(),
            fail_with: Some(message.into()),
        }
    }

    fn mock_sql(question: &str) -> String {
        let q = question.to_lowercase();

        if q.contains("how many") && q.contains("user") {
            return "SELECT COUNT(*) FROM users".to_string();
        }
        if q.contains("how many") && q.contains("order") {
            return "SELECT COUNT(*) FROM orders".to_string();
        }
        if q.contains("user") {
            return "SELECT * FROM users".to_string();
        }
        if q.contains("order") {
            return "SELECT * FROM orders".to_string();
        }
        "SELECT 1".to_string()
    }

    fn mock_answer(prompt: &str) -> String {
        // Echo the SQL response section back so assertions can check that
        // the execution result reached the answer stage.
        let result = extract_section(prompt, "SQL Response:", "\nProvide a clear");
        match result {
            Some(result) if !result.is_empty() => {
                format!("Based on the query results: {result}")
            }
            _ => "The query returned no rows.".to_string(),
        }
    }
}

/// Extracts the text between `start` and `end` markers, trimmed.
fn extract_section(text: &str, start: &str, end: &str) -> Option<String> {
    let begin = text.find(start)? + start.len();
    let rest = &text[begin..];
    let stop = rest.find(end).unwrap_or(rest.len());
    Some(rest[..stop].trim().to_string())
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        if let Some(message) = &self.fail_with {
            return Err(ChatError::generation(message.clone()));
        }

        let prompt_lower = prompt.to_lowercase();
        for (pattern, response) in &self.custom_responses {
            if prompt_lower.contains(&pattern.to_lowercase()) {
                return Ok(response.clone());
            }
        }

        // The answer template is the only one containing a SQL response.
        if prompt.contains("SQL Response:") {
            return Ok(Self::mock_answer(prompt));
        }

        let question = extract_section(prompt, "Question:", "\nSQL Query:").unwrap_or_default();
        Ok(Self::mock_sql(&question))
    }
}
