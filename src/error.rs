//! Error types for sql-chat.
//!
//! Defines the error taxonomy used throughout the pipeline: configuration
//! errors are user-correctable, connection errors roll the session back to
//! disconnected, and generation/execution errors surface as visible error
//! turns in the conversation.

use thiserror::Error;

/// Main error type for sql-chat operations.
#[derive(Error, Debug)]
pub enum ChatError {
    /// Invalid user input (non-numeric port, missing connection fields, bad config file).
    #[error("Configuration error: {0}")]
    Config(String),

    /// Database connectivity errors (host unreachable, auth failed, unknown database).
    #[error("Connection error: {0}")]
    Connection(String),

    /// LLM call failures (auth, rate limits, network, malformed responses).
    #[error("Generation error: {0}")]
    Generation(String),

    /// Generated SQL failed to execute; carries the driver's message unmodified.
    #[error("Execution error: {0}")]
    Execution(String),

    /// Internal application errors (unexpected states, bugs).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ChatError {
    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a connection error with the given message.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Creates a generation error with the given message.
    pub fn generation(msg: impl Into<String>) -> Self {
        Self::Generation(msg.into())
    }

    /// Creates an execution error with the given message.
    pub fn execution(msg: impl Into<String>) -> Self {
        Self::Execution(msg.into())
    }

    /// Creates an internal error with the given message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Config(_) => "Configuration Error",
            Self::Connection(_) => "Connection Error",
            Self::Generation(_) => "Generation Error",
            Self::Execution(_) => "Execution Error",
            Self::Internal(_) => "Internal Error",
        }
    }
}

/// Result type alias using ChatError.
pub type Result<T> = std::result::Result<T, ChatError>;
