//! Conversation state for a chat session.
//!
//! The conversation is an ordered, append-only log of turns. It is seeded
//! with a greeting and only ever shrinks via a full reset.

/// Greeting shown when a session starts or is reset.
pub const GREETING: &str =
    "Hello! I am a SQL assistant. Ask me questions about your MySQL database.";

/// A single turn in the conversation.
///
/// The greeting is its own variant so that the "every assistant message
/// follows a user message" invariant holds structurally for the rest of
/// the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Turn {
    /// The seeded greeting shown at session start.
    Greeting(String),
    /// A question typed by the user.
    User(String),
    /// An answer (or error message) produced for a question.
    Assistant(String),
}

impl Turn {
    /// Creates a user turn.
    pub fn user(content: impl Into<String>) -> Self {
        Self::User(content.into())
    }

    /// Creates an assistant turn.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::Assistant(content.into())
    }

    /// Returns the text payload of the turn.
    pub fn text(&self) -> &str {
        match self {
            Self::Greeting(text) | Self::User(text) | Self::Assistant(text) => text,
        }
    }
}

/// Append-only log of conversation turns, owned by the session.
#[derive(Debug, Clone)]
pub struct ConversationLog {
    turns: Vec<Turn>,
}

impl ConversationLog {
    /// Creates a new log seeded with the greeting turn.
    pub fn new() -> Self {
        Self {
            turns: vec![Turn::Greeting(GREETING.to_string())],
        }
    }

    /// Appends a turn to the log.
    pub fn append(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    /// Returns all turns in insertion order.
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Returns the number of turns in the log.
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// The log is never empty (it always holds at least the greeting).
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Clears the log back to exactly the initial greeting turn.
    pub fn reset(&mut self) {
        self.turns.clear();
        self.turns.push(Turn::Greeting(GREETING.to_string()));
    }
}

impl Default for ConversationLog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_log_holds_greeting() {
        let log = ConversationLog::new();
        assert_eq!(log.len(), 1);
        assert_eq!(log.turns()[0], Turn::Greeting(GREETING.to_string()));
        assert!(!log.is_empty());
    }

    #[test]
    fn test_append_is_monotonic() {
        let mut log = ConversationLog::new();
        let initial = log.len();

        for i in 0..5 {
            log.append(Turn::user(format!("question {i}")));
            log.append(Turn::assistant(format!("answer {i}")));
        }

        assert_eq!(log.len(), initial + 10);
        // Prior order is preserved
        assert_eq!(log.turns()[1], Turn::user("question 0"));
        assert_eq!(log.turns()[2], Turn::assistant("answer 0"));
        assert_eq!(log.turns()[9], Turn::user("question 4"));
        assert_eq!(log.turns()[10], Turn::assistant("answer 4"));
    }

    #[test]
    fn test_reset_restores_initial_state() {
        let mut log = ConversationLog::new();
        log.append(Turn::user("how many users?"));
        log.append(Turn::assistant("There are 42 users."));

        log.reset();

        assert_eq!(log.len(), 1);
        assert_eq!(log.turns()[0], Turn::Greeting(GREETING.to_string()));
    }

    #[test]
    fn test_turn_text() {
        assert_eq!(Turn::user("hi").text(), "hi");
        assert_eq!(Turn::assistant("hello").text(), "hello");
        assert_eq!(Turn::Greeting("hey".to_string()).text(), "hey");
    }
}
