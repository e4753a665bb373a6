//! Chat session: conversation log, database handle, and connectivity state.
//!
//! The session is an explicit object passed to whoever drives it (CLI,
//! tests); there is no process-wide state. It owns the single live
//! database handle and the append-only conversation log, and it is the
//! turn orchestrator: every `handle_turn` call appends exactly one user
//! turn and exactly one assistant turn, success or failure.

use tracing::{debug, info, warn};

use crate::conversation::{ConversationLog, Turn};
use crate::db::{self, ConnectionParams, DatabaseHandle};
use crate::error::Result;
use crate::llm::LlmClient;
use crate::pipeline::QueryPipeline;

/// Assistant text appended when a question arrives while disconnected.
pub const NOT_CONNECTED_MESSAGE: &str =
    "Not connected to a database. Connect first, then ask your question again.";

/// Connectivity state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Disconnected,
    Connected,
}

/// A single chat session over one database connection.
pub struct Session {
    log: ConversationLog,
    db: Option<Box<dyn DatabaseHandle>>,
    state: SessionState,
    pipeline: QueryPipeline,
}

impl Session {
    /// Creates a new disconnected session with a freshly seeded log.
    pub fn new(llm: Box<dyn LlmClient>) -> Self {
        Self {
            log: ConversationLog::new(),
            db: None,
            state: SessionState::Disconnected,
            pipeline: QueryPipeline::new(llm),
        }
    }

    /// Creates a session over an already-open handle.
    ///
    /// Useful for tests and for running against a mock database.
    pub fn with_connection(llm: Box<dyn LlmClient>, db: Box<dyn DatabaseHandle>) -> Self {
        Self {
            log: ConversationLog::new(),
            db: Some(db),
            state: SessionState::Connected,
            pipeline: QueryPipeline::new(llm),
        }
    }

    /// Returns the session's connectivity state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Returns true if a database handle is live.
    pub fn is_connected(&self) -> bool {
        self.state == SessionState::Connected
    }

    /// Returns the conversation log.
    pub fn log(&self) -> &ConversationLog {
        &self.log
    }

    /// Opens a database connection, replacing any existing handle.
    ///
    /// On success the session becomes Connected and the discovered table
    /// names are returned; an empty list is valid and logged as a
    /// warning. On failure the session is left Disconnected and the
    /// conversation log is untouched.
    pub async fn connect(&mut self, params: &ConnectionParams) -> Result<Vec<String>> {
        if let Some(old) = self.db.take() {
            let _ = old.close().await;
        }
        self.state = SessionState::Disconnected;

        let handle = db::connect(params).await?;

        let tables = match handle.table_names().await {
            Ok(tables) => tables,
            Err(e) => {
                let _ = handle.close().await;
                return Err(e);
            }
        };

        if tables.is_empty() {
            warn!("No tables found in database '{}'", params.database.trim());
        }

        self.db = Some(handle);
        self.state = SessionState::Connected;
        info!("Connected to {}", params.display_string());

        Ok(tables)
    }

    /// Closes the connection, keeping the conversation history.
    pub async fn disconnect(&mut self) {
        if let Some(db) = self.db.take() {
            let _ = db.close().await;
        }
        self.state = SessionState::Disconnected;
        debug!("Disconnected");
    }

    /// Resets the session to its initial state: no handle, disconnected,
    /// log containing exactly the greeting.
    pub async fn reset(&mut self) {
        self.disconnect().await;
        self.log.reset();
        info!("Session reset");
    }

    /// Lists the tables of the connected database.
    pub async fn tables(&self) -> Result<Vec<String>> {
        match &self.db {
            Some(db) => db.table_names().await,
            None => Err(crate::error::ChatError::connection(
                "Not connected to a database",
            )),
        }
    }

    /// Processes one user turn end to end.
    ///
    /// Appends the question, runs both pipeline stages, and appends the
    /// answer. Stage errors become the assistant turn's text instead of
    /// propagating, so a failed turn never unwinds the session.
    pub async fn handle_turn(&mut self, question: &str) -> String {
        let question = question.trim();
        self.log.append(Turn::user(question));

        let answer = match (self.state, &self.db) {
            (SessionState::Connected, Some(db)) => {
                let history = self.log.turns().to_vec();
                match self.run_stages(question, &history, db.as_ref()).await {
                    Ok(answer) => answer,
                    Err(e) => {
                        warn!("Turn failed: {e}");
                        e.to_string()
                    }
                }
            }
            _ => NOT_CONNECTED_MESSAGE.to_string(),
        };

        self.log.append(Turn::assistant(answer.clone()));
        answer
    }

    async fn run_stages(
        &self,
        question: &str,
        history: &[Turn],
        db: &dyn DatabaseHandle,
    ) -> Result<String> {
        let schema = db.table_info().await?;
        let sql = self.pipeline.generate_sql(question, &schema, history).await?;
        self.pipeline
            .synthesize_answer(question, &schema, history, &sql, db)
            .await
    }
}
