//! The two-stage query pipeline: question → SQL → natural-language answer.
//!
//! Stage one renders the SQL-generation prompt and asks the LLM for a
//! query. Stage two executes that query and asks the LLM to phrase the
//! textual result as an answer. The stages are strictly sequential; the
//! second depends on the first's output.

use std::time::Instant;

use tracing::{debug, info};

use crate::conversation::Turn;
use crate::db::DatabaseHandle;
use crate::error::Result;
use crate::llm::prompt::{build_answer_prompt, build_sql_prompt};
use crate::llm::LlmClient;

/// Drives the two LLM calls and the SQL execution for one turn.
pub struct QueryPipeline {
    llm: Box<dyn LlmClient>,
}

impl QueryPipeline {
    /// Creates a pipeline over the given LLM client.
    pub fn new(llm: Box<dyn LlmClient>) -> Self {
        Self { llm }
    }

    /// Generates a SQL statement for the question.
    ///
    /// The LLM output is returned verbatim: the prompt instructs the model
    /// to emit only SQL, and no markdown or code-fence stripping happens
    /// here. Malformed SQL surfaces later as an execution error.
    pub async fn generate_sql(
        &self,
        question: &str,
        schema: &str,
        history: &[Turn],
    ) -> Result<String> {
        let start = Instant::now();
        let prompt = build_sql_prompt(schema, history, question);

        debug!(prompt_len = prompt.len(), "Requesting SQL generation");
        let sql = self.llm.complete(&prompt).await?;

        info!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            sql_len = sql.len(),
            "Generated SQL"
        );
        Ok(sql)
    }

    /// Executes `sql` and phrases the textual result as an answer.
    pub async fn synthesize_answer(
        &self,
        question: &str,
        schema: &str,
        history: &[Turn],
        sql: &str,
        db: &dyn DatabaseHandle,
    ) -> Result<String> {
        let start = Instant::now();

        let result = db.run(sql).await?;
        debug!(result_len = result.len(), "Executed generated SQL");

        let prompt = build_answer_prompt(schema, history, question, sql, &result);
        let answer = self.llm.complete(&prompt).await?;

        info!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            answer_len = answer.len(),
            "Synthesized answer"
        );
        Ok(answer)
    }
}
