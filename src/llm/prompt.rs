//! Prompt construction for the two pipeline stages.
//!
//! Both templates are fixed; the schema descriptor, the serialized
//! conversation history, and the per-turn values are substituted in.

use crate::conversation::Turn;

/// Version of the history-in-prompt serialization format.
///
/// Version 1: one line per turn, `User: <text>` or `Assistant: <text>`
/// (the greeting serializes as an assistant line), joined with newlines;
/// an empty history renders as `(none)`. Bump this when the format
/// changes so prompts stay reproducible across releases.
pub const HISTORY_FORMAT_VERSION: u32 = 1;

/// Template for the SQL generation stage.
const SQL_PROMPT_TEMPLATE: &str = r#"You are a senior data analyst.
Based on the table schema provided below, write a SQL query that answers the question.
Consider the conversation history.
<SCHEMA>{schema}</SCHEMA>
Conversation History:
{history}
Write only the SQL query without any additional text.
Question: {question}
SQL Query:"#;

/// Template for the answer synthesis stage.
const ANSWER_PROMPT_TEMPLATE: &str = r#"You are a senior data analyst.
Given the database schema, question, SQL query, and SQL response, write a natural language response.
<SCHEMA>{schema}</SCHEMA>
Conversation History:
{history}
Question: {question}
SQL Query: {sql_query}
SQL Response: {response}
Provide a clear, natural language answer based on the SQL results."#;

/// Serializes conversation history for embedding in a prompt (format v1).
pub fn render_history(turns: &[Turn]) -> String {
    if turns.is_empty() {
        return "(none)".to_string();
    }

    turns
        .iter()
        .map(|turn| match turn {
            Turn::Greeting(text) | Turn::Assistant(text) => format!("Assistant: {text}"),
            Turn::User(text) => format!("User: {text}"),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Builds the prompt for the SQL generation stage.
pub fn build_sql_prompt(schema: &str, history: &[Turn], question: &str) -> String {
    SQL_PROMPT_TEMPLATE
        .replace("{schema}", schema)
        .replace("{history}", &render_history(history))
        .replace("{question}", question)
}

/// Builds the prompt for the answer synthesis stage.
pub fn build_answer_prompt(
    schema: &str,
    history: &[Turn],
    question: &str,
    sql_query: &str,
    response: &str,
) -> String {
    ANSWER_PROMPT_TEMPLATE
        .replace("{schema}", schema)
        .replace("{history}", &render_history(history))
        .replace("{question}", question)
        .replace("{sql_query}", sql_query)
        .replace("{response}", response)
}
