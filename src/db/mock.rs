//! Mock database handles for testing.
//!
//! Provide canned schema and query results so the pipeline can be
//! exercised without a running MySQL server.

use super::DatabaseHandle;
use crate::error::{ChatError, Result};
use async_trait::async_trait;

/// A mock database handle that returns predefined results.
#[derive(Debug, Clone)]
pub struct MockDatabaseHandle {
    tables: Vec<String>,
    table_info: String,
    /// Pattern → canned result, checked in insertion order against the
    /// lowercased SQL.
    responses: Vec<(String, String)>,
    default_result: String,
}

impl MockDatabaseHandle {
    /// Creates a mock with a small users/orders schema and canned results
    /// for the common aggregate queries.
    pub fn new() -> Self {
        Self {
            tables: vec!["orders".to_string(), "users".to_string()],
            table_info: concat!(
                "Database Schema:\n\n",
                "Table: users\n",
                "  - id: int (PK, NOT NULL)\n",
                "  - email: varchar(255) (NOT NULL)\n",
                "  - name: varchar(100)\n\n",
                "Table: orders\n",
                "  - id: int (PK, NOT NULL)\n",
                "  - user_id: int (NOT NULL)\n",
                "  - total: decimal(10,2) (NOT NULL)\n\n",
                "Foreign Keys:\n",
                "  - orders.user_id -> users.id\n",
            )
            .to_string(),
            responses: vec![(
                "count".to_string(),
                "COUNT(*)\n42".to_string(),
            )],
            default_result: "(no rows)".to_string(),
        }
    }

    /// Creates a mock with no tables at all.
    pub fn empty() -> Self {
        Self {
            tables: Vec::new(),
            table_info: "Database Schema:\n\n".to_string(),
            responses: Vec::new(),
            default_result: "(no rows)".to_string(),
        }
    }

    /// Adds a canned result returned when the executed SQL contains `pattern`.
    pub fn with_response(mut self, pattern: impl Into<String>, result: impl Into<String>) -> Self {
        self.responses.push((pattern.into(), result.into()));
        self
    }
}

impl Default for MockDatabaseHandle {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DatabaseHandle for MockDatabaseHandle {
    async fn table_names(&self) -> Result<Vec<String>> {
        Ok(self.tables.clone())
    }

    async fn table_info(&self) -> Result<String> {
        Ok(self.table_info.clone())
    }

    async fn run(&self, sql: &str) -> Result<String> {
        let sql_lower = sql.to_lowercase();
        for (pattern, result) in &self.responses {
            if sql_lower.contains(&pattern.to_lowercase()) {
                return Ok(result.clone());
            }
        }
        Ok(self.default_result.clone())
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// A database handle whose queries always fail.
///
/// Schema access still succeeds so the pipeline reaches the execution
/// stage before erroring.
#[derive(Debug, Clone)]
pub struct FailingDatabaseHandle {
    message: String,
    inner: MockDatabaseHandle,
}

impl FailingDatabaseHandle {
    /// Creates a failing handle with the given driver-style error message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            inner: MockDatabaseHandle::new(),
        }
    }
}

#[async_trait]
impl DatabaseHandle for FailingDatabaseHandle {
    async fn table_names(&self) -> Result<Vec<String>> {
        self.inner.table_names().await
    }

    async fn table_info(&self) -> Result<String> {
        self.inner.table_info().await
    }

    async fn run(&self, _sql: &str) -> Result<String> {
        Err(ChatError::execution(self.message.clone()))
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}
