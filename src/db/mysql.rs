//! MySQL database handle implementation.
//!
//! Connects via sqlx. A throwaway probe connection validates credentials
//! before the pool used by the pipeline is built, so bad parameters fail
//! fast with a mapped error instead of surfacing on the first query.

use crate::db::{ConnectionParams, DatabaseHandle};
use crate::error::{ChatError, Result};
use async_trait::async_trait;
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection, MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::{Column, Connection, Row};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Timeout for the initial connection validation.
const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Query execution timeout in seconds.
const QUERY_TIMEOUT_SECS: u64 = 30;

/// Maximum rows rendered into a textual result. Results feed an LLM
/// prompt, so unbounded row counts would blow the context window.
const MAX_RESULT_ROWS: usize = 100;

/// MySQL database handle backed by a connection pool.
#[derive(Debug)]
pub struct MySqlHandle {
    pool: MySqlPool,
}

impl MySqlHandle {
    /// Connects to MySQL with the given (already normalized) parameters.
    ///
    /// Opens a single probe connection first and drops it; only if that
    /// succeeds is the pool created from the connection URL. The driver
    /// negotiates the auth plugin with the server, so both
    /// `mysql_native_password` and `caching_sha2_password` servers work.
    pub async fn connect(params: &ConnectionParams) -> Result<Self> {
        let port = params.port_number()?;

        let options = MySqlConnectOptions::new()
            .host(&params.host)
            .port(port)
            .username(&params.user)
            .password(&params.password)
            .database(&params.database);

        debug!("Validating connection to {}", params.display_string());
        let probe = tokio::time::timeout(
            Duration::from_secs(CONNECT_TIMEOUT_SECS),
            MySqlConnection::connect_with(&options),
        )
        .await
        .map_err(|_| {
            ChatError::connection(format!(
                "Connection to {}:{} timed out after {CONNECT_TIMEOUT_SECS} seconds",
                params.host, port
            ))
        })?
        .map_err(|e| map_connection_error(e, params))?;
        let _ = probe.close().await;

        let url = params.database_url()?;
        let pool = MySqlPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .connect(&url)
            .await
            .map_err(|e| map_connection_error(e, params))?;

        debug!("Connected to {}", params.display_string());
        Ok(Self { pool })
    }

    /// Creates a handle from an existing pool. Primarily useful for tests.
    #[allow(dead_code)]
    pub fn from_pool(pool: MySqlPool) -> Self {
        Self { pool }
    }

    async fn fetch_table_columns(&self, table: &str) -> Result<Vec<ColumnMeta>> {
        let rows: Vec<(String, String, String, String, Option<String>)> = sqlx::query_as(
            r#"
            SELECT
                column_name,
                column_type,
                is_nullable,
                column_key,
                column_default
            FROM information_schema.columns
            WHERE table_schema = DATABASE() AND table_name = ?
            ORDER BY ordinal_position
            "#,
        )
        .bind(table)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| ChatError::execution(format!("Failed to fetch columns for {table}: {e}")))?;

        Ok(rows
            .into_iter()
            .map(
                |(name, data_type, is_nullable, column_key, default)| ColumnMeta {
                    name,
                    data_type,
                    nullable: is_nullable == "YES",
                    primary_key: column_key == "PRI",
                    default,
                },
            )
            .collect())
    }

    async fn fetch_foreign_keys(&self) -> Result<Vec<ForeignKeyMeta>> {
        let rows: Vec<(String, String, String, String)> = sqlx::query_as(
            r#"
            SELECT
                table_name,
                column_name,
                referenced_table_name,
                referenced_column_name
            FROM information_schema.key_column_usage
            WHERE table_schema = DATABASE() AND referenced_table_name IS NOT NULL
            ORDER BY table_name, ordinal_position
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| ChatError::execution(format!("Failed to fetch foreign keys: {e}")))?;

        Ok(rows
            .into_iter()
            .map(
                |(from_table, from_column, to_table, to_column)| ForeignKeyMeta {
                    from_table,
                    from_column,
                    to_table,
                    to_column,
                },
            )
            .collect())
    }
}

#[async_trait]
impl DatabaseHandle for MySqlHandle {
    async fn table_names(&self) -> Result<Vec<String>> {
        let names: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT table_name
            FROM information_schema.tables
            WHERE table_schema = DATABASE() AND table_type = 'BASE TABLE'
            ORDER BY table_name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| ChatError::execution(format!("Failed to list tables: {e}")))?;

        Ok(names)
    }

    async fn table_info(&self) -> Result<String> {
        let names = self.table_names().await?;

        let mut tables = Vec::with_capacity(names.len());
        for name in names {
            let columns = self.fetch_table_columns(&name).await?;
            tables.push((name, columns));
        }
        let foreign_keys = self.fetch_foreign_keys().await?;

        Ok(format_schema(&tables, &foreign_keys))
    }

    async fn run(&self, sql: &str) -> Result<String> {
        let start = Instant::now();

        let rows = tokio::time::timeout(
            Duration::from_secs(QUERY_TIMEOUT_SECS),
            sqlx::query(sql).fetch_all(&self.pool),
        )
        .await
        .map_err(|_| {
            ChatError::execution(format!("Query timed out after {QUERY_TIMEOUT_SECS} seconds"))
        })?
        .map_err(|e| ChatError::execution(e.to_string()))?;

        debug!(
            row_count = rows.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Executed SQL"
        );

        if rows.len() > MAX_RESULT_ROWS {
            warn!(
                "Query returned {} rows, rendering only {}",
                rows.len(),
                MAX_RESULT_ROWS
            );
        }

        Ok(format_rows(&rows))
    }

    async fn close(&self) -> Result<()> {
        self.pool.close().await;
        Ok(())
    }
}

/// Column metadata used to render the schema descriptor.
struct ColumnMeta {
    name: String,
    data_type: String,
    nullable: bool,
    primary_key: bool,
    default: Option<String>,
}

/// Foreign key metadata used to render the schema descriptor.
struct ForeignKeyMeta {
    from_table: String,
    from_column: String,
    to_table: String,
    to_column: String,
}

/// Renders tables and foreign keys into the schema descriptor string
/// embedded in LLM prompts.
fn format_schema(tables: &[(String, Vec<ColumnMeta>)], foreign_keys: &[ForeignKeyMeta]) -> String {
    let mut out = String::from("Database Schema:\n\n");

    for (name, columns) in tables {
        out.push_str(&format!("Table: {name}\n"));
        for column in columns {
            out.push_str(&format_column_line(column));
        }
        out.push('\n');
    }

    if !foreign_keys.is_empty() {
        out.push_str("Foreign Keys:\n");
        for fk in foreign_keys {
            out.push_str(&format!(
                "  - {}.{} -> {}.{}\n",
                fk.from_table, fk.from_column, fk.to_table, fk.to_column
            ));
        }
    }

    out
}

fn format_column_line(column: &ColumnMeta) -> String {
    let mut annotations: Vec<String> = Vec::new();
    if column.primary_key {
        annotations.push("PK".to_string());
    }
    if !column.nullable {
        annotations.push("NOT NULL".to_string());
    }
    if let Some(default) = &column.default {
        annotations.push(format!("DEFAULT {default}"));
    }

    if annotations.is_empty() {
        format!("  - {}: {}\n", column.name, column.data_type)
    } else {
        format!(
            "  - {}: {} ({})\n",
            column.name,
            column.data_type,
            annotations.join(", ")
        )
    }
}

/// Renders query results as plain text: a header line of column names,
/// one line per row, values separated by ` | `.
fn format_rows(rows: &[MySqlRow]) -> String {
    let Some(first) = rows.first() else {
        return "(no rows)".to_string();
    };

    let header = first
        .columns()
        .iter()
        .map(|c| c.name().to_string())
        .collect::<Vec<_>>()
        .join(" | ");

    let mut out = header;
    for row in rows.iter().take(MAX_RESULT_ROWS) {
        let line = (0..row.columns().len())
            .map(|i| decode_cell(row, i))
            .collect::<Vec<_>>()
            .join(" | ");
        out.push('\n');
        out.push_str(&line);
    }

    if rows.len() > MAX_RESULT_ROWS {
        out.push_str(&format!("\n... ({} more rows)", rows.len() - MAX_RESULT_ROWS));
    }

    out
}

/// Decodes a single cell to a display string, trying progressively looser
/// types. MySQL result types vary widely; the textual rendition only needs
/// a readable value, not a lossless one.
fn decode_cell(row: &MySqlRow, index: usize) -> String {
    if let Ok(value) = row.try_get::<Option<String>, _>(index) {
        return value.unwrap_or_else(|| "NULL".to_string());
    }
    if let Ok(value) = row.try_get::<Option<i64>, _>(index) {
        return value.map_or_else(|| "NULL".to_string(), |v| v.to_string());
    }
    if let Ok(value) = row.try_get::<Option<u64>, _>(index) {
        return value.map_or_else(|| "NULL".to_string(), |v| v.to_string());
    }
    if let Ok(value) = row.try_get::<Option<f64>, _>(index) {
        return value.map_or_else(|| "NULL".to_string(), |v| v.to_string());
    }
    if let Ok(value) = row.try_get::<Option<bool>, _>(index) {
        return value.map_or_else(|| "NULL".to_string(), |v| v.to_string());
    }
    if let Ok(value) = row.try_get::<Option<chrono::NaiveDateTime>, _>(index) {
        return value.map_or_else(|| "NULL".to_string(), |v| v.to_string());
    }
    if let Ok(value) = row.try_get::<Option<chrono::NaiveDate>, _>(index) {
        return value.map_or_else(|| "NULL".to_string(), |v| v.to_string());
    }
    if let Ok(value) = row.try_get::<Option<Vec<u8>>, _>(index) {
        return value.map_or_else(
            || "NULL".to_string(),
            |v| String::from_utf8_lossy(&v).into_owned(),
        );
    }
    "?".to_string()
}

/// Maps sqlx connection errors to actionable messages.
fn map_connection_error(error: sqlx::Error, params: &ConnectionParams) -> ChatError {
    let error_str = error.to_string();
    let lowered = error_str.to_lowercase();

    if lowered.contains("access denied") {
        ChatError::connection(format!(
            "Authentication failed for user '{}'. Check your credentials.",
            params.user
        ))
    } else if lowered.contains("unknown database") {
        ChatError::connection(format!("Database '{}' does not exist.", params.database))
    } else if lowered.contains("connection refused") {
        ChatError::connection(format!(
            "Cannot connect to {}:{}. Check that the MySQL server is running.",
            params.host, params.port
        ))
    } else if lowered.contains("failed to lookup") || lowered.contains("name or service") {
        ChatError::connection(format!("Cannot resolve host '{}'.", params.host))
    } else if lowered.contains("timed out") || lowered.contains("timeout") {
        ChatError::connection(format!(
            "Connection to {}:{} timed out. The server may be overloaded or unreachable.",
            params.host, params.port
        ))
    } else {
        ChatError::connection(error_str)
    }
}
