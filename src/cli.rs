//! Command-line argument parsing for sql-chat.

use clap::Parser;
use sql_chat::config::ConnectionDefaults;
use sql_chat::db::ConnectionParams;
use std::path::PathBuf;

/// Chat with your MySQL database in natural language.
#[derive(Parser, Debug)]
#[command(name = "sqlchat")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Database host
    #[arg(short = 'H', long, value_name = "HOST")]
    pub host: Option<String>,

    /// Database port
    #[arg(short = 'p', long, value_name = "PORT")]
    pub port: Option<String>,

    /// Database user
    #[arg(short = 'U', long, value_name = "USER")]
    pub user: Option<String>,

    /// Database password
    #[arg(long, value_name = "PASSWORD", env = "MYSQL_PWD", hide_env_values = true)]
    pub password: Option<String>,

    /// Database name; when provided, the session connects at startup
    #[arg(short = 'd', long, value_name = "DATABASE")]
    pub database: Option<String>,

    /// Config file path
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// LLM provider to use ("groq" or "mock")
    #[arg(long, value_name = "PROVIDER")]
    pub llm: Option<String>,

    /// Groq API key (manual override; otherwise GROQ_API_KEY is read from
    /// the environment or a .env file)
    #[arg(long, value_name = "KEY")]
    pub api_key: Option<String>,

    /// Model identifier override
    #[arg(long, value_name = "MODEL")]
    pub model: Option<String>,

    /// Use an in-memory mock database (try the chat without MySQL)
    #[arg(long)]
    pub mock_db: bool,
}

impl Cli {
    /// Parses command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Returns the config file path to use.
    pub fn config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(sql_chat::config::Config::default_path)
    }

    /// Builds connection parameters from CLI arguments layered over the
    /// config defaults. Returns None when no database is named anywhere,
    /// in which case the session starts disconnected.
    pub fn to_connection_params(&self, defaults: &ConnectionDefaults) -> Option<ConnectionParams> {
        let database = self
            .database
            .clone()
            .or_else(|| defaults.database.clone())?;

        Some(ConnectionParams::new(
            self.host.clone().unwrap_or_else(|| defaults.host.clone()),
            self.port.clone().unwrap_or_else(|| defaults.port.clone()),
            self.user.clone().unwrap_or_else(|| defaults.user.clone()),
            self.password.clone().unwrap_or_default(),
            database,
        ))
    }
}
