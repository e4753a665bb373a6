//! sql-chat - Chat with your MySQL database in natural language.
//!
//! A line-oriented REPL over the query pipeline: slash commands manage the
//! connection and session, everything else is treated as a question.

mod cli;

use std::io::Write;
use std::str::FromStr;

use anyhow::Context;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

use cli::Cli;
use sql_chat::config::Config;
use sql_chat::conversation::{ConversationLog, Turn, GREETING};
use sql_chat::db::{ConnectionParams, MockDatabaseHandle};
use sql_chat::llm::{self, GroqConfig, LlmProvider};
use sql_chat::session::Session;

#[tokio::main]
async fn main() {
    // Load .env before anything reads the environment.
    match dotenvy::dotenv() {
        Ok(path) => debug!("Loaded .env from {}", path.display()),
        Err(_) => debug!("No .env file found"),
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run().await {
        error!("{e:#}");
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse_args();

    let config_path = cli.config_path();
    let config = Config::load_from_file(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    let provider_name = cli.llm.clone().unwrap_or_else(|| config.llm.provider.clone());
    let provider = LlmProvider::from_str(&provider_name).map_err(anyhow::Error::msg)?;
    let model = cli.model.clone().unwrap_or_else(|| config.llm.model.clone());

    let llm_client = match provider {
        LlmProvider::Groq => {
            let api_key = config.llm.resolve_api_key(cli.api_key.clone()).context(
                "No Groq API key configured. Set GROQ_API_KEY (e.g. in a .env file) or pass --api-key.",
            )?;
            llm::create_client(provider, GroqConfig::new(api_key).with_model(model))?
        }
        LlmProvider::Mock => llm::create_client(provider, GroqConfig::new(String::new()))?,
    };

    let mut session = if cli.mock_db {
        Session::with_connection(llm_client, Box::new(MockDatabaseHandle::new()))
    } else {
        Session::new(llm_client)
    };

    println!("{GREETING}");

    if !cli.mock_db {
        match cli.to_connection_params(&config.connection) {
            Some(params) => connect_and_report(&mut session, &params).await,
            None => println!(
                "Use /connect <host> <port> <user> <password> <database> to connect. Type /help for commands."
            ),
        }
    }

    repl(&mut session).await
}

/// Reads lines until EOF or /quit; slash commands manage the session,
/// anything else is a question for the pipeline.
async fn repl(session: &mut Session) -> anyhow::Result<()> {
    use tokio::io::AsyncBufReadExt;

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    loop {
        print!("> ");
        std::io::stdout().flush().ok();

        let Some(line) = lines.next_line().await? else {
            break; // EOF
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(command) = line.strip_prefix('/') {
            if !dispatch_command(session, command).await {
                break;
            }
        } else {
            println!("Analyzing your database...");
            let answer = session.handle_turn(line).await;
            println!("{answer}");
        }
    }

    Ok(())
}

/// Handles a slash command. Returns false when the REPL should exit.
async fn dispatch_command(session: &mut Session, command: &str) -> bool {
    let mut parts = command.split_whitespace();
    let name = parts.next().unwrap_or("");
    let args: Vec<&str> = parts.collect();

    match name {
        "connect" => {
            if args.len() != 5 {
                println!("Usage: /connect <host> <port> <user> <password> <database>");
            } else {
                let params = ConnectionParams::new(args[0], args[1], args[2], args[3], args[4]);
                connect_and_report(session, &params).await;
            }
        }
        "disconnect" => {
            session.disconnect().await;
            println!("Disconnected.");
        }
        "reset" => {
            session.reset().await;
            println!("Session reset.");
            println!("{GREETING}");
        }
        "tables" => match session.tables().await {
            Ok(tables) if tables.is_empty() => println!("No tables found."),
            Ok(tables) => println!("Tables: {}", tables.join(", ")),
            Err(e) => println!("{e}"),
        },
        "history" => print_history(session.log()),
        "status" => {
            if session.is_connected() {
                println!("Connected.");
            } else {
                println!("Not connected.");
            }
        }
        "help" => print_help(),
        "quit" | "exit" => return false,
        _ => println!("Unknown command '/{name}'. Type /help for available commands."),
    }

    true
}

async fn connect_and_report(session: &mut Session, params: &ConnectionParams) {
    println!("Connecting to {}...", params.display_string());
    match session.connect(params).await {
        Ok(tables) if tables.is_empty() => {
            println!("Connected. Warning: no tables found.");
        }
        Ok(tables) => println!("Connected. Tables found: {}", tables.join(", ")),
        Err(e) => println!("Connection failed: {e}"),
    }
}

fn print_history(log: &ConversationLog) {
    for turn in log.turns() {
        match turn {
            Turn::Greeting(text) | Turn::Assistant(text) => println!("assistant> {text}"),
            Turn::User(text) => println!("you> {text}"),
        }
    }
}

fn print_help() {
    println!("Commands:");
    println!("  /connect <host> <port> <user> <password> <database>  Connect to a MySQL database");
    println!("  /disconnect   Close the current connection");
    println!("  /reset        Clear the conversation and disconnect");
    println!("  /tables       List tables in the connected database");
    println!("  /history      Show the conversation so far");
    println!("  /status       Show connection status");
    println!("  /help         Show this help");
    println!("  /quit         Exit");
    println!();
    println!("Anything else is treated as a question about your data.");
}
