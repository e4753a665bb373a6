//! Connection parameter and connectivity tests.
//!
//! The live tests require a running MySQL server and are skipped unless
//! DATABASE_URL is set to a mysql:// URL.

use sql_chat::db::{self, ConnectionParams, DatabaseHandle};
use sql_chat::error::ChatError;

fn get_test_params() -> Option<ConnectionParams> {
    let url = std::env::var("DATABASE_URL").ok()?;
    let parsed = url::Url::parse(&url).ok()?;
    if parsed.scheme() != "mysql" {
        return None;
    }
    Some(ConnectionParams::new(
        parsed.host_str().unwrap_or("localhost"),
        parsed.port().unwrap_or(3306).to_string(),
        parsed.username(),
        parsed.password().unwrap_or(""),
        parsed.path().trim_start_matches('/'),
    ))
}

#[tokio::test]
async fn test_connect_with_valid_credentials() {
    let Some(params) = get_test_params() else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let handle = db::connect(&params).await.unwrap();
    let tables = handle.table_names().await.unwrap();
    // An empty table list is a valid, non-error outcome.
    drop(tables);
    handle.close().await.unwrap();
}

#[tokio::test]
async fn test_connect_non_numeric_port_is_config_error() {
    let params = ConnectionParams::new("localhost", "not-a-port", "root", "pw", "mydb");

    let err = db::connect(&params).await.unwrap_err();

    assert!(matches!(err, ChatError::Config(_)));
    assert!(err.to_string().contains("not-a-port"));
}

#[tokio::test]
async fn test_connect_empty_fields_is_config_error() {
    let params = ConnectionParams::new("  ", "3306", "root", "pw", "mydb");

    let err = db::connect(&params).await.unwrap_err();

    assert!(matches!(err, ChatError::Config(_)));
    assert!(err.to_string().contains("host"));
}

#[tokio::test(flavor = "current_thread")]
async fn test_connect_unknown_host_is_connection_error() {
    let params = ConnectionParams::new(
        "invalid.host.that.does.not.exist.local",
        "3306",
        "root",
        "pw",
        "mydb",
    );

    let err = db::connect(&params).await.unwrap_err();

    assert!(matches!(err, ChatError::Connection(_)));
}

#[test]
fn test_connection_url_percent_encodes_password() {
    let params = ConnectionParams::new("localhost", "3306", "root", "p@ss:w/rd", "mydb");
    let url = params.database_url().unwrap();

    assert!(!url.contains("p@ss:w/rd"));
    assert!(url.starts_with("mysql://root:"));
    assert!(url.ends_with("@localhost:3306/mydb"));
}

#[test]
fn test_connection_params_trim_whitespace() {
    let params = ConnectionParams::new(" localhost ", " 3306 ", " root ", " pw ", " mydb ");
    let normalized = params.normalized();

    assert_eq!(normalized.host, "localhost");
    assert_eq!(normalized.database, "mydb");
    assert_eq!(normalized.port_number().unwrap(), 3306);
}
