//! End-to-end session tests over the mock database and mock LLM.

use pretty_assertions::assert_eq;
use sql_chat::conversation::{Turn, GREETING};
use sql_chat::db::{ConnectionParams, FailingDatabaseHandle, MockDatabaseHandle};
use sql_chat::error::ChatError;
use sql_chat::llm::MockLlmClient;
use sql_chat::session::{Session, SessionState, NOT_CONNECTED_MESSAGE};

fn connected_session() -> Session {
    Session::with_connection(
        Box::new(MockLlmClient::new()),
        Box::new(MockDatabaseHandle::new()),
    )
}

#[tokio::test]
async fn test_count_question_end_to_end() {
    let mut session = connected_session();

    let answer = session.handle_turn("How many users are there?").await;

    // The canned count result flows through both stages into the answer.
    assert!(answer.contains("42"), "got: {answer}");

    let turns = session.log().turns();
    assert_eq!(turns.len(), 3);
    assert_eq!(turns[0], Turn::Greeting(GREETING.to_string()));
    assert_eq!(turns[1], Turn::user("How many users are there?"));
    assert_eq!(turns[2], Turn::assistant(answer));
}

#[tokio::test]
async fn test_multi_turn_conversation_accumulates() {
    let mut session = connected_session();

    session.handle_turn("How many users are there?").await;
    session.handle_turn("And how many orders?").await;

    // Greeting + 2 * (user + assistant)
    assert_eq!(session.log().len(), 5);
}

#[tokio::test]
async fn test_generation_failure_appends_exactly_one_error_turn() {
    let mut session = Session::with_connection(
        Box::new(MockLlmClient::failing("model overloaded")),
        Box::new(MockDatabaseHandle::new()),
    );
    let before = session.log().len();

    let answer = session.handle_turn("How many users are there?").await;

    assert_eq!(session.log().len(), before + 2);
    assert!(answer.contains("Generation error"));
    // The session survives and the next turn still works structurally.
    let answer = session.handle_turn("Still there?").await;
    assert_eq!(session.log().len(), before + 4);
    assert!(answer.contains("Generation error"));
}

#[tokio::test]
async fn test_execution_failure_surfaces_driver_message() {
    let mut session = Session::with_connection(
        Box::new(MockLlmClient::new()),
        Box::new(FailingDatabaseHandle::new(
            "Table 'mydb.users' doesn't exist",
        )),
    );

    let answer = session.handle_turn("How many users are there?").await;

    assert!(answer.contains("Execution error"));
    assert!(answer.contains("Table 'mydb.users' doesn't exist"));
}

#[tokio::test]
async fn test_question_while_disconnected() {
    let mut session = Session::new(Box::new(MockLlmClient::new()));

    let answer = session.handle_turn("How many users are there?").await;

    assert_eq!(answer, NOT_CONNECTED_MESSAGE);
    assert_eq!(session.log().len(), 3);
}

#[tokio::test]
async fn test_connect_with_invalid_port_stays_disconnected() {
    let mut session = Session::new(Box::new(MockLlmClient::new()));
    let params = ConnectionParams::new("localhost", "not-a-port", "root", "pw", "mydb");

    let err = session.connect(&params).await.unwrap_err();

    assert!(matches!(err, ChatError::Config(_)));
    assert_eq!(session.state(), SessionState::Disconnected);
}

#[tokio::test]
async fn test_reset_returns_to_initial_state() {
    let mut session = connected_session();
    session.handle_turn("How many users are there?").await;
    assert!(session.is_connected());

    session.reset().await;

    assert_eq!(session.state(), SessionState::Disconnected);
    let turns = session.log().turns();
    assert_eq!(turns.len(), 1);
    assert_eq!(turns[0], Turn::Greeting(GREETING.to_string()));
}

#[tokio::test]
async fn test_disconnect_preserves_conversation() {
    let mut session = connected_session();
    session.handle_turn("How many users are there?").await;
    let len_before = session.log().len();

    session.disconnect().await;

    assert!(!session.is_connected());
    assert_eq!(session.log().len(), len_before);

    // Questions after disconnect still follow the two-turn rule.
    session.handle_turn("Anyone home?").await;
    assert_eq!(session.log().len(), len_before + 2);
}

#[tokio::test]
async fn test_append_only_order_is_preserved() {
    let mut session = connected_session();

    for i in 0..4 {
        session.handle_turn(&format!("question {i}")).await;
    }

    let turns = session.log().turns();
    assert_eq!(turns.len(), 9);
    for i in 0..4 {
        match &turns[1 + i * 2] {
            Turn::User(text) => assert_eq!(text, &format!("question {i}")),
            other => panic!("expected user turn, got {other:?}"),
        }
        assert!(matches!(turns[2 + i * 2], Turn::Assistant(_)));
    }
}
