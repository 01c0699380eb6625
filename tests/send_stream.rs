use std::sync::Arc;

use chat_backend::SessionSummary;
use chat_backend_mock::{MockBackend, ScriptedReply};
use chat_panel::{ChatClient, Role, Turn, ERROR_REPLY};
use client_state::{MemoryStateStore, StateStore, ACTIVE_SESSION_KEY, USER_ID_KEY};

fn seeded_store(session_id: &str, user_id: &str) -> Box<dyn StateStore> {
    let mut store = MemoryStateStore::new();
    store
        .set(ACTIVE_SESSION_KEY, session_id)
        .expect("memory set is infallible");
    store
        .set(USER_ID_KEY, user_id)
        .expect("memory set is infallible");
    Box::new(store)
}

fn summary(id: &str, user_id: &str) -> SessionSummary {
    SessionSummary {
        id: id.to_string(),
        user_id: user_id.to_string(),
        title: "chat".to_string(),
        last_updated: None,
    }
}

#[tokio::test]
async fn send_appends_user_turn_and_streams_reply_to_completion() {
    let backend = Arc::new(MockBackend::new());
    backend.insert_session(summary("s-1", "user-1"), Vec::new());
    backend.push_reply(ScriptedReply::chunks(["Hel", "lo ", "world"]));
    let client = ChatClient::initialize(backend.clone(), seeded_store("s-1", "user-1")).await;

    client.send("  hi  ").await;

    assert_eq!(
        client.turns(),
        vec![Turn::user("hi"), Turn::assistant("Hello world")]
    );
    assert!(!client.is_streaming());

    let requests = backend.recorded_requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].user_input, "hi");
    assert_eq!(requests[0].session_id, "s-1");
    assert_eq!(requests[0].user_id, "user-1");

    // Completion refreshes session metadata.
    assert_eq!(client.sessions().len(), 1);
}

#[tokio::test]
async fn send_shows_placeholder_until_first_chunk_arrives() {
    let backend = Arc::new(MockBackend::new());
    backend.push_reply(ScriptedReply::chunks(["reply"]));
    let client = Arc::new(
        ChatClient::initialize(backend.clone(), seeded_store("s-1", "user-1")).await,
    );

    let send = tokio::spawn({
        let client = client.clone();
        async move { client.send("hi").await }
    });

    while client.turns().len() < 2 {
        tokio::task::yield_now().await;
    }
    let turns = client.turns();
    assert_eq!(turns[0], Turn::user("hi"));
    assert_eq!(turns[1].role, Role::Assistant);
    assert!(turns[1].is_placeholder());
    assert!(client.is_streaming());

    send.await.expect("send task should complete");
    assert_eq!(client.turns()[1], Turn::assistant("reply"));
}

#[tokio::test]
async fn streamed_chunks_converge_without_duplication() {
    let backend = Arc::new(MockBackend::new());
    backend.push_reply(ScriptedReply::chunks(["A", "B", "C"]));
    let client = Arc::new(
        ChatClient::initialize(backend.clone(), seeded_store("s-1", "user-1")).await,
    );

    let send = tokio::spawn({
        let client = client.clone();
        async move { client.send("go").await }
    });

    let mut observed = Vec::new();
    while !send.is_finished() {
        let turns = client.turns();
        if turns.len() == 2 {
            observed.push(turns[1].content.clone());
        }
        tokio::task::yield_now().await;
    }
    send.await.expect("send task should complete");

    assert_eq!(client.turns()[1].content, "ABC");
    for partial in observed {
        assert!(
            "ABC".starts_with(&partial),
            "intermediate write {partial:?} is not a prefix of the final reply"
        );
    }
}

#[tokio::test]
async fn empty_and_whitespace_input_never_produce_a_send() {
    let backend = Arc::new(MockBackend::new());
    let client = ChatClient::initialize(backend.clone(), seeded_store("s-1", "user-1")).await;

    client.send("").await;
    client.send("   \n\t").await;

    assert!(client.turns().is_empty());
    assert!(backend.recorded_requests().is_empty());
}

#[tokio::test]
async fn open_failure_writes_exactly_one_error_turn() {
    let backend = Arc::new(MockBackend::new());
    backend.push_open_failure("connection refused");
    let client = ChatClient::initialize(backend.clone(), seeded_store("s-1", "user-1")).await;

    client.send("hi").await;

    assert_eq!(
        client.turns(),
        vec![Turn::user("hi"), Turn::assistant(ERROR_REPLY)]
    );
    assert!(!client.is_streaming());
}

#[tokio::test]
async fn retrying_after_a_failure_adds_no_duplicate_error_turns() {
    let backend = Arc::new(MockBackend::new());
    backend.push_open_failure("connection refused");
    backend.push_reply(ScriptedReply::chunks(["recovered"]));
    let client = ChatClient::initialize(backend.clone(), seeded_store("s-1", "user-1")).await;

    client.send("hi").await;
    client.send("hi again").await;

    let turns = client.turns();
    assert_eq!(
        turns,
        vec![
            Turn::user("hi"),
            Turn::assistant(ERROR_REPLY),
            Turn::user("hi again"),
            Turn::assistant("recovered"),
        ]
    );
    let error_turns = turns
        .iter()
        .filter(|turn| turn.content == ERROR_REPLY)
        .count();
    assert_eq!(error_turns, 1);
}

#[tokio::test]
async fn mid_stream_failure_overwrites_partial_reply_with_error() {
    let backend = Arc::new(MockBackend::new());
    backend.push_reply(ScriptedReply::chunks(["par", "tial"]).then_fail("connection reset"));
    let client = ChatClient::initialize(backend.clone(), seeded_store("s-1", "user-1")).await;

    client.send("hi").await;

    assert_eq!(
        client.turns(),
        vec![Turn::user("hi"), Turn::assistant(ERROR_REPLY)]
    );
}

#[tokio::test]
async fn send_is_refused_while_a_stream_is_in_flight() {
    let backend = Arc::new(MockBackend::new());
    backend.push_reply(ScriptedReply::chunks(["slow", " reply"]));
    let client = Arc::new(
        ChatClient::initialize(backend.clone(), seeded_store("s-1", "user-1")).await,
    );

    let send = tokio::spawn({
        let client = client.clone();
        async move { client.send("first").await }
    });

    while !client.is_streaming() {
        tokio::task::yield_now().await;
    }
    client.send("second").await;
    send.await.expect("send task should complete");

    assert_eq!(backend.recorded_requests().len(), 1);
    assert_eq!(
        client.turns(),
        vec![Turn::user("first"), Turn::assistant("slow reply")]
    );
}
