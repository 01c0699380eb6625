use chat_api::url::ask_stream_url;
use chat_api::{AskRequest, ChatApiClient, ChatApiConfig, ChatApiError};

#[test]
fn http_request_targets_stream_endpoint_with_post() {
    let config = ChatApiConfig::new("https://chat.example.com/api");
    let client = ChatApiClient::new(config).expect("client");
    let request = AskRequest::new("hello", "session-1", "user-1");

    let http_request = client
        .build_ask_request(&request)
        .expect("build request")
        .build()
        .expect("request");

    assert_eq!(
        http_request.url().as_str(),
        ask_stream_url("https://chat.example.com/api")
    );
    assert_eq!(http_request.method(), "POST");
}

#[test]
fn http_request_carries_json_payload() {
    let client = ChatApiClient::new(ChatApiConfig::default()).expect("client");
    let request = AskRequest::new("hello", "session-1", "user-1");

    let http_request = client
        .build_ask_request(&request)
        .expect("build request")
        .build()
        .expect("request");

    let body = http_request.body().expect("json body");
    let bytes = body.as_bytes().expect("buffered body");
    let value: serde_json::Value = serde_json::from_slice(bytes).expect("parse body");
    assert_eq!(value["user_input"], "hello");
    assert_eq!(value["session_id"], "session-1");
    assert_eq!(value["user_id"], "user-1");
}

#[test]
fn http_request_rejects_blank_user_input() {
    let client = ChatApiClient::new(ChatApiConfig::default()).expect("client");
    let request = AskRequest::new("   ", "session-1", "user-1");

    let error = client
        .build_ask_request(&request)
        .err()
        .expect("blank input must be rejected");
    assert!(matches!(error, ChatApiError::EmptyUserInput));
}
