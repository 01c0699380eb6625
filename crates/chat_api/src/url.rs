/// Default base URL for the conversation service.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";

/// Normalize a base URL for endpoint construction.
///
/// Empty input falls back to [`DEFAULT_BASE_URL`]; surrounding whitespace and
/// trailing slashes are stripped.
pub fn normalize_base_url(input: &str) -> String {
    let base = if input.trim().is_empty() {
        DEFAULT_BASE_URL
    } else {
        input.trim()
    };

    base.trim_end_matches('/').to_string()
}

/// Streaming completion endpoint.
pub fn ask_stream_url(base: &str) -> String {
    format!("{}/ask/stream", normalize_base_url(base))
}

/// Session listing endpoint.
pub fn sessions_url(base: &str) -> String {
    format!("{}/sessions", normalize_base_url(base))
}

/// Single-session endpoint, used for deletion.
pub fn session_url(base: &str, session_id: &str) -> String {
    format!("{}/sessions/{session_id}", normalize_base_url(base))
}

/// Conversation history endpoint for one session.
pub fn history_url(base: &str, session_id: &str) -> String {
    format!("{}/history/{session_id}", normalize_base_url(base))
}
