//! Provider-neutral contract between the chat client core and the
//! conversation service that answers it.
//!
//! This crate intentionally defines only the exchange lifecycle and the
//! collaborator lookups the core depends on (history, session listing,
//! deletion). It excludes transport details and wire payload shapes.

use std::fmt;

use async_trait::async_trait;

/// Speaker attached to one stored history message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeakerRole {
    User,
    Assistant,
}

/// One stored message from a session's conversation history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub role: SpeakerRole,
    pub content: String,
}

impl HistoryEntry {
    /// Constructs a user-authored history entry.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: SpeakerRole::User,
            content: content.into(),
        }
    }

    /// Constructs an assistant-authored history entry.
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: SpeakerRole::Assistant,
            content: content.into(),
        }
    }
}

/// One session as reported by the listing collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub last_updated: Option<String>,
}

/// Input required to open one streamed exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyRequest {
    pub user_input: String,
    pub session_id: String,
    pub user_id: String,
}

impl ReplyRequest {
    #[must_use]
    pub fn new(
        user_input: impl Into<String>,
        session_id: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            user_input: user_input.into(),
            session_id: session_id.into(),
            user_id: user_id.into(),
        }
    }
}

/// Error returned by backend operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendError {
    message: String,
}

impl BackendError {
    /// Creates a new backend error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the underlying error message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for BackendError {}

impl From<String> for BackendError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for BackendError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

/// One in-flight streamed reply.
#[async_trait]
pub trait ReplyStream: Send {
    /// Session id the service bound this exchange to, when the response
    /// carried one. Available before any chunk is consumed.
    fn assigned_session_id(&self) -> Option<&str>;

    /// Next decoded text chunk in arrival order, or `None` at end of stream.
    ///
    /// A returned error terminates the stream; further calls yield `None`.
    async fn next_chunk(&mut self) -> Option<Result<String, BackendError>>;
}

/// Conversation service interface consumed by the client core.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Opens the streamed reply for one send/regenerate exchange.
    async fn open_reply(
        &self,
        request: ReplyRequest,
    ) -> Result<Box<dyn ReplyStream>, BackendError>;

    /// Ordered history for a session. Unknown ids yield an empty history.
    async fn fetch_history(&self, session_id: &str) -> Result<Vec<HistoryEntry>, BackendError>;

    /// Sessions visible to one user.
    async fn list_sessions(&self, user_id: &str) -> Result<Vec<SessionSummary>, BackendError>;

    /// Deletes a session and its stored history.
    async fn delete_session(&self, session_id: &str) -> Result<(), BackendError>;
}
