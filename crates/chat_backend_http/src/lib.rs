//! HTTP-backed implementation of the shared `chat_backend` contract.
//!
//! This adapter translates `chat_api` transport semantics into the
//! provider-neutral types expected by the client core.

use async_trait::async_trait;
use chat_api::{
    AskRequest, AskStream, ChatApiClient, ChatApiConfig, ChatApiError, HistoryRecord,
    HistorySpeaker, SessionRecord,
};
use chat_backend::{
    BackendError, ChatBackend, HistoryEntry, ReplyRequest, ReplyStream, SessionSummary,
    SpeakerRole,
};

/// `ChatBackend` adapter backed by `chat_api` transport primitives.
#[derive(Debug)]
pub struct HttpChatBackend {
    client: ChatApiClient,
}

impl HttpChatBackend {
    /// Creates a backend using real service transport.
    pub fn new(config: ChatApiConfig) -> Result<Self, BackendError> {
        Ok(Self {
            client: ChatApiClient::new(config).map_err(map_transport_error)?,
        })
    }

    /// Wraps an already-configured transport client.
    #[must_use]
    pub fn from_client(client: ChatApiClient) -> Self {
        Self { client }
    }
}

struct HttpReplyStream {
    inner: AskStream,
}

#[async_trait]
impl ReplyStream for HttpReplyStream {
    fn assigned_session_id(&self) -> Option<&str> {
        self.inner.assigned_session_id()
    }

    async fn next_chunk(&mut self) -> Option<Result<String, BackendError>> {
        self.inner
            .next_chunk()
            .await
            .map(|chunk| chunk.map_err(map_transport_error))
    }
}

#[async_trait]
impl ChatBackend for HttpChatBackend {
    async fn open_reply(
        &self,
        request: ReplyRequest,
    ) -> Result<Box<dyn ReplyStream>, BackendError> {
        let request = AskRequest::new(request.user_input, request.session_id, request.user_id);
        let inner = self
            .client
            .open_ask_stream(&request)
            .await
            .map_err(map_transport_error)?;
        Ok(Box::new(HttpReplyStream { inner }))
    }

    async fn fetch_history(&self, session_id: &str) -> Result<Vec<HistoryEntry>, BackendError> {
        let records = self
            .client
            .fetch_history(session_id)
            .await
            .map_err(map_transport_error)?;
        Ok(records.into_iter().map(entry_from_record).collect())
    }

    async fn list_sessions(&self, user_id: &str) -> Result<Vec<SessionSummary>, BackendError> {
        let records = self
            .client
            .list_sessions(Some(user_id))
            .await
            .map_err(map_transport_error)?;
        Ok(records.into_iter().map(summary_from_record).collect())
    }

    async fn delete_session(&self, session_id: &str) -> Result<(), BackendError> {
        self.client
            .delete_session(session_id)
            .await
            .map_err(map_transport_error)
    }
}

fn map_transport_error(error: ChatApiError) -> BackendError {
    BackendError::new(error.to_string())
}

fn entry_from_record(record: HistoryRecord) -> HistoryEntry {
    let role = match record.speaker {
        HistorySpeaker::Human => SpeakerRole::User,
        HistorySpeaker::Ai => SpeakerRole::Assistant,
    };

    HistoryEntry {
        role,
        content: record.content,
    }
}

fn summary_from_record(record: SessionRecord) -> SessionSummary {
    SessionSummary {
        id: record.id,
        user_id: record.user_id,
        title: record.title,
        last_updated: record.last_updated,
    }
}
