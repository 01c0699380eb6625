//! Deterministic mock implementation of the shared `chat_backend` contract.
//!
//! This crate contains no transport logic and is intended for local
//! development and contract-level integration testing. Reply streams yield
//! to the scheduler before each scripted step so callers can observe and
//! interleave work mid-stream.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chat_backend::{
    BackendError, ChatBackend, HistoryEntry, ReplyRequest, ReplyStream, SessionSummary,
};

/// One scripted step of a mock reply stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptedStep {
    /// Emit a decoded text chunk.
    Chunk(String),
    /// Fail the stream mid-flight.
    Fail(String),
}

/// Script for one `open_reply` call.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ScriptedReply {
    pub assigned_session_id: Option<String>,
    pub steps: Vec<ScriptedStep>,
}

impl ScriptedReply {
    /// Creates a script that streams the given chunks and completes.
    #[must_use]
    pub fn chunks<I, S>(chunks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            assigned_session_id: None,
            steps: chunks
                .into_iter()
                .map(|chunk| ScriptedStep::Chunk(chunk.into()))
                .collect(),
        }
    }

    /// Declares the session id the mock service binds this exchange to.
    #[must_use]
    pub fn with_assigned_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.assigned_session_id = Some(session_id.into());
        self
    }

    /// Appends a mid-stream failure after the scripted chunks.
    #[must_use]
    pub fn then_fail(mut self, message: impl Into<String>) -> Self {
        self.steps.push(ScriptedStep::Fail(message.into()));
        self
    }
}

/// Deterministic mock backend used by `chat_panel` tests and local runs.
#[derive(Debug, Default)]
pub struct MockBackend {
    replies: Mutex<VecDeque<Result<ScriptedReply, BackendError>>>,
    requests: Mutex<Vec<ReplyRequest>>,
    history_fetches: Mutex<Vec<String>>,
    sessions: Mutex<Vec<SessionSummary>>,
    histories: Mutex<HashMap<String, Vec<HistoryEntry>>>,
    fail_next_history: Mutex<Option<String>>,
    fail_next_list: Mutex<Option<String>>,
}

impl MockBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues the script for the next `open_reply` call.
    pub fn push_reply(&self, reply: ScriptedReply) {
        lock_unpoisoned(&self.replies).push_back(Ok(reply));
    }

    /// Queues a failure for the next `open_reply` call (the request cannot
    /// be sent at all).
    pub fn push_open_failure(&self, message: impl Into<String>) {
        lock_unpoisoned(&self.replies).push_back(Err(BackendError::new(message.into())));
    }

    /// Seeds a session with stored history.
    pub fn insert_session(&self, summary: SessionSummary, history: Vec<HistoryEntry>) {
        lock_unpoisoned(&self.histories).insert(summary.id.clone(), history);
        lock_unpoisoned(&self.sessions).push(summary);
    }

    /// Fails the next `fetch_history` call with the given message.
    pub fn fail_next_history(&self, message: impl Into<String>) {
        *lock_unpoisoned(&self.fail_next_history) = Some(message.into());
    }

    /// Fails the next `list_sessions` call with the given message.
    pub fn fail_next_list(&self, message: impl Into<String>) {
        *lock_unpoisoned(&self.fail_next_list) = Some(message.into());
    }

    /// Requests observed by `open_reply`, in call order.
    #[must_use]
    pub fn recorded_requests(&self) -> Vec<ReplyRequest> {
        lock_unpoisoned(&self.requests).clone()
    }

    /// Session ids observed by `fetch_history`, in call order.
    #[must_use]
    pub fn recorded_history_fetches(&self) -> Vec<String> {
        lock_unpoisoned(&self.history_fetches).clone()
    }

    /// Ids of the sessions currently stored, in insertion order.
    #[must_use]
    pub fn session_ids(&self) -> Vec<String> {
        lock_unpoisoned(&self.sessions)
            .iter()
            .map(|summary| summary.id.clone())
            .collect()
    }
}

#[derive(Debug)]
struct MockReplyStream {
    assigned_session_id: Option<String>,
    steps: VecDeque<ScriptedStep>,
}

#[async_trait]
impl ReplyStream for MockReplyStream {
    fn assigned_session_id(&self) -> Option<&str> {
        self.assigned_session_id.as_deref()
    }

    async fn next_chunk(&mut self) -> Option<Result<String, BackendError>> {
        // Suspension point before each step, mirroring network chunk arrival.
        tokio::task::yield_now().await;

        match self.steps.pop_front()? {
            ScriptedStep::Chunk(text) => Some(Ok(text)),
            ScriptedStep::Fail(message) => {
                self.steps.clear();
                Some(Err(BackendError::new(message)))
            }
        }
    }
}

#[async_trait]
impl ChatBackend for MockBackend {
    async fn open_reply(
        &self,
        request: ReplyRequest,
    ) -> Result<Box<dyn ReplyStream>, BackendError> {
        lock_unpoisoned(&self.requests).push(request);

        let scripted = lock_unpoisoned(&self.replies)
            .pop_front()
            .unwrap_or_else(|| Err(BackendError::new("no scripted reply queued")))?;

        Ok(Box::new(MockReplyStream {
            assigned_session_id: scripted.assigned_session_id,
            steps: scripted.steps.into(),
        }))
    }

    async fn fetch_history(&self, session_id: &str) -> Result<Vec<HistoryEntry>, BackendError> {
        lock_unpoisoned(&self.history_fetches).push(session_id.to_string());

        if let Some(message) = lock_unpoisoned(&self.fail_next_history).take() {
            return Err(BackendError::new(message));
        }

        Ok(lock_unpoisoned(&self.histories)
            .get(session_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn list_sessions(&self, user_id: &str) -> Result<Vec<SessionSummary>, BackendError> {
        if let Some(message) = lock_unpoisoned(&self.fail_next_list).take() {
            return Err(BackendError::new(message));
        }

        Ok(lock_unpoisoned(&self.sessions)
            .iter()
            .filter(|summary| summary.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn delete_session(&self, session_id: &str) -> Result<(), BackendError> {
        lock_unpoisoned(&self.sessions).retain(|summary| summary.id != session_id);
        lock_unpoisoned(&self.histories).remove(session_id);
        Ok(())
    }
}

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
