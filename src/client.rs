use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chat_backend::{
    BackendError, ChatBackend, HistoryEntry, ReplyRequest, SessionSummary, SpeakerRole,
};
use client_state::{StateStore, ACTIVE_SESSION_KEY, USER_ID_KEY};
use tracing::warn;
use uuid::Uuid;

use crate::exchange::Exchange;
use crate::turns::{lock_unpoisoned, shared_arena, Role, SharedTurns, Turn, TurnArena};

/// Client core: owns the active session, the visible turn arena, and the
/// in-flight exchange lifecycle.
///
/// Methods take `&self`; interior state is guarded by mutexes held only
/// across synchronous sections, so UI events interleave freely at the await
/// points of an in-flight stream without torn writes.
pub struct ChatClient {
    backend: Arc<dyn ChatBackend>,
    state: Mutex<Box<dyn StateStore>>,
    turns: Mutex<SharedTurns>,
    sessions: Mutex<Vec<SessionSummary>>,
    active_session_id: Mutex<String>,
    user_id: String,
    streaming: AtomicBool,
}

impl ChatClient {
    /// Restores persisted identity (generating and persisting fresh ids
    /// when absent), loads the active session's history, and refreshes the
    /// session list.
    pub async fn initialize(backend: Arc<dyn ChatBackend>, mut state: Box<dyn StateStore>) -> Self {
        let user_id = restore_or_generate(state.as_mut(), USER_ID_KEY, generate_user_id);
        let active_session_id =
            restore_or_generate(state.as_mut(), ACTIVE_SESSION_KEY, generate_session_id);

        let client = Self {
            backend,
            state: Mutex::new(state),
            turns: Mutex::new(shared_arena(TurnArena::new())),
            sessions: Mutex::new(Vec::new()),
            active_session_id: Mutex::new(active_session_id),
            user_id,
            streaming: AtomicBool::new(false),
        };

        client.load_history().await;
        client.refresh_sessions().await;
        client
    }

    /// Current turn sequence of the active session, for rendering.
    #[must_use]
    pub fn turns(&self) -> Vec<Turn> {
        let arena = self.current_arena();
        let snapshot = lock_unpoisoned(&arena).snapshot();
        snapshot
    }

    /// Sessions visible to the active user, as of the last refresh.
    #[must_use]
    pub fn sessions(&self) -> Vec<SessionSummary> {
        lock_unpoisoned(&self.sessions).clone()
    }

    #[must_use]
    pub fn active_session_id(&self) -> String {
        lock_unpoisoned(&self.active_session_id).clone()
    }

    #[must_use]
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// True while a send or regeneration stream is in flight.
    #[must_use]
    pub fn is_streaming(&self) -> bool {
        self.streaming.load(Ordering::SeqCst)
    }

    /// Sends a user message and streams the reply into a fresh assistant
    /// slot at the end of the arena.
    ///
    /// Empty or whitespace-only input is ignored, as is a send while
    /// another stream is in flight.
    pub async fn send(&self, input: &str) {
        let message = input.trim().to_string();
        if message.is_empty() {
            return;
        }
        if self.streaming.swap(true, Ordering::SeqCst) {
            return;
        }

        let arena = self.current_arena();
        let target_index =
            lock_unpoisoned(&arena).append([Turn::user(message.clone()), Turn::placeholder()]);

        self.run_exchange(message, Exchange::new(arena, target_index))
            .await;
    }

    /// Re-runs the assistant reply at `index` from the nearest preceding
    /// user turn.
    ///
    /// A no-op when no user turn precedes `index` or while any stream is in
    /// flight.
    pub async fn regenerate(&self, index: usize) {
        if self.streaming.swap(true, Ordering::SeqCst) {
            return;
        }

        let arena = self.current_arena();
        let message = {
            let guard = lock_unpoisoned(&arena);
            guard
                .turns()
                .iter()
                .take(index)
                .rev()
                .find(|turn| turn.role == Role::User)
                .map(|turn| turn.content.clone())
        };
        let Some(message) = message else {
            self.streaming.store(false, Ordering::SeqCst);
            return;
        };

        lock_unpoisoned(&arena).replace_at(index, Turn::placeholder());
        self.run_exchange(message, Exchange::new(arena, index))
            .await;
    }

    /// Starts a fresh session: new persisted id, empty arena, refreshed
    /// session list.
    pub async fn new_chat(&self) {
        let id = generate_session_id();
        self.set_active_session(&id);
        self.install_arena(TurnArena::new());
        self.refresh_sessions().await;
    }

    /// Makes `id` the active session and replaces the arena wholesale with
    /// its fetched history.
    pub async fn switch_session(&self, id: &str) {
        self.set_active_session(id);
        self.load_history().await;
    }

    /// Deletes a session. Deleting the active session behaves like
    /// [`ChatClient::new_chat`]; deleting another session only refreshes
    /// the list. Deletion failures are logged and the transition proceeds.
    pub async fn delete_session(&self, id: &str) {
        if let Err(error) = self.backend.delete_session(id).await {
            warn!(session_id = id, error = %error, "session deletion failed");
        }

        if id == self.active_session_id() {
            self.new_chat().await;
        } else {
            self.refresh_sessions().await;
        }
    }

    async fn run_exchange(&self, message: String, mut exchange: Exchange) {
        let request = ReplyRequest::new(
            message.clone(),
            self.active_session_id(),
            self.user_id.clone(),
        );

        match self.drive_stream(request, &message, &mut exchange).await {
            Ok(()) => self.refresh_sessions().await,
            Err(error) => {
                warn!(error = %error, "reply stream failed");
                exchange.fail();
            }
        }

        self.streaming.store(false, Ordering::SeqCst);
    }

    /// Consumes one reply stream: adopts a server-assigned session id when
    /// the response carries a different one, then folds chunks into the
    /// target slot strictly in arrival order.
    async fn drive_stream(
        &self,
        request: ReplyRequest,
        message: &str,
        exchange: &mut Exchange,
    ) -> Result<(), BackendError> {
        let requested_session_id = request.session_id.clone();
        let mut stream = self.backend.open_reply(request).await?;

        if let Some(assigned) = stream.assigned_session_id().map(ToOwned::to_owned) {
            if assigned != requested_session_id {
                self.adopt_assigned_session(&assigned).await;
                let arena = self.current_arena();
                let target_index =
                    lock_unpoisoned(&arena).append([Turn::user(message), Turn::placeholder()]);
                exchange.retarget(arena, target_index);
            }
        }

        while let Some(chunk) = stream.next_chunk().await {
            exchange.absorb(&chunk?);
        }

        Ok(())
    }

    /// Same effect as a user-initiated switch, triggered by the stream
    /// consumer mid-exchange.
    async fn adopt_assigned_session(&self, id: &str) {
        self.set_active_session(id);
        self.load_history().await;
    }

    fn set_active_session(&self, id: &str) {
        *lock_unpoisoned(&self.active_session_id) = id.to_string();

        let mut state = lock_unpoisoned(&self.state);
        if let Err(error) = state.set(ACTIVE_SESSION_KEY, id) {
            warn!(error = %error, "failed to persist active session id");
        }
    }

    fn current_arena(&self) -> SharedTurns {
        lock_unpoisoned(&self.turns).clone()
    }

    fn install_arena(&self, arena: TurnArena) {
        *lock_unpoisoned(&self.turns) = shared_arena(arena);
    }

    /// Replaces the arena with the active session's fetched history. Fetch
    /// failures degrade to an empty history.
    async fn load_history(&self) {
        let session_id = self.active_session_id();
        let turns = match self.backend.fetch_history(&session_id).await {
            Ok(entries) => entries.into_iter().map(turn_from_entry).collect(),
            Err(error) => {
                warn!(session_id = %session_id, error = %error, "history fetch failed");
                Vec::new()
            }
        };

        self.install_arena(TurnArena::from_turns(turns));
    }

    /// Refreshes the session list for the active user. Fetch failures
    /// degrade to an empty list.
    async fn refresh_sessions(&self) {
        let sessions = match self.backend.list_sessions(&self.user_id).await {
            Ok(sessions) => sessions,
            Err(error) => {
                warn!(error = %error, "session list fetch failed");
                Vec::new()
            }
        };

        *lock_unpoisoned(&self.sessions) = sessions;
    }
}

fn restore_or_generate(
    state: &mut dyn StateStore,
    key: &str,
    generate: fn() -> String,
) -> String {
    if let Some(value) = state
        .get(key)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
    {
        return value;
    }

    let value = generate();
    if let Err(error) = state.set(key, &value) {
        warn!(key, error = %error, "failed to persist client state");
    }
    value
}

fn turn_from_entry(entry: HistoryEntry) -> Turn {
    let role = match entry.role {
        SpeakerRole::User => Role::User,
        SpeakerRole::Assistant => Role::Assistant,
    };

    Turn {
        role,
        content: entry.content,
    }
}

fn generate_session_id() -> String {
    Uuid::new_v4().to_string()
}

fn generate_user_id() -> String {
    format!("user-{}", Uuid::new_v4())
}

#[cfg(test)]
mod tests {
    use chat_backend::HistoryEntry;
    use client_state::{MemoryStateStore, StateStore, ACTIVE_SESSION_KEY};

    use super::{restore_or_generate, turn_from_entry};
    use crate::turns::Role;

    #[test]
    fn history_entries_map_onto_turn_roles() {
        let user = turn_from_entry(HistoryEntry::user("q"));
        let assistant = turn_from_entry(HistoryEntry::assistant("a"));

        assert_eq!(user.role, Role::User);
        assert_eq!(user.content, "q");
        assert_eq!(assistant.role, Role::Assistant);
        assert_eq!(assistant.content, "a");
    }

    #[test]
    fn restore_or_generate_prefers_persisted_value() {
        let mut store = MemoryStateStore::new();
        store
            .set(ACTIVE_SESSION_KEY, "persisted")
            .expect("memory set is infallible");

        let value = restore_or_generate(&mut store, ACTIVE_SESSION_KEY, || "fresh".to_string());
        assert_eq!(value, "persisted");
    }

    #[test]
    fn restore_or_generate_persists_generated_value() {
        let mut store = MemoryStateStore::new();

        let value = restore_or_generate(&mut store, ACTIVE_SESSION_KEY, || "fresh".to_string());
        assert_eq!(value, "fresh");
        assert_eq!(store.get(ACTIVE_SESSION_KEY).as_deref(), Some("fresh"));
    }
}
