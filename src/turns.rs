use std::sync::{Arc, Mutex, MutexGuard};

/// Role attached to one conversational turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

/// One message in a conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    /// Assistant turn with empty content, rendered as a loading indicator
    /// until streaming fills it.
    #[must_use]
    pub fn placeholder() -> Self {
        Self::assistant("")
    }

    /// True for an assistant turn whose content has not arrived yet.
    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        self.role == Role::Assistant && self.content.is_empty()
    }
}

/// Ordered turn slots for the active session.
///
/// Slots are addressed by position. `replace_at` on a position that no
/// longer exists is a no-op, which keeps writes from a superseded stream
/// harmless (see crate docs).
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TurnArena {
    turns: Vec<Turn>,
}

impl TurnArena {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_turns(turns: Vec<Turn>) -> Self {
        Self { turns }
    }

    /// Appends turns at the end; returns the index of the last slot after
    /// the append.
    pub fn append(&mut self, turns: impl IntoIterator<Item = Turn>) -> usize {
        self.turns.extend(turns);
        self.turns.len().saturating_sub(1)
    }

    /// Overwrites the slot at `index` wholesale.
    ///
    /// Returns false and mutates nothing when `index` is out of bounds at
    /// call time.
    pub fn replace_at(&mut self, index: usize, turn: Turn) -> bool {
        match self.turns.get_mut(index) {
            Some(slot) => {
                *slot = turn;
                true
            }
            None => false,
        }
    }

    /// Full ordered copy for rendering.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Turn> {
        self.turns.clone()
    }

    #[must_use]
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

/// Shared handle through which exchanges write into an arena.
pub type SharedTurns = Arc<Mutex<TurnArena>>;

pub(crate) fn shared_arena(arena: TurnArena) -> SharedTurns {
    Arc::new(Mutex::new(arena))
}

pub(crate) fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
