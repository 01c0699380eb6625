//! Embeddable chat client core.
//!
//! `chat_panel` reconciles a streamed reply into an ordered list of
//! conversational turns while the response is still arriving, coordinates
//! multiple persisted sessions for one user, and regenerates prior answers
//! in place. Rendering, input widgets, and the conversation service itself
//! are external collaborators, reached through the `chat_backend` contract
//! and the `client_state` capability.
//!
//! The central reconciliation rule: every transition that replaces the
//! visible history (new chat, session switch, deletion, server-driven
//! reassignment) installs a fresh turn arena, while an in-flight exchange
//! keeps writing through the arena handle it captured when it started.
//! Writes from a superseded stream therefore land in an orphaned arena
//! instead of corrupting the newly active session.

pub mod client;
pub mod exchange;
pub mod turns;

pub use client::ChatClient;
pub use exchange::ERROR_REPLY;
pub use turns::{Role, SharedTurns, Turn, TurnArena};
