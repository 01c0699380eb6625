//! Transport-only client primitives for the conversation service.
//!
//! This crate owns request building, wire-format parsing, URL normalization,
//! and incremental decoding of streamed reply bodies for the service
//! endpoints only. It intentionally contains no session-coordination logic
//! and no UI coupling; those live above the `chat_backend` contract.
//!
//! Streamed bytes pass through [`StreamTextDecoder`] so multi-byte UTF-8
//! sequences split across network chunks are reassembled instead of being
//! decoded per chunk.

pub mod client;
pub mod config;
pub mod decode;
pub mod error;
pub mod headers;
pub mod payload;
pub mod url;

pub use client::{AskStream, ChatApiClient};
pub use config::ChatApiConfig;
pub use decode::StreamTextDecoder;
pub use error::ChatApiError;
pub use payload::{AskRequest, HistoryRecord, HistorySpeaker, SessionRecord};
pub use url::normalize_base_url;
