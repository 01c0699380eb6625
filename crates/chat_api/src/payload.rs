use serde::{Deserialize, Serialize};

/// Request payload for the streaming completion endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AskRequest {
    pub user_input: String,
    pub session_id: String,
    pub user_id: String,
}

impl AskRequest {
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

/// One session as reported by the listing endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: String,
    pub user_id: String,
    pub title: String,
    #[serde(default)]
    pub last_updated: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SessionsResponse {
    pub sessions: Vec<SessionRecord>,
}

/// Speaker tag used by the history endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistorySpeaker {
    Human,
    Ai,
}

/// One stored message as reported by the history endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    #[serde(rename = "type")]
    pub speaker: HistorySpeaker,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct HistoryResponse {
    pub history: Vec<HistoryRecord>,
}
