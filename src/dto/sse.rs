use serde::Serialize;
use utoipa::ToSchema;

use crate::dto::{
    game::GameSummary,
    team::{SessionSummary, TeamSummary},
};

#[derive(Clone, Debug)]
/// Dispatched payload carried across SSE channels.
pub struct ServerEvent {
    pub event: Option<String>,
    pub data: String,
}

impl ServerEvent {
    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Initial metadata sent to an SSE client when it connects.
pub struct Handshake {
    /// Identifier of the SSE stream.
    pub stream: String,
    /// Whether the backend is running without a storage backend connection.
    pub degraded: bool,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when the backend enters or leaves degraded mode.
pub struct SystemStatus {
    pub degraded: bool,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when a game is created, decided or reversed.
pub struct GameActivityEvent {
    pub team: String,
    pub game: GameSummary,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when a game is deleted.
pub struct GameDeletedEvent {
    pub team: String,
    pub slug: String,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when a team is created.
pub struct TeamCreatedEvent {
    pub team: TeamSummary,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when a session is scheduled.
pub struct SessionCreatedEvent {
    pub team: String,
    pub session: SessionSummary,
}
