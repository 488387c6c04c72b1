use serde::Serialize;
use tracing::warn;

use crate::{
    dto::{
        game::GameSummary,
        sse::{
            GameActivityEvent, GameDeletedEvent, ServerEvent, SessionCreatedEvent, SystemStatus,
            TeamCreatedEvent,
        },
        team::{SessionSummary, TeamSummary},
    },
    state::AppState,
};

const EVENT_SYSTEM_STATUS: &str = "system.status";
const EVENT_GAME_CREATED: &str = "game.created";
const EVENT_GAME_DECIDED: &str = "game.decided";
const EVENT_GAME_REVERSED: &str = "game.reversed";
const EVENT_GAME_DELETED: &str = "game.deleted";
const EVENT_TEAM_CREATED: &str = "team.created";
const EVENT_SESSION_CREATED: &str = "session.created";

/// Announce that the backend entered or left degraded mode.
pub fn broadcast_system_status(state: &AppState, degraded: bool) {
    send_activity_event(state, EVENT_SYSTEM_STATUS, &SystemStatus { degraded });
}

pub fn broadcast_game_created(state: &AppState, team: &str, game: GameSummary) {
    let payload = GameActivityEvent {
        team: team.to_owned(),
        game,
    };
    send_activity_event(state, EVENT_GAME_CREATED, &payload);
}

/// Broadcast a game whose winner was just recorded.
pub fn broadcast_game_decided(state: &AppState, team: &str, game: GameSummary) {
    let payload = GameActivityEvent {
        team: team.to_owned(),
        game,
    };
    send_activity_event(state, EVENT_GAME_DECIDED, &payload);
}

/// Broadcast a game whose winner was cleared.
pub fn broadcast_game_reversed(state: &AppState, team: &str, game: GameSummary) {
    let payload = GameActivityEvent {
        team: team.to_owned(),
        game,
    };
    send_activity_event(state, EVENT_GAME_REVERSED, &payload);
}

pub fn broadcast_game_deleted(state: &AppState, team: &str, slug: &str) {
    let payload = GameDeletedEvent {
        team: team.to_owned(),
        slug: slug.to_owned(),
    };
    send_activity_event(state, EVENT_GAME_DELETED, &payload);
}

pub fn broadcast_team_created(state: &AppState, team: TeamSummary) {
    send_activity_event(state, EVENT_TEAM_CREATED, &TeamCreatedEvent { team });
}

pub fn broadcast_session_created(state: &AppState, team: &str, session: SessionSummary) {
    let payload = SessionCreatedEvent {
        team: team.to_owned(),
        session,
    };
    send_activity_event(state, EVENT_SESSION_CREATED, &payload);
}

fn send_activity_event(state: &AppState, event: &str, payload: &impl Serialize) {
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(event) => state.activity().broadcast(event),
        Err(err) => warn!(event, error = %err, "failed to serialize activity SSE payload"),
    }
}
