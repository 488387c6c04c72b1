use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::GameEntity,
    dto::{format_system_time, validation::validate_roster},
    stats::Side,
};

/// Rosters of a new game: one player per side for singles, two for doubles.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateGameRequest {
    #[validate(custom(function = "validate_roster"))]
    pub side_a: Vec<String>,
    #[validate(custom(function = "validate_roster"))]
    pub side_b: Vec<String>,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct SetWinnerRequest {
    pub winner: Side,
}

#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameFormat {
    Singles,
    Doubles,
}

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct GameSummary {
    pub id: Uuid,
    pub slug: String,
    pub session_id: Uuid,
    pub format: GameFormat,
    pub side_a: Vec<String>,
    pub side_b: Vec<String>,
    /// Absent while the game is pending.
    pub winner: Option<Side>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&GameEntity> for GameSummary {
    fn from(game: &GameEntity) -> Self {
        let format = if game.side_a.len() == 2 {
            GameFormat::Doubles
        } else {
            GameFormat::Singles
        };
        Self {
            id: game.id,
            slug: game.slug.clone(),
            session_id: game.session_id,
            format,
            side_a: game.side_a.clone(),
            side_b: game.side_b.clone(),
            winner: game.winner,
            created_at: format_system_time(game.created_at),
            updated_at: format_system_time(game.updated_at),
        }
    }
}
