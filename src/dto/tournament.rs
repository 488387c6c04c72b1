use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::TournamentEntity,
    dto::{format_system_time, validation::validate_name},
};

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateTournamentRequest {
    #[validate(custom(function = "validate_name"))]
    pub name: String,
    /// Games each player must complete to rank.
    #[serde(default)]
    #[validate(range(max = 100))]
    pub min_games_per_player: u32,
    #[validate(url)]
    pub banner_url: Option<String>,
}

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TournamentSummary {
    pub id: Uuid,
    pub slug: String,
    pub name: String,
    pub banner_url: Option<String>,
    pub min_games_per_player: u32,
    pub created_at: String,
}

impl From<TournamentEntity> for TournamentSummary {
    fn from(tournament: TournamentEntity) -> Self {
        Self {
            id: tournament.id,
            slug: tournament.slug,
            name: tournament.name,
            banner_url: tournament.banner_url,
            min_games_per_player: tournament.min_games_per_player,
            created_at: format_system_time(tournament.created_at),
        }
    }
}
