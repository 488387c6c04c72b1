use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};

use crate::{
    dto::stats::PlayerStatsResponse, error::AppError, services::stats_service,
    state::SharedState,
};

pub fn router() -> Router<SharedState> {
    Router::new().route("/players/{email}/stats", get(player_stats))
}

/// Cumulative counters of a player across all teams.
#[utoipa::path(
    get,
    path = "/players/{email}/stats",
    tag = "stats",
    params(("email" = String, Path, description = "Player email")),
    responses((status = 200, description = "Player counters", body = PlayerStatsResponse))
)]
pub async fn player_stats(
    State(state): State<SharedState>,
    Path(email): Path<String>,
) -> Result<Json<PlayerStatsResponse>, AppError> {
    Ok(Json(stats_service::player_stats(&state, &email).await?))
}
