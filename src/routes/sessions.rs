use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use axum_valid::Valid;

use crate::{
    dto::{
        game::{CreateGameRequest, GameSummary},
        stats::LeaderboardResponse,
    },
    error::AppError,
    services::{game_service, identity_service::Principal, stats_service},
    state::SharedState,
};

/// Games and leaderboard of a single session.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route(
            "/sessions/{slug}/games",
            get(list_session_games).post(create_game),
        )
        .route("/sessions/{slug}/leaderboard", get(session_leaderboard))
}

#[utoipa::path(
    get,
    path = "/sessions/{slug}/games",
    tag = "games",
    params(("slug" = String, Path, description = "Session slug")),
    responses((status = 200, description = "Games of the session", body = [GameSummary]))
)]
pub async fn list_session_games(
    State(state): State<SharedState>,
    Path(slug): Path<String>,
) -> Result<Json<Vec<GameSummary>>, AppError> {
    Ok(Json(game_service::list_session_games(&state, &slug).await?))
}

/// Register a pending singles or doubles game.
#[utoipa::path(
    post,
    path = "/sessions/{slug}/games",
    tag = "games",
    params(
        ("slug" = String, Path, description = "Session slug"),
        ("x-user-id" = String, Header, description = "Identity provider user id"),
        ("x-user-email" = String, Header, description = "Email of the authenticated user")
    ),
    request_body = CreateGameRequest,
    responses(
        (status = 201, description = "Game created", body = GameSummary),
        (status = 400, description = "Singles require 1 vs 1, doubles require 2 vs 2 players.")
    )
)]
pub async fn create_game(
    State(state): State<SharedState>,
    principal: Principal,
    Path(slug): Path<String>,
    Valid(Json(payload)): Valid<Json<CreateGameRequest>>,
) -> Result<(StatusCode, Json<GameSummary>), AppError> {
    let game =
        game_service::create_game(&state, &principal, &slug, payload.side_a, payload.side_b)
            .await?;
    Ok((StatusCode::CREATED, Json(game)))
}

/// Leaderboard over the session's games.
#[utoipa::path(
    get,
    path = "/sessions/{slug}/leaderboard",
    tag = "stats",
    params(("slug" = String, Path, description = "Session slug")),
    responses((status = 200, description = "Session leaderboard", body = LeaderboardResponse))
)]
pub async fn session_leaderboard(
    State(state): State<SharedState>,
    Path(slug): Path<String>,
) -> Result<Json<LeaderboardResponse>, AppError> {
    Ok(Json(stats_service::session_leaderboard(&state, &slug).await?))
}
