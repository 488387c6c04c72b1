use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, post},
};
use axum_valid::Valid;

use crate::{
    dto::game::{GameSummary, SetWinnerRequest},
    error::AppError,
    services::{game_service, identity_service::Principal},
    state::SharedState,
};

/// Winner recording, correction and deletion of games.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/games/{slug}", delete(delete_game))
        .route("/games/{slug}/winner", post(set_winner).delete(clear_winner))
}

/// Record the winning side and credit the players.
#[utoipa::path(
    post,
    path = "/games/{slug}/winner",
    tag = "games",
    params(
        ("slug" = String, Path, description = "Game slug"),
        ("x-user-id" = String, Header, description = "Identity provider user id"),
        ("x-user-email" = String, Header, description = "Email of the authenticated user")
    ),
    request_body = SetWinnerRequest,
    responses(
        (status = 200, description = "Winner recorded", body = GameSummary),
        (status = 409, description = "A winner is already recorded")
    )
)]
pub async fn set_winner(
    State(state): State<SharedState>,
    principal: Principal,
    Path(slug): Path<String>,
    Valid(Json(payload)): Valid<Json<SetWinnerRequest>>,
) -> Result<Json<GameSummary>, AppError> {
    let game = game_service::set_winner(&state, &principal, &slug, payload.winner).await?;
    Ok(Json(game))
}

/// Clear a recorded winner and withdraw its contribution.
#[utoipa::path(
    delete,
    path = "/games/{slug}/winner",
    tag = "games",
    params(
        ("slug" = String, Path, description = "Game slug"),
        ("x-user-id" = String, Header, description = "Identity provider user id"),
        ("x-user-email" = String, Header, description = "Email of the authenticated user")
    ),
    responses(
        (status = 200, description = "Winner cleared", body = GameSummary),
        (status = 409, description = "No winner is recorded")
    )
)]
pub async fn clear_winner(
    State(state): State<SharedState>,
    principal: Principal,
    Path(slug): Path<String>,
) -> Result<Json<GameSummary>, AppError> {
    Ok(Json(game_service::clear_winner(&state, &principal, &slug).await?))
}

#[utoipa::path(
    delete,
    path = "/games/{slug}",
    tag = "games",
    params(
        ("slug" = String, Path, description = "Game slug"),
        ("x-user-id" = String, Header, description = "Identity provider user id"),
        ("x-user-email" = String, Header, description = "Email of the authenticated user")
    ),
    responses((status = 204, description = "Game deleted"))
)]
pub async fn delete_game(
    State(state): State<SharedState>,
    principal: Principal,
    Path(slug): Path<String>,
) -> Result<StatusCode, AppError> {
    game_service::delete_game(&state, &principal, &slug).await?;
    Ok(StatusCode::NO_CONTENT)
}
