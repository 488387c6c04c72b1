use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::get,
};
use axum_valid::Valid;

use crate::{
    dto::tournament::{CreateTournamentRequest, TournamentSummary},
    error::AppError,
    services::{identity_service::Principal, tournament_service},
    state::SharedState,
};

pub fn router() -> Router<SharedState> {
    Router::new().route("/tournaments", get(list_tournaments).post(create_tournament))
}

/// Open a tournament owned by the caller.
#[utoipa::path(
    post,
    path = "/tournaments",
    tag = "tournaments",
    params(
        ("x-user-id" = String, Header, description = "Identity provider user id"),
        ("x-user-email" = String, Header, description = "Email of the authenticated user")
    ),
    request_body = CreateTournamentRequest,
    responses(
        (status = 201, description = "Tournament created", body = TournamentSummary),
        (status = 403, description = "Package or quota does not allow another tournament")
    )
)]
pub async fn create_tournament(
    State(state): State<SharedState>,
    principal: Principal,
    Valid(Json(payload)): Valid<Json<CreateTournamentRequest>>,
) -> Result<(StatusCode, Json<TournamentSummary>), AppError> {
    let tournament = tournament_service::create_tournament(
        &state,
        &principal,
        &payload.name,
        payload.min_games_per_player,
        payload.banner_url,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(tournament)))
}

/// Tournaments owned by the caller.
#[utoipa::path(
    get,
    path = "/tournaments",
    tag = "tournaments",
    params(
        ("x-user-id" = String, Header, description = "Identity provider user id"),
        ("x-user-email" = String, Header, description = "Email of the authenticated user")
    ),
    responses((status = 200, description = "Owned tournaments", body = [TournamentSummary]))
)]
pub async fn list_tournaments(
    State(state): State<SharedState>,
    principal: Principal,
) -> Result<Json<Vec<TournamentSummary>>, AppError> {
    Ok(Json(
        tournament_service::list_tournaments(&state, &principal).await?,
    ))
}
