use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
};
use axum_valid::Valid;
use uuid::Uuid;

use crate::{
    dto::{
        stats::{LeaderboardResponse, TeamPairsResponse},
        team::{
            AddMemberRequest, CreateSessionRequest, CreateTeamRequest, MemberSummary,
            SessionSummary, TeamOverview, TeamSummary,
        },
    },
    error::AppError,
    services::{identity_service::Principal, stats_service, team_service},
    state::SharedState,
};

/// Team, roster and session management plus team-scoped statistics.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/teams", post(create_team))
        .route("/teams/{slug}", get(team_overview))
        .route("/teams/{slug}/members", post(add_member))
        .route("/teams/{slug}/members/{member_id}", delete(remove_member))
        .route("/teams/{slug}/sessions", post(create_session))
        .route("/teams/{slug}/leaderboard", get(team_leaderboard))
        .route("/teams/{slug}/pairs", get(team_pairs))
}

/// Open a new team owned by the caller.
#[utoipa::path(
    post,
    path = "/teams",
    tag = "teams",
    params(
        ("x-user-id" = String, Header, description = "Identity provider user id"),
        ("x-user-email" = String, Header, description = "Email of the authenticated user")
    ),
    request_body = CreateTeamRequest,
    responses(
        (status = 201, description = "Team created", body = TeamSummary),
        (status = 403, description = "Package or quota does not allow another team"),
        (status = 409, description = "Slug already taken")
    )
)]
pub async fn create_team(
    State(state): State<SharedState>,
    principal: Principal,
    Valid(Json(payload)): Valid<Json<CreateTeamRequest>>,
) -> Result<(StatusCode, Json<TeamSummary>), AppError> {
    let team = team_service::create_team(&state, &principal, &payload.name).await?;
    Ok((StatusCode::CREATED, Json(team)))
}

/// Team card with members and sessions.
#[utoipa::path(
    get,
    path = "/teams/{slug}",
    tag = "teams",
    params(("slug" = String, Path, description = "Team slug")),
    responses(
        (status = 200, description = "Team overview", body = TeamOverview),
        (status = 404, description = "Unknown team")
    )
)]
pub async fn team_overview(
    State(state): State<SharedState>,
    Path(slug): Path<String>,
) -> Result<Json<TeamOverview>, AppError> {
    Ok(Json(team_service::team_overview(&state, &slug).await?))
}

#[utoipa::path(
    post,
    path = "/teams/{slug}/members",
    tag = "teams",
    params(
        ("slug" = String, Path, description = "Team slug"),
        ("x-user-id" = String, Header, description = "Identity provider user id"),
        ("x-user-email" = String, Header, description = "Email of the authenticated user")
    ),
    request_body = AddMemberRequest,
    responses(
        (status = 201, description = "Member added", body = MemberSummary),
        (status = 409, description = "Already a member")
    )
)]
pub async fn add_member(
    State(state): State<SharedState>,
    principal: Principal,
    Path(slug): Path<String>,
    Valid(Json(payload)): Valid<Json<AddMemberRequest>>,
) -> Result<(StatusCode, Json<MemberSummary>), AppError> {
    let member =
        team_service::add_member(&state, &principal, &slug, &payload.email, payload.display_name)
            .await?;
    Ok((StatusCode::CREATED, Json(member)))
}

#[utoipa::path(
    delete,
    path = "/teams/{slug}/members/{member_id}",
    tag = "teams",
    params(
        ("slug" = String, Path, description = "Team slug"),
        ("member_id" = Uuid, Path, description = "Membership identifier"),
        ("x-user-id" = String, Header, description = "Identity provider user id"),
        ("x-user-email" = String, Header, description = "Email of the authenticated user")
    ),
    responses(
        (status = 204, description = "Member removed"),
        (status = 409, description = "The owner cannot be removed")
    )
)]
pub async fn remove_member(
    State(state): State<SharedState>,
    principal: Principal,
    Path((slug, member_id)): Path<(String, Uuid)>,
) -> Result<StatusCode, AppError> {
    team_service::remove_member(&state, &principal, &slug, member_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Schedule a play session.
#[utoipa::path(
    post,
    path = "/teams/{slug}/sessions",
    tag = "teams",
    params(
        ("slug" = String, Path, description = "Team slug"),
        ("x-user-id" = String, Header, description = "Identity provider user id"),
        ("x-user-email" = String, Header, description = "Email of the authenticated user")
    ),
    request_body = CreateSessionRequest,
    responses((status = 201, description = "Session created", body = SessionSummary))
)]
pub async fn create_session(
    State(state): State<SharedState>,
    principal: Principal,
    Path(slug): Path<String>,
    Valid(Json(payload)): Valid<Json<CreateSessionRequest>>,
) -> Result<(StatusCode, Json<SessionSummary>), AppError> {
    let session =
        team_service::create_session(&state, &principal, &slug, payload.name, &payload.date)
            .await?;
    Ok((StatusCode::CREATED, Json(session)))
}

/// Leaderboard over every game of the team.
#[utoipa::path(
    get,
    path = "/teams/{slug}/leaderboard",
    tag = "stats",
    params(("slug" = String, Path, description = "Team slug")),
    responses((status = 200, description = "Team leaderboard", body = LeaderboardResponse))
)]
pub async fn team_leaderboard(
    State(state): State<SharedState>,
    Path(slug): Path<String>,
) -> Result<Json<LeaderboardResponse>, AppError> {
    Ok(Json(stats_service::team_leaderboard(&state, &slug).await?))
}

/// Doubles pair statistics of the team.
#[utoipa::path(
    get,
    path = "/teams/{slug}/pairs",
    tag = "stats",
    params(("slug" = String, Path, description = "Team slug")),
    responses((status = 200, description = "Pair statistics", body = TeamPairsResponse))
)]
pub async fn team_pairs(
    State(state): State<SharedState>,
    Path(slug): Path<String>,
) -> Result<Json<TeamPairsResponse>, AppError> {
    Ok(Json(stats_service::team_pairs(&state, &slug).await?))
}
