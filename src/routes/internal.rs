use axum::{
    Json, Router,
    body::Body,
    extract::State,
    http::Request,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};

use crate::{
    dto::account::{BackfillReport, BootstrapResponse, SafeBackfillReport},
    error::AppError,
    services::{identity_service, identity_service::Principal, maintenance_service},
    state::SharedState,
};

const INTERNAL_TOKEN_HEADER: &str = "x-internal-token";

/// Maintenance endpoints guarded by the shared internal token.
pub fn router(state: SharedState) -> Router<SharedState> {
    Router::new()
        .route("/internal/bootstrap", get(bootstrap))
        .route("/internal/backfill", post(backfill))
        .route("/internal/safe-backfill", post(safe_backfill))
        .route_layer(middleware::from_fn_with_state(state, require_internal_token))
}

/// Ensure an account row exists for the forwarded identity.
#[utoipa::path(
    get,
    path = "/internal/bootstrap",
    tag = "internal",
    params(
        ("x-internal-token" = String, Header, description = "Shared maintenance token"),
        ("x-user-id" = String, Header, description = "Identity provider user id"),
        ("x-user-email" = String, Header, description = "Email of the authenticated user")
    ),
    responses((status = 200, description = "Account ensured", body = BootstrapResponse))
)]
pub async fn bootstrap(
    State(state): State<SharedState>,
    principal: Principal,
) -> Result<Json<BootstrapResponse>, AppError> {
    Ok(Json(identity_service::bootstrap(&state, &principal).await?))
}

/// Link every orphan member, creating placeholder accounts.
#[utoipa::path(
    post,
    path = "/internal/backfill",
    tag = "internal",
    params(("x-internal-token" = String, Header, description = "Shared maintenance token")),
    responses((status = 200, description = "Backfill report", body = BackfillReport))
)]
pub async fn backfill(State(state): State<SharedState>) -> Result<Json<BackfillReport>, AppError> {
    Ok(Json(maintenance_service::backfill_members(&state).await?))
}

/// Normalize member emails and repair links without creating accounts.
#[utoipa::path(
    post,
    path = "/internal/safe-backfill",
    tag = "internal",
    params(("x-internal-token" = String, Header, description = "Shared maintenance token")),
    responses((status = 200, description = "Relink report", body = SafeBackfillReport))
)]
pub async fn safe_backfill(
    State(state): State<SharedState>,
) -> Result<Json<SafeBackfillReport>, AppError> {
    Ok(Json(maintenance_service::safe_relink(&state).await?))
}

async fn require_internal_token(
    State(state): State<SharedState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let Some(expected) = state.internal_token() else {
        return Err(AppError::NotFound("internal endpoints are disabled".into()));
    };

    let provided = req
        .headers()
        .get(INTERNAL_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| {
            AppError::Unauthorized(format!("missing header `{INTERNAL_TOKEN_HEADER}`"))
        })?;

    if provided != expected {
        return Err(AppError::Unauthorized("invalid internal token".into()));
    }
    Ok(next.run(req).await)
}
