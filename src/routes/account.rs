use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use axum_valid::Valid;

use crate::{
    dto::account::{
        IdentityWebhook, UpdatePackageRequest, UpgradeRequest, UserProfile, WebhookAck,
    },
    error::AppError,
    services::{
        identity_service::{self, Principal},
        package_service,
    },
    state::SharedState,
};

/// Routes about the calling account and its identity provider.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/me", get(me))
        .route("/me/package", post(update_package))
        .route("/me/upgrade", post(upgrade_package))
        .route("/identity/webhook", post(identity_webhook))
}

/// Return the caller's account, creating or linking it on first sight.
#[utoipa::path(
    get,
    path = "/me",
    tag = "account",
    params(
        ("x-user-id" = String, Header, description = "Identity provider user id"),
        ("x-user-email" = String, Header, description = "Email of the authenticated user")
    ),
    responses(
        (status = 200, description = "Current account", body = UserProfile),
        (status = 401, description = "Missing identity headers")
    )
)]
pub async fn me(
    State(state): State<SharedState>,
    principal: Principal,
) -> Result<Json<UserProfile>, AppError> {
    Ok(Json(identity_service::current_profile(&state, &principal).await?))
}

/// Switch the caller to another package.
#[utoipa::path(
    post,
    path = "/me/package",
    tag = "account",
    params(
        ("x-user-id" = String, Header, description = "Identity provider user id"),
        ("x-user-email" = String, Header, description = "Email of the authenticated user")
    ),
    request_body = UpdatePackageRequest,
    responses((status = 200, description = "Package updated", body = UserProfile))
)]
pub async fn update_package(
    State(state): State<SharedState>,
    principal: Principal,
    Valid(Json(payload)): Valid<Json<UpdatePackageRequest>>,
) -> Result<Json<UserProfile>, AppError> {
    let profile = package_service::update_package(&state, &principal, payload.package).await?;
    Ok(Json(profile))
}

/// Buy one more team or tournament slot.
#[utoipa::path(
    post,
    path = "/me/upgrade",
    tag = "account",
    params(
        ("x-user-id" = String, Header, description = "Identity provider user id"),
        ("x-user-email" = String, Header, description = "Email of the authenticated user")
    ),
    request_body = UpgradeRequest,
    responses((status = 200, description = "Package upgraded", body = UserProfile))
)]
pub async fn upgrade_package(
    State(state): State<SharedState>,
    principal: Principal,
    Valid(Json(payload)): Valid<Json<UpgradeRequest>>,
) -> Result<Json<UserProfile>, AppError> {
    let profile = package_service::upgrade_package(&state, &principal, payload.target).await?;
    Ok(Json(profile))
}

/// Receive profile updates pushed by the identity provider.
#[utoipa::path(
    post,
    path = "/identity/webhook",
    tag = "account",
    request_body = IdentityWebhook,
    responses((status = 200, description = "Webhook processed", body = WebhookAck))
)]
pub async fn identity_webhook(
    State(state): State<SharedState>,
    Json(payload): Json<IdentityWebhook>,
) -> Result<Json<WebhookAck>, AppError> {
    Ok(Json(identity_service::apply_profile_update(&state, payload).await?))
}
