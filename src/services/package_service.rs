use tracing::info;

use crate::{
    dao::models::{PackageChange, PackageKind, UserEntity},
    dto::account::{UpgradeTarget, UserProfile},
    error::ServiceError,
    services::identity_service::{Principal, require_user},
    state::AppState,
};

/// Whether `user` may open one more team.
pub fn can_create_team(user: &UserEntity) -> Result<(), ServiceError> {
    if !user.package.allows_teams() {
        return Err(ServiceError::QuotaExceeded(
            "your package does not include teams".into(),
        ));
    }
    if user.team_count >= user.team_quota {
        return Err(ServiceError::QuotaExceeded(format!(
            "team quota reached ({}/{})",
            user.team_count, user.team_quota
        )));
    }
    Ok(())
}

/// Whether `user` may open one more tournament.
pub fn can_create_tournament(user: &UserEntity) -> Result<(), ServiceError> {
    if !user.package.allows_tournaments() {
        return Err(ServiceError::QuotaExceeded(
            "your package does not include tournaments".into(),
        ));
    }
    if user.tournament_count >= user.tournament_quota {
        return Err(ServiceError::QuotaExceeded(format!(
            "tournament quota reached ({}/{})",
            user.tournament_count, user.tournament_quota
        )));
    }
    Ok(())
}

/// Switch the caller to `kind`, resetting both quotas from the catalog.
pub async fn update_package(
    state: &AppState,
    principal: &Principal,
    kind: PackageKind,
) -> Result<UserProfile, ServiceError> {
    let quotas = state.config().quotas_for(kind);
    let change = PackageChange::Reset {
        package: kind,
        team_quota: quotas.team_quota,
        tournament_quota: quotas.tournament_quota,
    };
    let user = apply_change(state, principal, change).await?;

    info!(user_id = %user.id, package = ?kind, "package updated");
    Ok(user.into())
}

/// Buy one more team or tournament slot, moving to the matching package.
pub async fn upgrade_package(
    state: &AppState,
    principal: &Principal,
    target: UpgradeTarget,
) -> Result<UserProfile, ServiceError> {
    let change = match target {
        UpgradeTarget::Team => PackageChange::AddSlots {
            package: PackageKind::TeamPackage,
            teams: 1,
            tournaments: 0,
        },
        UpgradeTarget::Tournament => PackageChange::AddSlots {
            package: PackageKind::TournamentPackage,
            teams: 0,
            tournaments: 1,
        },
    };
    let user = apply_change(state, principal, change).await?;

    info!(
        user_id = %user.id,
        package = ?user.package,
        team_quota = user.team_quota,
        tournament_quota = user.tournament_quota,
        "package upgraded"
    );
    Ok(user.into())
}

async fn apply_change(
    state: &AppState,
    principal: &Principal,
    change: PackageChange,
) -> Result<UserEntity, ServiceError> {
    let (user, store) = require_user(state, principal).await?;
    store
        .update_package(user.id, change)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("user `{}` disappeared", user.id)))
}
