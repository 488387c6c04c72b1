use std::time::SystemTime;

use tracing::info;
use uuid::Uuid;

use crate::{
    dao::models::TournamentEntity,
    dto::{tournament::TournamentSummary, validation::MIN_NAME_LEN},
    error::ServiceError,
    services::{
        identity_service::{Principal, require_user},
        package_service,
        slug::unique_slug,
    },
    state::AppState,
};

/// Open a tournament owned by the caller, consuming one tournament slot.
pub async fn create_tournament(
    state: &AppState,
    principal: &Principal,
    name: &str,
    min_games_per_player: u32,
    banner_url: Option<String>,
) -> Result<TournamentSummary, ServiceError> {
    let name = name.trim();
    if name.chars().count() < MIN_NAME_LEN {
        return Err(ServiceError::InvalidInput(format!(
            "tournament name must be at least {MIN_NAME_LEN} characters long"
        )));
    }
    let banner_url = banner_url
        .map(|url| url.trim().to_owned())
        .filter(|url| !url.is_empty());

    let (user, store) = require_user(state, principal).await?;
    package_service::can_create_tournament(&user)?;

    let tournament = TournamentEntity {
        id: Uuid::new_v4(),
        slug: unique_slug(name),
        name: name.to_owned(),
        owner_id: user.id,
        banner_url,
        min_games_per_player,
        created_at: SystemTime::now(),
    };
    store.create_tournament(tournament.clone()).await?;

    info!(tournament = %tournament.slug, owner_id = %user.id, "tournament created");
    Ok(tournament.into())
}

pub async fn list_tournaments(
    state: &AppState,
    principal: &Principal,
) -> Result<Vec<TournamentSummary>, ServiceError> {
    let (user, store) = require_user(state, principal).await?;
    let tournaments = store.list_tournaments(user.id).await?;
    Ok(tournaments.into_iter().map(Into::into).collect())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::{club_store::memory::MemoryClubStore, models::PackageKind},
        services::package_service::update_package,
    };

    #[tokio::test]
    async fn quota_caps_tournaments() {
        let state = AppState::new(AppConfig::default(), None);
        state.install_store(Arc::new(MemoryClubStore::new())).await;
        let owner = Principal::new("ext-owner", "owner@x.com", None, None).unwrap();
        update_package(&state, &owner, PackageKind::TournamentPackage)
            .await
            .unwrap();

        for name in ["Spring Open", "Summer Open"] {
            create_tournament(&state, &owner, name, 3, None).await.unwrap();
        }
        let err = create_tournament(&state, &owner, "Autumn Open", 3, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::QuotaExceeded(_)));

        let listed = list_tournaments(&state, &owner).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert!(listed[0].slug.starts_with("spring-open-"));
    }

    #[tokio::test]
    async fn free_package_has_no_tournaments() {
        let state = AppState::new(AppConfig::default(), None);
        state.install_store(Arc::new(MemoryClubStore::new())).await;
        let free = Principal::new("ext-free", "free@x.com", None, None).unwrap();

        let err = create_tournament(&state, &free, "Spring Open", 0, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::QuotaExceeded(_)));
    }
}
