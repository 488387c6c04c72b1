use std::{sync::Arc, time::SystemTime};

use tracing::info;
use uuid::Uuid;

use crate::{
    dao::{
        club_store::ClubStore,
        models::{GameEntity, SessionEntity, TeamEntity},
    },
    dto::game::GameSummary,
    error::ServiceError,
    services::{
        activity_events,
        identity_service::{Principal, require_user},
        ledger_service,
        slug::unique_slug,
        team_service::ensure_owner,
    },
    state::AppState,
    stats::{Outcome, Side, StatsError},
};

/// Register a pending game in a session of an owned team.
pub async fn create_game(
    state: &AppState,
    principal: &Principal,
    session_slug: &str,
    side_a: Vec<String>,
    side_b: Vec<String>,
) -> Result<GameSummary, ServiceError> {
    let outcome = Outcome::from_raw(&side_a, &side_b).map_err(StatsError::from)?;

    let (user, store) = require_user(state, principal).await?;
    let session = load_session(store.as_ref(), session_slug).await?;
    let team = load_team_by_id(store.as_ref(), session.team_id).await?;
    ensure_owner(&user, &team)?;

    let roster = |side: Side| {
        outcome
            .side(side)
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
    };
    let now = SystemTime::now();
    let game = GameEntity {
        id: Uuid::new_v4(),
        slug: unique_slug(&format!("{}-game", session.slug)),
        session_id: session.id,
        team_id: team.id,
        side_a: roster(Side::A),
        side_b: roster(Side::B),
        winner: None,
        scoring: None,
        created_at: now,
        updated_at: now,
    };
    store.save_game(game.clone()).await?;

    info!(
        team = %team.slug,
        game = %game.slug,
        format = ?outcome.format(),
        "game created"
    );
    let summary = GameSummary::from(&game);
    activity_events::broadcast_game_created(state, &team.slug, summary.clone());
    Ok(summary)
}

/// Record the winner of a pending game.
pub async fn set_winner(
    state: &AppState,
    principal: &Principal,
    game_slug: &str,
    side: Side,
) -> Result<GameSummary, ServiceError> {
    let (game, team, store) = owned_game(state, principal, game_slug).await?;

    let decided =
        ledger_service::record_outcome(store.as_ref(), state.config().scoring(), &game, side)
            .await?;

    info!(team = %team.slug, game = %decided.slug, winner = ?side, "winner recorded");
    let summary = GameSummary::from(&decided);
    activity_events::broadcast_game_decided(state, &team.slug, summary.clone());
    Ok(summary)
}

/// Clear the recorded winner, returning the game to pending.
pub async fn clear_winner(
    state: &AppState,
    principal: &Principal,
    game_slug: &str,
) -> Result<GameSummary, ServiceError> {
    let (game, team, store) = owned_game(state, principal, game_slug).await?;

    let pending =
        ledger_service::reverse_outcome(store.as_ref(), state.config().scoring(), &game).await?;

    info!(team = %team.slug, game = %pending.slug, "winner cleared");
    let summary = GameSummary::from(&pending);
    activity_events::broadcast_game_reversed(state, &team.slug, summary.clone());
    Ok(summary)
}

/// Delete a game together with its contribution to the counters.
pub async fn delete_game(
    state: &AppState,
    principal: &Principal,
    game_slug: &str,
) -> Result<(), ServiceError> {
    let (game, team, store) = owned_game(state, principal, game_slug).await?;

    ledger_service::delete_outcome(store.as_ref(), state.config().scoring(), &game).await?;

    info!(team = %team.slug, game = %game.slug, "game deleted");
    activity_events::broadcast_game_deleted(state, &team.slug, &game.slug);
    Ok(())
}

pub async fn list_session_games(
    state: &AppState,
    session_slug: &str,
) -> Result<Vec<GameSummary>, ServiceError> {
    let store = state.require_store().await?;
    let session = load_session(store.as_ref(), session_slug).await?;
    let games = store.list_games_by_session(session.id).await?;
    Ok(games.iter().map(GameSummary::from).collect())
}

pub(crate) async fn load_session(
    store: &dyn ClubStore,
    slug: &str,
) -> Result<SessionEntity, ServiceError> {
    store
        .find_session_by_slug(slug.to_owned())
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("session `{slug}`")))
}

async fn load_team_by_id(store: &dyn ClubStore, id: Uuid) -> Result<TeamEntity, ServiceError> {
    store
        .find_team(id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("team `{id}`")))
}

async fn owned_game(
    state: &AppState,
    principal: &Principal,
    slug: &str,
) -> Result<(GameEntity, TeamEntity, Arc<dyn ClubStore>), ServiceError> {
    let (user, store) = require_user(state, principal).await?;
    let game = store
        .find_game_by_slug(slug.to_owned())
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("game `{slug}`")))?;
    let team = load_team_by_id(store.as_ref(), game.team_id).await?;
    ensure_owner(&user, &team)?;
    Ok((game, team, store))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::AppConfig,
        dao::{club_store::memory::MemoryClubStore, models::PackageKind},
        services::{package_service::update_package, team_service},
        state::SharedState,
    };

    async fn setup() -> (SharedState, Principal, String) {
        let state = AppState::new(AppConfig::default(), None);
        state.install_store(Arc::new(MemoryClubStore::new())).await;
        let owner = Principal::new("ext-owner", "owner@x.com", None, None).unwrap();
        update_package(&state, &owner, PackageKind::TeamPackage)
            .await
            .unwrap();
        team_service::create_team(&state, &owner, "Smash Club")
            .await
            .unwrap();
        let session = team_service::create_session(&state, &owner, "smash-club", None, "2025-03-14")
            .await
            .unwrap();
        (state, owner, session.slug)
    }

    fn players(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn rosters_are_normalized_and_slug_derived_from_session() {
        let (state, owner, session) = setup().await;
        let game = create_game(
            &state,
            &owner,
            &session,
            players(&[" Alice@X.com"]),
            players(&["bob@x.com"]),
        )
        .await
        .unwrap();

        assert_eq!(game.side_a, vec!["alice@x.com"]);
        assert!(game.slug.starts_with(&format!("{session}-game-")));
        assert_eq!(list_session_games(&state, &session).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn mismatched_sides_are_invalid_input() {
        let (state, owner, session) = setup().await;
        let err = create_game(
            &state,
            &owner,
            &session,
            players(&["alice@x.com"]),
            players(&["bob@x.com", "carol@x.com"]),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
        assert!(list_session_games(&state, &session).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn winner_lifecycle() {
        let (state, owner, session) = setup().await;
        let game = create_game(
            &state,
            &owner,
            &session,
            players(&["alice@x.com"]),
            players(&["bob@x.com"]),
        )
        .await
        .unwrap();

        let decided = set_winner(&state, &owner, &game.slug, Side::A).await.unwrap();
        assert_eq!(decided.winner, Some(Side::A));
        let err = set_winner(&state, &owner, &game.slug, Side::B).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));

        let pending = clear_winner(&state, &owner, &game.slug).await.unwrap();
        assert_eq!(pending.winner, None);
        let err = clear_winner(&state, &owner, &game.slug).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));

        delete_game(&state, &owner, &game.slug).await.unwrap();
        let err = delete_game(&state, &owner, &game.slug).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn only_the_owner_decides() {
        let (state, owner, session) = setup().await;
        let game = create_game(
            &state,
            &owner,
            &session,
            players(&["alice@x.com"]),
            players(&["bob@x.com"]),
        )
        .await
        .unwrap();

        let alice = Principal::new("ext-alice", "alice@x.com", None, None).unwrap();
        let err = set_winner(&state, &alice, &game.slug, Side::A).await.unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));
    }
}
