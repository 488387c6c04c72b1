//! Read-side statistics: scoped leaderboards recomputed from games, stored
//! pair counters and cumulative player counters.

use std::collections::HashMap;

use crate::{
    dao::models::{GameEntity, TeamEntity},
    dto::stats::{LeaderboardResponse, LeaderboardRow, PairRow, PlayerStatsResponse, TeamPairsResponse},
    error::ServiceError,
    services::{
        game_service::load_session,
        ledger_service::outcome_of,
        team_service::{load_team, resolve_member_names},
    },
    state::AppState,
    stats::{LeaderboardEntry, Outcome, PlayerId, compute_leaderboard, compute_pair_table},
};

/// Leaderboard of one session; every rostered player gets a row.
pub async fn session_leaderboard(
    state: &AppState,
    session_slug: &str,
) -> Result<LeaderboardResponse, ServiceError> {
    let store = state.require_store().await?;
    let session = load_session(store.as_ref(), session_slug).await?;
    let games = store.list_games_by_session(session.id).await?;
    let outcomes = outcomes_of(&games)?;

    let nobody = std::iter::empty::<&PlayerId>();
    let entries = compute_leaderboard(&outcomes, nobody, state.config().scoring());
    let names = match store.find_team(session.team_id).await? {
        Some(team) => member_names(state, &team).await?,
        None => HashMap::new(),
    };

    Ok(LeaderboardResponse {
        scope: session.slug,
        rows: rows(&entries, &names),
    })
}

/// Leaderboard of a whole team; members without decided games still appear.
pub async fn team_leaderboard(
    state: &AppState,
    team_slug: &str,
) -> Result<LeaderboardResponse, ServiceError> {
    let store = state.require_store().await?;
    let team = load_team(store.as_ref(), team_slug).await?;
    let games = store.list_games_by_team(team.id).await?;
    let outcomes = outcomes_of(&games)?;

    let names = member_names(state, &team).await?;
    let known: Vec<PlayerId> = names.keys().cloned().collect();
    let entries = compute_leaderboard(&outcomes, &known, state.config().scoring());

    Ok(LeaderboardResponse {
        scope: team.slug,
        rows: rows(&entries, &names),
    })
}

/// Stored pair counters of a team next to a recomputation from its games.
pub async fn team_pairs(state: &AppState, team_slug: &str) -> Result<TeamPairsResponse, ServiceError> {
    let store = state.require_store().await?;
    let team = load_team(store.as_ref(), team_slug).await?;

    let mut stored: Vec<PairRow> = store
        .list_pair_stats(team.id)
        .await?
        .into_iter()
        .filter(|row| row.plays > 0)
        .map(PairRow::from)
        .collect();
    stored.sort_by(|a, b| {
        b.wins
            .cmp(&a.wins)
            .then_with(|| b.plays.cmp(&a.plays))
            .then_with(|| (&a.player_a, &a.player_b).cmp(&(&b.player_a, &b.player_b)))
    });

    let games = store.list_games_by_team(team.id).await?;
    let outcomes = outcomes_of(&games)?;
    let recomputed = compute_pair_table(&outcomes).iter().map(PairRow::from).collect();

    Ok(TeamPairsResponse {
        team: team.slug,
        stored,
        recomputed,
    })
}

/// Cumulative counters of one player across every team.
pub async fn player_stats(state: &AppState, email: &str) -> Result<PlayerStatsResponse, ServiceError> {
    let player =
        PlayerId::parse(email).map_err(|err| ServiceError::InvalidInput(err.to_string()))?;
    let store = state.require_store().await?;

    let tally = store
        .find_player_stats(player.to_string())
        .await?
        .map(|row| row.tally())
        .unwrap_or_default();
    Ok(PlayerStatsResponse::new(player.into(), tally))
}

fn outcomes_of(games: &[GameEntity]) -> Result<Vec<Outcome>, ServiceError> {
    games
        .iter()
        .map(|game| outcome_of(game).map_err(ServiceError::from))
        .collect()
}

async fn member_names(
    state: &AppState,
    team: &TeamEntity,
) -> Result<HashMap<PlayerId, String>, ServiceError> {
    let store = state.require_store().await?;
    let members = store.list_members(team.id).await?;
    let summaries = resolve_member_names(store.as_ref(), &members).await?;

    Ok(summaries
        .into_iter()
        .filter_map(|member| {
            PlayerId::parse(&member.email)
                .ok()
                .map(|id| (id, member.display_name))
        })
        .collect())
}

fn rows(entries: &[LeaderboardEntry], names: &HashMap<PlayerId, String>) -> Vec<LeaderboardRow> {
    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            let display_name = names
                .get(&entry.player)
                .cloned()
                .unwrap_or_else(|| entry.player.local_part().to_owned());
            LeaderboardRow::new(index + 1, entry, display_name)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::{club_store::memory::MemoryClubStore, models::PackageKind},
        services::{
            game_service, identity_service::Principal, package_service::update_package,
            team_service,
        },
        state::SharedState,
        stats::Side,
    };

    async fn setup() -> (SharedState, Principal, String) {
        let state = AppState::new(AppConfig::default(), None);
        state.install_store(Arc::new(MemoryClubStore::new())).await;
        let owner = Principal::new("ext-owner", "owner@x.com", Some("Olive"), None).unwrap();
        update_package(&state, &owner, PackageKind::TeamPackage)
            .await
            .unwrap();
        team_service::create_team(&state, &owner, "Smash Club")
            .await
            .unwrap();
        team_service::add_member(&state, &owner, "smash-club", "zoe@x.com", Some("Zoe".into()))
            .await
            .unwrap();
        let session = team_service::create_session(&state, &owner, "smash-club", None, "2025-03-14")
            .await
            .unwrap();
        (state, owner, session.slug)
    }

    fn to_vec(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    async fn play(
        state: &AppState,
        owner: &Principal,
        session: &str,
        a: &[&str],
        b: &[&str],
        winner: Option<Side>,
    ) {
        let game = game_service::create_game(state, owner, session, to_vec(a), to_vec(b))
            .await
            .unwrap();
        if let Some(side) = winner {
            game_service::set_winner(state, owner, &game.slug, side)
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn team_leaderboard_lists_idle_members_last() {
        let (state, owner, session) = setup().await;
        play(&state, &owner, &session, &["alice@x.com"], &["bob@x.com"], Some(Side::A)).await;

        let board = team_leaderboard(&state, "smash-club").await.unwrap();
        let players: Vec<_> = board.rows.iter().map(|r| r.player.as_str()).collect();
        assert_eq!(
            players,
            vec!["alice@x.com", "bob@x.com", "owner@x.com", "zoe@x.com"]
        );
        assert_eq!(board.rows[0].rank, 1);
        assert_eq!(board.rows[0].points, 10);
        assert_eq!(board.rows[2].display_name, "Olive");
        assert_eq!(board.rows[3].display_name, "Zoe");
    }

    #[tokio::test]
    async fn pending_games_list_players_without_counting() {
        let (state, owner, session) = setup().await;
        play(&state, &owner, &session, &["alice@x.com"], &["bob@x.com"], None).await;

        let board = session_leaderboard(&state, &session).await.unwrap();
        assert_eq!(board.rows.len(), 2);
        assert!(board.rows.iter().all(|r| r.games == 0 && r.points == 0));
    }

    #[tokio::test]
    async fn stored_pairs_match_recomputation() {
        let (state, owner, session) = setup().await;
        play(
            &state,
            &owner,
            &session,
            &["alice@x.com", "carol@x.com"],
            &["bob@x.com", "dave@x.com"],
            Some(Side::B),
        )
        .await;
        play(
            &state,
            &owner,
            &session,
            &["carol@x.com", "alice@x.com"],
            &["dave@x.com", "bob@x.com"],
            Some(Side::A),
        )
        .await;

        let pairs = team_pairs(&state, "smash-club").await.unwrap();
        assert_eq!(pairs.stored, pairs.recomputed);
        assert_eq!(pairs.stored.len(), 2);
        assert!(pairs.stored.iter().all(|p| p.plays == 2 && p.wins == 1));
    }

    #[tokio::test]
    async fn unknown_player_has_zero_stats() {
        let (state, _, _) = setup().await;
        let stats = player_stats(&state, "Nobody@X.com").await.unwrap();
        assert_eq!(stats.player, "nobody@x.com");
        assert_eq!((stats.points, stats.wins, stats.losses, stats.games), (0, 0, 0, 0));
    }
}
