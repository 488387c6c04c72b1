use std::{sync::Arc, time::SystemTime};

use shuttle_league_back::{
    config::AppConfig,
    dao::{
        club_store::{ClubStore, memory::MemoryClubStore},
        models::{GameEntity, PackageKind},
    },
    error::ServiceError,
    services::{
        game_service, identity_service::Principal, ledger_service, package_service, stats_service,
        team_service,
    },
    state::{AppState, SharedState},
    stats::{Outcome, PlayerId, ScoringRule, Side, compute_leaderboard},
};
use uuid::Uuid;

fn players(raw: &[&str]) -> Vec<String> {
    raw.iter().map(|s| s.to_string()).collect()
}

async fn league() -> (SharedState, MemoryClubStore, Principal, String) {
    let state = AppState::new(AppConfig::default(), None);
    let store = MemoryClubStore::new();
    state.install_store(Arc::new(store.clone())).await;

    let owner = Principal::new("ext-owner", "owner@club.test", Some("Olive"), None).unwrap();
    package_service::update_package(&state, &owner, PackageKind::ProPackage)
        .await
        .unwrap();
    team_service::create_team(&state, &owner, "Smash Club")
        .await
        .unwrap();
    let session = team_service::create_session(&state, &owner, "smash-club", None, "2025-03-14")
        .await
        .unwrap();
    (state, store, owner, session.slug)
}

async fn counters(store: &MemoryClubStore, player: &str) -> (i64, i64, i64) {
    store
        .find_player_stats(player.to_string())
        .await
        .unwrap()
        .map(|row| (row.points, row.wins, row.losses))
        .unwrap_or_default()
}

#[tokio::test]
async fn singles_win_credits_both_players_without_pair_rows() {
    let (state, store, owner, session) = league().await;
    let game = game_service::create_game(
        &state,
        &owner,
        &session,
        players(&["alice@club.test"]),
        players(&["bob@club.test"]),
    )
    .await
    .unwrap();

    game_service::set_winner(&state, &owner, &game.slug, Side::A)
        .await
        .unwrap();

    assert_eq!(counters(&store, "alice@club.test").await, (10, 1, 0));
    assert_eq!(counters(&store, "bob@club.test").await, (2, 0, 1));

    let team = store
        .find_team_by_slug("smash-club".into())
        .await
        .unwrap()
        .unwrap();
    assert!(store.list_pair_stats(team.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn doubles_win_then_reverse_restores_every_counter() {
    let (state, store, owner, session) = league().await;
    let game = game_service::create_game(
        &state,
        &owner,
        &session,
        players(&["alice@club.test", "carol@club.test"]),
        players(&["bob@club.test", "dave@club.test"]),
    )
    .await
    .unwrap();

    game_service::set_winner(&state, &owner, &game.slug, Side::A)
        .await
        .unwrap();
    let pairs = stats_service::team_pairs(&state, "smash-club").await.unwrap();
    assert_eq!(pairs.stored.len(), 2);
    assert_eq!(pairs.stored, pairs.recomputed);

    game_service::clear_winner(&state, &owner, &game.slug)
        .await
        .unwrap();

    for player in [
        "alice@club.test",
        "bob@club.test",
        "carol@club.test",
        "dave@club.test",
    ] {
        assert_eq!(counters(&store, player).await, (0, 0, 0), "{player}");
    }
    let team = store
        .find_team_by_slug("smash-club".into())
        .await
        .unwrap()
        .unwrap();
    let rows = store.list_pair_stats(team.id).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|row| row.plays == 0 && row.wins == 0));

    game_service::delete_game(&state, &owner, &game.slug)
        .await
        .unwrap();
    assert!(
        game_service::list_session_games(&state, &session)
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn reversing_a_later_game_returns_counters_to_their_prior_values() {
    let (state, store, owner, session) = league().await;
    let doubles = || {
        (
            players(&["alice@club.test", "carol@club.test"]),
            players(&["bob@club.test", "dave@club.test"]),
        )
    };

    let (a, b) = doubles();
    let first = game_service::create_game(&state, &owner, &session, a, b)
        .await
        .unwrap();
    game_service::set_winner(&state, &owner, &first.slug, Side::A)
        .await
        .unwrap();

    let team = store
        .find_team_by_slug("smash-club".into())
        .await
        .unwrap()
        .unwrap();
    let everyone = [
        "alice@club.test",
        "bob@club.test",
        "carol@club.test",
        "dave@club.test",
    ];
    let mut before = Vec::new();
    for player in everyone {
        before.push(counters(&store, player).await);
    }
    let pairs_before = store.list_pair_stats(team.id).await.unwrap();

    let (a, b) = doubles();
    let second = game_service::create_game(&state, &owner, &session, a, b)
        .await
        .unwrap();
    game_service::set_winner(&state, &owner, &second.slug, Side::B)
        .await
        .unwrap();
    assert_eq!(counters(&store, "bob@club.test").await, (12, 1, 1));

    game_service::clear_winner(&state, &owner, &second.slug)
        .await
        .unwrap();

    let mut after = Vec::new();
    for player in everyone {
        after.push(counters(&store, player).await);
    }
    assert_eq!(after, before);
    assert_eq!(before[0], (10, 1, 0));
    assert_eq!(store.list_pair_stats(team.id).await.unwrap(), pairs_before);
}

#[tokio::test]
async fn invalid_roster_is_rejected_before_any_write() {
    let (state, store, owner, session) = league().await;
    let err = game_service::create_game(
        &state,
        &owner,
        &session,
        players(&["alice@club.test"]),
        players(&["bob@club.test", "carol@club.test"]),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, ServiceError::InvalidInput(ref m) if m.contains("invalid roster")));
    assert!(
        store
            .find_player_stats("alice@club.test".into())
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn racing_decisions_on_one_game_let_exactly_one_through() {
    let store = MemoryClubStore::new();
    let rule = ScoringRule::default();
    let now = SystemTime::now();
    let game = GameEntity {
        id: Uuid::new_v4(),
        slug: "race-game".into(),
        session_id: Uuid::new_v4(),
        team_id: Uuid::new_v4(),
        side_a: players(&["alice@club.test"]),
        side_b: players(&["bob@club.test"]),
        winner: None,
        scoring: None,
        created_at: now,
        updated_at: now,
    };
    store.save_game(game.clone()).await.unwrap();

    let (first, second) = tokio::join!(
        ledger_service::record_outcome(&store, &rule, &game, Side::A),
        ledger_service::record_outcome(&store, &rule, &game, Side::B),
    );

    assert_eq!([first.is_ok(), second.is_ok()].iter().filter(|ok| **ok).count(), 1);
    let loser = first.err().or(second.err()).unwrap();
    assert!(matches!(loser, ServiceError::InvalidState(ref m) if m.contains("already")));

    let alice = counters(&store, "alice@club.test").await;
    let bob = counters(&store, "bob@club.test").await;
    assert_eq!(alice.1 + bob.1, 1);
    assert_eq!(alice.2 + bob.2, 1);
}

#[tokio::test]
async fn stored_counters_agree_with_recomputed_leaderboard() {
    let (state, store, owner, session) = league().await;
    let matches: [(&[&str], &[&str], Side); 3] = [
        (&["alice@club.test"], &["bob@club.test"], Side::A),
        (&["bob@club.test"], &["carol@club.test"], Side::A),
        (
            &["alice@club.test", "carol@club.test"],
            &["bob@club.test", "dave@club.test"],
            Side::B,
        ),
    ];
    for (a, b, winner) in matches {
        let game = game_service::create_game(&state, &owner, &session, players(a), players(b))
            .await
            .unwrap();
        game_service::set_winner(&state, &owner, &game.slug, winner)
            .await
            .unwrap();
    }

    let board = stats_service::session_leaderboard(&state, &session)
        .await
        .unwrap();
    assert_eq!(board.rows[0].player, "bob@club.test");
    for row in &board.rows {
        let stored = counters(&store, &row.player).await;
        assert_eq!((row.points, row.wins, row.losses), stored, "{}", row.player);
    }
}

#[test]
fn leaderboard_ignores_input_order() {
    let game = |a: &[&str], b: &[&str], winner| {
        Outcome::from_raw(a, b).unwrap().with_winner(Some(winner))
    };
    let outcomes = vec![
        game(&["alice@club.test"], &["bob@club.test"], Side::A),
        game(&["carol@club.test"], &["dave@club.test"], Side::B),
        game(&["bob@club.test"], &["dave@club.test"], Side::A),
    ];
    let mut reversed = outcomes.clone();
    reversed.reverse();
    let known = [PlayerId::parse("zoe@club.test").unwrap()];

    let rule = ScoringRule::default();
    let forward = compute_leaderboard(&outcomes, &known, &rule);
    let backward = compute_leaderboard(&reversed, &known, &rule);
    assert_eq!(forward, backward);
    assert_eq!(forward.last().unwrap().player.as_str(), "zoe@club.test");
}

#[tokio::test]
async fn guest_member_is_linked_when_they_sign_in() {
    let (state, store, owner, _) = league().await;
    team_service::add_member(&state, &owner, "smash-club", "Bob@Club.test", None)
        .await
        .unwrap();

    let bob = Principal::new("ext-bob", "bob@club.test", Some("Bob"), None).unwrap();
    let profile = shuttle_league_back::services::identity_service::current_profile(&state, &bob)
        .await
        .unwrap();

    let members = store.list_all_members().await.unwrap();
    let row = members
        .iter()
        .find(|m| m.email == "bob@club.test")
        .unwrap();
    assert_eq!(row.user_id, Some(profile.id));

    let overview = team_service::team_overview(&state, "smash-club").await.unwrap();
    assert!(overview.members.iter().any(|m| m.display_name == "Bob"));
}
