//! Reconciliation of stored counters with game outcomes.
//!
//! Each operation validates the game in memory, derives the counter delta
//! and hands the store one [`LedgerCommit`]. Nothing is written when
//! validation fails, and the store rejects the commit if the winner flag
//! moved in the meantime.

use crate::{
    dao::{
        club_store::ClubStore,
        models::GameEntity,
        storage::{GameTransition, LedgerCommit},
    },
    error::ServiceError,
    stats::{LedgerDelta, Outcome, ScoringRule, Side, StatsError, record_delta, reverse_delta},
};

/// Validated outcome of a stored game.
pub fn outcome_of(game: &GameEntity) -> Result<Outcome, StatsError> {
    Ok(Outcome::from_raw(&game.side_a, &game.side_b)?
        .with_winner(game.winner)
        .with_scoring(game.scoring))
}

/// Record `side` as the winner of a pending game and credit every rostered
/// player and doubles pair.
pub async fn record_outcome(
    store: &dyn ClubStore,
    rule: &ScoringRule,
    game: &GameEntity,
    side: Side,
) -> Result<GameEntity, ServiceError> {
    let outcome = outcome_of(game)?;
    let delta = record_delta(&outcome, side, rule)?;
    let commit = LedgerCommit {
        game_id: game.id,
        expected_winner: None,
        expected_scoring: None,
        transition: GameTransition::Decide(side, *rule),
        delta,
    };
    Ok(store.commit_ledger(commit).await?)
}

/// Undo the contribution of a decided game and leave it pending.
///
/// The points removed are the ones the game was credited with; `rule` only
/// applies to games stored without that record.
pub async fn reverse_outcome(
    store: &dyn ClubStore,
    rule: &ScoringRule,
    game: &GameEntity,
) -> Result<GameEntity, ServiceError> {
    let outcome = outcome_of(game)?;
    let delta = reverse_delta(&outcome, rule)?;
    let commit = LedgerCommit {
        game_id: game.id,
        expected_winner: outcome.winner(),
        expected_scoring: game.scoring,
        transition: GameTransition::Undecide,
        delta,
    };
    Ok(store.commit_ledger(commit).await?)
}

/// Delete a game, reversing its contribution first when it was decided.
pub async fn delete_outcome(
    store: &dyn ClubStore,
    rule: &ScoringRule,
    game: &GameEntity,
) -> Result<GameEntity, ServiceError> {
    let outcome = outcome_of(game)?;
    let delta = match outcome.winner() {
        Some(_) => reverse_delta(&outcome, rule)?,
        None => LedgerDelta::default(),
    };
    let commit = LedgerCommit {
        game_id: game.id,
        expected_winner: outcome.winner(),
        expected_scoring: game.scoring,
        transition: GameTransition::Delete,
        delta,
    };
    Ok(store.commit_ledger(commit).await?)
}
