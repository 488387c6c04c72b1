//! Counter arithmetic for decided outcomes.
//!
//! A decided outcome contributes a [`LedgerDelta`]: one signed entry per
//! rostered player and, for doubles, one per pair. Recording applies the
//! delta, reversing applies its [`LedgerDelta::inverse`], and the leaderboard
//! fold reuses the same computation, so the scoring rule lives here only.

use std::ops::Neg;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{
    error::StatsError,
    outcome::{Outcome, PlayerId, Side},
};

/// Points awarded per decided match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ScoringRule {
    pub win_points: i64,
    pub loss_points: i64,
}

impl Default for ScoringRule {
    fn default() -> Self {
        Self {
            win_points: 10,
            loss_points: 2,
        }
    }
}

/// Order-independent key of a doubles pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PairKey {
    first: PlayerId,
    second: PlayerId,
}

impl PairKey {
    /// Build the key for two distinct players in either order.
    pub fn new(a: PlayerId, b: PlayerId) -> Option<Self> {
        if a == b {
            return None;
        }
        let (first, second) = if a < b { (a, b) } else { (b, a) };
        Some(Self { first, second })
    }

    /// Key of a two-player roster; `None` for singles.
    pub fn from_roster(players: &[PlayerId]) -> Option<Self> {
        match players {
            [a, b] => Self::new(a.clone(), b.clone()),
            _ => None,
        }
    }

    pub fn first(&self) -> &PlayerId {
        &self.first
    }

    pub fn second(&self) -> &PlayerId {
        &self.second
    }
}

/// Signed change to a player's cumulative counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlayerDelta {
    pub points: i64,
    pub wins: i64,
    pub losses: i64,
}

impl Neg for PlayerDelta {
    type Output = Self;

    fn neg(self) -> Self {
        Self {
            points: -self.points,
            wins: -self.wins,
            losses: -self.losses,
        }
    }
}

/// Signed change to a pair's cumulative counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PairDelta {
    pub plays: i64,
    pub wins: i64,
}

impl Neg for PairDelta {
    type Output = Self;

    fn neg(self) -> Self {
        Self {
            plays: -self.plays,
            wins: -self.wins,
        }
    }
}

/// Every counter change produced by one decided outcome, keyed and sorted
/// by player and by pair.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerDelta {
    players: IndexMap<PlayerId, PlayerDelta>,
    pairs: IndexMap<PairKey, PairDelta>,
}

impl LedgerDelta {
    /// Delta contributed by `outcome` when `winner` takes the match.
    pub fn for_decision(outcome: &Outcome, winner: Side, rule: &ScoringRule) -> Self {
        let mut delta = Self::default();
        let loser = winner.opposite();

        for player in outcome.side(winner) {
            delta.players.insert(
                player.clone(),
                PlayerDelta {
                    points: rule.win_points,
                    wins: 1,
                    losses: 0,
                },
            );
        }
        for player in outcome.side(loser) {
            delta.players.insert(
                player.clone(),
                PlayerDelta {
                    points: rule.loss_points,
                    wins: 0,
                    losses: 1,
                },
            );
        }

        if let Some(pair) = PairKey::from_roster(outcome.side(winner)) {
            delta.pairs.insert(pair, PairDelta { plays: 1, wins: 1 });
        }
        if let Some(pair) = PairKey::from_roster(outcome.side(loser)) {
            delta.pairs.insert(pair, PairDelta { plays: 1, wins: 0 });
        }

        delta.players.sort_keys();
        delta.pairs.sort_keys();
        delta
    }

    /// Delta that exactly undoes `self`.
    pub fn inverse(&self) -> Self {
        Self {
            players: self
                .players
                .iter()
                .map(|(player, change)| (player.clone(), -*change))
                .collect(),
            pairs: self
                .pairs
                .iter()
                .map(|(pair, change)| (pair.clone(), -*change))
                .collect(),
        }
    }

    pub fn players(&self) -> impl Iterator<Item = (&PlayerId, &PlayerDelta)> {
        self.players.iter()
    }

    pub fn pairs(&self) -> impl Iterator<Item = (&PairKey, &PairDelta)> {
        self.pairs.iter()
    }
}

/// Delta to apply when recording `side` as the winner of `outcome`.
pub fn record_delta(
    outcome: &Outcome,
    side: Side,
    rule: &ScoringRule,
) -> Result<LedgerDelta, StatsError> {
    if outcome.is_decided() {
        return Err(StatsError::AlreadyDecided);
    }
    Ok(LedgerDelta::for_decision(outcome, side, rule))
}

/// Delta to apply when clearing the recorded winner of `outcome`.
///
/// Undoes the rule the winner was credited with; `rule` only applies to
/// outcomes that do not carry one.
pub fn reverse_delta(outcome: &Outcome, rule: &ScoringRule) -> Result<LedgerDelta, StatsError> {
    let winner = outcome.winner().ok_or(StatsError::NotDecided)?;
    let credited = outcome.scoring_or(rule);
    Ok(LedgerDelta::for_decision(outcome, winner, &credited).inverse())
}

/// Cumulative per-player counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct PlayerTally {
    pub points: i64,
    pub wins: i64,
    pub losses: i64,
}

impl PlayerTally {
    pub fn apply(&mut self, delta: &PlayerDelta) {
        self.points += delta.points;
        self.wins += delta.wins;
        self.losses += delta.losses;
    }

    /// Decided games played.
    pub fn games(&self) -> i64 {
        self.wins + self.losses
    }

    /// Percentage of decided games won, 0 when none were played.
    pub fn win_rate(&self) -> f64 {
        match self.games() {
            0 => 0.0,
            games => self.wins as f64 * 100.0 / games as f64,
        }
    }
}

/// Cumulative per-pair counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct PairTally {
    pub plays: i64,
    pub wins: i64,
}

impl PairTally {
    pub fn apply(&mut self, delta: &PairDelta) {
        self.plays += delta.plays;
        self.wins += delta.wins;
    }
}
