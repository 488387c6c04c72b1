//! Match outcome model: player identities, sides and validated rosters.

use std::{collections::HashSet, fmt};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use super::ledger::ScoringRule;

/// Stable player identity: the account email, trimmed and lowercased.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
    /// Normalize a raw email into an identity key.
    pub fn parse(raw: &str) -> Result<Self, RosterError> {
        let normalized = raw.trim().to_lowercase();
        if normalized.is_empty() {
            return Err(RosterError::BlankPlayer);
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Part of the email before `@`, used as a fallback display name.
    pub fn local_part(&self) -> &str {
        self.0.split('@').next().unwrap_or(&self.0)
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<PlayerId> for String {
    fn from(value: PlayerId) -> Self {
        value.0
    }
}

/// One side of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum Side {
    A,
    B,
}

impl Side {
    pub fn opposite(self) -> Self {
        match self {
            Side::A => Side::B,
            Side::B => Side::A,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::A => f.write_str("A"),
            Side::B => f.write_str("B"),
        }
    }
}

/// Singles (1 vs 1) or doubles (2 vs 2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchFormat {
    Singles,
    Doubles,
}

/// Reasons a pair of rosters cannot form a match.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RosterError {
    #[error("player identity must not be blank")]
    BlankPlayer,
    #[error("side {0} has no players")]
    EmptySide(Side),
    #[error("side {side} has {size} players; singles require 1 and doubles require 2")]
    UnsupportedSize { side: Side, size: usize },
    #[error("singles require 1 vs 1, doubles require 2 vs 2 players (got {side_a} vs {side_b})")]
    SizeMismatch { side_a: usize, side_b: usize },
    #[error("player `{0}` appears on both sides")]
    Overlap(PlayerId),
    #[error("player `{player}` is listed twice on side {side}")]
    DuplicatePlayer { side: Side, player: PlayerId },
}

/// A single recorded match between two rosters, optionally decided.
///
/// Rosters are validated on construction, so holding an `Outcome` means
/// both sides are non-empty, of equal size 1 or 2, and disjoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    side_a: Vec<PlayerId>,
    side_b: Vec<PlayerId>,
    winner: Option<Side>,
    scoring: Option<ScoringRule>,
}

impl Outcome {
    /// Build an undecided outcome from two rosters.
    pub fn new(side_a: Vec<PlayerId>, side_b: Vec<PlayerId>) -> Result<Self, RosterError> {
        validate_side(Side::A, &side_a)?;
        validate_side(Side::B, &side_b)?;

        if side_a.len() != side_b.len() {
            return Err(RosterError::SizeMismatch {
                side_a: side_a.len(),
                side_b: side_b.len(),
            });
        }

        if let Some(shared) = side_a.iter().find(|player| side_b.contains(player)) {
            return Err(RosterError::Overlap(shared.clone()));
        }

        Ok(Self {
            side_a,
            side_b,
            winner: None,
            scoring: None,
        })
    }

    /// Parse raw identities for both sides and build the outcome.
    pub fn from_raw<A, B>(side_a: A, side_b: B) -> Result<Self, RosterError>
    where
        A: IntoIterator,
        A::Item: AsRef<str>,
        B: IntoIterator,
        B::Item: AsRef<str>,
    {
        let side_a = parse_side(side_a)?;
        let side_b = parse_side(side_b)?;
        Self::new(side_a, side_b)
    }

    /// Attach a recorded winner (used when rebuilding persisted games).
    pub fn with_winner(mut self, winner: Option<Side>) -> Self {
        self.winner = winner;
        self
    }

    /// Attach the rule the recorded winner was credited with.
    pub fn with_scoring(mut self, scoring: Option<ScoringRule>) -> Self {
        self.scoring = scoring;
        self
    }

    pub fn side(&self, side: Side) -> &[PlayerId] {
        match side {
            Side::A => &self.side_a,
            Side::B => &self.side_b,
        }
    }

    pub fn winner(&self) -> Option<Side> {
        self.winner
    }

    /// Rule to score the recorded winner with: the one it was credited
    /// with when known, otherwise `fallback`.
    pub fn scoring_or(&self, fallback: &ScoringRule) -> ScoringRule {
        self.scoring.unwrap_or(*fallback)
    }

    pub fn is_decided(&self) -> bool {
        self.winner.is_some()
    }

    pub fn format(&self) -> MatchFormat {
        if self.side_a.len() == 2 {
            MatchFormat::Doubles
        } else {
            MatchFormat::Singles
        }
    }

    /// Every rostered player, side A first.
    pub fn players(&self) -> impl Iterator<Item = &PlayerId> {
        self.side_a.iter().chain(self.side_b.iter())
    }
}

fn parse_side<I>(raw: I) -> Result<Vec<PlayerId>, RosterError>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    raw.into_iter()
        .map(|player| PlayerId::parse(player.as_ref()))
        .collect()
}

fn validate_side(side: Side, players: &[PlayerId]) -> Result<(), RosterError> {
    match players.len() {
        0 => return Err(RosterError::EmptySide(side)),
        1 | 2 => {}
        size => return Err(RosterError::UnsupportedSize { side, size }),
    }

    let mut seen = HashSet::with_capacity(players.len());
    for player in players {
        if !seen.insert(player) {
            return Err(RosterError::DuplicatePlayer {
                side,
                player: player.clone(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(a: &[&str], b: &[&str]) -> Result<Outcome, RosterError> {
        Outcome::from_raw(a.iter().copied(), b.iter().copied())
    }

    #[test]
    fn player_ids_are_normalized() {
        let id = PlayerId::parse("  Alice@Example.COM ").unwrap();
        assert_eq!(id.as_str(), "alice@example.com");
        assert_eq!(id.local_part(), "alice");
        assert_eq!(PlayerId::parse("   "), Err(RosterError::BlankPlayer));
    }

    #[test]
    fn singles_and_doubles_are_accepted() {
        let singles = outcome(&["alice@x.com"], &["bob@x.com"]).unwrap();
        assert_eq!(singles.format(), MatchFormat::Singles);
        assert!(!singles.is_decided());

        let doubles = outcome(&["alice@x.com", "carol@x.com"], &["bob@x.com", "dave@x.com"]).unwrap();
        assert_eq!(doubles.format(), MatchFormat::Doubles);
        assert_eq!(doubles.players().count(), 4);
    }

    #[test]
    fn size_mismatch_is_rejected() {
        let err = outcome(&["alice@x.com"], &["bob@x.com", "carol@x.com"]).unwrap_err();
        assert_eq!(
            err,
            RosterError::SizeMismatch {
                side_a: 1,
                side_b: 2
            }
        );
    }

    #[test]
    fn empty_and_oversized_sides_are_rejected() {
        assert_eq!(
            outcome(&[], &["bob@x.com"]).unwrap_err(),
            RosterError::EmptySide(Side::A)
        );
        assert_eq!(
            outcome(&["a@x.com", "b@x.com", "c@x.com"], &["d@x.com"]).unwrap_err(),
            RosterError::UnsupportedSize {
                side: Side::A,
                size: 3
            }
        );
    }

    #[test]
    fn overlapping_rosters_are_rejected() {
        let err = outcome(&["alice@x.com", "bob@x.com"], &["BOB@x.com", "carol@x.com"]).unwrap_err();
        assert_eq!(err, RosterError::Overlap(PlayerId::parse("bob@x.com").unwrap()));
    }

    #[test]
    fn duplicate_player_within_side_is_rejected() {
        let err = outcome(&["alice@x.com", "Alice@x.com"], &["bob@x.com", "carol@x.com"]).unwrap_err();
        assert!(matches!(err, RosterError::DuplicatePlayer { side: Side::A, .. }));
    }
}
