use std::error::Error;
use thiserror::Error;
use uuid::Uuid;

use crate::stats::{LedgerDelta, ScoringRule, Side, StatsError};

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Error raised by storage backends regardless of the underlying database.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage unavailable: {message}")]
    Unavailable {
        message: String,
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// A unique key (slug, email, membership) is already taken.
    #[error("{entity} `{key}` already exists")]
    Duplicate { entity: &'static str, key: String },
    /// The owner had no free slot left when the creation was applied.
    #[error("{resource} quota reached")]
    QuotaExceeded { resource: &'static str },
}

impl StorageError {
    /// Construct an unavailable error from any backend failure.
    pub fn unavailable(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        StorageError::Unavailable {
            message,
            source: Box::new(source),
        }
    }

    pub fn duplicate(entity: &'static str, key: impl Into<String>) -> Self {
        StorageError::Duplicate {
            entity,
            key: key.into(),
        }
    }
}

/// What happens to the game row when a ledger commit lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameTransition {
    /// Set the winner, remembering the rule the delta was scored with.
    Decide(Side, ScoringRule),
    /// Clear the winner, keeping the game.
    Undecide,
    /// Remove the game.
    Delete,
}

/// One atomic unit of work for the statistics ledger: the winner flag of a
/// game moves from `expected_winner` according to `transition`, and `delta`
/// is added to the player and pair counters, all or nothing.
///
/// `expected_scoring` is the rule stored with the current winner. A reversal
/// delta is only valid against that exact rule, so it is compared together
/// with the winner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerCommit {
    pub game_id: Uuid,
    pub expected_winner: Option<Side>,
    pub expected_scoring: Option<ScoringRule>,
    pub transition: GameTransition,
    pub delta: LedgerDelta,
}

impl LedgerCommit {
    /// Winner stored on the game once the commit is applied.
    pub fn next_winner(&self) -> Option<Side> {
        match self.transition {
            GameTransition::Decide(side, _) => Some(side),
            GameTransition::Undecide | GameTransition::Delete => None,
        }
    }

    /// Scoring rule stored on the game once the commit is applied.
    pub fn next_scoring(&self) -> Option<ScoringRule> {
        match self.transition {
            GameTransition::Decide(_, rule) => Some(rule),
            GameTransition::Undecide | GameTransition::Delete => None,
        }
    }

    /// Compare the winner and rule found inside the transaction with the
    /// ones the delta was computed from.
    pub fn check(
        &self,
        winner: Option<Side>,
        scoring: Option<ScoringRule>,
    ) -> Result<(), StatsError> {
        if winner == self.expected_winner && scoring == self.expected_scoring {
            return Ok(());
        }
        Err(self.conflict())
    }

    /// Error reported when the winner flag no longer matches `expected_winner`.
    pub fn conflict(&self) -> StatsError {
        match self.expected_winner {
            None => StatsError::AlreadyDecided,
            Some(_) => StatsError::NotDecided,
        }
    }
}

/// Failure of an atomic ledger commit.
#[derive(Debug, Error)]
pub enum LedgerWriteError {
    /// The winner flag moved since the delta was computed.
    #[error(transparent)]
    Stats(#[from] StatsError),
    #[error("game `{0}` not found")]
    MissingGame(Uuid),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
