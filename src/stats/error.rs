use thiserror::Error;

use super::outcome::RosterError;

/// Precondition violations reported by the statistics ledger.
///
/// All of them are detected before any counter is touched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StatsError {
    /// The outcome already has a winner.
    #[error("a winner has already been recorded for this game")]
    AlreadyDecided,
    /// The outcome has no winner to reverse.
    #[error("no winner is recorded for this game")]
    NotDecided,
    /// The rosters do not form a valid singles or doubles match.
    #[error("invalid roster: {0}")]
    InvalidRoster(#[from] RosterError),
}
