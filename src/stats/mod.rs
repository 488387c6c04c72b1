//! Statistics reconciliation core: validated outcomes, ledger deltas and
//! leaderboard recomputation. Nothing in here touches storage.

mod error;
pub mod leaderboard;
pub mod ledger;
pub mod outcome;

pub use self::error::StatsError;
pub use self::leaderboard::{LeaderboardEntry, PairRecord, compute_leaderboard, compute_pair_table};
pub use self::ledger::{
    LedgerDelta, PairDelta, PairKey, PairTally, PlayerDelta, PlayerTally, ScoringRule,
    record_delta, reverse_delta,
};
pub use self::outcome::{MatchFormat, Outcome, PlayerId, RosterError, Side};
