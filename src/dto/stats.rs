use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    dao::models::PairStatsEntity,
    stats::{LeaderboardEntry, PairRecord, PlayerTally},
};

/// One ranked leaderboard row.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LeaderboardRow {
    /// 1-based position.
    pub rank: usize,
    pub player: String,
    pub display_name: String,
    pub points: i64,
    pub wins: i64,
    pub losses: i64,
    pub games: i64,
    /// Percentage of decided games won.
    pub win_rate: f64,
}

impl LeaderboardRow {
    pub fn new(rank: usize, entry: &LeaderboardEntry, display_name: String) -> Self {
        Self {
            rank,
            player: entry.player.to_string(),
            display_name,
            points: entry.tally.points,
            wins: entry.tally.wins,
            losses: entry.tally.losses,
            games: entry.tally.games(),
            win_rate: entry.tally.win_rate(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LeaderboardResponse {
    /// Slug of the session or team the board covers.
    pub scope: String,
    pub rows: Vec<LeaderboardRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct PairRow {
    pub player_a: String,
    pub player_b: String,
    pub plays: i64,
    pub wins: i64,
    pub win_rate: f64,
}

impl PairRow {
    fn new(player_a: String, player_b: String, plays: i64, wins: i64) -> Self {
        let win_rate = if plays == 0 {
            0.0
        } else {
            wins as f64 * 100.0 / plays as f64
        };
        Self {
            player_a,
            player_b,
            plays,
            wins,
            win_rate,
        }
    }
}

impl From<&PairRecord> for PairRow {
    fn from(record: &PairRecord) -> Self {
        Self::new(
            record.pair.first().to_string(),
            record.pair.second().to_string(),
            record.tally.plays,
            record.tally.wins,
        )
    }
}

impl From<PairStatsEntity> for PairRow {
    fn from(row: PairStatsEntity) -> Self {
        Self::new(row.player_a, row.player_b, row.plays, row.wins)
    }
}

/// Pair statistics of a team: the persisted counters next to a
/// recomputation from its decided games.
#[derive(Debug, Serialize, ToSchema)]
pub struct TeamPairsResponse {
    pub team: String,
    pub stored: Vec<PairRow>,
    pub recomputed: Vec<PairRow>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PlayerStatsResponse {
    pub player: String,
    pub points: i64,
    pub wins: i64,
    pub losses: i64,
    pub games: i64,
    pub win_rate: f64,
}

impl PlayerStatsResponse {
    pub fn new(player: String, tally: PlayerTally) -> Self {
        Self {
            player,
            points: tally.points,
            wins: tally.wins,
            losses: tally.losses,
            games: tally.games(),
            win_rate: tally.win_rate(),
        }
    }
}
