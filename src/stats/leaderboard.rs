//! Scoped leaderboards recomputed from outcomes, independent of stored counters.

use std::collections::BTreeMap;

use super::{
    ledger::{LedgerDelta, PairKey, PairTally, PlayerTally, ScoringRule},
    outcome::{Outcome, PlayerId},
};

/// One ranked row of a leaderboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardEntry {
    pub player: PlayerId,
    pub tally: PlayerTally,
}

/// One row of a recomputed pair table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairRecord {
    pub pair: PairKey,
    pub tally: PairTally,
}

/// Fold every decided outcome into per-player tallies and rank them.
///
/// Outcomes carrying the rule they were credited with are scored with it,
/// so the fold agrees with the stored counters after a rule change.
///
/// Known players and every rostered player get a row even without a decided
/// game. Ranking is wins desc, points desc, then player identity asc, so the
/// result does not depend on input order.
pub fn compute_leaderboard<'a, O, K>(
    outcomes: O,
    known_players: K,
    rule: &ScoringRule,
) -> Vec<LeaderboardEntry>
where
    O: IntoIterator<Item = &'a Outcome>,
    K: IntoIterator<Item = &'a PlayerId>,
{
    let mut tallies: BTreeMap<PlayerId, PlayerTally> = known_players
        .into_iter()
        .map(|player| (player.clone(), PlayerTally::default()))
        .collect();

    for outcome in outcomes {
        for player in outcome.players() {
            tallies.entry(player.clone()).or_default();
        }

        let Some(winner) = outcome.winner() else {
            continue;
        };

        let delta = LedgerDelta::for_decision(outcome, winner, &outcome.scoring_or(rule));
        for (player, change) in delta.players() {
            tallies.entry(player.clone()).or_default().apply(change);
        }
    }

    let mut entries: Vec<LeaderboardEntry> = tallies
        .into_iter()
        .map(|(player, tally)| LeaderboardEntry { player, tally })
        .collect();

    entries.sort_by(|a, b| {
        b.tally
            .wins
            .cmp(&a.tally.wins)
            .then_with(|| b.tally.points.cmp(&a.tally.points))
            .then_with(|| a.player.cmp(&b.player))
    });
    entries
}

/// Recompute pair plays/wins over the doubles outcomes in scope.
///
/// Sorted by wins desc, plays desc, then pair key asc.
pub fn compute_pair_table<'a, O>(outcomes: O) -> Vec<PairRecord>
where
    O: IntoIterator<Item = &'a Outcome>,
{
    let mut tallies: BTreeMap<PairKey, PairTally> = BTreeMap::new();

    for outcome in outcomes {
        let Some(winner) = outcome.winner() else {
            continue;
        };
        // Pair deltas do not depend on the points rule.
        let delta = LedgerDelta::for_decision(outcome, winner, &ScoringRule::default());
        for (pair, change) in delta.pairs() {
            tallies.entry(pair.clone()).or_default().apply(change);
        }
    }

    let mut records: Vec<PairRecord> = tallies
        .into_iter()
        .map(|(pair, tally)| PairRecord { pair, tally })
        .collect();

    records.sort_by(|a, b| {
        b.tally
            .wins
            .cmp(&a.tally.wins)
            .then_with(|| b.tally.plays.cmp(&a.tally.plays))
            .then_with(|| a.pair.cmp(&b.pair))
    });
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::outcome::Side;

    fn id(raw: &str) -> PlayerId {
        PlayerId::parse(raw).unwrap()
    }

    fn decided(a: &[&str], b: &[&str], winner: Option<Side>) -> Outcome {
        Outcome::from_raw(a.iter().copied(), b.iter().copied())
            .unwrap()
            .with_winner(winner)
    }

    const NOBODY: [PlayerId; 0] = [];

    fn sample() -> Vec<Outcome> {
        vec![
            decided(&["alice@x.com"], &["bob@x.com"], Some(Side::A)),
            decided(&["bob@x.com"], &["carol@x.com"], Some(Side::A)),
            decided(&["carol@x.com"], &["alice@x.com"], Some(Side::A)),
            decided(&["dave@x.com"], &["erin@x.com"], None),
        ]
    }

    #[test]
    fn ranks_by_wins_points_then_identity() {
        let known = [id("zoe@x.com")];
        let board = compute_leaderboard(&sample(), &known, &ScoringRule::default());

        let order: Vec<_> = board.iter().map(|e| e.player.as_str()).collect();
        assert_eq!(
            order,
            vec![
                "alice@x.com",
                "bob@x.com",
                "carol@x.com",
                "dave@x.com",
                "erin@x.com",
                "zoe@x.com"
            ]
        );

        let alice = &board[0].tally;
        assert_eq!((alice.wins, alice.losses, alice.points), (1, 1, 12));
        assert_eq!(board[5].tally, PlayerTally::default());
    }

    #[test]
    fn points_break_ties_on_wins() {
        let outcomes = vec![
            decided(&["alice@x.com"], &["bob@x.com"], Some(Side::A)),
            decided(&["carol@x.com"], &["dave@x.com"], Some(Side::A)),
            decided(&["dave@x.com"], &["alice@x.com"], Some(Side::B)),
        ];
        let board = compute_leaderboard(&outcomes, &NOBODY, &ScoringRule::default());
        assert_eq!(board[0].player.as_str(), "alice@x.com");
        assert_eq!(board[0].tally.points, 20);
        assert_eq!(board[1].player.as_str(), "carol@x.com");
        // dave and bob have no wins; dave has more points from two losses.
        assert_eq!(board[2].player.as_str(), "dave@x.com");
        assert_eq!(board[3].player.as_str(), "bob@x.com");
    }

    #[test]
    fn input_order_does_not_change_ranking() {
        let rule = ScoringRule::default();
        let forward = sample();
        let mut backward = sample();
        backward.reverse();

        let a = compute_leaderboard(&forward, &NOBODY, &rule);
        let b = compute_leaderboard(&backward, &NOBODY, &rule);
        assert_eq!(a, b);
        assert_eq!(a, compute_leaderboard(&forward, &NOBODY, &rule));
    }

    #[test]
    fn credited_rule_wins_over_the_current_one() {
        let credited = ScoringRule {
            win_points: 3,
            loss_points: 1,
        };
        let outcomes = vec![
            decided(&["alice@x.com"], &["bob@x.com"], Some(Side::A)).with_scoring(Some(credited)),
            decided(&["alice@x.com"], &["bob@x.com"], Some(Side::A)),
        ];
        let board = compute_leaderboard(&outcomes, &NOBODY, &ScoringRule::default());
        assert_eq!(board[0].tally.points, 13);
        assert_eq!(board[1].tally.points, 3);
    }

    #[test]
    fn pending_outcomes_only_list_players() {
        let outcomes = vec![decided(&["alice@x.com"], &["bob@x.com"], None)];
        let board = compute_leaderboard(&outcomes, &NOBODY, &ScoringRule::default());
        assert_eq!(board.len(), 2);
        assert!(board.iter().all(|e| e.tally == PlayerTally::default()));
    }

    #[test]
    fn pair_table_counts_doubles_only() {
        let outcomes = vec![
            decided(&["alice@x.com", "carol@x.com"], &["bob@x.com", "dave@x.com"], Some(Side::A)),
            decided(&["carol@x.com", "alice@x.com"], &["dave@x.com", "bob@x.com"], Some(Side::B)),
            decided(&["carol@x.com", "alice@x.com"], &["erin@x.com", "bob@x.com"], Some(Side::A)),
            decided(&["alice@x.com"], &["bob@x.com"], Some(Side::A)),
        ];
        let table = compute_pair_table(&outcomes);

        let first = &table[0];
        assert_eq!(first.pair.first().as_str(), "alice@x.com");
        assert_eq!(first.pair.second().as_str(), "carol@x.com");
        assert_eq!(first.tally, PairTally { plays: 3, wins: 2 });

        let bob_dave = table
            .iter()
            .find(|r| r.pair.first().as_str() == "bob@x.com" && r.pair.second().as_str() == "dave@x.com")
            .unwrap();
        assert_eq!(bob_dave.tally, PairTally { plays: 2, wins: 1 });
        assert_eq!(table.len(), 3);
    }
}
