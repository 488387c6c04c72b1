use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::stats::{PairKey, PairTally, PlayerTally, ScoringRule, Side};

/// Subscription package gating team and tournament creation.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PackageKind {
    #[default]
    Free,
    TeamPackage,
    TournamentPackage,
    ProPackage,
}

impl PackageKind {
    pub const ALL: [PackageKind; 4] = [
        PackageKind::Free,
        PackageKind::TeamPackage,
        PackageKind::TournamentPackage,
        PackageKind::ProPackage,
    ];

    /// Stored and wire name of the package.
    pub fn as_str(self) -> &'static str {
        match self {
            PackageKind::Free => "FREE",
            PackageKind::TeamPackage => "TEAM_PACKAGE",
            PackageKind::TournamentPackage => "TOURNAMENT_PACKAGE",
            PackageKind::ProPackage => "PRO_PACKAGE",
        }
    }

    /// Whether owners on this package may create teams at all.
    pub fn allows_teams(self) -> bool {
        matches!(self, PackageKind::TeamPackage | PackageKind::ProPackage)
    }

    /// Whether owners on this package may create tournaments at all.
    pub fn allows_tournaments(self) -> bool {
        matches!(self, PackageKind::TournamentPackage | PackageKind::ProPackage)
    }
}

/// Account row, linked to the identity provider by `external_id`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserEntity {
    /// Primary key.
    pub id: Uuid,
    /// Identifier assigned by the identity provider; `None` for guest rows
    /// created from a team invitation.
    pub external_id: Option<String>,
    /// Lowercased email, unique across users.
    pub email: String,
    pub name: Option<String>,
    pub image: Option<String>,
    pub package: PackageKind,
    pub team_quota: u32,
    pub tournament_quota: u32,
    pub team_count: u32,
    pub tournament_count: u32,
    pub created_at: SystemTime,
    pub updated_at: SystemTime,
}

impl UserEntity {
    /// Whether the package includes teams and a team slot is still free.
    pub fn has_team_slot(&self) -> bool {
        self.package.allows_teams() && self.team_count < self.team_quota
    }

    /// Whether the package includes tournaments and a slot is still free.
    pub fn has_tournament_slot(&self) -> bool {
        self.package.allows_tournaments() && self.tournament_count < self.tournament_quota
    }
}

/// Change to a user's package and quotas. Team and tournament counts are
/// never part of it, so it can land next to concurrent creations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageChange {
    /// Switch to `package` with both quotas replaced.
    Reset {
        package: PackageKind,
        team_quota: u32,
        tournament_quota: u32,
    },
    /// Switch to `package` and add slots on top of the current quotas.
    AddSlots {
        package: PackageKind,
        teams: u32,
        tournaments: u32,
    },
}

impl PackageChange {
    pub fn package(self) -> PackageKind {
        match self {
            PackageChange::Reset { package, .. } | PackageChange::AddSlots { package, .. } => {
                package
            }
        }
    }

    pub fn apply(self, user: &mut UserEntity) {
        match self {
            PackageChange::Reset {
                package,
                team_quota,
                tournament_quota,
            } => {
                user.package = package;
                user.team_quota = team_quota;
                user.tournament_quota = tournament_quota;
            }
            PackageChange::AddSlots {
                package,
                teams,
                tournaments,
            } => {
                user.package = package;
                user.team_quota += teams;
                user.tournament_quota += tournaments;
            }
        }
    }
}

/// A team owned by one user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TeamEntity {
    pub id: Uuid,
    /// Unique URL slug derived from the name.
    pub slug: String,
    pub name: String,
    pub owner_id: Uuid,
    pub created_at: SystemTime,
}

/// Role of a member inside a team.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MemberRole {
    Owner,
    Member,
}

/// Team membership keyed by email; `user_id` stays empty until an account
/// with that email exists (an "orphan" member).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TeamMemberEntity {
    pub id: Uuid,
    pub team_id: Uuid,
    pub email: String,
    pub user_id: Option<Uuid>,
    pub display_name: Option<String>,
    pub role: MemberRole,
    pub created_at: SystemTime,
}

/// A dated play session of a team.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionEntity {
    pub id: Uuid,
    pub slug: String,
    pub team_id: Uuid,
    pub name: Option<String>,
    /// Calendar day of the session (`YYYY-MM-DD`).
    pub date: String,
    pub created_at: SystemTime,
}

/// Persisted match outcome.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameEntity {
    pub id: Uuid,
    pub slug: String,
    pub session_id: Uuid,
    /// Denormalized from the session so team-wide views and pair rows can be
    /// resolved without a join.
    pub team_id: Uuid,
    /// Normalized player emails on side A.
    pub side_a: Vec<String>,
    /// Normalized player emails on side B.
    pub side_b: Vec<String>,
    /// `None` while the game is pending.
    pub winner: Option<Side>,
    /// Rule the recorded winner was credited with; reversals undo exactly
    /// these points. `None` while pending.
    #[serde(default)]
    pub scoring: Option<ScoringRule>,
    pub created_at: SystemTime,
    pub updated_at: SystemTime,
}

/// A tournament owned by one user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TournamentEntity {
    pub id: Uuid,
    pub slug: String,
    pub name: String,
    pub owner_id: Uuid,
    pub banner_url: Option<String>,
    pub min_games_per_player: u32,
    pub created_at: SystemTime,
}

/// Global cumulative counters of one player.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerStatsEntity {
    /// Normalized email of the player.
    pub player: String,
    pub points: i64,
    pub wins: i64,
    pub losses: i64,
}

impl PlayerStatsEntity {
    /// Zeroed row for a player without contributions yet.
    pub fn empty(player: impl Into<String>) -> Self {
        Self {
            player: player.into(),
            points: 0,
            wins: 0,
            losses: 0,
        }
    }

    pub fn tally(&self) -> PlayerTally {
        PlayerTally {
            points: self.points,
            wins: self.wins,
            losses: self.losses,
        }
    }
}

/// Cumulative counters of one doubles pair inside a team.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PairStatsEntity {
    pub team_id: Uuid,
    /// Lexicographically smaller email of the pair.
    pub player_a: String,
    /// Lexicographically larger email of the pair.
    pub player_b: String,
    pub plays: i64,
    pub wins: i64,
}

impl PairStatsEntity {
    pub fn empty(team_id: Uuid, pair: &PairKey) -> Self {
        Self {
            team_id,
            player_a: pair.first().to_string(),
            player_b: pair.second().to_string(),
            plays: 0,
            wins: 0,
        }
    }

    pub fn tally(&self) -> PairTally {
        PairTally {
            plays: self.plays,
            wins: self.wins,
        }
    }
}
