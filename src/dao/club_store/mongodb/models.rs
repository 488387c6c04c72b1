use mongodb::bson::{Bson, DateTime, Document, doc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    dao::models::{
        GameEntity, MemberRole, PackageKind, PairStatsEntity, PlayerStatsEntity, SessionEntity,
        TeamEntity, TeamMemberEntity, TournamentEntity, UserEntity,
    },
    stats::{PairKey, ScoringRule, Side},
};

use super::error::{MongoDaoError, MongoResult};

pub const USERS: &str = "users";
pub const TEAMS: &str = "teams";
pub const MEMBERS: &str = "team_members";
pub const SESSIONS: &str = "sessions";
pub const GAMES: &str = "games";
pub const TOURNAMENTS: &str = "tournaments";
pub const PLAYER_STATS: &str = "player_stats";
pub const PAIR_STATS: &str = "pair_stats";

pub fn doc_id(id: Uuid) -> Document {
    doc! {"_id": id.to_string()}
}

pub fn winner_bson(winner: Option<Side>) -> Bson {
    match winner {
        Some(side) => Bson::String(side.to_string()),
        None => Bson::Null,
    }
}

/// Embedded form of the rule a winner was credited with. Field order is
/// fixed so equality filters on the whole document match.
pub fn scoring_bson(scoring: Option<ScoringRule>) -> Bson {
    match scoring {
        Some(rule) => Bson::Document(doc! {
            "win_points": rule.win_points,
            "loss_points": rule.loss_points,
        }),
        None => Bson::Null,
    }
}

/// `_id` of a pair row: team, then both emails in key order.
pub fn pair_row_id(team_id: Uuid, pair: &PairKey) -> String {
    format!("{team_id}:{}:{}", pair.first(), pair.second())
}

fn parse_uuid(collection: &'static str, raw: &str) -> MongoResult<Uuid> {
    Uuid::parse_str(raw).map_err(|err| MongoDaoError::MalformedDocument {
        collection,
        id: raw.to_owned(),
        reason: err.to_string(),
    })
}

fn parse_optional_uuid(collection: &'static str, raw: Option<&str>) -> MongoResult<Option<Uuid>> {
    raw.map(|value| parse_uuid(collection, value)).transpose()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserDocument {
    #[serde(rename = "_id")]
    id: String,
    external_id: Option<String>,
    email: String,
    name: Option<String>,
    image: Option<String>,
    package: PackageKind,
    team_quota: u32,
    tournament_quota: u32,
    team_count: u32,
    tournament_count: u32,
    created_at: DateTime,
    updated_at: DateTime,
}

impl From<UserEntity> for UserDocument {
    fn from(value: UserEntity) -> Self {
        Self {
            id: value.id.to_string(),
            external_id: value.external_id,
            email: value.email,
            name: value.name,
            image: value.image,
            package: value.package,
            team_quota: value.team_quota,
            tournament_quota: value.tournament_quota,
            team_count: value.team_count,
            tournament_count: value.tournament_count,
            created_at: DateTime::from_system_time(value.created_at),
            updated_at: DateTime::from_system_time(value.updated_at),
        }
    }
}

impl TryFrom<UserDocument> for UserEntity {
    type Error = MongoDaoError;

    fn try_from(value: UserDocument) -> MongoResult<Self> {
        Ok(Self {
            id: parse_uuid(USERS, &value.id)?,
            external_id: value.external_id,
            email: value.email,
            name: value.name,
            image: value.image,
            package: value.package,
            team_quota: value.team_quota,
            tournament_quota: value.tournament_quota,
            team_count: value.team_count,
            tournament_count: value.tournament_count,
            created_at: value.created_at.to_system_time(),
            updated_at: value.updated_at.to_system_time(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamDocument {
    #[serde(rename = "_id")]
    id: String,
    slug: String,
    name: String,
    owner_id: String,
    created_at: DateTime,
}

impl From<TeamEntity> for TeamDocument {
    fn from(value: TeamEntity) -> Self {
        Self {
            id: value.id.to_string(),
            slug: value.slug,
            name: value.name,
            owner_id: value.owner_id.to_string(),
            created_at: DateTime::from_system_time(value.created_at),
        }
    }
}

impl TryFrom<TeamDocument> for TeamEntity {
    type Error = MongoDaoError;

    fn try_from(value: TeamDocument) -> MongoResult<Self> {
        Ok(Self {
            id: parse_uuid(TEAMS, &value.id)?,
            slug: value.slug,
            name: value.name,
            owner_id: parse_uuid(TEAMS, &value.owner_id)?,
            created_at: value.created_at.to_system_time(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberDocument {
    #[serde(rename = "_id")]
    id: String,
    team_id: String,
    email: String,
    user_id: Option<String>,
    display_name: Option<String>,
    role: MemberRole,
    created_at: DateTime,
}

impl From<TeamMemberEntity> for MemberDocument {
    fn from(value: TeamMemberEntity) -> Self {
        Self {
            id: value.id.to_string(),
            team_id: value.team_id.to_string(),
            email: value.email,
            user_id: value.user_id.map(|id| id.to_string()),
            display_name: value.display_name,
            role: value.role,
            created_at: DateTime::from_system_time(value.created_at),
        }
    }
}

impl TryFrom<MemberDocument> for TeamMemberEntity {
    type Error = MongoDaoError;

    fn try_from(value: MemberDocument) -> MongoResult<Self> {
        Ok(Self {
            id: parse_uuid(MEMBERS, &value.id)?,
            team_id: parse_uuid(MEMBERS, &value.team_id)?,
            email: value.email,
            user_id: parse_optional_uuid(MEMBERS, value.user_id.as_deref())?,
            display_name: value.display_name,
            role: value.role,
            created_at: value.created_at.to_system_time(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionDocument {
    #[serde(rename = "_id")]
    id: String,
    slug: String,
    team_id: String,
    name: Option<String>,
    date: String,
    created_at: DateTime,
}

impl From<SessionEntity> for SessionDocument {
    fn from(value: SessionEntity) -> Self {
        Self {
            id: value.id.to_string(),
            slug: value.slug,
            team_id: value.team_id.to_string(),
            name: value.name,
            date: value.date,
            created_at: DateTime::from_system_time(value.created_at),
        }
    }
}

impl TryFrom<SessionDocument> for SessionEntity {
    type Error = MongoDaoError;

    fn try_from(value: SessionDocument) -> MongoResult<Self> {
        Ok(Self {
            id: parse_uuid(SESSIONS, &value.id)?,
            slug: value.slug,
            team_id: parse_uuid(SESSIONS, &value.team_id)?,
            name: value.name,
            date: value.date,
            created_at: value.created_at.to_system_time(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameDocument {
    #[serde(rename = "_id")]
    id: String,
    slug: String,
    session_id: String,
    team_id: String,
    side_a: Vec<String>,
    side_b: Vec<String>,
    winner: Option<Side>,
    #[serde(default)]
    scoring: Option<ScoringRule>,
    created_at: DateTime,
    updated_at: DateTime,
}

impl From<GameEntity> for GameDocument {
    fn from(value: GameEntity) -> Self {
        Self {
            id: value.id.to_string(),
            slug: value.slug,
            session_id: value.session_id.to_string(),
            team_id: value.team_id.to_string(),
            side_a: value.side_a,
            side_b: value.side_b,
            winner: value.winner,
            scoring: value.scoring,
            created_at: DateTime::from_system_time(value.created_at),
            updated_at: DateTime::from_system_time(value.updated_at),
        }
    }
}

impl TryFrom<GameDocument> for GameEntity {
    type Error = MongoDaoError;

    fn try_from(value: GameDocument) -> MongoResult<Self> {
        Ok(Self {
            id: parse_uuid(GAMES, &value.id)?,
            slug: value.slug,
            session_id: parse_uuid(GAMES, &value.session_id)?,
            team_id: parse_uuid(GAMES, &value.team_id)?,
            side_a: value.side_a,
            side_b: value.side_b,
            winner: value.winner,
            scoring: value.scoring,
            created_at: value.created_at.to_system_time(),
            updated_at: value.updated_at.to_system_time(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TournamentDocument {
    #[serde(rename = "_id")]
    id: String,
    slug: String,
    name: String,
    owner_id: String,
    banner_url: Option<String>,
    min_games_per_player: u32,
    created_at: DateTime,
}

impl From<TournamentEntity> for TournamentDocument {
    fn from(value: TournamentEntity) -> Self {
        Self {
            id: value.id.to_string(),
            slug: value.slug,
            name: value.name,
            owner_id: value.owner_id.to_string(),
            banner_url: value.banner_url,
            min_games_per_player: value.min_games_per_player,
            created_at: DateTime::from_system_time(value.created_at),
        }
    }
}

impl TryFrom<TournamentDocument> for TournamentEntity {
    type Error = MongoDaoError;

    fn try_from(value: TournamentDocument) -> MongoResult<Self> {
        Ok(Self {
            id: parse_uuid(TOURNAMENTS, &value.id)?,
            slug: value.slug,
            name: value.name,
            owner_id: parse_uuid(TOURNAMENTS, &value.owner_id)?,
            banner_url: value.banner_url,
            min_games_per_player: value.min_games_per_player,
            created_at: value.created_at.to_system_time(),
        })
    }
}

/// Player counters keyed by email.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerStatsDocument {
    #[serde(rename = "_id")]
    player: String,
    #[serde(default)]
    points: i64,
    #[serde(default)]
    wins: i64,
    #[serde(default)]
    losses: i64,
}

impl From<PlayerStatsDocument> for PlayerStatsEntity {
    fn from(value: PlayerStatsDocument) -> Self {
        Self {
            player: value.player,
            points: value.points,
            wins: value.wins,
            losses: value.losses,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairStatsDocument {
    #[serde(rename = "_id")]
    id: String,
    team_id: String,
    player_a: String,
    player_b: String,
    #[serde(default)]
    plays: i64,
    #[serde(default)]
    wins: i64,
}

impl TryFrom<PairStatsDocument> for PairStatsEntity {
    type Error = MongoDaoError;

    fn try_from(value: PairStatsDocument) -> MongoResult<Self> {
        Ok(Self {
            team_id: parse_uuid(PAIR_STATS, &value.team_id)?,
            player_a: value.player_a,
            player_b: value.player_b,
            plays: value.plays,
            wins: value.wins,
        })
    }
}
