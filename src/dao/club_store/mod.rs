pub mod memory;
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use crate::dao::models::{
    GameEntity, PackageChange, PairStatsEntity, PlayerStatsEntity, SessionEntity, TeamEntity, TeamMemberEntity,
    TournamentEntity, UserEntity,
};
use crate::dao::storage::{LedgerCommit, LedgerWriteError, StorageResult};
use futures::future::BoxFuture;
use uuid::Uuid;

/// Abstraction over the persistence layer for accounts, teams, games and
/// statistics counters.
///
/// `save_*` methods insert or replace by primary key and reject unique-key
/// collisions with [`StorageError::Duplicate`](crate::dao::storage::StorageError).
/// Methods that touch several records at once are atomic.
pub trait ClubStore: Send + Sync {
    fn find_user(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<UserEntity>>>;
    fn find_user_by_external_id(
        &self,
        external_id: String,
    ) -> BoxFuture<'static, StorageResult<Option<UserEntity>>>;
    fn find_user_by_email(
        &self,
        email: String,
    ) -> BoxFuture<'static, StorageResult<Option<UserEntity>>>;
    fn save_user(&self, user: UserEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Refresh name and image of the users linked to `external_id`, leaving
    /// fields passed as `None` untouched. Returns the number of rows updated.
    fn update_user_profile(
        &self,
        external_id: String,
        name: Option<String>,
        image: Option<String>,
    ) -> BoxFuture<'static, StorageResult<u64>>;

    /// Set `external_id` when given and fill `name` and `image` only where the
    /// row has none, leaving every other field untouched. Returns the
    /// updated user, `None` when absent.
    fn complete_user(
        &self,
        user_id: Uuid,
        external_id: Option<String>,
        name: Option<String>,
        image: Option<String>,
    ) -> BoxFuture<'static, StorageResult<Option<UserEntity>>>;

    /// Apply `change` to the user's package and quotas without touching
    /// anything else on the row. Returns the updated user, `None` when absent.
    fn update_package(
        &self,
        user_id: Uuid,
        change: PackageChange,
    ) -> BoxFuture<'static, StorageResult<Option<UserEntity>>>;

    /// Insert the team and its owner membership and bump the owner's team
    /// count. Fails with `QuotaExceeded` unless the owner still has a team
    /// slot when the write lands.
    fn create_team(
        &self,
        team: TeamEntity,
        owner: TeamMemberEntity,
    ) -> BoxFuture<'static, StorageResult<()>>;
    fn find_team(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<TeamEntity>>>;
    fn find_team_by_slug(&self, slug: String)
    -> BoxFuture<'static, StorageResult<Option<TeamEntity>>>;

    fn list_members(&self, team_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<TeamMemberEntity>>>;
    fn list_all_members(&self) -> BoxFuture<'static, StorageResult<Vec<TeamMemberEntity>>>;
    fn save_member(&self, member: TeamMemberEntity) -> BoxFuture<'static, StorageResult<()>>;
    fn delete_member(&self, team_id: Uuid, member_id: Uuid) -> BoxFuture<'static, StorageResult<bool>>;
    /// Attach every member row with `email` and no user to `user_id`.
    fn link_orphan_members(
        &self,
        email: String,
        user_id: Uuid,
        display_name: Option<String>,
    ) -> BoxFuture<'static, StorageResult<u64>>;

    fn save_session(&self, session: SessionEntity) -> BoxFuture<'static, StorageResult<()>>;
    fn find_session_by_slug(
        &self,
        slug: String,
    ) -> BoxFuture<'static, StorageResult<Option<SessionEntity>>>;
    fn list_sessions(&self, team_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<SessionEntity>>>;

    fn save_game(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<()>>;
    fn find_game_by_slug(&self, slug: String) -> BoxFuture<'static, StorageResult<Option<GameEntity>>>;
    fn list_games_by_session(
        &self,
        session_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>>;
    fn list_games_by_team(&self, team_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>>;
    /// Apply a ledger commit atomically and return the game as left by the
    /// transition (for deletions, the removed row with its winner cleared).
    fn commit_ledger(
        &self,
        commit: LedgerCommit,
    ) -> BoxFuture<'static, Result<GameEntity, LedgerWriteError>>;

    /// Insert the tournament and bump the owner's tournament count, with the
    /// same slot check as [`ClubStore::create_team`].
    fn create_tournament(&self, tournament: TournamentEntity)
    -> BoxFuture<'static, StorageResult<()>>;
    fn find_tournament_by_slug(
        &self,
        slug: String,
    ) -> BoxFuture<'static, StorageResult<Option<TournamentEntity>>>;
    fn list_tournaments(
        &self,
        owner_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<TournamentEntity>>>;

    fn find_player_stats(
        &self,
        player: String,
    ) -> BoxFuture<'static, StorageResult<Option<PlayerStatsEntity>>>;
    fn list_pair_stats(&self, team_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<PairStatsEntity>>>;

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
