//! In-process store backing local runs and tests.
//!
//! Every table sits behind one [`RwLock`]; an operation holds the write guard
//! for its whole read-check-write, which makes multi-record writes atomic and
//! serializes ledger commits.

use std::{sync::Arc, time::SystemTime};

use futures::future::BoxFuture;
use indexmap::IndexMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::dao::{
    club_store::ClubStore,
    models::{
        GameEntity, PackageChange, PairStatsEntity, PlayerStatsEntity, SessionEntity, TeamEntity,
        TeamMemberEntity, TournamentEntity, UserEntity,
    },
    storage::{GameTransition, LedgerCommit, LedgerWriteError, StorageError, StorageResult},
};

type PairRowKey = (Uuid, String, String);

#[derive(Default)]
struct Tables {
    users: IndexMap<Uuid, UserEntity>,
    teams: IndexMap<Uuid, TeamEntity>,
    members: IndexMap<Uuid, TeamMemberEntity>,
    sessions: IndexMap<Uuid, SessionEntity>,
    games: IndexMap<Uuid, GameEntity>,
    tournaments: IndexMap<Uuid, TournamentEntity>,
    player_stats: IndexMap<String, PlayerStatsEntity>,
    pair_stats: IndexMap<PairRowKey, PairStatsEntity>,
}

impl Tables {
    fn ensure_unique_email(&self, user: &UserEntity) -> StorageResult<()> {
        let taken = self
            .users
            .values()
            .any(|existing| existing.email == user.email && existing.id != user.id);
        if taken {
            return Err(StorageError::duplicate("user", user.email.clone()));
        }
        Ok(())
    }

    fn ensure_unique_membership(&self, member: &TeamMemberEntity) -> StorageResult<()> {
        let taken = self.members.values().any(|existing| {
            existing.team_id == member.team_id
                && existing.email == member.email
                && existing.id != member.id
        });
        if taken {
            return Err(StorageError::duplicate("team member", member.email.clone()));
        }
        Ok(())
    }

    fn apply_commit(&mut self, commit: &LedgerCommit) -> Result<GameEntity, LedgerWriteError> {
        let game = self
            .games
            .get(&commit.game_id)
            .cloned()
            .ok_or(LedgerWriteError::MissingGame(commit.game_id))?;
        commit.check(game.winner, game.scoring)?;

        for (player, change) in commit.delta.players() {
            let row = self
                .player_stats
                .entry(player.to_string())
                .or_insert_with(|| PlayerStatsEntity::empty(player.as_str()));
            row.points += change.points;
            row.wins += change.wins;
            row.losses += change.losses;
        }

        for (pair, change) in commit.delta.pairs() {
            let key = (
                game.team_id,
                pair.first().to_string(),
                pair.second().to_string(),
            );
            let row = self
                .pair_stats
                .entry(key)
                .or_insert_with(|| PairStatsEntity::empty(game.team_id, pair));
            row.plays += change.plays;
            row.wins += change.wins;
        }

        let mut updated = game;
        updated.winner = commit.next_winner();
        updated.scoring = commit.next_scoring();
        updated.updated_at = SystemTime::now();

        match commit.transition {
            GameTransition::Delete => {
                self.games.shift_remove(&commit.game_id);
            }
            GameTransition::Decide(..) | GameTransition::Undecide => {
                self.games.insert(updated.id, updated.clone());
            }
        }

        Ok(updated)
    }
}

/// [`ClubStore`] keeping every table in memory.
#[derive(Clone, Default)]
pub struct MemoryClubStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryClubStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn read<T>(&self, f: impl FnOnce(&Tables) -> T) -> T {
        let guard = self.tables.read().await;
        f(&guard)
    }

    async fn write<T>(&self, f: impl FnOnce(&mut Tables) -> T) -> T {
        let mut guard = self.tables.write().await;
        f(&mut guard)
    }
}

impl ClubStore for MemoryClubStore {
    fn find_user(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<UserEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.read(|t| t.users.get(&id).cloned()).await) })
    }

    fn find_user_by_external_id(
        &self,
        external_id: String,
    ) -> BoxFuture<'static, StorageResult<Option<UserEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            Ok(store
                .read(|t| {
                    t.users
                        .values()
                        .find(|u| u.external_id.as_deref() == Some(external_id.as_str()))
                        .cloned()
                })
                .await)
        })
    }

    fn find_user_by_email(
        &self,
        email: String,
    ) -> BoxFuture<'static, StorageResult<Option<UserEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            Ok(store
                .read(|t| t.users.values().find(|u| u.email == email).cloned())
                .await)
        })
    }

    fn save_user(&self, user: UserEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .write(|t| {
                    t.ensure_unique_email(&user)?;
                    t.users.insert(user.id, user);
                    Ok(())
                })
                .await
        })
    }

    fn update_user_profile(
        &self,
        external_id: String,
        name: Option<String>,
        image: Option<String>,
    ) -> BoxFuture<'static, StorageResult<u64>> {
        let store = self.clone();
        Box::pin(async move {
            Ok(store
                .write(|t| {
                    let mut updated = 0;
                    for user in t.users.values_mut() {
                        if user.external_id.as_deref() != Some(external_id.as_str()) {
                            continue;
                        }
                        if let Some(name) = &name {
                            user.name = Some(name.clone());
                        }
                        if let Some(image) = &image {
                            user.image = Some(image.clone());
                        }
                        user.updated_at = SystemTime::now();
                        updated += 1;
                    }
                    updated
                })
                .await)
        })
    }

    fn complete_user(
        &self,
        user_id: Uuid,
        external_id: Option<String>,
        name: Option<String>,
        image: Option<String>,
    ) -> BoxFuture<'static, StorageResult<Option<UserEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            Ok(store
                .write(|t| {
                    let user = t.users.get_mut(&user_id)?;
                    if external_id.is_some() {
                        user.external_id = external_id;
                    }
                    if user.name.is_none() {
                        user.name = name;
                    }
                    if user.image.is_none() {
                        user.image = image;
                    }
                    user.updated_at = SystemTime::now();
                    Some(user.clone())
                })
                .await)
        })
    }

    fn update_package(
        &self,
        user_id: Uuid,
        change: PackageChange,
    ) -> BoxFuture<'static, StorageResult<Option<UserEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            Ok(store
                .write(|t| {
                    let user = t.users.get_mut(&user_id)?;
                    change.apply(user);
                    user.updated_at = SystemTime::now();
                    Some(user.clone())
                })
                .await)
        })
    }

    fn create_team(
        &self,
        team: TeamEntity,
        owner: TeamMemberEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .write(|t| {
                    if t.teams.values().any(|existing| existing.slug == team.slug) {
                        return Err(StorageError::duplicate("team", team.slug.clone()));
                    }
                    let Some(user) = t.users.get_mut(&team.owner_id) else {
                        return Err(StorageError::unavailable(
                            format!("owner `{}` of team `{}` is missing", team.owner_id, team.slug),
                            std::io::Error::from(std::io::ErrorKind::NotFound),
                        ));
                    };
                    if !user.has_team_slot() {
                        return Err(StorageError::QuotaExceeded { resource: "team" });
                    }
                    user.team_count += 1;
                    user.updated_at = SystemTime::now();
                    t.members.insert(owner.id, owner);
                    t.teams.insert(team.id, team);
                    Ok(())
                })
                .await
        })
    }

    fn find_team(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<TeamEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.read(|t| t.teams.get(&id).cloned()).await) })
    }

    fn find_team_by_slug(
        &self,
        slug: String,
    ) -> BoxFuture<'static, StorageResult<Option<TeamEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            Ok(store
                .read(|t| t.teams.values().find(|team| team.slug == slug).cloned())
                .await)
        })
    }

    fn list_members(&self, team_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<TeamMemberEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            Ok(store
                .read(|t| {
                    t.members
                        .values()
                        .filter(|m| m.team_id == team_id)
                        .cloned()
                        .collect()
                })
                .await)
        })
    }

    fn list_all_members(&self) -> BoxFuture<'static, StorageResult<Vec<TeamMemberEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.read(|t| t.members.values().cloned().collect()).await) })
    }

    fn save_member(&self, member: TeamMemberEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .write(|t| {
                    t.ensure_unique_membership(&member)?;
                    t.members.insert(member.id, member);
                    Ok(())
                })
                .await
        })
    }

    fn delete_member(&self, team_id: Uuid, member_id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            Ok(store
                .write(|t| match t.members.get(&member_id) {
                    Some(member) if member.team_id == team_id => {
                        t.members.shift_remove(&member_id);
                        true
                    }
                    _ => false,
                })
                .await)
        })
    }

    fn link_orphan_members(
        &self,
        email: String,
        user_id: Uuid,
        display_name: Option<String>,
    ) -> BoxFuture<'static, StorageResult<u64>> {
        let store = self.clone();
        Box::pin(async move {
            Ok(store
                .write(|t| {
                    let mut linked = 0;
                    for member in t.members.values_mut() {
                        if member.email != email || member.user_id.is_some() {
                            continue;
                        }
                        member.user_id = Some(user_id);
                        if let Some(name) = &display_name {
                            member.display_name = Some(name.clone());
                        }
                        linked += 1;
                    }
                    linked
                })
                .await)
        })
    }

    fn save_session(&self, session: SessionEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .write(|t| {
                    let taken = t
                        .sessions
                        .values()
                        .any(|s| s.slug == session.slug && s.id != session.id);
                    if taken {
                        return Err(StorageError::duplicate("session", session.slug.clone()));
                    }
                    t.sessions.insert(session.id, session);
                    Ok(())
                })
                .await
        })
    }

    fn find_session_by_slug(
        &self,
        slug: String,
    ) -> BoxFuture<'static, StorageResult<Option<SessionEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            Ok(store
                .read(|t| t.sessions.values().find(|s| s.slug == slug).cloned())
                .await)
        })
    }

    fn list_sessions(&self, team_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<SessionEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            Ok(store
                .read(|t| {
                    t.sessions
                        .values()
                        .filter(|s| s.team_id == team_id)
                        .cloned()
                        .collect()
                })
                .await)
        })
    }

    fn save_game(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .write(|t| {
                    let taken = t
                        .games
                        .values()
                        .any(|g| g.slug == game.slug && g.id != game.id);
                    if taken {
                        return Err(StorageError::duplicate("game", game.slug.clone()));
                    }
                    t.games.insert(game.id, game);
                    Ok(())
                })
                .await
        })
    }

    fn find_game_by_slug(&self, slug: String) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            Ok(store
                .read(|t| t.games.values().find(|g| g.slug == slug).cloned())
                .await)
        })
    }

    fn list_games_by_session(
        &self,
        session_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            Ok(store
                .read(|t| {
                    t.games
                        .values()
                        .filter(|g| g.session_id == session_id)
                        .cloned()
                        .collect()
                })
                .await)
        })
    }

    fn list_games_by_team(&self, team_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            Ok(store
                .read(|t| {
                    t.games
                        .values()
                        .filter(|g| g.team_id == team_id)
                        .cloned()
                        .collect()
                })
                .await)
        })
    }

    fn commit_ledger(
        &self,
        commit: LedgerCommit,
    ) -> BoxFuture<'static, Result<GameEntity, LedgerWriteError>> {
        let store = self.clone();
        Box::pin(async move { store.write(|t| t.apply_commit(&commit)).await })
    }

    fn create_tournament(
        &self,
        tournament: TournamentEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .write(|t| {
                    if t.tournaments.values().any(|e| e.slug == tournament.slug) {
                        return Err(StorageError::duplicate("tournament", tournament.slug.clone()));
                    }
                    let Some(user) = t.users.get_mut(&tournament.owner_id) else {
                        return Err(StorageError::unavailable(
                            format!(
                                "owner `{}` of tournament `{}` is missing",
                                tournament.owner_id, tournament.slug
                            ),
                            std::io::Error::from(std::io::ErrorKind::NotFound),
                        ));
                    };
                    if !user.has_tournament_slot() {
                        return Err(StorageError::QuotaExceeded {
                            resource: "tournament",
                        });
                    }
                    user.tournament_count += 1;
                    user.updated_at = SystemTime::now();
                    t.tournaments.insert(tournament.id, tournament);
                    Ok(())
                })
                .await
        })
    }

    fn find_tournament_by_slug(
        &self,
        slug: String,
    ) -> BoxFuture<'static, StorageResult<Option<TournamentEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            Ok(store
                .read(|t| t.tournaments.values().find(|e| e.slug == slug).cloned())
                .await)
        })
    }

    fn list_tournaments(
        &self,
        owner_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<TournamentEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            Ok(store
                .read(|t| {
                    t.tournaments
                        .values()
                        .filter(|e| e.owner_id == owner_id)
                        .cloned()
                        .collect()
                })
                .await)
        })
    }

    fn find_player_stats(
        &self,
        player: String,
    ) -> BoxFuture<'static, StorageResult<Option<PlayerStatsEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.read(|t| t.player_stats.get(&player).cloned()).await) })
    }

    fn list_pair_stats(&self, team_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<PairStatsEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            Ok(store
                .read(|t| {
                    t.pair_stats
                        .values()
                        .filter(|p| p.team_id == team_id)
                        .cloned()
                        .collect()
                })
                .await)
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dao::models::{MemberRole, PackageKind},
        stats::{LedgerDelta, Outcome, ScoringRule, Side, StatsError},
    };

    fn game(side_a: &[&str], side_b: &[&str]) -> GameEntity {
        let now = SystemTime::now();
        GameEntity {
            id: Uuid::new_v4(),
            slug: format!("game-{}", Uuid::new_v4().simple()),
            session_id: Uuid::new_v4(),
            team_id: Uuid::new_v4(),
            side_a: side_a.iter().map(|s| s.to_string()).collect(),
            side_b: side_b.iter().map(|s| s.to_string()).collect(),
            winner: None,
            scoring: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn decide_commit(game: &GameEntity, side: Side) -> LedgerCommit {
        let outcome = Outcome::from_raw(&game.side_a, &game.side_b).unwrap();
        LedgerCommit {
            game_id: game.id,
            expected_winner: None,
            expected_scoring: None,
            transition: GameTransition::Decide(side, ScoringRule::default()),
            delta: LedgerDelta::for_decision(&outcome, side, &ScoringRule::default()),
        }
    }

    #[tokio::test]
    async fn commit_updates_counters_and_winner_together() {
        let store = MemoryClubStore::new();
        let g = game(&["alice@x.com", "carol@x.com"], &["bob@x.com", "dave@x.com"]);
        store.save_game(g.clone()).await.unwrap();

        let updated = store.commit_ledger(decide_commit(&g, Side::A)).await.unwrap();
        assert_eq!(updated.winner, Some(Side::A));

        let alice = store.find_player_stats("alice@x.com".into()).await.unwrap().unwrap();
        assert_eq!((alice.points, alice.wins, alice.losses), (10, 1, 0));
        let pairs = store.list_pair_stats(g.team_id).await.unwrap();
        assert_eq!(pairs.len(), 2);
    }

    #[tokio::test]
    async fn stale_commit_leaves_counters_untouched() {
        let store = MemoryClubStore::new();
        let g = game(&["alice@x.com"], &["bob@x.com"]);
        store.save_game(g.clone()).await.unwrap();

        store.commit_ledger(decide_commit(&g, Side::A)).await.unwrap();
        let err = store
            .commit_ledger(decide_commit(&g, Side::B))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerWriteError::Stats(StatsError::AlreadyDecided)));

        let bob = store.find_player_stats("bob@x.com".into()).await.unwrap().unwrap();
        assert_eq!((bob.points, bob.wins, bob.losses), (2, 0, 1));
    }

    #[tokio::test]
    async fn concurrent_decisions_let_one_through() {
        let store = MemoryClubStore::new();
        let g = game(&["alice@x.com"], &["bob@x.com"]);
        store.save_game(g.clone()).await.unwrap();

        let first = store.commit_ledger(decide_commit(&g, Side::A));
        let second = store.commit_ledger(decide_commit(&g, Side::B));
        let (first, second) = tokio::join!(first, second);
        assert_eq!([first.is_ok(), second.is_ok()].iter().filter(|ok| **ok).count(), 1);

        let alice = store.find_player_stats("alice@x.com".into()).await.unwrap().unwrap();
        let bob = store.find_player_stats("bob@x.com".into()).await.unwrap().unwrap();
        assert_eq!(alice.wins + bob.wins, 1);
        assert_eq!(alice.losses + bob.losses, 1);
    }

    #[tokio::test]
    async fn delete_commit_removes_the_game() {
        let store = MemoryClubStore::new();
        let g = game(&["alice@x.com"], &["bob@x.com"]);
        store.save_game(g.clone()).await.unwrap();

        let commit = LedgerCommit {
            game_id: g.id,
            expected_winner: None,
            expected_scoring: None,
            transition: GameTransition::Delete,
            delta: LedgerDelta::default(),
        };
        store.commit_ledger(commit.clone()).await.unwrap();
        assert!(store.find_game_by_slug(g.slug.clone()).await.unwrap().is_none());
        assert!(matches!(
            store.commit_ledger(commit).await,
            Err(LedgerWriteError::MissingGame(id)) if id == g.id
        ));
    }

    #[tokio::test]
    async fn duplicate_slugs_are_rejected() {
        let store = MemoryClubStore::new();
        let g = game(&["alice@x.com"], &["bob@x.com"]);
        store.save_game(g.clone()).await.unwrap();

        let mut clash = game(&["carol@x.com"], &["dave@x.com"]);
        clash.slug = g.slug.clone();
        assert!(matches!(
            store.save_game(clash).await,
            Err(StorageError::Duplicate { entity: "game", .. })
        ));
    }

    fn owner(package: PackageKind, team_quota: u32, tournament_quota: u32) -> UserEntity {
        let now = SystemTime::now();
        UserEntity {
            id: Uuid::new_v4(),
            external_id: None,
            email: "olive@x.com".into(),
            name: None,
            image: None,
            package,
            team_quota,
            tournament_quota,
            team_count: 0,
            tournament_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    fn team_for(user: &UserEntity, slug: &str) -> (TeamEntity, TeamMemberEntity) {
        let now = SystemTime::now();
        let team = TeamEntity {
            id: Uuid::new_v4(),
            slug: slug.into(),
            name: slug.into(),
            owner_id: user.id,
            created_at: now,
        };
        let member = TeamMemberEntity {
            id: Uuid::new_v4(),
            team_id: team.id,
            email: user.email.clone(),
            user_id: Some(user.id),
            display_name: None,
            role: MemberRole::Owner,
            created_at: now,
        };
        (team, member)
    }

    #[tokio::test]
    async fn creations_recheck_the_slot_under_the_lock() {
        let store = MemoryClubStore::new();
        let user = owner(PackageKind::ProPackage, 1, 0);
        store.save_user(user.clone()).await.unwrap();

        let (first, first_owner) = team_for(&user, "first");
        let (second, second_owner) = team_for(&user, "second");
        let (a, b) = tokio::join!(
            store.create_team(first, first_owner),
            store.create_team(second, second_owner),
        );
        assert_eq!([a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count(), 1);

        let tournament = TournamentEntity {
            id: Uuid::new_v4(),
            slug: "open".into(),
            name: "Open".into(),
            owner_id: user.id,
            banner_url: None,
            min_games_per_player: 0,
            created_at: SystemTime::now(),
        };
        assert!(matches!(
            store.create_tournament(tournament).await,
            Err(StorageError::QuotaExceeded {
                resource: "tournament"
            })
        ));

        let stored = store.find_user(user.id).await.unwrap().unwrap();
        assert_eq!((stored.team_count, stored.tournament_count), (1, 0));
    }

    #[tokio::test]
    async fn package_change_leaves_counts_alone() {
        let store = MemoryClubStore::new();
        let mut user = owner(PackageKind::TeamPackage, 3, 0);
        user.team_count = 2;
        store.save_user(user.clone()).await.unwrap();

        let change = PackageChange::AddSlots {
            package: PackageKind::TournamentPackage,
            teams: 0,
            tournaments: 1,
        };
        let updated = store.update_package(user.id, change).await.unwrap().unwrap();
        assert_eq!(updated.package, PackageKind::TournamentPackage);
        assert_eq!((updated.team_count, updated.team_quota), (2, 3));
        assert_eq!(updated.tournament_quota, 1);

        assert!(
            store
                .update_package(Uuid::new_v4(), change)
                .await
                .unwrap()
                .is_none()
        );
    }
}
