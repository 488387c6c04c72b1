use std::{sync::Arc, time::SystemTime};

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{
    Client, ClientSession, Collection, Database, IndexModel,
    bson::{DateTime, Document, doc},
    error::Error as MongoError,
    options::{IndexOptions, ReturnDocument},
};
use serde::{Serialize, de::DeserializeOwned};
use tokio::sync::RwLock;
use tracing::{debug, warn};
use uuid::Uuid;

use super::{
    config::MongoConfig,
    connection::establish_connection,
    error::{MongoDaoError, MongoResult, is_duplicate_key},
    models::{
        GAMES, GameDocument, MEMBERS, MemberDocument, PAIR_STATS, PLAYER_STATS, PairStatsDocument,
        PlayerStatsDocument, SESSIONS, SessionDocument, TEAMS, TOURNAMENTS, TeamDocument,
        TournamentDocument, USERS, UserDocument, doc_id, pair_row_id, scoring_bson, winner_bson,
    },
};
use crate::{
    dao::{
        club_store::ClubStore,
        models::{
            GameEntity, PackageChange, PackageKind, PairStatsEntity, PlayerStatsEntity,
            SessionEntity, TeamEntity, TeamMemberEntity, TournamentEntity, UserEntity,
        },
        storage::{GameTransition, LedgerCommit, LedgerWriteError, StorageError, StorageResult},
    },
    stats::StatsError,
};

/// Attempts for a ledger commit aborted by a transient transaction error.
const MAX_TRANSACTION_ATTEMPTS: u32 = 3;

/// MongoDB-backed [`ClubStore`]. Multi-document writes run inside
/// transactions, so the deployment must be a replica set.
#[derive(Clone)]
pub struct MongoClubStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
}

struct MongoState {
    client: Client,
    database: Database,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = {
            let guard = self.state.read().await;
            guard.database.clone()
        };

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let (client, database) =
            establish_connection(&self.config.options, &self.config.database_name).await?;
        let mut guard = self.state.write().await;
        guard.client = client;
        guard.database = database;
        Ok(())
    }
}

/// Failure inside a ledger transaction, kept apart so transient driver
/// errors can be retried.
enum CommitError {
    Ledger(LedgerWriteError),
    Mongo(MongoDaoError),
}

impl From<MongoDaoError> for CommitError {
    fn from(err: MongoDaoError) -> Self {
        CommitError::Mongo(err)
    }
}

impl From<StatsError> for CommitError {
    fn from(err: StatsError) -> Self {
        CommitError::Ledger(err.into())
    }
}

/// Map a failed insert or replace, reporting unique index collisions as
/// [`StorageError::Duplicate`].
fn write_error(
    entity: &'static str,
    key: String,
    collection: &'static str,
) -> impl FnOnce(MongoError) -> StorageError {
    move |source| {
        if is_duplicate_key(&source) {
            StorageError::duplicate(entity, key)
        } else {
            MongoDaoError::Query {
                action: "write",
                collection,
                source,
            }
            .into()
        }
    }
}

fn missing_owner(kind: &str, owner_id: Uuid) -> StorageError {
    StorageError::unavailable(
        format!("owner `{owner_id}` of {kind} is missing"),
        std::io::Error::from(std::io::ErrorKind::NotFound),
    )
}

/// Which slot a creation consumes and how the owner row tracks it.
struct Slot {
    resource: &'static str,
    allowed: fn(PackageKind) -> bool,
    count: &'static str,
    quota: &'static str,
}

const TEAM_SLOT: Slot = Slot {
    resource: "team",
    allowed: PackageKind::allows_teams,
    count: "team_count",
    quota: "team_quota",
};

const TOURNAMENT_SLOT: Slot = Slot {
    resource: "tournament",
    allowed: PackageKind::allows_tournaments,
    count: "tournament_count",
    quota: "tournament_quota",
};

/// Bump the owner's count for `slot` inside the transaction, matching the
/// row only while its package allows the resource and the count is below
/// the quota.
async fn reserve_slot(
    database: &Database,
    session: &mut ClientSession,
    owner_id: Uuid,
    slot: &Slot,
) -> StorageResult<()> {
    let packages: Vec<&str> = PackageKind::ALL
        .into_iter()
        .filter(|kind| (slot.allowed)(*kind))
        .map(PackageKind::as_str)
        .collect();
    let mut bump = Document::new();
    bump.insert(slot.count, 1);

    let users = database.collection::<Document>(USERS);
    let updated = users
        .update_one(
            doc! {
                "_id": owner_id.to_string(),
                "package": {"$in": packages},
                "$expr": {"$lt": [format!("${}", slot.count), format!("${}", slot.quota)]},
            },
            doc! {"$inc": bump, "$set": {"updated_at": DateTime::now()}},
        )
        .session(&mut *session)
        .await
        .map_err(MongoDaoError::query("reserve slot", USERS))?;
    if updated.matched_count > 0 {
        return Ok(());
    }

    let exists = users
        .count_documents(doc_id(owner_id))
        .session(&mut *session)
        .await
        .map_err(MongoDaoError::query("find owner", USERS))?;
    if exists == 0 {
        return Err(missing_owner(slot.resource, owner_id));
    }
    Err(StorageError::QuotaExceeded {
        resource: slot.resource,
    })
}

/// Commit on success, abort otherwise, and hand back the outcome.
async fn finish_transaction<T, E>(mut session: ClientSession, result: Result<T, E>) -> Result<T, E>
where
    E: From<MongoDaoError>,
{
    match result {
        Ok(value) => {
            session
                .commit_transaction()
                .await
                .map_err(MongoDaoError::transaction("commit"))?;
            Ok(value)
        }
        Err(err) => {
            if let Err(abort) = session.abort_transaction().await {
                warn!(error = %abort, "failed to abort MongoDB transaction");
            }
            Err(err)
        }
    }
}

impl MongoClubStore {
    /// Establish a connection to MongoDB and ensure indexes are present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (client, database) =
            establish_connection(&config.options, &config.database_name).await?;

        let inner = Arc::new(MongoInner {
            state: RwLock::new(MongoState { client, database }),
            config,
        });

        let store = Self { inner };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> MongoResult<()> {
        let database = self.database().await;
        let indexes: [(&'static str, &'static str, Document, bool); 9] = [
            (USERS, "email", doc! {"email": 1}, true),
            (USERS, "external_id", doc! {"external_id": 1}, false),
            (TEAMS, "slug", doc! {"slug": 1}, true),
            (MEMBERS, "team_id,email", doc! {"team_id": 1, "email": 1}, true),
            (MEMBERS, "email", doc! {"email": 1}, false),
            (SESSIONS, "slug", doc! {"slug": 1}, true),
            (GAMES, "slug", doc! {"slug": 1}, true),
            (GAMES, "session_id", doc! {"session_id": 1}, false),
            (TOURNAMENTS, "slug", doc! {"slug": 1}, true),
        ];

        for (collection, index, keys, unique) in indexes {
            let model = IndexModel::builder()
                .keys(keys)
                .options(
                    IndexOptions::builder()
                        .name(Some(format!("{collection}_{}_idx", index.replace(',', "_"))))
                        .unique(Some(unique))
                        .build(),
                )
                .build();

            database
                .collection::<Document>(collection)
                .create_index(model)
                .await
                .map_err(|source| MongoDaoError::EnsureIndex {
                    collection,
                    index,
                    source,
                })?;
        }

        Ok(())
    }

    async fn database(&self) -> Database {
        let guard = self.inner.state.read().await;
        guard.database.clone()
    }

    async fn handles(&self) -> (Client, Database) {
        let guard = self.inner.state.read().await;
        (guard.client.clone(), guard.database.clone())
    }

    async fn collection<D: Send + Sync>(&self, name: &'static str) -> Collection<D> {
        self.database().await.collection::<D>(name)
    }

    async fn start_transaction(&self) -> MongoResult<(ClientSession, Database)> {
        let (client, database) = self.handles().await;
        let mut session = client
            .start_session()
            .await
            .map_err(MongoDaoError::transaction("start session"))?;
        session
            .start_transaction()
            .await
            .map_err(MongoDaoError::transaction("start transaction"))?;
        Ok((session, database))
    }

    async fn find_one<D, E>(&self, name: &'static str, filter: Document) -> MongoResult<Option<E>>
    where
        D: DeserializeOwned + Unpin + Send + Sync,
        E: TryFrom<D, Error = MongoDaoError>,
    {
        self.collection::<D>(name)
            .await
            .find_one(filter)
            .await
            .map_err(MongoDaoError::query("find", name))?
            .map(E::try_from)
            .transpose()
    }

    async fn find_many<D, E>(&self, name: &'static str, filter: Document) -> MongoResult<Vec<E>>
    where
        D: DeserializeOwned + Unpin + Send + Sync,
        E: TryFrom<D, Error = MongoDaoError>,
    {
        let documents: Vec<D> = self
            .collection::<D>(name)
            .await
            .find(filter)
            .sort(doc! {"created_at": 1})
            .await
            .map_err(MongoDaoError::query("list", name))?
            .try_collect()
            .await
            .map_err(MongoDaoError::query("list", name))?;

        documents.into_iter().map(E::try_from).collect()
    }

    async fn replace<D>(
        &self,
        name: &'static str,
        id: Uuid,
        document: D,
        entity: &'static str,
        key: String,
    ) -> StorageResult<()>
    where
        D: Serialize + Send + Sync,
    {
        self.collection::<D>(name)
            .await
            .replace_one(doc_id(id), &document)
            .upsert(true)
            .await
            .map_err(write_error(entity, key, name))?;
        Ok(())
    }

    async fn update_user_profile(
        &self,
        external_id: String,
        name: Option<String>,
        image: Option<String>,
    ) -> MongoResult<u64> {
        let mut set = doc! {"updated_at": DateTime::now()};
        if let Some(name) = name {
            set.insert("name", name);
        }
        if let Some(image) = image {
            set.insert("image", image);
        }

        let result = self
            .collection::<Document>(USERS)
            .await
            .update_many(doc! {"external_id": external_id}, doc! {"$set": set})
            .await
            .map_err(MongoDaoError::query("update profile", USERS))?;
        Ok(result.modified_count)
    }

    async fn complete_user(
        &self,
        user_id: Uuid,
        external_id: Option<String>,
        name: Option<String>,
        image: Option<String>,
    ) -> MongoResult<Option<UserEntity>> {
        let mut set = doc! {"updated_at": DateTime::now()};
        if let Some(external_id) = external_id {
            set.insert("external_id", external_id);
        }
        if let Some(name) = name {
            set.insert("name", doc! {"$ifNull": ["$name", {"$literal": name}]});
        }
        if let Some(image) = image {
            set.insert("image", doc! {"$ifNull": ["$image", {"$literal": image}]});
        }

        self.collection::<UserDocument>(USERS)
            .await
            .find_one_and_update(doc_id(user_id), vec![doc! {"$set": set}])
            .return_document(ReturnDocument::After)
            .await
            .map_err(MongoDaoError::query("complete user", USERS))?
            .map(UserEntity::try_from)
            .transpose()
    }

    async fn update_package(
        &self,
        user_id: Uuid,
        change: PackageChange,
    ) -> MongoResult<Option<UserEntity>> {
        let update = match change {
            PackageChange::Reset {
                package,
                team_quota,
                tournament_quota,
            } => doc! {"$set": {
                "package": package.as_str(),
                "team_quota": i64::from(team_quota),
                "tournament_quota": i64::from(tournament_quota),
                "updated_at": DateTime::now()
            }},
            PackageChange::AddSlots {
                package,
                teams,
                tournaments,
            } => doc! {
                "$set": {"package": package.as_str(), "updated_at": DateTime::now()},
                "$inc": {
                    "team_quota": i64::from(teams),
                    "tournament_quota": i64::from(tournaments)
                }
            },
        };

        self.collection::<UserDocument>(USERS)
            .await
            .find_one_and_update(doc_id(user_id), update)
            .return_document(ReturnDocument::After)
            .await
            .map_err(MongoDaoError::query("update package", USERS))?
            .map(UserEntity::try_from)
            .transpose()
    }

    async fn create_team(&self, team: TeamEntity, owner: TeamMemberEntity) -> StorageResult<()> {
        let (mut session, database) = self.start_transaction().await?;
        let owner_id = team.owner_id;
        let slug = team.slug.clone();

        let result: StorageResult<()> = async {
            reserve_slot(&database, &mut session, owner_id, &TEAM_SLOT).await?;

            database
                .collection::<TeamDocument>(TEAMS)
                .insert_one(TeamDocument::from(team))
                .session(&mut session)
                .await
                .map_err(write_error("team", slug.clone(), TEAMS))?;

            let owner_email = owner.email.clone();
            database
                .collection::<MemberDocument>(MEMBERS)
                .insert_one(MemberDocument::from(owner))
                .session(&mut session)
                .await
                .map_err(write_error("team member", owner_email, MEMBERS))?;
            Ok(())
        }
        .await;

        finish_transaction(session, result).await
    }

    async fn create_tournament(&self, tournament: TournamentEntity) -> StorageResult<()> {
        let (mut session, database) = self.start_transaction().await?;
        let owner_id = tournament.owner_id;
        let slug = tournament.slug.clone();

        let result: StorageResult<()> = async {
            reserve_slot(&database, &mut session, owner_id, &TOURNAMENT_SLOT).await?;

            database
                .collection::<TournamentDocument>(TOURNAMENTS)
                .insert_one(TournamentDocument::from(tournament))
                .session(&mut session)
                .await
                .map_err(write_error("tournament", slug, TOURNAMENTS))?;
            Ok(())
        }
        .await;

        finish_transaction(session, result).await
    }

    async fn delete_member(&self, team_id: Uuid, member_id: Uuid) -> MongoResult<bool> {
        let result = self
            .collection::<Document>(MEMBERS)
            .await
            .delete_one(doc! {"_id": member_id.to_string(), "team_id": team_id.to_string()})
            .await
            .map_err(MongoDaoError::query("delete member", MEMBERS))?;
        Ok(result.deleted_count > 0)
    }

    async fn link_orphan_members(
        &self,
        email: String,
        user_id: Uuid,
        display_name: Option<String>,
    ) -> MongoResult<u64> {
        let mut set = doc! {"user_id": user_id.to_string()};
        if let Some(name) = display_name {
            set.insert("display_name", name);
        }

        let result = self
            .collection::<Document>(MEMBERS)
            .await
            .update_many(doc! {"email": email, "user_id": null}, doc! {"$set": set})
            .await
            .map_err(MongoDaoError::query("link members", MEMBERS))?;
        Ok(result.modified_count)
    }

    async fn commit_ledger(&self, commit: LedgerCommit) -> Result<GameEntity, LedgerWriteError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let err = match self.commit_ledger_once(&commit).await {
                Ok(game) => return Ok(game),
                Err(CommitError::Ledger(err)) => return Err(err),
                Err(CommitError::Mongo(err)) => err,
            };

            if !err.is_transient_transaction_error() {
                return Err(StorageError::from(err).into());
            }

            // A concurrent commit on the same game wins the write conflict.
            let current: Option<GameEntity> = self
                .find_one::<GameDocument, _>(GAMES, doc_id(commit.game_id))
                .await
                .map_err(StorageError::from)?;
            let Some(current) = current else {
                return Err(LedgerWriteError::MissingGame(commit.game_id));
            };
            commit.check(current.winner, current.scoring)?;

            if attempt >= MAX_TRANSACTION_ATTEMPTS {
                return Err(StorageError::from(err).into());
            }
            debug!(attempt, game_id = %commit.game_id, "retrying ledger commit after transient error");
        }
    }

    async fn commit_ledger_once(&self, commit: &LedgerCommit) -> Result<GameEntity, CommitError> {
        let (mut session, database) = self.start_transaction().await?;
        let result = apply_commit(&database, &mut session, commit).await;
        finish_transaction(session, result).await
    }
}

async fn apply_commit(
    database: &Database,
    session: &mut ClientSession,
    commit: &LedgerCommit,
) -> Result<GameEntity, CommitError> {
    let games = database.collection::<GameDocument>(GAMES);
    let game: GameEntity = games
        .find_one(doc_id(commit.game_id))
        .session(&mut *session)
        .await
        .map_err(MongoDaoError::query("load game", GAMES))?
        .ok_or(CommitError::Ledger(LedgerWriteError::MissingGame(
            commit.game_id,
        )))?
        .try_into()?;
    commit.check(game.winner, game.scoring)?;

    let player_stats = database.collection::<Document>(PLAYER_STATS);
    for (player, change) in commit.delta.players() {
        player_stats
            .update_one(
                doc! {"_id": player.as_str()},
                doc! {"$inc": {
                    "points": change.points,
                    "wins": change.wins,
                    "losses": change.losses
                }},
            )
            .upsert(true)
            .session(&mut *session)
            .await
            .map_err(MongoDaoError::query("update player stats", PLAYER_STATS))?;
    }

    let pair_stats = database.collection::<Document>(PAIR_STATS);
    for (pair, change) in commit.delta.pairs() {
        pair_stats
            .update_one(
                doc! {"_id": pair_row_id(game.team_id, pair)},
                doc! {
                    "$inc": {"plays": change.plays, "wins": change.wins},
                    "$setOnInsert": {
                        "team_id": game.team_id.to_string(),
                        "player_a": pair.first().as_str(),
                        "player_b": pair.second().as_str()
                    }
                },
            )
            .upsert(true)
            .session(&mut *session)
            .await
            .map_err(MongoDaoError::query("update pair stats", PAIR_STATS))?;
    }

    let guard = doc! {
        "_id": commit.game_id.to_string(),
        "winner": winner_bson(commit.expected_winner),
        "scoring": scoring_bson(commit.expected_scoring),
    };
    let now = SystemTime::now();
    let touched = match commit.transition {
        GameTransition::Delete => {
            games
                .delete_one(guard)
                .session(&mut *session)
                .await
                .map_err(MongoDaoError::query("delete game", GAMES))?
                .deleted_count
        }
        GameTransition::Decide(..) | GameTransition::Undecide => {
            games
                .update_one(
                    guard,
                    doc! {"$set": {
                        "winner": winner_bson(commit.next_winner()),
                        "scoring": scoring_bson(commit.next_scoring()),
                        "updated_at": DateTime::from_system_time(now)
                    }},
                )
                .session(&mut *session)
                .await
                .map_err(MongoDaoError::query("update winner", GAMES))?
                .matched_count
        }
    };
    if touched == 0 {
        return Err(commit.conflict().into());
    }

    Ok(GameEntity {
        winner: commit.next_winner(),
        scoring: commit.next_scoring(),
        updated_at: now,
        ..game
    })
}

impl ClubStore for MongoClubStore {
    fn find_user(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<UserEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_one::<UserDocument, _>(USERS, doc_id(id))
                .await
                .map_err(Into::into)
        })
    }

    fn find_user_by_external_id(
        &self,
        external_id: String,
    ) -> BoxFuture<'static, StorageResult<Option<UserEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_one::<UserDocument, _>(USERS, doc! {"external_id": external_id})
                .await
                .map_err(Into::into)
        })
    }

    fn find_user_by_email(
        &self,
        email: String,
    ) -> BoxFuture<'static, StorageResult<Option<UserEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_one::<UserDocument, _>(USERS, doc! {"email": email})
                .await
                .map_err(Into::into)
        })
    }

    fn save_user(&self, user: UserEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let (id, email) = (user.id, user.email.clone());
            store
                .replace(USERS, id, UserDocument::from(user), "user", email)
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
            store
                .update_user_profile(external_id, name, image)
                .await
                .map_err(Into::into)
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
            store
                .complete_user(user_id, external_id, name, image)
                .await
                .map_err(Into::into)
        })
    }

    fn update_package(
        &self,
        user_id: Uuid,
        change: PackageChange,
    ) -> BoxFuture<'static, StorageResult<Option<UserEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .update_package(user_id, change)
                .await
                .map_err(Into::into)
        })
    }

    fn create_team(
        &self,
        team: TeamEntity,
        owner: TeamMemberEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.create_team(team, owner).await })
    }

    fn find_team(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<TeamEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_one::<TeamDocument, _>(TEAMS, doc_id(id))
                .await
                .map_err(Into::into)
        })
    }

    fn find_team_by_slug(
        &self,
        slug: String,
    ) -> BoxFuture<'static, StorageResult<Option<TeamEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_one::<TeamDocument, _>(TEAMS, doc! {"slug": slug})
                .await
                .map_err(Into::into)
        })
    }

    fn list_members(&self, team_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<TeamMemberEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_many::<MemberDocument, _>(MEMBERS, doc! {"team_id": team_id.to_string()})
                .await
                .map_err(Into::into)
        })
    }

    fn list_all_members(&self) -> BoxFuture<'static, StorageResult<Vec<TeamMemberEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_many::<MemberDocument, _>(MEMBERS, doc! {})
                .await
                .map_err(Into::into)
        })
    }

    fn save_member(&self, member: TeamMemberEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let (id, email) = (member.id, member.email.clone());
            store
                .replace(MEMBERS, id, MemberDocument::from(member), "team member", email)
                .await
        })
    }

    fn delete_member(&self, team_id: Uuid, member_id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .delete_member(team_id, member_id)
                .await
                .map_err(Into::into)
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
            store
                .link_orphan_members(email, user_id, display_name)
                .await
                .map_err(Into::into)
        })
    }

    fn save_session(&self, session: SessionEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let (id, slug) = (session.id, session.slug.clone());
            store
                .replace(SESSIONS, id, SessionDocument::from(session), "session", slug)
                .await
        })
    }

    fn find_session_by_slug(
        &self,
        slug: String,
    ) -> BoxFuture<'static, StorageResult<Option<SessionEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_one::<SessionDocument, _>(SESSIONS, doc! {"slug": slug})
                .await
                .map_err(Into::into)
        })
    }

    fn list_sessions(&self, team_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<SessionEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_many::<SessionDocument, _>(SESSIONS, doc! {"team_id": team_id.to_string()})
                .await
                .map_err(Into::into)
        })
    }

    fn save_game(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let (id, slug) = (game.id, game.slug.clone());
            store
                .replace(GAMES, id, GameDocument::from(game), "game", slug)
                .await
        })
    }

    fn find_game_by_slug(&self, slug: String) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_one::<GameDocument, _>(GAMES, doc! {"slug": slug})
                .await
                .map_err(Into::into)
        })
    }

    fn list_games_by_session(
        &self,
        session_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_many::<GameDocument, _>(GAMES, doc! {"session_id": session_id.to_string()})
                .await
                .map_err(Into::into)
        })
    }

    fn list_games_by_team(&self, team_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_many::<GameDocument, _>(GAMES, doc! {"team_id": team_id.to_string()})
                .await
                .map_err(Into::into)
        })
    }

    fn commit_ledger(
        &self,
        commit: LedgerCommit,
    ) -> BoxFuture<'static, Result<GameEntity, LedgerWriteError>> {
        let store = self.clone();
        Box::pin(async move { store.commit_ledger(commit).await })
    }

    fn create_tournament(
        &self,
        tournament: TournamentEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.create_tournament(tournament).await })
    }

    fn find_tournament_by_slug(
        &self,
        slug: String,
    ) -> BoxFuture<'static, StorageResult<Option<TournamentEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_one::<TournamentDocument, _>(TOURNAMENTS, doc! {"slug": slug})
                .await
                .map_err(Into::into)
        })
    }

    fn list_tournaments(
        &self,
        owner_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<TournamentEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_many::<TournamentDocument, _>(
                    TOURNAMENTS,
                    doc! {"owner_id": owner_id.to_string()},
                )
                .await
                .map_err(Into::into)
        })
    }

    fn find_player_stats(
        &self,
        player: String,
    ) -> BoxFuture<'static, StorageResult<Option<PlayerStatsEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let document = store
                .collection::<PlayerStatsDocument>(PLAYER_STATS)
                .await
                .find_one(doc! {"_id": player})
                .await
                .map_err(MongoDaoError::query("find", PLAYER_STATS))?;
            Ok(document.map(Into::into))
        })
    }

    fn list_pair_stats(&self, team_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<PairStatsEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let documents: Vec<PairStatsDocument> = store
                .collection::<PairStatsDocument>(PAIR_STATS)
                .await
                .find(doc! {"team_id": team_id.to_string()})
                .await
                .map_err(MongoDaoError::query("list", PAIR_STATS))?
                .try_collect()
                .await
                .map_err(MongoDaoError::query("list", PAIR_STATS))?;

            documents
                .into_iter()
                .map(|document| PairStatsEntity::try_from(document).map_err(Into::into))
                .collect()
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}
