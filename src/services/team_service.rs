use std::{sync::Arc, time::SystemTime};

use futures::future::try_join_all;
use tracing::info;
use uuid::Uuid;

use crate::{
    dao::{
        club_store::ClubStore,
        models::{MemberRole, SessionEntity, TeamEntity, TeamMemberEntity, UserEntity},
    },
    dto::{
        team::{MemberSummary, SessionSummary, TeamOverview, TeamSummary},
        validation::{MIN_NAME_LEN, parse_session_date},
    },
    error::ServiceError,
    services::{
        activity_events,
        identity_service::{Principal, require_user},
        package_service,
        slug::{slugify, unique_slug},
    },
    state::AppState,
    stats::PlayerId,
};

/// Load a team by slug or report it missing.
pub(crate) async fn load_team(store: &dyn ClubStore, slug: &str) -> Result<TeamEntity, ServiceError> {
    store
        .find_team_by_slug(slug.to_owned())
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("team `{slug}`")))
}

/// Reject callers that do not own `team`.
pub(crate) fn ensure_owner(user: &UserEntity, team: &TeamEntity) -> Result<(), ServiceError> {
    if team.owner_id != user.id {
        return Err(ServiceError::Forbidden(format!(
            "only the owner can manage team `{}`",
            team.slug
        )));
    }
    Ok(())
}

/// Load the team owned by the caller, with the store handle used for it.
pub(crate) async fn owned_team(
    state: &AppState,
    principal: &Principal,
    slug: &str,
) -> Result<(TeamEntity, Arc<dyn ClubStore>), ServiceError> {
    let (user, store) = require_user(state, principal).await?;
    let team = load_team(store.as_ref(), slug).await?;
    ensure_owner(&user, &team)?;
    Ok((team, store))
}

/// Open a team owned by the caller; the owner becomes its first member.
pub async fn create_team(
    state: &AppState,
    principal: &Principal,
    name: &str,
) -> Result<TeamSummary, ServiceError> {
    let name = name.trim();
    if name.chars().count() < MIN_NAME_LEN {
        return Err(ServiceError::InvalidInput(format!(
            "team name must be at least {MIN_NAME_LEN} characters long"
        )));
    }
    let slug = slugify(name);
    if slug.is_empty() {
        return Err(ServiceError::InvalidInput(
            "team name must contain letters or digits".into(),
        ));
    }

    let (user, store) = require_user(state, principal).await?;
    package_service::can_create_team(&user)?;

    let now = SystemTime::now();
    let team = TeamEntity {
        id: Uuid::new_v4(),
        slug,
        name: name.to_owned(),
        owner_id: user.id,
        created_at: now,
    };
    let owner = TeamMemberEntity {
        id: Uuid::new_v4(),
        team_id: team.id,
        email: user.email.clone(),
        user_id: Some(user.id),
        display_name: user.name.clone(),
        role: MemberRole::Owner,
        created_at: now,
    };
    store.create_team(team.clone(), owner).await?;

    info!(team = %team.slug, owner_id = %user.id, "team created");
    let summary = TeamSummary::from(&team);
    activity_events::broadcast_team_created(state, summary.clone());
    Ok(summary)
}

/// Add a player to the roster of an owned team.
pub async fn add_member(
    state: &AppState,
    principal: &Principal,
    team_slug: &str,
    email: &str,
    display_name: Option<String>,
) -> Result<MemberSummary, ServiceError> {
    let email = PlayerId::parse(email)
        .map_err(|err| ServiceError::InvalidInput(err.to_string()))?;
    let display_name = display_name
        .map(|name| name.trim().to_owned())
        .filter(|name| !name.is_empty());
    let (team, store) = owned_team(state, principal, team_slug).await?;

    let linked = store.find_user_by_email(email.to_string()).await?;
    if let Some(user) = &linked {
        if user.name.is_none() && display_name.is_some() {
            store
                .complete_user(user.id, None, display_name.clone(), None)
                .await?;
        }
    }

    let member = TeamMemberEntity {
        id: Uuid::new_v4(),
        team_id: team.id,
        email: email.to_string(),
        user_id: linked.as_ref().map(|user| user.id),
        display_name,
        role: MemberRole::Member,
        created_at: SystemTime::now(),
    };
    store.save_member(member.clone()).await?;

    info!(team = %team.slug, member = %member.email, "member added");
    let linked_name = linked.and_then(|user| user.name);
    Ok(member_summary(&member, linked_name))
}

/// Remove a member; the owner's own membership stays.
pub async fn remove_member(
    state: &AppState,
    principal: &Principal,
    team_slug: &str,
    member_id: Uuid,
) -> Result<(), ServiceError> {
    let (team, store) = owned_team(state, principal, team_slug).await?;

    let members = store.list_members(team.id).await?;
    let member = members
        .iter()
        .find(|member| member.id == member_id)
        .ok_or_else(|| ServiceError::NotFound(format!("member `{member_id}`")))?;
    if member.role == MemberRole::Owner {
        return Err(ServiceError::InvalidState(
            "the team owner cannot be removed".into(),
        ));
    }

    store.delete_member(team.id, member_id).await?;
    info!(team = %team.slug, member = %member.email, "member removed");
    Ok(())
}

/// Schedule a play session for an owned team.
pub async fn create_session(
    state: &AppState,
    principal: &Principal,
    team_slug: &str,
    name: Option<String>,
    date: &str,
) -> Result<SessionSummary, ServiceError> {
    let date = date.trim();
    parse_session_date(date).map_err(|err| {
        ServiceError::InvalidInput(
            err.message
                .map(|m| m.to_string())
                .unwrap_or_else(|| "invalid session date".into()),
        )
    })?;
    let name = name
        .map(|name| name.trim().to_owned())
        .filter(|name| !name.is_empty());
    let (team, store) = owned_team(state, principal, team_slug).await?;

    let base = match &name {
        Some(name) => format!("{}-{date}-{name}", team.slug),
        None => format!("{}-{date}", team.slug),
    };
    let session = SessionEntity {
        id: Uuid::new_v4(),
        slug: unique_slug(&base),
        team_id: team.id,
        name,
        date: date.to_owned(),
        created_at: SystemTime::now(),
    };
    store.save_session(session.clone()).await?;

    info!(team = %team.slug, session = %session.slug, "session created");
    let summary = SessionSummary::from(&session);
    activity_events::broadcast_session_created(state, &team.slug, summary.clone());
    Ok(summary)
}

/// Team card with its roster and sessions.
pub async fn team_overview(state: &AppState, team_slug: &str) -> Result<TeamOverview, ServiceError> {
    let store = state.require_store().await?;
    let team = load_team(store.as_ref(), team_slug).await?;

    let members = store.list_members(team.id).await?;
    let sessions = store.list_sessions(team.id).await?;
    let members = resolve_member_names(store.as_ref(), &members).await?;

    Ok(TeamOverview {
        team: TeamSummary::from(&team),
        members,
        sessions: sessions.iter().map(SessionSummary::from).collect(),
    })
}

/// Summaries of `members`, named after their linked account when it has a name.
pub(crate) async fn resolve_member_names(
    store: &dyn ClubStore,
    members: &[TeamMemberEntity],
) -> Result<Vec<MemberSummary>, ServiceError> {
    let lookups = members.iter().map(|member| async move {
        let linked_name = match member.user_id {
            Some(user_id) => store.find_user(user_id).await?.and_then(|user| user.name),
            None => None,
        };
        Ok::<_, ServiceError>(member_summary(member, linked_name))
    });
    try_join_all(lookups).await
}

fn member_summary(member: &TeamMemberEntity, linked_name: Option<String>) -> MemberSummary {
    let display_name = linked_name
        .or_else(|| member.display_name.clone())
        .or_else(|| {
            PlayerId::parse(&member.email)
                .ok()
                .map(|email| email.local_part().to_owned())
        })
        .unwrap_or_else(|| member.email.clone());
    MemberSummary {
        id: member.id,
        email: member.email.clone(),
        display_name,
        role: member.role,
        user_id: member.user_id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::AppConfig, dao::club_store::memory::MemoryClubStore,
        dao::models::PackageKind, services::package_service::update_package,
        state::SharedState,
    };

    async fn setup() -> (SharedState, Principal) {
        let state = AppState::new(AppConfig::default(), None);
        state.install_store(Arc::new(MemoryClubStore::new())).await;
        let owner = Principal::new("ext-owner", "owner@x.com", Some("Olive"), None).unwrap();
        update_package(&state, &owner, PackageKind::TeamPackage)
            .await
            .unwrap();
        (state, owner)
    }

    #[tokio::test]
    async fn free_users_cannot_open_teams() {
        let state = AppState::new(AppConfig::default(), None);
        state.install_store(Arc::new(MemoryClubStore::new())).await;
        let free = Principal::new("ext-free", "free@x.com", None, None).unwrap();

        let err = create_team(&state, &free, "Smash Club").await.unwrap_err();
        assert!(matches!(err, ServiceError::QuotaExceeded(_)));
    }

    #[tokio::test]
    async fn owner_is_first_member_and_counted() {
        let (state, owner) = setup().await;
        let team = create_team(&state, &owner, "  Smash Club ").await.unwrap();
        assert_eq!(team.slug, "smash-club");

        let overview = team_overview(&state, "smash-club").await.unwrap();
        assert_eq!(overview.members.len(), 1);
        assert_eq!(overview.members[0].role, MemberRole::Owner);
        assert_eq!(overview.members[0].display_name, "Olive");

        let store = state.require_store().await.unwrap();
        let user = store
            .find_user_by_external_id("ext-owner".into())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user.team_count, 1);

        let err = create_team(&state, &owner, "smash club").await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
    }

    #[tokio::test]
    async fn racing_creations_cannot_exceed_the_quota() {
        let (state, owner) = setup().await;
        create_team(&state, &owner, "First Club").await.unwrap();
        create_team(&state, &owner, "Second Club").await.unwrap();

        let (third, fourth) = tokio::join!(
            create_team(&state, &owner, "Third Club"),
            create_team(&state, &owner, "Fourth Club"),
        );
        let results = [third, fourth];
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(
            results
                .iter()
                .any(|r| matches!(r, Err(ServiceError::QuotaExceeded(_))))
        );

        let (user, _) = require_user(&state, &owner).await.unwrap();
        assert_eq!(user.team_count, 3);
    }

    #[tokio::test]
    async fn short_names_are_rejected() {
        let (state, owner) = setup().await;
        let err = create_team(&state, &owner, " ab ").await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn accented_names_keep_their_letters_in_the_slug() {
        let (state, owner) = setup().await;
        let team = create_team(&state, &owner, "Équipe Œuvre").await.unwrap();
        assert_eq!(team.slug, "equipe-oeuvre");

        let team = create_team(&state, &owner, "Москва").await.unwrap();
        assert_eq!(team.slug, "moskva");
    }

    #[tokio::test]
    async fn members_are_unique_and_owner_stays() {
        let (state, owner) = setup().await;
        create_team(&state, &owner, "Smash Club").await.unwrap();

        let bob = add_member(&state, &owner, "smash-club", " Bob@X.com ", None)
            .await
            .unwrap();
        assert_eq!(bob.email, "bob@x.com");
        assert_eq!(bob.display_name, "bob");

        let err = add_member(&state, &owner, "smash-club", "bob@x.com", None)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));

        let overview = team_overview(&state, "smash-club").await.unwrap();
        let owner_row = overview
            .members
            .iter()
            .find(|m| m.role == MemberRole::Owner)
            .unwrap();
        let err = remove_member(&state, &owner, "smash-club", owner_row.id)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));

        remove_member(&state, &owner, "smash-club", bob.id).await.unwrap();
        assert_eq!(team_overview(&state, "smash-club").await.unwrap().members.len(), 1);
    }

    #[tokio::test]
    async fn strangers_cannot_manage_the_team() {
        let (state, owner) = setup().await;
        create_team(&state, &owner, "Smash Club").await.unwrap();
        let stranger = Principal::new("ext-eve", "eve@x.com", None, None).unwrap();

        let err = add_member(&state, &stranger, "smash-club", "eve@x.com", None)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));
    }

    #[tokio::test]
    async fn session_slug_carries_team_date_and_name() {
        let (state, owner) = setup().await;
        create_team(&state, &owner, "Smash Club").await.unwrap();

        let session = create_session(
            &state,
            &owner,
            "smash-club",
            Some("Friday Night".into()),
            "2025-03-14",
        )
        .await
        .unwrap();
        assert!(session.slug.starts_with("smash-club-2025-03-14-friday-night-"));

        let err = create_session(&state, &owner, "smash-club", None, "2025-02-30")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }
}
