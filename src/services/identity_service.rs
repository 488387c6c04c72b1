//! Linking identity-provider principals to account rows.

use std::time::SystemTime;

use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    dao::{
        club_store::ClubStore,
        models::{PackageKind, UserEntity},
    },
    dto::account::{BootstrapResponse, IdentityWebhook, UserProfile, WebhookAck},
    error::ServiceError,
    state::AppState,
    stats::PlayerId,
};

const PROFILE_UPDATED_EVENT: &str = "user.updated";

/// Caller identity forwarded by the upstream identity proxy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    external_id: String,
    email: PlayerId,
    name: Option<String>,
    image: Option<String>,
}

impl Principal {
    /// Build a principal; id and email are required, blank optional fields
    /// count as absent.
    pub fn new(
        external_id: &str,
        email: &str,
        name: Option<&str>,
        image: Option<&str>,
    ) -> Result<Self, ServiceError> {
        let external_id = external_id.trim();
        if external_id.is_empty() {
            return Err(ServiceError::Unauthorized("missing user id".into()));
        }
        let email = PlayerId::parse(email)
            .map_err(|_| ServiceError::Unauthorized("missing user email".into()))?;

        let non_blank = |value: Option<&str>| {
            value
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_owned)
        };

        Ok(Self {
            external_id: external_id.to_owned(),
            email,
            name: non_blank(name),
            image: non_blank(image),
        })
    }

    pub fn external_id(&self) -> &str {
        &self.external_id
    }

    pub fn email(&self) -> &PlayerId {
        &self.email
    }
}

/// Resolve the account of `principal`, linking or creating it on first sight.
///
/// Lookup order: by provider id, then by email (attaching the provider id and
/// filling missing name/image), otherwise a fresh FREE account. Orphan
/// memberships with the same email are relinked in both latter cases.
pub async fn get_or_create_user(
    state: &AppState,
    principal: &Principal,
) -> Result<UserEntity, ServiceError> {
    let store = state.require_store().await?;

    if let Some(user) = store
        .find_user_by_external_id(principal.external_id.clone())
        .await?
    {
        return Ok(user);
    }

    if let Some(existing) = store
        .find_user_by_email(principal.email.to_string())
        .await?
    {
        let user = store
            .complete_user(
                existing.id,
                Some(principal.external_id.clone()),
                principal.name.clone(),
                principal.image.clone(),
            )
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("user `{}` disappeared", existing.id)))?;

        let linked = store
            .link_orphan_members(user.email.clone(), user.id, user.name.clone())
            .await?;
        info!(user_id = %user.id, linked, "linked identity to existing account");
        return Ok(user);
    }

    let user = new_user(state, principal.email.clone(), principal.name.clone());
    let user = UserEntity {
        external_id: Some(principal.external_id.clone()),
        image: principal.image.clone(),
        ..user
    };
    store.save_user(user.clone()).await?;
    let linked = store
        .link_orphan_members(user.email.clone(), user.id, user.name.clone())
        .await?;
    info!(user_id = %user.id, linked, "created account");
    Ok(user)
}

pub async fn current_profile(
    state: &AppState,
    principal: &Principal,
) -> Result<UserProfile, ServiceError> {
    get_or_create_user(state, principal).await.map(Into::into)
}

/// Apply a provider webhook; only profile updates are acted upon.
pub async fn apply_profile_update(
    state: &AppState,
    webhook: IdentityWebhook,
) -> Result<WebhookAck, ServiceError> {
    if webhook.event_type != PROFILE_UPDATED_EVENT {
        debug!(event_type = %webhook.event_type, "ignoring identity webhook");
        return Ok(WebhookAck { updated: 0 });
    }
    let Some(user) = webhook.data else {
        return Ok(WebhookAck { updated: 0 });
    };
    let Some(external_id) = user.id.filter(|id| !id.trim().is_empty()) else {
        return Ok(WebhookAck { updated: 0 });
    };

    let store = state.require_store().await?;
    let updated = store
        .update_user_profile(external_id, user.full_name, user.image_url)
        .await?;
    Ok(WebhookAck { updated })
}

/// Make sure `principal` has an account row, without touching existing data
/// beyond attaching a missing provider id.
pub async fn bootstrap(
    state: &AppState,
    principal: &Principal,
) -> Result<BootstrapResponse, ServiceError> {
    let store = state.require_store().await?;

    if let Some(user) = store
        .find_user_by_external_id(principal.external_id.clone())
        .await?
    {
        return Ok(BootstrapResponse {
            user: user.into(),
            created: false,
            linked: false,
        });
    }

    match store.find_user_by_email(principal.email.to_string()).await? {
        Some(mut user) => {
            let linked = user.external_id.is_none();
            if linked {
                user = store
                    .complete_user(user.id, Some(principal.external_id.clone()), None, None)
                    .await?
                    .unwrap_or(user);
            }
            Ok(BootstrapResponse {
                user: user.into(),
                created: false,
                linked,
            })
        }
        None => {
            let name = principal
                .name
                .clone()
                .unwrap_or_else(|| principal.email.local_part().to_owned());
            let user = UserEntity {
                external_id: Some(principal.external_id.clone()),
                ..new_user(state, principal.email.clone(), Some(name))
            };
            store.save_user(user.clone()).await?;
            Ok(BootstrapResponse {
                user: user.into(),
                created: true,
                linked: true,
            })
        }
    }
}

/// Fresh FREE account with catalog quotas and no provider link.
pub(crate) fn new_user(state: &AppState, email: PlayerId, name: Option<String>) -> UserEntity {
    let quotas = state.config().quotas_for(PackageKind::Free);
    let now = SystemTime::now();
    UserEntity {
        id: Uuid::new_v4(),
        external_id: None,
        email: email.into(),
        name,
        image: None,
        package: PackageKind::Free,
        team_quota: quotas.team_quota,
        tournament_quota: quotas.tournament_quota,
        team_count: 0,
        tournament_count: 0,
        created_at: now,
        updated_at: now,
    }
}

/// Resolve the account behind a principal for owner checks.
pub(crate) async fn require_user(
    state: &AppState,
    principal: &Principal,
) -> Result<(UserEntity, std::sync::Arc<dyn ClubStore>), ServiceError> {
    let user = get_or_create_user(state, principal).await?;
    let store = state.require_store().await?;
    Ok((user, store))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::{
            club_store::memory::MemoryClubStore,
            models::{MemberRole, TeamMemberEntity},
        },
        dto::account::WebhookUser,
        state::SharedState,
    };

    async fn state() -> (SharedState, MemoryClubStore) {
        let state = AppState::new(AppConfig::default(), None);
        let store = MemoryClubStore::new();
        state.install_store(Arc::new(store.clone())).await;
        (state, store)
    }

    fn alice() -> Principal {
        Principal::new("ext-alice", " Alice@X.com ", Some("Alice"), None).unwrap()
    }

    #[test]
    fn principal_requires_id_and_email() {
        assert!(Principal::new("", "a@x.com", None, None).is_err());
        assert!(Principal::new("ext", "  ", None, None).is_err());
        let p = Principal::new("ext", "A@X.com", Some("  "), None).unwrap();
        assert_eq!(p.email().as_str(), "a@x.com");
        assert_eq!(p.name, None);
    }

    #[tokio::test]
    async fn first_sight_creates_a_free_account() {
        let (state, _) = state().await;
        let user = get_or_create_user(&state, &alice()).await.unwrap();
        assert_eq!(user.email, "alice@x.com");
        assert_eq!(user.package, PackageKind::Free);
        assert_eq!((user.team_quota, user.tournament_quota), (1, 1));

        let again = get_or_create_user(&state, &alice()).await.unwrap();
        assert_eq!(again.id, user.id);
    }

    #[tokio::test]
    async fn guest_account_is_linked_and_memberships_relinked() {
        let (state, store) = state().await;
        let guest = new_user(&state, PlayerId::parse("alice@x.com").unwrap(), None);
        store.save_user(guest.clone()).await.unwrap();
        let orphan = TeamMemberEntity {
            id: Uuid::new_v4(),
            team_id: Uuid::new_v4(),
            email: "alice@x.com".into(),
            user_id: None,
            display_name: None,
            role: MemberRole::Member,
            created_at: SystemTime::now(),
        };
        store.save_member(orphan).await.unwrap();

        let user = get_or_create_user(&state, &alice()).await.unwrap();
        assert_eq!(user.id, guest.id);
        assert_eq!(user.external_id.as_deref(), Some("ext-alice"));
        assert_eq!(user.name.as_deref(), Some("Alice"));

        let members = store.list_all_members().await.unwrap();
        assert_eq!(members[0].user_id, Some(guest.id));
        assert_eq!(members[0].display_name.as_deref(), Some("Alice"));
    }

    #[tokio::test]
    async fn webhook_updates_profile_of_linked_account() {
        let (state, store) = state().await;
        let user = get_or_create_user(&state, &alice()).await.unwrap();

        let ack = apply_profile_update(
            &state,
            IdentityWebhook {
                event_type: "user.updated".into(),
                data: Some(WebhookUser {
                    id: Some("ext-alice".into()),
                    full_name: Some("Alice Liddell".into()),
                    image_url: Some("https://img.example/alice.png".into()),
                }),
            },
        )
        .await
        .unwrap();
        assert_eq!(ack.updated, 1);

        let stored = store.find_user(user.id).await.unwrap().unwrap();
        assert_eq!(stored.name.as_deref(), Some("Alice Liddell"));

        let ignored = apply_profile_update(
            &state,
            IdentityWebhook {
                event_type: "user.created".into(),
                data: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(ignored.updated, 0);
    }

    #[tokio::test]
    async fn bootstrap_is_idempotent() {
        let (state, _) = state().await;
        let principal = Principal::new("ext-bob", "bob@x.com", None, None).unwrap();

        let first = bootstrap(&state, &principal).await.unwrap();
        assert!(first.created);
        assert_eq!(first.user.name.as_deref(), Some("bob"));

        let second = bootstrap(&state, &principal).await.unwrap();
        assert!(!second.created && !second.linked);
        assert_eq!(second.user.id, first.user.id);
    }
}
