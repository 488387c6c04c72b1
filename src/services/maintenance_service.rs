//! One-off repairs of member-to-account links, reachable through the
//! internal endpoints only.

use tracing::{info, warn};

use crate::{
    dao::{club_store::ClubStore, models::UserEntity, storage::StorageError},
    dto::account::{BackfillReport, SafeBackfillReport},
    error::ServiceError,
    services::identity_service::new_user,
    state::AppState,
    stats::PlayerId,
};

/// Link every orphan member to an account, creating placeholder accounts
/// for emails nobody signed up with yet.
pub async fn backfill_members(state: &AppState) -> Result<BackfillReport, ServiceError> {
    let store = state.require_store().await?;
    let mut report = BackfillReport::default();

    for mut member in store.list_all_members().await? {
        if member.user_id.is_some() {
            continue;
        }
        let Ok(email) = PlayerId::parse(&member.email) else {
            warn!(member_id = %member.id, "member without email left untouched");
            continue;
        };

        let user = match store.find_user_by_email(email.to_string()).await? {
            Some(user) => user,
            None => {
                let name = member
                    .display_name
                    .clone()
                    .unwrap_or_else(|| email.local_part().to_owned());
                let user = new_user(state, email.clone(), Some(name));
                store.save_user(user.clone()).await?;
                report.created_users += 1;
                user
            }
        };

        member.user_id = Some(user.id);
        store.save_member(member).await?;
        report.linked += 1;
    }

    info!(
        linked = report.linked,
        created_users = report.created_users,
        "member backfill finished"
    );
    Ok(report)
}

/// Normalize member emails and repair links to existing accounts. Never
/// creates accounts.
pub async fn safe_relink(state: &AppState) -> Result<SafeBackfillReport, ServiceError> {
    let store = state.require_store().await?;
    let mut report = SafeBackfillReport::default();

    for mut member in store.list_all_members().await? {
        let Ok(email) = PlayerId::parse(&member.email) else {
            report.skipped += 1;
            continue;
        };
        let mut changed = false;

        if member.email != email.as_str() {
            member.email = email.to_string();
            changed = true;
            report.lowercased += 1;
        }

        let linked = linked_user(store.as_ref(), member.user_id).await?;
        match (linked, store.find_user_by_email(email.to_string()).await?) {
            (Some(current), _) if current.email == email.as_str() => {
                if !changed {
                    report.skipped += 1;
                }
            }
            (_, Some(user)) => {
                member.user_id = Some(user.id);
                if member.display_name.is_none() {
                    let name = user
                        .name
                        .clone()
                        .unwrap_or_else(|| email.local_part().to_owned());
                    member.display_name = Some(name);
                }
                changed = true;
                report.relinked += 1;
            }
            (_, None) => report.missing += 1,
        }

        if changed {
            match store.save_member(member.clone()).await {
                Ok(()) => {}
                Err(StorageError::Duplicate { .. }) => {
                    warn!(
                        member_id = %member.id,
                        email = %member.email,
                        "normalized member collides with an existing membership"
                    );
                    report.skipped += 1;
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    info!(
        lowercased = report.lowercased,
        relinked = report.relinked,
        skipped = report.skipped,
        missing = report.missing,
        "safe relink finished"
    );
    Ok(report)
}

async fn linked_user(
    store: &dyn ClubStore,
    user_id: Option<uuid::Uuid>,
) -> Result<Option<UserEntity>, ServiceError> {
    match user_id {
        Some(id) => Ok(store.find_user(id).await?),
        None => Ok(None),
    }
}
