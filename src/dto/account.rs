use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::{PackageKind, UserEntity},
    dto::format_system_time,
};

/// Account of the calling user.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub image: Option<String>,
    pub package: PackageKind,
    pub team_quota: u32,
    pub tournament_quota: u32,
    pub team_count: u32,
    pub tournament_count: u32,
    pub created_at: String,
}

impl From<UserEntity> for UserProfile {
    fn from(user: UserEntity) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            image: user.image,
            package: user.package,
            team_quota: user.team_quota,
            tournament_quota: user.tournament_quota,
            team_count: user.team_count,
            tournament_count: user.tournament_count,
            created_at: format_system_time(user.created_at),
        }
    }
}

/// Switch to another package; quotas are reset from the catalog.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct UpdatePackageRequest {
    pub package: PackageKind,
}

/// Allowance bumped by an upgrade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UpgradeTarget {
    Team,
    Tournament,
}

/// Move to the package matching `target` and add one to its quota.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct UpgradeRequest {
    pub target: UpgradeTarget,
}

/// Event posted by the identity provider.
#[derive(Debug, Deserialize, ToSchema)]
pub struct IdentityWebhook {
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub data: Option<WebhookUser>,
}

/// User payload of an identity provider event.
#[derive(Debug, Deserialize, ToSchema)]
pub struct WebhookUser {
    pub id: Option<String>,
    pub full_name: Option<String>,
    pub image_url: Option<String>,
}

/// Acknowledgement of a webhook delivery.
#[derive(Debug, Serialize, ToSchema)]
pub struct WebhookAck {
    /// Number of accounts refreshed by the event.
    pub updated: u64,
}

/// Result of the first-login bootstrap.
#[derive(Debug, Serialize, ToSchema)]
pub struct BootstrapResponse {
    pub user: UserProfile,
    /// A new account row was created.
    pub created: bool,
    /// The identity provider id was attached to an existing row.
    pub linked: bool,
}

/// Summary of a member backfill run.
#[derive(Debug, Default, Serialize, ToSchema, PartialEq, Eq)]
pub struct BackfillReport {
    /// Orphan members attached to an account.
    pub linked: u64,
    /// Placeholder accounts created for them.
    pub created_users: u64,
}

/// Summary of a relink-only backfill run.
#[derive(Debug, Default, Serialize, ToSchema, PartialEq, Eq)]
pub struct SafeBackfillReport {
    /// Member emails rewritten in lowercase.
    pub lowercased: u64,
    /// Members attached to an existing account.
    pub relinked: u64,
    /// Members already linked.
    pub skipped: u64,
    /// Members whose email has no account yet.
    pub missing: u64,
}
