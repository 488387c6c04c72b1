use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::{MemberRole, SessionEntity, TeamEntity},
    dto::{
        format_system_time,
        validation::{validate_name, validate_session_date},
    },
};

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateTeamRequest {
    #[validate(custom(function = "validate_name"))]
    pub name: String,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct AddMemberRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 64))]
    pub display_name: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateSessionRequest {
    #[validate(length(min = 1, max = 64))]
    pub name: Option<String>,
    /// Day of play, `YYYY-MM-DD`.
    #[validate(custom(function = "validate_session_date"))]
    pub date: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TeamSummary {
    pub id: Uuid,
    pub slug: String,
    pub name: String,
    pub owner_id: Uuid,
    pub created_at: String,
}

impl From<&TeamEntity> for TeamSummary {
    fn from(team: &TeamEntity) -> Self {
        Self {
            id: team.id,
            slug: team.slug.clone(),
            name: team.name.clone(),
            owner_id: team.owner_id,
            created_at: format_system_time(team.created_at),
        }
    }
}

/// Team member with its resolved display name.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MemberSummary {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
    pub role: MemberRole,
    /// Linked account, absent until the member signs up.
    pub user_id: Option<Uuid>,
}

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SessionSummary {
    pub id: Uuid,
    pub slug: String,
    pub name: Option<String>,
    pub date: String,
    pub created_at: String,
}

impl From<&SessionEntity> for SessionSummary {
    fn from(session: &SessionEntity) -> Self {
        Self {
            id: session.id,
            slug: session.slug.clone(),
            name: session.name.clone(),
            date: session.date.clone(),
            created_at: format_system_time(session.created_at),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TeamOverview {
    pub team: TeamSummary,
    pub members: Vec<MemberSummary>,
    /// Most recent first.
    pub sessions: Vec<SessionSummary>,
}
