use axum::{extract::FromRequestParts, http::request::Parts};

use crate::{error::AppError, services::identity_service::Principal};

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_EMAIL_HEADER: &str = "x-user-email";
pub const USER_NAME_HEADER: &str = "x-user-name";
pub const USER_AVATAR_HEADER: &str = "x-user-avatar";

/// Identity headers forwarded by the upstream identity proxy.
impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|value| value.to_str().ok())
        };

        let external_id = header(USER_ID_HEADER).ok_or_else(|| {
            AppError::Unauthorized(format!("missing identity header `{USER_ID_HEADER}`"))
        })?;
        let email = header(USER_EMAIL_HEADER).ok_or_else(|| {
            AppError::Unauthorized(format!("missing identity header `{USER_EMAIL_HEADER}`"))
        })?;

        Ok(Principal::new(
            external_id,
            email,
            header(USER_NAME_HEADER),
            header(USER_AVATAR_HEADER),
        )?)
    }
}
