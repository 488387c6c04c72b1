use serde::Serialize;
use utoipa::ToSchema;

/// Payload of the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// "ok" or "degraded".
    pub status: &'static str,
    /// Whether a storage backend is currently installed and answering.
    pub storage: bool,
}

impl HealthResponse {
    pub fn new(storage_healthy: bool) -> Self {
        Self {
            status: if storage_healthy { "ok" } else { "degraded" },
            storage: storage_healthy,
        }
    }
}
