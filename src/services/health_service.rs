use tracing::warn;

use crate::{dto::health::HealthResponse, state::AppState};

/// Probe the installed store and report whether the backend is serving.
pub async fn health_status(state: &AppState) -> HealthResponse {
    match state.require_store().await {
        Ok(store) => {
            if let Err(err) = store.health_check().await {
                warn!(error = %err, "storage health check failed");
                return HealthResponse::new(false);
            }
        }
        Err(_) => warn!("storage unavailable (degraded mode)"),
    }

    HealthResponse::new(!state.is_degraded())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{config::AppConfig, dao::club_store::memory::MemoryClubStore};

    #[tokio::test]
    async fn reports_degraded_without_store() {
        let state = AppState::new(AppConfig::default(), None);
        let health = health_status(&state).await;
        assert_eq!(health.status, "degraded");
        assert!(!health.storage);

        state.install_store(Arc::new(MemoryClubStore::new())).await;
        let health = health_status(&state).await;
        assert_eq!(health.status, "ok");
        assert!(health.storage);
    }
}
