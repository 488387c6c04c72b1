mod sse;

use std::sync::Arc;

use tokio::sync::{RwLock, watch};

use crate::{
    config::AppConfig, dao::club_store::ClubStore, error::ServiceError,
    services::activity_events,
};

pub use self::sse::SseHub;

pub type SharedState = Arc<AppState>;

/// Capacity of the activity broadcast channel.
const ACTIVITY_CAPACITY: usize = 64;

/// Central application state storing the storage handle, configuration and
/// the activity stream.
pub struct AppState {
    store: RwLock<Option<Arc<dyn ClubStore>>>,
    activity: SseHub,
    degraded: watch::Sender<bool>,
    config: AppConfig,
    internal_token: Option<String>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    /// Internal maintenance endpoints stay disabled when `internal_token` is `None`.
    pub fn new(config: AppConfig, internal_token: Option<String>) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new(Self {
            store: RwLock::new(None),
            activity: SseHub::new(ACTIVITY_CAPACITY),
            degraded: degraded_tx,
            config,
            internal_token,
        })
    }

    /// Obtain a handle to the current store, if one is installed.
    pub async fn store(&self) -> Option<Arc<dyn ClubStore>> {
        let guard = self.store.read().await;
        guard.as_ref().cloned()
    }

    /// Current store, or [`ServiceError::Degraded`] while storage is unavailable.
    pub async fn require_store(&self) -> Result<Arc<dyn ClubStore>, ServiceError> {
        if self.is_degraded() {
            return Err(ServiceError::Degraded);
        }
        self.store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a new store implementation and leave degraded mode.
    pub async fn install_store(&self, store: Arc<dyn ClubStore>) {
        {
            let mut guard = self.store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false);
    }

    /// Remove the current store and enter degraded mode.
    pub async fn clear_store(&self) {
        {
            let mut guard = self.store.write().await;
            guard.take();
        }
        self.update_degraded(true);
    }

    /// Current degraded flag.
    pub fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Update the degraded flag, notifying watchers and the activity stream
    /// when the value changes.
    pub fn update_degraded(&self, value: bool) {
        let changed = self.degraded.send_if_modified(|current| {
            if *current == value {
                return false;
            }
            *current = value;
            true
        });

        if changed {
            activity_events::broadcast_system_status(self, value);
        }
    }

    /// Broadcast hub used for the activity SSE stream.
    pub fn activity(&self) -> &SseHub {
        &self.activity
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Token expected in the `x-internal-token` header, if maintenance is enabled.
    pub fn internal_token(&self) -> Option<&str> {
        self.internal_token.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::club_store::memory::MemoryClubStore;

    #[tokio::test]
    async fn starts_degraded_until_a_store_is_installed() {
        let state = AppState::new(AppConfig::default(), None);
        assert!(state.is_degraded());
        assert!(matches!(
            state.require_store().await,
            Err(ServiceError::Degraded)
        ));

        state.install_store(Arc::new(MemoryClubStore::new())).await;
        assert!(!state.is_degraded());
        assert!(state.require_store().await.is_ok());
    }

    #[tokio::test]
    async fn flipping_degraded_mode_is_announced_once() {
        let state = AppState::new(AppConfig::default(), None);
        let mut activity = state.activity().subscribe();

        state.install_store(Arc::new(MemoryClubStore::new())).await;
        state.update_degraded(false);
        state.clear_store().await;

        let first = activity.recv().await.unwrap();
        assert_eq!(first.event.as_deref(), Some("system.status"));
        assert_eq!(first.data, r#"{"degraded":false}"#);
        let second = activity.recv().await.unwrap();
        assert_eq!(second.data, r#"{"degraded":true}"#);
        assert!(activity.try_recv().is_err());
    }
}
