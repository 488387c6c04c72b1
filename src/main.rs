//! Shuttle League backend entrypoint wiring REST, SSE and the storage backend.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use shuttle_league_back::{
    config::AppConfig,
    dao::club_store::memory::MemoryClubStore,
    routes,
    state::{AppState, SharedState},
};

const INTERNAL_TOKEN_ENV: &str = "SHUTTLE_INTERNAL_TOKEN";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let internal_token = env::var(INTERNAL_TOKEN_ENV)
        .ok()
        .filter(|token| !token.trim().is_empty());
    if internal_token.is_none() {
        info!("{INTERNAL_TOKEN_ENV} not set; internal endpoints disabled");
    }

    let app_state = AppState::new(config, internal_token);
    start_storage(app_state.clone()).await;

    // Build the HTTP router once the shared state is ready.
    let app = build_router(app_state);

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    let service = app.into_make_service();
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Supervise MongoDB when `MONGO_URI` is configured, otherwise serve from memory.
async fn start_storage(state: SharedState) {
    if let Ok(uri) = env::var("MONGO_URI") {
        if spawn_mongo_supervisor(state.clone(), uri) {
            return;
        }
    }

    warn!("no persistent storage configured; data lives in memory only");
    state
        .install_store(Arc::new(MemoryClubStore::new()))
        .await;
}

#[cfg(feature = "mongo-store")]
fn spawn_mongo_supervisor(state: SharedState, uri: String) -> bool {
    use shuttle_league_back::{
        dao::{
            club_store::{
                ClubStore,
                mongodb::{MongoClubStore, MongoConfig},
            },
            storage::StorageError,
        },
        services::storage_supervisor,
    };

    let db_name = env::var("MONGO_DB").ok();
    info!("MONGO_URI set; supervising MongoDB storage");
    tokio::spawn(storage_supervisor::run(state, move || {
        let uri = uri.clone();
        let db_name = db_name.clone();
        async move {
            let config = MongoConfig::from_uri(&uri, db_name.as_deref()).await?;
            let store = MongoClubStore::connect(config).await?;
            Ok::<_, StorageError>(Arc::new(store) as Arc<dyn ClubStore>)
        }
    }));
    true
}

#[cfg(not(feature = "mongo-store"))]
fn spawn_mongo_supervisor(_state: SharedState, _uri: String) -> bool {
    warn!("MONGO_URI set but the mongo-store feature is disabled");
    false
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut term = signal(SignalKind::terminate()).expect("install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = term.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
