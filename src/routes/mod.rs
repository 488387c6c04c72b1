use axum::Router;

use crate::state::SharedState;

pub mod account;
pub mod docs;
pub mod games;
pub mod health;
pub mod internal;
pub mod players;
pub mod principal;
pub mod sessions;
pub mod sse;
pub mod teams;
pub mod tournaments;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router()
        .merge(account::router())
        .merge(teams::router())
        .merge(sessions::router())
        .merge(games::router())
        .merge(players::router())
        .merge(tournaments::router())
        .merge(internal::router(state.clone()))
        .merge(sse::router());

    let docs_router = docs::router(state.clone());

    api_router.merge(docs_router).with_state(state)
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode},
    };
    use serde_json::{Value, json};
    use std::sync::Arc;
    use tower::ServiceExt;

    use super::*;
    use crate::{config::AppConfig, dao::club_store::memory::MemoryClubStore, state::AppState};

    async fn app(internal_token: Option<&str>) -> Router<()> {
        let state = AppState::new(AppConfig::default(), internal_token.map(str::to_owned));
        state.install_store(Arc::new(MemoryClubStore::new())).await;
        router(state)
    }

    fn request(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("x-user-id", "ext-owner")
            .header("x-user-email", "owner@x.com")
            .header("x-internal-token", "s3cret");
        match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn send(app: &Router<()>, req: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    #[tokio::test]
    async fn healthcheck_reports_ok() {
        let app = app(None).await;
        let req = Request::get("/healthcheck").body(Body::empty()).unwrap();
        let (status, body) = send(&app, req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn identity_headers_are_required() {
        let app = app(None).await;
        let req = Request::get("/me").body(Body::empty()).unwrap();
        let (status, body) = send(&app, req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body["message"].as_str().unwrap().contains("x-user-id"));
    }

    #[tokio::test]
    async fn singles_game_through_http() {
        let app = app(None).await;

        let (status, _) = send(
            &app,
            request("POST", "/me/package", Some(json!({ "package": "TEAM_PACKAGE" }))),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, team) = send(
            &app,
            request("POST", "/teams", Some(json!({ "name": "Smash Club" }))),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(team["slug"], "smash-club");

        let (status, session) = send(
            &app,
            request(
                "POST",
                "/teams/smash-club/sessions",
                Some(json!({ "date": "2025-03-14" })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let session = session["slug"].as_str().unwrap().to_owned();

        let (status, _) = send(
            &app,
            request(
                "POST",
                &format!("/sessions/{session}/games"),
                Some(json!({ "side_a": ["alice@x.com"], "side_b": ["bob@x.com", "carol@x.com"] })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, game) = send(
            &app,
            request(
                "POST",
                &format!("/sessions/{session}/games"),
                Some(json!({ "side_a": ["alice@x.com"], "side_b": ["bob@x.com"] })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let game = game["slug"].as_str().unwrap().to_owned();

        let winner = || Some(json!({ "winner": "A" }));
        let (status, decided) =
            send(&app, request("POST", &format!("/games/{game}/winner"), winner())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(decided["winner"], "A");

        let (status, _) =
            send(&app, request("POST", &format!("/games/{game}/winner"), winner())).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, stats) =
            send(&app, request("GET", "/players/alice@x.com/stats", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(stats["wins"], 1);
        assert_eq!(stats["points"], 10);
    }

    #[tokio::test]
    async fn internal_routes_require_the_token() {
        let guarded = app(Some("s3cret")).await;
        let (status, report) = send(&guarded, request("POST", "/internal/backfill", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(report["linked"], 0);

        let req = Request::post("/internal/backfill")
            .header("x-internal-token", "wrong")
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(&guarded, req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let disabled = app(None).await;
        let (status, _) = send(&disabled, request("POST", "/internal/backfill", None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
