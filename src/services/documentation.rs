use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Shuttle League Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::account::me,
        crate::routes::account::update_package,
        crate::routes::account::upgrade_package,
        crate::routes::account::identity_webhook,
        crate::routes::teams::create_team,
        crate::routes::teams::team_overview,
        crate::routes::teams::add_member,
        crate::routes::teams::remove_member,
        crate::routes::teams::create_session,
        crate::routes::teams::team_leaderboard,
        crate::routes::teams::team_pairs,
        crate::routes::sessions::list_session_games,
        crate::routes::sessions::create_game,
        crate::routes::sessions::session_leaderboard,
        crate::routes::games::set_winner,
        crate::routes::games::clear_winner,
        crate::routes::games::delete_game,
        crate::routes::players::player_stats,
        crate::routes::tournaments::create_tournament,
        crate::routes::tournaments::list_tournaments,
        crate::routes::internal::bootstrap,
        crate::routes::internal::backfill,
        crate::routes::internal::safe_backfill,
        crate::routes::sse::activity_stream,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::account::UserProfile,
            crate::dto::account::UpdatePackageRequest,
            crate::dto::account::UpgradeTarget,
            crate::dto::account::UpgradeRequest,
            crate::dto::account::IdentityWebhook,
            crate::dto::account::WebhookUser,
            crate::dto::account::WebhookAck,
            crate::dto::account::BootstrapResponse,
            crate::dto::account::BackfillReport,
            crate::dto::account::SafeBackfillReport,
            crate::dto::team::CreateTeamRequest,
            crate::dto::team::AddMemberRequest,
            crate::dto::team::CreateSessionRequest,
            crate::dto::team::TeamSummary,
            crate::dto::team::MemberSummary,
            crate::dto::team::SessionSummary,
            crate::dto::team::TeamOverview,
            crate::dto::game::CreateGameRequest,
            crate::dto::game::SetWinnerRequest,
            crate::dto::game::GameFormat,
            crate::dto::game::GameSummary,
            crate::dto::tournament::CreateTournamentRequest,
            crate::dto::tournament::TournamentSummary,
            crate::dto::stats::LeaderboardRow,
            crate::dto::stats::LeaderboardResponse,
            crate::dto::stats::PairRow,
            crate::dto::stats::TeamPairsResponse,
            crate::dto::stats::PlayerStatsResponse,
            crate::dto::sse::Handshake,
            crate::dto::sse::SystemStatus,
            crate::dto::sse::GameActivityEvent,
            crate::dto::sse::GameDeletedEvent,
            crate::dto::sse::TeamCreatedEvent,
            crate::dto::sse::SessionCreatedEvent,
            crate::dao::models::PackageKind,
            crate::dao::models::MemberRole,
            crate::stats::Side,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "account", description = "Caller account, packages and identity webhook"),
        (name = "teams", description = "Teams, members and sessions"),
        (name = "games", description = "Games and recorded winners"),
        (name = "stats", description = "Leaderboards and counters"),
        (name = "tournaments", description = "Tournament management"),
        (name = "internal", description = "Maintenance endpoints guarded by the internal token"),
        (name = "sse", description = "Server-sent events streams"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documents_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/healthcheck",
            "/me",
            "/teams/{slug}/members/{member_id}",
            "/sessions/{slug}/games",
            "/games/{slug}/winner",
            "/players/{email}/stats",
            "/internal/safe-backfill",
            "/sse/activity",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
