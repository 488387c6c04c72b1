/// Activity stream event builders.
pub mod activity_events;
/// OpenAPI documentation generation.
pub mod documentation;
/// Game lifecycle: creation, winners and deletion.
pub mod game_service;
/// Health check service.
pub mod health_service;
/// Identity proxy principals and account linking.
pub mod identity_service;
/// Atomic reconciliation of counters with game outcomes.
pub mod ledger_service;
/// Member link repairs for the internal endpoints.
pub mod maintenance_service;
/// Package catalog, upgrades and quota gates.
pub mod package_service;
/// Slug generation.
pub mod slug;
/// Server-Sent Events streaming service.
pub mod sse_service;
/// Leaderboards and counters views.
pub mod stats_service;
/// Storage connection supervisor with reconnection backoff.
pub mod storage_supervisor;
/// Teams, members and sessions.
pub mod team_service;
/// Tournament creation and listing.
pub mod tournament_service;
