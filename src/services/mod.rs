/// Master and host secret checks.
pub mod auth;
/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Game creation, question management and grading.
pub mod host_service;
/// Join code generation and normalisation.
pub mod join_code;
/// Lifecycle commands driven by the host.
pub mod lifecycle_service;
/// Joining, answering and the player view.
pub mod player_service;
/// Read-only lookups and snapshots.
pub mod public_service;
/// Score reconciliation.
pub mod scoring;
/// Server-Sent Events streaming.
pub mod sse_service;
/// Storage connection supervisor with backoff.
pub mod storage_supervisor;
/// Push plus poll game watchers.
pub mod watch_service;
