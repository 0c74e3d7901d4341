use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use axum_valid::Valid;
use uuid::Uuid;

use crate::{
    dto::{
        game::{GameSnapshot, GameSummary, PlayerSummary},
        host::CreateGameRequest,
    },
    error::AppError,
    services::{host_service, public_service},
    state::SharedState,
};

/// Game creation and read-only lookups open to everyone.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/games", post(create_game))
        .route("/games/code/{code}", get(find_by_code))
        .route("/games/{id}/scores", get(scoreboard))
        .route("/games/{id}/snapshot", get(snapshot))
}

/// Create a game in the lobby. Requires the master PIN.
#[utoipa::path(
    post,
    path = "/games",
    tag = "game",
    request_body = CreateGameRequest,
    responses(
        (status = 200, description = "Game created", body = GameSummary),
        (status = 401, description = "Invalid PIN")
    )
)]
pub async fn create_game(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<CreateGameRequest>>,
) -> Result<Json<GameSummary>, AppError> {
    Ok(Json(host_service::create_game(&state, payload).await?))
}

/// Resolve a game from its join code (case-insensitive).
#[utoipa::path(
    get,
    path = "/games/code/{code}",
    tag = "game",
    params(("code" = String, Path, description = "Join code in any case")),
    responses(
        (status = 200, description = "Game found", body = GameSummary),
        (status = 404, description = "Game not found")
    )
)]
pub async fn find_by_code(
    State(state): State<SharedState>,
    Path(code): Path<String>,
) -> Result<Json<GameSummary>, AppError> {
    Ok(Json(public_service::find_by_code(&state, &code).await?))
}

/// Leaderboard of a game, best score first.
#[utoipa::path(
    get,
    path = "/games/{id}/scores",
    tag = "game",
    params(("id" = String, Path, description = "Identifier of the game")),
    responses((status = 200, description = "Players by score", body = [PlayerSummary]))
)]
pub async fn scoreboard(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<PlayerSummary>>, AppError> {
    Ok(Json(public_service::scoreboard(&state, id).await?))
}

#[utoipa::path(
    get,
    path = "/games/{id}/snapshot",
    tag = "game",
    params(("id" = String, Path, description = "Identifier of the game")),
    responses((status = 200, description = "Authoritative game snapshot", body = GameSnapshot))
)]
pub async fn snapshot(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<GameSnapshot>, AppError> {
    Ok(Json(public_service::snapshot(&state, id).await?))
}
