use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use axum_valid::Valid;
use uuid::Uuid;

use crate::{
    dto::{
        game::AnswerSummary,
        player::{JoinRequest, JoinResponse, PlayerGameView, SubmitAnswerRequest},
    },
    error::AppError,
    services::player_service,
    state::SharedState,
};

/// Player endpoints. A player is identified by the id returned on join.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/join", post(join))
        .route("/players/{id}/answers", post(submit_answer))
        .route("/players/{id}/answers/{question_id}", get(own_answer))
        .route("/players/{id}/view", get(player_view))
}

/// Join a game in the lobby with its code.
#[utoipa::path(
    post,
    path = "/join",
    tag = "player",
    request_body = JoinRequest,
    responses(
        (status = 200, description = "Player created", body = JoinResponse),
        (status = 404, description = "Game not found"),
        (status = 409, description = "Game already started")
    )
)]
pub async fn join(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<JoinRequest>>,
) -> Result<Json<JoinResponse>, AppError> {
    Ok(Json(player_service::join(&state, payload).await?))
}

/// Submit or replace the player's answer to a question.
#[utoipa::path(
    post,
    path = "/players/{id}/answers",
    tag = "player",
    params(("id" = String, Path, description = "Identifier of the player")),
    request_body = SubmitAnswerRequest,
    responses((status = 200, description = "Answer stored", body = AnswerSummary))
)]
pub async fn submit_answer(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Valid(Json(payload)): Valid<Json<SubmitAnswerRequest>>,
) -> Result<Json<AnswerSummary>, AppError> {
    Ok(Json(player_service::submit_answer(&state, id, payload).await?))
}

#[utoipa::path(
    get,
    path = "/players/{id}/answers/{question_id}",
    tag = "player",
    params(
        ("id" = String, Path, description = "Identifier of the player"),
        ("question_id" = String, Path, description = "Identifier of the question")
    ),
    responses((status = 200, description = "The player's answer or null", body = Option<AnswerSummary>))
)]
pub async fn own_answer(
    State(state): State<SharedState>,
    Path((id, question_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Option<AnswerSummary>>, AppError> {
    Ok(Json(
        player_service::own_answer(&state, id, question_id).await?,
    ))
}

/// Current question, own answer and leaderboard for a player's screen.
#[utoipa::path(
    get,
    path = "/players/{id}/view",
    tag = "player",
    params(("id" = String, Path, description = "Identifier of the player")),
    responses((status = 200, description = "Player view", body = PlayerGameView))
)]
pub async fn player_view(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PlayerGameView>, AppError> {
    Ok(Json(player_service::player_view(&state, id).await?))
}
