use std::collections::HashMap;

use axum::{
    Json, Router,
    body::Body,
    extract::{Path, Query, State},
    http::{Request, StatusCode},
    middleware::{self, Next},
    response::Response,
    routing::{delete, get, post},
};
use axum_valid::Valid;
use uuid::Uuid;

use crate::{
    dto::{
        game::{GameSummary, QuestionSummary},
        host::{AddQuestionRequest, GradeAnswerRequest, HostGameView, NukeQuery},
    },
    error::AppError,
    services::{host_service, lifecycle_service},
    state::SharedState,
};

const HOST_PIN_HEADER: &str = "x-host-pin";

/// Host-only endpoints guarded by the per-game host PIN.
pub fn router(state: SharedState) -> Router<SharedState> {
    Router::new()
        .route("/host/games/{id}", delete(nuke))
        .route("/host/games/{id}/session", post(open_session))
        .route("/host/games/{id}/view", get(host_view))
        .route(
            "/host/games/{id}/questions",
            get(list_questions).post(add_question),
        )
        .route("/host/games/{id}/questions/seed", post(load_seed_questions))
        .route(
            "/host/games/{id}/questions/{question_id}",
            delete(delete_question),
        )
        .route("/host/games/{id}/start", post(start))
        .route("/host/games/{id}/close-answers", post(close_answers))
        .route(
            "/host/games/{id}/answers/{answer_id}/grade",
            post(grade_answer),
        )
        .route("/host/games/{id}/finish-grading", post(finish_grading))
        .route("/host/games/{id}/next", post(next_question))
        .route("/host/games/{id}/redo", post(redo))
        .route("/host/games/{id}/reset", post(reset))
        .route_layer(middleware::from_fn_with_state(state, require_host_pin))
}

/// Check a host PIN so the client can cache it for the session.
#[utoipa::path(
    post,
    path = "/host/games/{id}/session",
    tag = "host",
    params(("X-Host-Pin" = String, Header, description = "Host PIN of the game"),
    ("id" = String, Path, description = "Identifier of the game")),
    responses(
        (status = 200, description = "PIN accepted", body = GameSummary),
        (status = 401, description = "Invalid PIN")
    )
)]
pub async fn open_session(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<GameSummary>, AppError> {
    Ok(Json(host_service::session(&state, id).await?))
}

/// Game, questions, players and answers to grade.
#[utoipa::path(
    get,
    path = "/host/games/{id}/view",
    tag = "host",
    params(("X-Host-Pin" = String, Header, description = "Host PIN of the game"),
    ("id" = String, Path, description = "Identifier of the game")),
    responses((status = 200, description = "Host view", body = HostGameView))
)]
pub async fn host_view(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<HostGameView>, AppError> {
    Ok(Json(host_service::host_view(&state, id).await?))
}

#[utoipa::path(
    get,
    path = "/host/games/{id}/questions",
    tag = "host",
    params(("X-Host-Pin" = String, Header, description = "Host PIN of the game"),
    ("id" = String, Path, description = "Identifier of the game")),
    responses((status = 200, description = "Questions in play order", body = [QuestionSummary]))
)]
pub async fn list_questions(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<QuestionSummary>>, AppError> {
    Ok(Json(host_service::list_questions(&state, id).await?))
}

/// Append a question while the game is in the lobby.
#[utoipa::path(
    post,
    path = "/host/games/{id}/questions",
    tag = "host",
    params(("X-Host-Pin" = String, Header, description = "Host PIN of the game"),
    ("id" = String, Path, description = "Identifier of the game")),
    request_body = AddQuestionRequest,
    responses((status = 200, description = "Question added", body = QuestionSummary))
)]
pub async fn add_question(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Valid(Json(payload)): Valid<Json<AddQuestionRequest>>,
) -> Result<Json<QuestionSummary>, AppError> {
    Ok(Json(host_service::add_question(&state, id, payload).await?))
}

/// Append the configured seed questions while the game is in the lobby.
#[utoipa::path(
    post,
    path = "/host/games/{id}/questions/seed",
    tag = "host",
    params(("X-Host-Pin" = String, Header, description = "Host PIN of the game"),
    ("id" = String, Path, description = "Identifier of the game")),
    responses((status = 200, description = "Questions added", body = [QuestionSummary]))
)]
pub async fn load_seed_questions(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<QuestionSummary>>, AppError> {
    Ok(Json(host_service::load_seed_questions(&state, id).await?))
}

#[utoipa::path(
    delete,
    path = "/host/games/{id}/questions/{question_id}",
    tag = "host",
    params(("X-Host-Pin" = String, Header, description = "Host PIN of the game"),
    ("id" = String, Path, description = "Identifier of the game"),
    ("question_id" = String, Path, description = "Identifier of the question")),
    responses((status = 204, description = "Question deleted"))
)]
pub async fn delete_question(
    State(state): State<SharedState>,
    Path((id, question_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, AppError> {
    host_service::delete_question(&state, id, question_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Open the first question.
#[utoipa::path(
    post,
    path = "/host/games/{id}/start",
    tag = "host",
    params(("X-Host-Pin" = String, Header, description = "Host PIN of the game"),
    ("id" = String, Path, description = "Identifier of the game")),
    responses((status = 200, description = "Game started", body = GameSummary))
)]
pub async fn start(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<GameSummary>, AppError> {
    Ok(Json(lifecycle_service::start(&state, id).await?))
}

#[utoipa::path(
    post,
    path = "/host/games/{id}/close-answers",
    tag = "host",
    params(("X-Host-Pin" = String, Header, description = "Host PIN of the game"),
    ("id" = String, Path, description = "Identifier of the game")),
    responses((status = 200, description = "Grading started", body = GameSummary))
)]
pub async fn close_answers(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<GameSummary>, AppError> {
    Ok(Json(lifecycle_service::close_answers(&state, id).await?))
}

/// Mark one answer to the current question as correct or wrong.
#[utoipa::path(
    post,
    path = "/host/games/{id}/answers/{answer_id}/grade",
    tag = "host",
    params(("X-Host-Pin" = String, Header, description = "Host PIN of the game"),
    ("id" = String, Path, description = "Identifier of the game"),
    ("answer_id" = String, Path, description = "Identifier of the answer")),
    request_body = GradeAnswerRequest,
    responses((status = 204, description = "Answer graded"))
)]
pub async fn grade_answer(
    State(state): State<SharedState>,
    Path((id, answer_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<GradeAnswerRequest>,
) -> Result<StatusCode, AppError> {
    host_service::grade_answer(&state, id, answer_id, payload.is_correct).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Award points and reveal the current question.
#[utoipa::path(
    post,
    path = "/host/games/{id}/finish-grading",
    tag = "host",
    params(("X-Host-Pin" = String, Header, description = "Host PIN of the game"),
    ("id" = String, Path, description = "Identifier of the game")),
    responses(
        (status = 200, description = "Scores revealed", body = GameSummary),
        (status = 409, description = "Some answers are still ungraded")
    )
)]
pub async fn finish_grading(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<GameSummary>, AppError> {
    Ok(Json(lifecycle_service::finish_grading(&state, id).await?))
}

#[utoipa::path(
    post,
    path = "/host/games/{id}/next",
    tag = "host",
    params(("X-Host-Pin" = String, Header, description = "Host PIN of the game"),
    ("id" = String, Path, description = "Identifier of the game")),
    responses((status = 200, description = "Next question opened or game finished", body = GameSummary))
)]
pub async fn next_question(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<GameSummary>, AppError> {
    Ok(Json(lifecycle_service::next(&state, id).await?))
}

/// Discard the current question's answers and reopen it.
#[utoipa::path(
    post,
    path = "/host/games/{id}/redo",
    tag = "host",
    params(("X-Host-Pin" = String, Header, description = "Host PIN of the game"),
    ("id" = String, Path, description = "Identifier of the game")),
    responses((status = 200, description = "Question reopened", body = GameSummary))
)]
pub async fn redo(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<GameSummary>, AppError> {
    Ok(Json(lifecycle_service::redo(&state, id).await?))
}

/// Remove players, answers and questions; keep the code and PIN.
#[utoipa::path(
    post,
    path = "/host/games/{id}/reset",
    tag = "host",
    params(("X-Host-Pin" = String, Header, description = "Host PIN of the game"),
    ("id" = String, Path, description = "Identifier of the game")),
    responses((status = 200, description = "Game back in the lobby", body = GameSummary))
)]
pub async fn reset(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<GameSummary>, AppError> {
    Ok(Json(lifecycle_service::reset(&state, id).await?))
}

/// Delete the game and everything it owns.
#[utoipa::path(
    delete,
    path = "/host/games/{id}",
    tag = "host",
    params(("X-Host-Pin" = String, Header, description = "Host PIN of the game"),
    ("id" = String, Path, description = "Identifier of the game"),
    NukeQuery),
    responses(
        (status = 204, description = "Game deleted"),
        (status = 400, description = "Confirmation missing")
    )
)]
pub async fn nuke(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Query(query): Query<NukeQuery>,
) -> Result<StatusCode, AppError> {
    lifecycle_service::nuke(&state, id, query.confirm).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn require_host_pin(
    State(state): State<SharedState>,
    Path(params): Path<HashMap<String, String>>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let game_id = params
        .get("id")
        .and_then(|raw| Uuid::parse_str(raw).ok())
        .ok_or_else(|| AppError::BadRequest("invalid game id".into()))?;

    let provided = req
        .headers()
        .get(HOST_PIN_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_owned());

    host_service::authorize(&state, game_id, provided.as_deref()).await?;
    Ok(next.run(req).await)
}
