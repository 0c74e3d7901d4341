use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the trivia backend.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::sse::game_stream,
        crate::routes::game::create_game,
        crate::routes::game::find_by_code,
        crate::routes::game::scoreboard,
        crate::routes::game::snapshot,
        crate::routes::player::join,
        crate::routes::player::submit_answer,
        crate::routes::player::own_answer,
        crate::routes::player::player_view,
        crate::routes::host::open_session,
        crate::routes::host::host_view,
        crate::routes::host::list_questions,
        crate::routes::host::add_question,
        crate::routes::host::load_seed_questions,
        crate::routes::host::delete_question,
        crate::routes::host::start,
        crate::routes::host::close_answers,
        crate::routes::host::grade_answer,
        crate::routes::host::finish_grading,
        crate::routes::host::next_question,
        crate::routes::host::redo,
        crate::routes::host::reset,
        crate::routes::host::nuke,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::health::HealthStatus,
            crate::dto::game::GameSummary,
            crate::dto::game::QuestionSummary,
            crate::dto::game::PublicQuestion,
            crate::dto::game::PlayerSummary,
            crate::dto::game::AnswerSummary,
            crate::dto::game::AuthoredAnswer,
            crate::dto::game::GameSnapshot,
            crate::dto::host::CreateGameRequest,
            crate::dto::host::AddQuestionRequest,
            crate::dto::host::GradeAnswerRequest,
            crate::dto::host::HostGameView,
            crate::dto::player::JoinRequest,
            crate::dto::player::JoinResponse,
            crate::dto::player::SubmitAnswerRequest,
            crate::dto::player::PlayerGameView,
            crate::dto::sse::GameDeletedEvent,
            crate::state::changes::RowChange,
            crate::state::changes::Table,
            crate::state::changes::ChangeKind,
            crate::dao::models::GameStatus,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "game", description = "Game creation and public lookups"),
        (name = "player", description = "Joining and answering"),
        (name = "host", description = "Host commands guarded by the X-Host-Pin header"),
        (name = "sse", description = "Server-sent events streams"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_host_route_is_documented() {
        let doc = ApiDoc::openapi();
        for path in [
            "/host/games/{id}",
            "/host/games/{id}/redo",
            "/host/games/{id}/answers/{answer_id}/grade",
            "/games/{id}/events",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
