use uuid::Uuid;

use crate::{
    dao::repository::TriviaRepository,
    dto::game::{GameSnapshot, GameSummary, PlayerSummary, PublicQuestion},
    error::ServiceError,
    services::{join_code::normalize_code, lifecycle_service::find_game, player_service},
    state::SharedState,
};

/// Resolve a game from its join code, in any case.
pub async fn find_by_code(state: &SharedState, code: &str) -> Result<GameSummary, ServiceError> {
    let repository = state.repository().await?;
    let game = repository
        .find_game_by_code(&normalize_code(code))
        .await?
        .ok_or_else(|| ServiceError::NotFound("game not found".into()))?;
    Ok(GameSummary::from(&game))
}

/// Players of a game ordered by score, best first.
pub async fn scoreboard(
    state: &SharedState,
    game_id: Uuid,
) -> Result<Vec<PlayerSummary>, ServiceError> {
    let repository = state.repository().await?;
    find_game(&repository, game_id).await?;
    let players = repository.list_players(game_id).await?;
    Ok(players.into_iter().map(Into::into).collect())
}

pub async fn snapshot(state: &SharedState, game_id: Uuid) -> Result<GameSnapshot, ServiceError> {
    let repository = state.repository().await?;
    load_snapshot(&repository, game_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("game not found".into()))
}

/// Read the authoritative snapshot of a game; `None` once the game is deleted.
pub async fn load_snapshot(
    repository: &TriviaRepository,
    game_id: Uuid,
) -> Result<Option<GameSnapshot>, ServiceError> {
    let Some(game) = repository.find_game(game_id).await? else {
        return Ok(None);
    };
    let questions = repository.list_questions(game_id).await?;
    let players = repository.list_players(game_id).await?;

    let current = player_service::current_question(game.status, game.current_question, &questions);
    let answer_count = match current {
        Some(question) => repository.list_answers_with_players(question.id).await?.len(),
        None => 0,
    };

    Ok(Some(GameSnapshot {
        question: current
            .map(|question| PublicQuestion::for_status(question, game.current_question, game.status)),
        answer_count,
        question_count: questions.len(),
        players: players.into_iter().map(Into::into).collect(),
        game: GameSummary::from(&game),
    }))
}
