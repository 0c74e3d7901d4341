use std::time::SystemTime;

use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::{
        models::{GameStatus, PlayerEntity, QuestionEntity},
        repository::TriviaRepository,
    },
    dto::{
        game::{AnswerSummary, GameSummary, PlayerSummary, PublicQuestion},
        player::{JoinRequest, JoinResponse, PlayerGameView, SubmitAnswerRequest},
    },
    error::ServiceError,
    services::{join_code::normalize_code, lifecycle_service::find_game},
    state::SharedState,
};

/// Add a player to the lobby of the game identified by `request.code`.
pub async fn join(state: &SharedState, request: JoinRequest) -> Result<JoinResponse, ServiceError> {
    request.validate()?;
    let repository = state.repository().await?;

    let code = normalize_code(&request.code);
    let game = repository
        .find_game_by_code(&code)
        .await?
        .ok_or_else(|| ServiceError::NotFound("game not found".into()))?;
    if game.status != GameStatus::Lobby {
        return Err(ServiceError::InvalidState(
            "this game has already started".into(),
        ));
    }

    let player = repository
        .create_player(PlayerEntity {
            id: Uuid::new_v4(),
            game_id: game.id,
            name: request.name.trim().to_owned(),
            score: 0,
            joined_at: SystemTime::now(),
        })
        .await?;
    info!(game_id = %game.id, player_id = %player.id, %code, "player joined");

    Ok(JoinResponse {
        player: player.into(),
        game: GameSummary::from(&game),
    })
}

/// Store the player's answer, replacing any earlier one for the same question.
///
/// Accepted in every status; the last write wins.
pub async fn submit_answer(
    state: &SharedState,
    player_id: Uuid,
    request: SubmitAnswerRequest,
) -> Result<AnswerSummary, ServiceError> {
    request.validate()?;
    let repository = state.repository().await?;
    let player = find_player(&repository, player_id).await?;

    let belongs = repository
        .list_questions(player.game_id)
        .await?
        .iter()
        .any(|question| question.id == request.question_id);
    if !belongs {
        return Err(ServiceError::NotFound("question not found".into()));
    }

    let answer = repository
        .upsert_answer(
            &player,
            request.question_id,
            request.answer_text.trim().to_owned(),
        )
        .await?;
    Ok(answer.into())
}

/// The player's own answer to a question, if submitted.
pub async fn own_answer(
    state: &SharedState,
    player_id: Uuid,
    question_id: Uuid,
) -> Result<Option<AnswerSummary>, ServiceError> {
    let repository = state.repository().await?;
    find_player(&repository, player_id).await?;
    let answer = repository.find_player_answer(player_id, question_id).await?;
    Ok(answer.map(Into::into))
}

/// Everything a player screen shows: game, current question, own answer and leaderboard.
pub async fn player_view(
    state: &SharedState,
    player_id: Uuid,
) -> Result<PlayerGameView, ServiceError> {
    let repository = state.repository().await?;
    let player = find_player(&repository, player_id).await?;
    let game = find_game(&repository, player.game_id).await?;
    let questions = repository.list_questions(game.id).await?;

    let current = current_question(game.status, game.current_question, &questions);
    let answer = match current {
        Some(question) => repository
            .find_player_answer(player.id, question.id)
            .await?
            .map(AnswerSummary::from),
        None => None,
    };
    let leaderboard = repository
        .list_players(game.id)
        .await?
        .into_iter()
        .map(PlayerSummary::from)
        .collect();

    Ok(PlayerGameView {
        question: current
            .map(|question| PublicQuestion::for_status(question, game.current_question, game.status)),
        answer,
        leaderboard,
        game: GameSummary::from(&game),
        player: player.into(),
    })
}

/// Question a viewer should see, none in the lobby.
pub(crate) fn current_question(
    status: GameStatus,
    index: usize,
    questions: &[QuestionEntity],
) -> Option<&QuestionEntity> {
    match status {
        GameStatus::Lobby => None,
        _ => questions.get(index),
    }
}

async fn find_player(
    repository: &TriviaRepository,
    player_id: Uuid,
) -> Result<PlayerEntity, ServiceError> {
    repository
        .find_player(player_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("player not found".into()))
}
