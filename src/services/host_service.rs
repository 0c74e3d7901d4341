use std::time::SystemTime;

use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::{
    config::SeedQuestion,
    dao::{
        models::{GameEntity, GameStatus, QuestionEntity},
        repository::TriviaRepository,
    },
    dto::{
        game::{GameSummary, QuestionSummary},
        host::{AddQuestionRequest, CreateGameRequest, HostGameView},
    },
    error::ServiceError,
    services::{auth, join_code, lifecycle_service::find_game},
    state::SharedState,
};

/// Create a game in the lobby after checking the master secret.
pub async fn create_game(
    state: &SharedState,
    request: CreateGameRequest,
) -> Result<GameSummary, ServiceError> {
    auth::require_master_pin(state.config(), &request.master_pin)?;
    request.validate()?;

    let repository = state.repository().await?;
    let host_pin = match request.host_pin {
        Some(pin) => pin.trim().to_owned(),
        None => request.master_pin.trim().to_owned(),
    };
    let code = join_code::allocate(&repository, state.config().join_code_attempts()).await?;

    let game = repository
        .create_game(GameEntity {
            id: Uuid::new_v4(),
            code,
            host_pin,
            status: GameStatus::Lobby,
            current_question: 0,
            created_at: SystemTime::now(),
        })
        .await?;
    info!(game_id = %game.id, code = %game.code, "game created");

    if request.seed_questions {
        let seeded = append_questions(&repository, game.id, state.config().seed_questions()).await?;
        info!(game_id = %game.id, count = seeded.len(), "seed questions added");
    }

    Ok(GameSummary::from(&game))
}

/// Check the host secret of a game; used by the host route guard.
///
/// An unknown game id is rejected like a wrong PIN, so the guard does not
/// reveal which ids exist.
pub async fn authorize(
    state: &SharedState,
    game_id: Uuid,
    provided: Option<&str>,
) -> Result<GameEntity, ServiceError> {
    let repository = state.repository().await?;
    let game = repository.find_game(game_id).await?;
    auth::require_host_pin_for(game.as_ref(), provided)?;
    game.ok_or_else(|| ServiceError::NotFound("game not found".into()))
}

/// Summary returned once a host PIN has been accepted.
pub async fn session(state: &SharedState, game_id: Uuid) -> Result<GameSummary, ServiceError> {
    let repository = state.repository().await?;
    let game = find_game(&repository, game_id).await?;
    Ok(GameSummary::from(&game))
}

pub async fn list_questions(
    state: &SharedState,
    game_id: Uuid,
) -> Result<Vec<QuestionSummary>, ServiceError> {
    let repository = state.repository().await?;
    find_game(&repository, game_id).await?;
    let questions = repository.list_questions(game_id).await?;
    Ok(questions.into_iter().map(Into::into).collect())
}

/// Append a question; only allowed in the lobby.
pub async fn add_question(
    state: &SharedState,
    game_id: Uuid,
    request: AddQuestionRequest,
) -> Result<QuestionSummary, ServiceError> {
    request.validate()?;
    let repository = state.repository().await?;
    ensure_lobby(&find_game(&repository, game_id).await?)?;

    let seed = SeedQuestion {
        text: request.text,
        correct_answer: request.correct_answer,
    };
    let mut added = append_questions(&repository, game_id, std::slice::from_ref(&seed)).await?;
    added
        .pop()
        .map(Into::into)
        .ok_or_else(|| ServiceError::InvalidInput("question text must not be blank".into()))
}

/// Append the configured seed question set; only allowed in the lobby.
pub async fn load_seed_questions(
    state: &SharedState,
    game_id: Uuid,
) -> Result<Vec<QuestionSummary>, ServiceError> {
    let repository = state.repository().await?;
    ensure_lobby(&find_game(&repository, game_id).await?)?;
    let added = append_questions(&repository, game_id, state.config().seed_questions()).await?;
    info!(%game_id, count = added.len(), "seed questions added");
    Ok(added.into_iter().map(Into::into).collect())
}

/// Remove a question of the game; only allowed in the lobby.
pub async fn delete_question(
    state: &SharedState,
    game_id: Uuid,
    question_id: Uuid,
) -> Result<(), ServiceError> {
    let repository = state.repository().await?;
    ensure_lobby(&find_game(&repository, game_id).await?)?;

    let owned = repository
        .list_questions(game_id)
        .await?
        .iter()
        .any(|question| question.id == question_id);
    if !owned || !repository.delete_question(game_id, question_id).await? {
        return Err(ServiceError::NotFound("question not found".into()));
    }
    Ok(())
}

/// Grade one answer to the current question while the game is grading.
pub async fn grade_answer(
    state: &SharedState,
    game_id: Uuid,
    answer_id: Uuid,
    is_correct: bool,
) -> Result<(), ServiceError> {
    let repository = state.repository().await?;
    let game = find_game(&repository, game_id).await?;
    if game.status != GameStatus::Grading {
        return Err(ServiceError::InvalidState(format!(
            "answers can only be graded while grading (game is {:?})",
            game.status
        )));
    }

    let answer = repository
        .find_answer(answer_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("answer not found".into()))?;
    let questions = repository.list_questions(game_id).await?;
    let current = questions.get(game.current_question).map(|question| question.id);
    if current != Some(answer.question_id) {
        return Err(ServiceError::InvalidState(
            "answer does not belong to the current question".into(),
        ));
    }

    if !repository.grade_answer(game_id, &answer, is_correct).await? {
        return Err(ServiceError::NotFound("answer not found".into()));
    }
    Ok(())
}

/// Game, questions, players and the current question's answers.
pub async fn host_view(state: &SharedState, game_id: Uuid) -> Result<HostGameView, ServiceError> {
    let repository = state.repository().await?;
    let game = find_game(&repository, game_id).await?;
    let questions = repository.list_questions(game_id).await?;
    let players = repository.list_players(game_id).await?;

    let answers = match (game.status, questions.get(game.current_question)) {
        (GameStatus::Active | GameStatus::Grading, Some(question)) => {
            repository.list_answers_with_players(question.id).await?
        }
        _ => Vec::new(),
    };

    Ok(HostGameView {
        game: GameSummary::from(&game),
        questions: questions.into_iter().map(Into::into).collect(),
        players: players.into_iter().map(Into::into).collect(),
        answers: answers.into_iter().map(Into::into).collect(),
    })
}

fn ensure_lobby(game: &GameEntity) -> Result<(), ServiceError> {
    if game.status != GameStatus::Lobby {
        return Err(ServiceError::InvalidState(
            "questions can only be edited in the lobby".into(),
        ));
    }
    Ok(())
}

/// Insert `seeds` after the last existing question, skipping blank entries.
async fn append_questions(
    repository: &TriviaRepository,
    game_id: Uuid,
    seeds: &[SeedQuestion],
) -> Result<Vec<QuestionEntity>, ServiceError> {
    let mut order_num = repository
        .list_questions(game_id)
        .await?
        .last()
        .map_or(0, |question| question.order_num + 1);

    let mut added = Vec::with_capacity(seeds.len());
    for seed in seeds {
        let text = seed.text.trim();
        if text.is_empty() {
            continue;
        }
        let correct_answer = seed
            .correct_answer
            .as_deref()
            .map(str::trim)
            .filter(|answer| !answer.is_empty())
            .map(str::to_owned);

        let question = repository
            .create_question(QuestionEntity {
                id: Uuid::new_v4(),
                game_id,
                text: text.to_owned(),
                correct_answer,
                order_num,
                created_at: SystemTime::now(),
            })
            .await?;
        order_num += 1;
        added.push(question);
    }
    Ok(added)
}
