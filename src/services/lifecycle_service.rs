//! Host-driven lifecycle commands.
//!
//! Each command reads the game, checks the requested event against
//! [`transition`], performs its side effects and writes the new position
//! last. The steps are separate storage round trips: a failure part-way
//! propagates to the caller and leaves the earlier steps applied.

use tracing::info;
use uuid::Uuid;

use crate::{
    dao::{
        models::{GameEntity, GameStatus, QuestionEntity},
        repository::TriviaRepository,
    },
    dto::game::GameSummary,
    error::ServiceError,
    services::scoring,
    state::{
        SharedState,
        state_machine::{LifecycleEvent, Position, transition},
    },
};

/// Game and ordered questions loaded at the start of a command.
struct Loaded {
    repository: TriviaRepository,
    game: GameEntity,
    questions: Vec<QuestionEntity>,
}

impl Loaded {
    fn position(&self) -> Position {
        Position::new(self.game.status, self.game.current_question)
    }

    fn plan(&self, event: LifecycleEvent) -> Result<Position, ServiceError> {
        Ok(transition(self.position(), event, self.questions.len())?)
    }

    fn current_question(&self) -> Result<&QuestionEntity, ServiceError> {
        self.questions
            .get(self.game.current_question)
            .ok_or_else(|| {
                ServiceError::InvalidState(format!(
                    "question {} no longer exists",
                    self.game.current_question
                ))
            })
    }
}

async fn load(state: &SharedState, game_id: Uuid) -> Result<Loaded, ServiceError> {
    let repository = state.repository().await?;
    let game = find_game(&repository, game_id).await?;
    let questions = repository.list_questions(game_id).await?;
    Ok(Loaded {
        repository,
        game,
        questions,
    })
}

pub(crate) async fn find_game(
    repository: &TriviaRepository,
    game_id: Uuid,
) -> Result<GameEntity, ServiceError> {
    repository
        .find_game(game_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("game not found".into()))
}

async fn commit(
    loaded: Loaded,
    event: LifecycleEvent,
    next: Position,
) -> Result<GameSummary, ServiceError> {
    let Loaded {
        repository,
        mut game,
        ..
    } = loaded;

    if !repository
        .set_game_position(game.id, next.status, next.current_question)
        .await?
    {
        return Err(ServiceError::NotFound("game not found".into()));
    }

    info!(
        game_id = %game.id,
        ?event,
        from = ?game.status,
        to = ?next.status,
        current_question = next.current_question,
        "game transitioned"
    );
    game.status = next.status;
    game.current_question = next.current_question;
    Ok(GameSummary::from(&game))
}

/// Open the first question. Fails without questions.
pub async fn start(state: &SharedState, game_id: Uuid) -> Result<GameSummary, ServiceError> {
    let loaded = load(state, game_id).await?;
    let next = loaded.plan(LifecycleEvent::Start)?;
    commit(loaded, LifecycleEvent::Start, next).await
}

/// Stop collecting answers for the current question and begin grading.
///
/// Submissions are not rejected afterwards; only the views stop offering them.
pub async fn close_answers(
    state: &SharedState,
    game_id: Uuid,
) -> Result<GameSummary, ServiceError> {
    let loaded = load(state, game_id).await?;
    let next = loaded.plan(LifecycleEvent::CloseAnswers)?;
    commit(loaded, LifecycleEvent::CloseAnswers, next).await
}

/// Reveal the current question once every answer is graded, awarding points first.
pub async fn finish_grading(
    state: &SharedState,
    game_id: Uuid,
) -> Result<GameSummary, ServiceError> {
    let loaded = load(state, game_id).await?;
    let next = loaded.plan(LifecycleEvent::FinishGrading)?;
    let question = loaded.current_question()?;

    let answers = loaded
        .repository
        .list_answers_with_players(question.id)
        .await?;
    let ungraded = answers
        .iter()
        .filter(|entry| entry.answer.is_correct.is_none())
        .count();
    if ungraded > 0 {
        return Err(ServiceError::InvalidState(format!(
            "{ungraded} answer(s) still need grading"
        )));
    }

    let awarded = scoring::award(&loaded.repository, question.id).await?;
    info!(%game_id, question_id = %question.id, awarded, "scores reconciled");
    commit(loaded, LifecycleEvent::FinishGrading, next).await
}

/// Move on to the next question, or finish after the last one.
pub async fn next(state: &SharedState, game_id: Uuid) -> Result<GameSummary, ServiceError> {
    let loaded = load(state, game_id).await?;
    let next = loaded.plan(LifecycleEvent::Next)?;
    commit(loaded, LifecycleEvent::Next, next).await
}

/// Reopen the current question from scratch.
///
/// Points are taken back only when they were granted, i.e. when the question
/// was already revealed. Every answer to the question is then deleted so
/// players resubmit.
pub async fn redo(state: &SharedState, game_id: Uuid) -> Result<GameSummary, ServiceError> {
    let loaded = load(state, game_id).await?;
    let next = loaded.plan(LifecycleEvent::Redo)?;
    let question_id = loaded.current_question()?.id;

    if loaded.game.status == GameStatus::Revealing {
        let reverted = scoring::revert(&loaded.repository, question_id).await?;
        info!(%game_id, %question_id, reverted, "scores reverted");
    }
    let removed = loaded
        .repository
        .delete_answers_for_question(game_id, question_id)
        .await?;
    info!(%game_id, %question_id, removed, "answers discarded for redo");

    commit(loaded, LifecycleEvent::Redo, next).await
}

/// Empty a lobby or finished game while keeping its code and host secret.
pub async fn reset(state: &SharedState, game_id: Uuid) -> Result<GameSummary, ServiceError> {
    let loaded = load(state, game_id).await?;
    let next = loaded.plan(LifecycleEvent::Reset)?;
    teardown(&loaded.repository, game_id).await?;
    commit(loaded, LifecycleEvent::Reset, next).await
}

/// Delete a game and everything it owns. Requires `confirm`.
pub async fn nuke(state: &SharedState, game_id: Uuid, confirm: bool) -> Result<(), ServiceError> {
    if !confirm {
        return Err(ServiceError::InvalidInput(
            "deleting a game requires confirmation".into(),
        ));
    }

    let repository = state.repository().await?;
    let game = find_game(&repository, game_id).await?;
    teardown(&repository, game_id).await?;
    repository.delete_game(game_id).await?;
    state.changes().close(game_id);

    info!(%game_id, code = %game.code, "game deleted");
    Ok(())
}

/// Delete answers, then players, then questions of a game.
async fn teardown(repository: &TriviaRepository, game_id: Uuid) -> Result<(), ServiceError> {
    let player_ids = repository
        .list_players(game_id)
        .await?
        .into_iter()
        .map(|player| player.id)
        .collect::<Vec<_>>();

    let answers = repository
        .delete_answers_for_players(game_id, player_ids)
        .await?;
    let players = repository.delete_players_for_game(game_id).await?;
    let questions = repository.delete_questions_for_game(game_id).await?;

    info!(%game_id, answers, players, questions, "game contents removed");
    Ok(())
}
